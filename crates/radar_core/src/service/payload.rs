//! JSON payload decoding for the ingest and patch surfaces.
//!
//! # Responsibility
//! - Turn loosely-typed JSON bodies into `IngestRequest` / `RadarPatch`.
//!
//! # Invariants
//! - Ingest decoding is lenient: unknown enum values and unusable scores
//!   count as "not supplied"; title/source/url are validated later.
//! - Patch decoding is strict: every present field must be valid, and at
//!   least one field must be present.

use crate::canon::text::sanitize_text;
use crate::canon::url::sanitize_url;
use crate::model::radar_item::{
    clamp_score, Kind, Lane, Level, RadarPatch, RadarStatus, RadarValidationError, TocAxis,
    MAX_SOURCE_CHARS, MAX_TITLE_CHARS,
};
use crate::service::ingest::IngestRequest;
use serde_json::{Map, Value};

/// Raw ingest body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestPayload {
    fields: Map<String, Value>,
}

impl IngestPayload {
    /// Parses a JSON document; the body must be an object.
    pub fn from_json(raw: &str) -> Result<Self, RadarValidationError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|_| RadarValidationError::NotAnObject)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, RadarValidationError> {
        match value {
            Value::Object(fields) => Ok(Self::from_map(fields)),
            _ => Err(RadarValidationError::NotAnObject),
        }
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Converts to a request. Never fails; validation of the required text
    /// fields happens during ingestion.
    pub fn into_request(self) -> IngestRequest {
        let fields = &self.fields;
        IngestRequest {
            title: text_field(fields, "title"),
            source: text_field(fields, "source"),
            url: text_field(fields, "url"),
            lane: lenient_enum(fields, "lane", Lane::parse),
            kind: lenient_enum(fields, "kind", Kind::parse),
            score: fields.get("score").and_then(lenient_score),
            impact: lenient_enum(fields, "impact", Level::parse),
            urgency: lenient_enum(fields, "urgency", Level::parse),
            toc_axis: lenient_toc_axis(fields.get("tocAxis")),
            status: lenient_enum(fields, "status", RadarStatus::parse),
        }
    }
}

/// Raw patch body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchPayload {
    fields: Map<String, Value>,
}

impl PatchPayload {
    pub fn from_json(raw: &str) -> Result<Self, RadarValidationError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|_| RadarValidationError::NotAnObject)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, RadarValidationError> {
        match value {
            Value::Object(fields) => Ok(Self::from_map(fields)),
            _ => Err(RadarValidationError::NotAnObject),
        }
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Converts to a validated patch.
    ///
    /// # Errors
    /// - `InvalidEnum` / `InvalidScore` for present but unusable values.
    /// - Text and URL sanitization errors.
    /// - `EmptyPatch` when no editable field is present.
    pub fn into_patch(self) -> Result<RadarPatch, RadarValidationError> {
        let fields = &self.fields;
        let mut patch = RadarPatch {
            status: strict_enum(fields, "status", RadarStatus::parse)?,
            impact: strict_enum(fields, "impact", Level::parse)?,
            urgency: strict_enum(fields, "urgency", Level::parse)?,
            lane: strict_enum(fields, "lane", Lane::parse)?,
            kind: strict_enum(fields, "kind", Kind::parse)?,
            ..RadarPatch::default()
        };

        if let Some(raw) = fields.get("score") {
            patch.score = Some(strict_score(raw)?);
        }

        if let Some(raw) = fields.get("tocAxis") {
            patch.toc_axis = Some(match raw {
                Value::Null => None,
                Value::String(value) if value.trim().is_empty() => None,
                Value::String(value) => Some(TocAxis::parse(value.trim()).ok_or_else(|| {
                    RadarValidationError::InvalidEnum {
                        field: "tocAxis",
                        value: value.clone(),
                    }
                })?),
                other => {
                    return Err(RadarValidationError::InvalidEnum {
                        field: "tocAxis",
                        value: other.to_string(),
                    })
                }
            });
        }

        if fields.contains_key("title") {
            patch.title = Some(sanitize_text(
                &text_field(fields, "title"),
                "title",
                MAX_TITLE_CHARS,
            )?);
        }
        if fields.contains_key("source") {
            patch.source = Some(sanitize_text(
                &text_field(fields, "source"),
                "source",
                MAX_SOURCE_CHARS,
            )?);
        }
        if fields.contains_key("url") {
            patch.url = Some(sanitize_url(&text_field(fields, "url"))?);
        }

        if patch.is_empty() {
            return Err(RadarValidationError::EmptyPatch);
        }
        Ok(patch)
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(value)) => value.clone(),
        Some(other) => other.to_string(),
    }
}

fn lenient_enum<T>(
    fields: &Map<String, Value>,
    key: &str,
    parse: fn(&str) -> Option<T>,
) -> Option<T> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .and_then(|value| parse(value.trim()))
}

fn lenient_toc_axis(raw: Option<&Value>) -> Option<Option<TocAxis>> {
    match raw? {
        Value::Null => Some(None),
        Value::String(value) if value.trim().is_empty() => Some(None),
        Value::String(value) => TocAxis::parse(value.trim()).map(Some),
        _ => None,
    }
}

fn lenient_score(raw: &Value) -> Option<f64> {
    let parsed = match raw {
        Value::Number(number) => number.as_f64(),
        Value::String(value) => parse_decimal(value),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

fn strict_enum<T>(
    fields: &Map<String, Value>,
    key: &'static str,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, RadarValidationError> {
    let Some(raw) = fields.get(key) else {
        return Ok(None);
    };
    match raw.as_str().map(str::trim).and_then(parse) {
        Some(value) => Ok(Some(value)),
        None => Err(RadarValidationError::InvalidEnum {
            field: key,
            value: match raw {
                Value::String(value) => value.clone(),
                other => other.to_string(),
            },
        }),
    }
}

fn strict_score(raw: &Value) -> Result<f64, RadarValidationError> {
    let parsed = match raw {
        Value::Number(number) => number.as_f64(),
        Value::String(value) => parse_decimal(value),
        _ => None,
    };
    match parsed {
        Some(score) if score.is_finite() => Ok(clamp_score(score)),
        _ => Err(RadarValidationError::InvalidScore(match raw {
            Value::String(value) => value.clone(),
            other => other.to_string(),
        })),
    }
}

/// Parses a decimal number, accepting one decimal comma (`"72,5"`).
fn parse_decimal(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.replacen(',', ".", 1).parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::{IngestPayload, PatchPayload};
    use crate::model::radar_item::{Lane, Level, RadarStatus, RadarValidationError, TocAxis};
    use serde_json::json;

    #[test]
    fn ingest_payload_ignores_unknown_enums() {
        let request = IngestPayload::from_value(json!({
            "title": "Titel",
            "source": "SRF",
            "url": "https://srf.ch/a",
            "lane": "sport",
            "urgency": " high ",
            "status": 7
        }))
        .unwrap()
        .into_request();
        assert_eq!(request.lane, None);
        assert_eq!(request.urgency, Some(Level::High));
        assert_eq!(request.status, None);
    }

    #[test]
    fn ingest_payload_accepts_decimal_comma_scores() {
        let request = IngestPayload::from_value(json!({ "score": "72,5" }))
            .unwrap()
            .into_request();
        assert_eq!(request.score, Some(72.5));

        let request = IngestPayload::from_value(json!({ "score": "viel" }))
            .unwrap()
            .into_request();
        assert_eq!(request.score, None);
    }

    #[test]
    fn ingest_payload_distinguishes_absent_and_cleared_toc_axis() {
        let absent = IngestPayload::from_value(json!({})).unwrap().into_request();
        assert_eq!(absent.toc_axis, None);

        let cleared = IngestPayload::from_value(json!({ "tocAxis": null }))
            .unwrap()
            .into_request();
        assert_eq!(cleared.toc_axis, Some(None));

        let set = IngestPayload::from_value(json!({ "tocAxis": "weltbild" }))
            .unwrap()
            .into_request();
        assert_eq!(set.toc_axis, Some(Some(TocAxis::Weltbild)));
    }

    #[test]
    fn ingest_payload_rejects_non_objects() {
        assert_eq!(
            IngestPayload::from_json("[1, 2]"),
            Err(RadarValidationError::NotAnObject)
        );
        assert_eq!(
            IngestPayload::from_json("{ broken"),
            Err(RadarValidationError::NotAnObject)
        );
    }

    #[test]
    fn patch_payload_is_strict() {
        let error = PatchPayload::from_value(json!({ "status": "archived" }))
            .unwrap()
            .into_patch()
            .unwrap_err();
        assert!(matches!(
            error,
            RadarValidationError::InvalidEnum { field: "status", .. }
        ));

        let error = PatchPayload::from_value(json!({ "score": "" }))
            .unwrap()
            .into_patch()
            .unwrap_err();
        assert!(matches!(error, RadarValidationError::InvalidScore(_)));
    }

    #[test]
    fn patch_payload_requires_a_field() {
        let error = PatchPayload::from_value(json!({ "unknown": 1 }))
            .unwrap()
            .into_patch()
            .unwrap_err();
        assert_eq!(error, RadarValidationError::EmptyPatch);
    }

    #[test]
    fn patch_payload_clamps_scores_and_clears_toc_axis() {
        let patch = PatchPayload::from_value(json!({
            "score": "120,5",
            "tocAxis": "",
            "lane": " politik ",
            "status": "watchlist"
        }))
        .unwrap()
        .into_patch()
        .unwrap();
        assert_eq!(patch.score, Some(100.0));
        assert_eq!(patch.toc_axis, Some(None));
        assert_eq!(patch.lane, Some(Lane::Politik));
        assert_eq!(patch.status, Some(RadarStatus::Watchlist));
    }

    #[test]
    fn patch_payload_sanitizes_text_and_url() {
        let patch = PatchPayload::from_value(json!({
            "title": "  Neuer\tTitel ",
            "url": "www.example.com/x?utm_source=a"
        }))
        .unwrap()
        .into_patch()
        .unwrap();
        assert_eq!(patch.title.as_deref(), Some("Neuer Titel"));
        assert_eq!(patch.url.as_deref(), Some("https://www.example.com/x"));
    }
}
