//! Radar item domain model.
//!
//! # Responsibility
//! - Define the canonical record for a tracked candidate signal.
//! - Provide ordinal helpers used by merge precedence and view sorting.
//! - Apply partial updates (`RadarPatch`) with `updated_at` bookkeeping.
//!
//! # Invariants
//! - `id` is assigned once at creation and never rewritten.
//! - `title` is non-empty and at most 220 chars, `source` at most 120 chars.
//! - `url` parses as an absolute http/https URL.
//! - `score` is finite and clamped to `[0, 100]`.
//! - `updated_at` is never earlier than `created_at` for records created by core.

use crate::clock::serde_millis;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use url::Url;
use uuid::Uuid;

/// Stable identifier of a radar item.
///
/// Kept as an opaque string so records written by other tools
/// (`radar_<base36>` style ids) stay readable.
pub type RadarId = String;

pub const MAX_TITLE_CHARS: usize = 220;
pub const MAX_SOURCE_CHARS: usize = 120;
pub const MAX_URL_CHARS: usize = 2_048;
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;
pub const DEFAULT_SCORE: f64 = 50.0;

/// Categorical routing bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    /// Media work.
    #[default]
    Medienarbeit,
    /// Politics.
    Politik,
    /// Book project.
    Buchprojekt,
}

impl Lane {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Medienarbeit => "medienarbeit",
            Self::Politik => "politik",
            Self::Buchprojekt => "buchprojekt",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "medienarbeit" => Some(Self::Medienarbeit),
            "politik" => Some(Self::Politik),
            "buchprojekt" => Some(Self::Buchprojekt),
            _ => None,
        }
    }
}

/// Signal category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    #[default]
    News,
    Vorstoss,
    Kampagne,
    Analyse,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Vorstoss => "vorstoss",
            Self::Kampagne => "kampagne",
            Self::Analyse => "analyse",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "news" => Some(Self::News),
            "vorstoss" => Some(Self::Vorstoss),
            "kampagne" => Some(Self::Kampagne),
            "analyse" => Some(Self::Analyse),
            _ => None,
        }
    }
}

/// Ordinal scale used for both `impact` and `urgency`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    #[default]
    Med,
    High,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Med => "med",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "med" => Some(Self::Med),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Ordinal position on the `low < med < high` scale.
    pub fn ordinal(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Med => 2,
            Self::High => 3,
        }
    }

    /// Returns whichever level ranks higher; ties keep `self`.
    pub fn max_keep_self(self, other: Self) -> Self {
        if other.ordinal() > self.ordinal() {
            other
        } else {
            self
        }
    }
}

/// Theory-of-change axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TocAxis {
    Wertschoepfung,
    Weltbild,
    Repraesentation,
}

impl TocAxis {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wertschoepfung => "wertschoepfung",
            Self::Weltbild => "weltbild",
            Self::Repraesentation => "repraesentation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "wertschoepfung" => Some(Self::Wertschoepfung),
            "weltbild" => Some(Self::Weltbild),
            "repraesentation" => Some(Self::Repraesentation),
            _ => None,
        }
    }
}

/// Triage state. Drives visibility in views and merge precedence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadarStatus {
    #[default]
    New,
    Accepted,
    Watchlist,
    Rejected,
    /// Stored value outside the known set. Never accepted from input.
    #[serde(other)]
    Unknown,
}

impl RadarStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Accepted => "accepted",
            Self::Watchlist => "watchlist",
            Self::Rejected => "rejected",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(Self::New),
            "accepted" => Some(Self::Accepted),
            "watchlist" => Some(Self::Watchlist),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Reads a persisted status; unrecognized values become `Unknown`.
    pub fn from_stored(value: &str) -> Self {
        Self::parse(value.trim()).unwrap_or(Self::Unknown)
    }

    /// Precedence used when two records claim the same identity slot.
    ///
    /// `new` ranks above `rejected` so a resurfacing signal can re-enter
    /// triage; `Unknown` ranks below everything.
    pub fn dedupe_rank(self) -> u8 {
        match self {
            Self::Accepted => 4,
            Self::Watchlist => 3,
            Self::New => 2,
            Self::Rejected => 1,
            Self::Unknown => 0,
        }
    }

    /// Board ordering: open items first, then rejected, unknown last.
    pub fn board_priority(self) -> u8 {
        match self {
            Self::New => 0,
            Self::Watchlist => 1,
            Self::Accepted => 2,
            Self::Rejected => 3,
            Self::Unknown => 99,
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),+) => {
        $(impl Display for $ty {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        })+
    };
}

display_as_str!(Lane, Kind, Level, TocAxis, RadarStatus);

/// Validation error for radar input and persisted radar state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadarValidationError {
    /// A required text field is empty after sanitization.
    MissingField(&'static str),
    /// A text field exceeds its character cap.
    FieldTooLong { field: &'static str, max: usize },
    /// URL cannot be parsed or is not http/https.
    InvalidUrl(String),
    /// Enum field carries an unsupported value.
    InvalidEnum { field: &'static str, value: String },
    /// Score is not a finite number inside the accepted range.
    InvalidScore(String),
    /// Request body is not a JSON object.
    NotAnObject,
    /// Patch contains no applicable field.
    EmptyPatch,
}

impl Display for RadarValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "{field} is required"),
            Self::FieldTooLong { field, max } => {
                write!(f, "{field} is too long (max. {max} characters)")
            }
            Self::InvalidUrl(value) => write!(f, "invalid url `{value}` (http/https only)"),
            Self::InvalidEnum { field, value } => write!(f, "invalid {field}: `{value}`"),
            Self::InvalidScore(value) => write!(f, "invalid score: `{value}`"),
            Self::NotAnObject => write!(f, "request body must be a JSON object"),
            Self::EmptyPatch => write!(f, "no valid fields to update"),
        }
    }
}

impl Error for RadarValidationError {}

/// Canonical radar record.
///
/// Serialized with camelCase field names so JSON documents written by the
/// web tooling can be read and written back without translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarItem {
    pub id: RadarId,
    pub title: String,
    pub source: String,
    /// Sanitized absolute URL (tracking params stripped, path normalized).
    pub url: String,
    pub lane: Lane,
    pub kind: Kind,
    pub score: f64,
    pub impact: Level,
    pub urgency: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toc_axis: Option<TocAxis>,
    pub status: RadarStatus,
    #[serde(with = "serde_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "serde_millis")]
    pub updated_at: DateTime<Utc>,
}

impl RadarItem {
    /// Generates a fresh id with the given prefix (`radar`, `radar_news`).
    pub fn generate_id(prefix: &str) -> RadarId {
        format!("{prefix}_{}", Uuid::new_v4().simple())
    }

    /// Validates record-level invariants.
    ///
    /// Called by repositories on every write and on every read, so invalid
    /// persisted state is reported instead of silently served.
    pub fn validate(&self) -> Result<(), RadarValidationError> {
        if self.id.trim().is_empty() {
            return Err(RadarValidationError::MissingField("id"));
        }
        if self.title.trim().is_empty() {
            return Err(RadarValidationError::MissingField("title"));
        }
        if self.title.chars().count() > MAX_TITLE_CHARS {
            return Err(RadarValidationError::FieldTooLong {
                field: "title",
                max: MAX_TITLE_CHARS,
            });
        }
        if self.source.chars().count() > MAX_SOURCE_CHARS {
            return Err(RadarValidationError::FieldTooLong {
                field: "source",
                max: MAX_SOURCE_CHARS,
            });
        }
        if !self.score.is_finite() || self.score < SCORE_MIN || self.score > SCORE_MAX {
            return Err(RadarValidationError::InvalidScore(self.score.to_string()));
        }
        match Url::parse(&self.url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
            _ => Err(RadarValidationError::InvalidUrl(self.url.clone())),
        }
    }
}

/// Partial update for one radar item.
///
/// `None` leaves a field untouched. `toc_axis: Some(None)` clears the axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RadarPatch {
    pub title: Option<String>,
    pub source: Option<String>,
    pub url: Option<String>,
    pub lane: Option<Lane>,
    pub kind: Option<Kind>,
    pub score: Option<f64>,
    pub impact: Option<Level>,
    pub urgency: Option<Level>,
    pub toc_axis: Option<Option<TocAxis>>,
    pub status: Option<RadarStatus>,
    /// Refresh `updated_at` even when no field value changes.
    pub touch: bool,
}

impl RadarPatch {
    /// Returns whether the patch carries no field update.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.source.is_none()
            && self.url.is_none()
            && self.lane.is_none()
            && self.kind.is_none()
            && self.score.is_none()
            && self.impact.is_none()
            && self.urgency.is_none()
            && self.toc_axis.is_none()
            && self.status.is_none()
    }

    /// Applies this patch to `item`.
    ///
    /// Returns `true` when the item was mutated. `updated_at` is set to `now`
    /// when any value changed or when `touch` is set; a no-op patch leaves
    /// the record byte-identical.
    pub fn apply_to(&self, item: &mut RadarItem, now: DateTime<Utc>) -> bool {
        let mut changed = false;

        changed |= assign(&mut item.title, self.title.as_ref());
        changed |= assign(&mut item.source, self.source.as_ref());
        changed |= assign(&mut item.url, self.url.as_ref());
        changed |= assign(&mut item.lane, self.lane.as_ref());
        changed |= assign(&mut item.kind, self.kind.as_ref());
        changed |= assign(&mut item.impact, self.impact.as_ref());
        changed |= assign(&mut item.urgency, self.urgency.as_ref());
        changed |= assign(&mut item.toc_axis, self.toc_axis.as_ref());
        changed |= assign(&mut item.status, self.status.as_ref());
        if let Some(score) = self.score {
            let score = clamp_score(score);
            if item.score != score {
                item.score = score;
                changed = true;
            }
        }

        if changed || self.touch {
            item.updated_at = now;
            return true;
        }
        false
    }
}

fn assign<T: Clone + PartialEq>(slot: &mut T, value: Option<&T>) -> bool {
    match value {
        Some(value) if slot != value => {
            *slot = value.clone();
            true
        }
        _ => false,
    }
}

/// Clamps a score into `[0, 100]`; non-finite values collapse to `0`.
pub fn clamp_score(score: f64) -> f64 {
    if !score.is_finite() {
        return SCORE_MIN;
    }
    score.clamp(SCORE_MIN, SCORE_MAX)
}
