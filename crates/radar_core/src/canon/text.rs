//! Text sanitization and normalization.

use crate::model::radar_item::RadarValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static CONTROL_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x1f\x7f]+").expect("valid control-char regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));
static NON_ALNUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("valid non-alnum regex"));

/// Decomposes (NFKD), drops combining diacritics and lower-cases.
///
/// `Zürich` becomes `zurich`, `Österreich` becomes `osterreich`.
pub fn fold_diacritics(value: &str) -> String {
    value
        .nfkd()
        .filter(|c| !is_combining_diacritic(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Normalizes text for fingerprinting.
///
/// Folds diacritics, lower-cases, collapses every run of non-alphanumeric
/// characters into one space and trims.
pub fn normalize_text(value: &str) -> String {
    NON_ALNUM_RE
        .replace_all(&fold_diacritics(value), " ")
        .trim()
        .to_string()
}

/// Collapses whitespace runs to a single space and trims.
pub fn collapse_whitespace(value: &str) -> String {
    WHITESPACE_RE.replace_all(value, " ").trim().to_string()
}

/// Sanitizes a free-text input field.
///
/// Control characters become spaces, whitespace is collapsed, the result is
/// trimmed and must be non-empty and at most `max_chars` characters long.
pub fn sanitize_text(
    raw: &str,
    field: &'static str,
    max_chars: usize,
) -> Result<String, RadarValidationError> {
    let without_controls = CONTROL_CHARS_RE.replace_all(raw, " ");
    let cleaned = collapse_whitespace(&without_controls);

    if cleaned.is_empty() {
        return Err(RadarValidationError::MissingField(field));
    }
    if cleaned.chars().count() > max_chars {
        return Err(RadarValidationError::FieldTooLong {
            field,
            max: max_chars,
        });
    }

    Ok(cleaned)
}

fn is_combining_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}
