//! Content fingerprint for URL-independent deduplication.
//!
//! Lane is not part of the fingerprint: the same story can be re-tagged
//! across lanes and must still collapse to one record.

use super::text::normalize_text;
use super::url::domain_key;
use crate::model::radar_item::RadarItem;

const LONG_TITLE_MIN_CHARS: usize = 12;
const SHORT_TITLE_MIN_CHARS: usize = 6;
const SHORT_TITLE_MIN_SOURCE_CHARS: usize = 4;

/// Builds `title|source|domain` from normalized parts.
///
/// Long titles (>= 12 chars) always fingerprint. Short titles (>= 6 chars)
/// fingerprint only with a source of >= 4 chars and a known domain. Anything
/// shorter returns `None` and is deduplicated by URL only.
pub fn fingerprint(title: &str, source: &str, url: &str) -> Option<String> {
    let title = normalize_text(title);
    let source = normalize_text(source);
    let domain = domain_key(url);
    let title_len = title.chars().count();

    let long_enough = title_len >= LONG_TITLE_MIN_CHARS;
    let short_but_anchored = title_len >= SHORT_TITLE_MIN_CHARS
        && source.chars().count() >= SHORT_TITLE_MIN_SOURCE_CHARS
        && !domain.is_empty();

    if long_enough || short_but_anchored {
        Some(format!("{title}|{source}|{domain}"))
    } else {
        None
    }
}

pub fn item_fingerprint(item: &RadarItem) -> Option<String> {
    fingerprint(&item.title, &item.source, &item.url)
}
