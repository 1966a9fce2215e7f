//! URL sanitization and comparison keys.

use crate::model::radar_item::{RadarValidationError, MAX_URL_CHARS};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Exact query parameter names treated as tracking noise (besides `utm_*`).
const TRACKING_QUERY_KEYS: &[&str] = &[
    "fbclid", "gclid", "igshid", "mc_cid", "mc_eid", "mkt_tok", "ref", "ref_src", "si", "spm",
    "wt_mc",
];

static SCHEME_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z][a-z\d+.-]*://").expect("valid scheme regex"));
static REPEATED_SLASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/{2,}").expect("valid slash regex"));
static INDEX_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/index\.(html?|php)$").expect("valid index regex"));
static HOST_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(www|m|mobile|amp)\.").expect("valid host prefix regex"));

/// Sanitizes user-supplied URL input into the stored form.
///
/// Prepends `https://` when no scheme is present, rejects anything but
/// http/https, strips fragment and tracking params, sorts the remaining
/// query params by name and normalizes the path.
///
/// # Errors
/// - `MissingField("url")` for blank input.
/// - `FieldTooLong` above 2048 chars.
/// - `InvalidUrl` when parsing fails or the scheme is not http/https.
pub fn sanitize_url(raw: &str) -> Result<String, RadarValidationError> {
    let candidate = raw.trim();
    if candidate.is_empty() {
        return Err(RadarValidationError::MissingField("url"));
    }
    if candidate.chars().count() > MAX_URL_CHARS {
        return Err(RadarValidationError::FieldTooLong {
            field: "url",
            max: MAX_URL_CHARS,
        });
    }

    let with_scheme = if SCHEME_PREFIX_RE.is_match(candidate) {
        candidate.to_string()
    } else {
        format!("https://{candidate}")
    };

    let mut parsed = Url::parse(&with_scheme)
        .map_err(|_| RadarValidationError::InvalidUrl(candidate.to_string()))?;
    if !is_http_like(&parsed) {
        return Err(RadarValidationError::InvalidUrl(candidate.to_string()));
    }

    strip_tracking_params(&mut parsed);
    let path = normalize_path(parsed.path());
    parsed.set_path(&path);

    Ok(parsed.to_string())
}

/// Comparison key for URL-based deduplication.
///
/// Shape: `host[:port]path[?query]`, lower-cased, with tracking params
/// removed, host prefixes (`www.`, `m.`, `mobile.`, `amp.`) stripped and
/// default ports dropped. Returns an empty string for empty input.
pub fn url_key(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let Ok(mut parsed) = Url::parse(trimmed) else {
        let lowered = trimmed.to_lowercase();
        return lowered
            .strip_suffix('/')
            .map(str::to_string)
            .unwrap_or(lowered);
    };

    strip_tracking_params(&mut parsed);

    let host = normalize_host(parsed.host_str().unwrap_or_default());
    // `Url::port` already reports `None` for the scheme default.
    let port = parsed.port().map(|p| format!(":{p}")).unwrap_or_default();
    let path = normalize_path(parsed.path());
    let query = parsed.query().map(|q| format!("?{q}")).unwrap_or_default();
    let base = format!("{host}{port}{path}{query}");

    if is_http_like(&parsed) {
        base.to_lowercase()
    } else {
        format!("{}://{base}", parsed.scheme()).to_lowercase()
    }
}

/// Normalized host of `url`, or an empty string when it does not parse.
pub fn domain_key(url: &str) -> String {
    Url::parse(url.trim())
        .ok()
        .and_then(|parsed| parsed.host_str().map(normalize_host))
        .unwrap_or_default()
}

/// Lower-cases a host and strips leading mobile/AMP/www labels repeatedly.
pub fn normalize_host(host: &str) -> String {
    let mut normalized = host.to_lowercase();
    while let Some(found) = HOST_PREFIX_RE.find(&normalized) {
        normalized = normalized[found.end()..].to_string();
    }
    normalized
}

/// Collapses `//`, strips a trailing index document, drops trailing slashes
/// except for the root path.
pub(crate) fn normalize_path(path: &str) -> String {
    let collapsed = REPEATED_SLASH_RE.replace_all(path, "/");
    let without_index = INDEX_SUFFIX_RE.replace(&collapsed, "/");

    if without_index.len() > 1 {
        let trimmed = without_index.trim_end_matches('/');
        if trimmed.is_empty() {
            return "/".to_string();
        }
        return trimmed.to_string();
    }

    without_index.into_owned()
}

fn strip_tracking_params(parsed: &mut Url) {
    parsed.set_fragment(None);
    if parsed.query().is_none() {
        return;
    }

    let mut kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    // Stable: repeated keys keep their relative order.
    kept.sort_by(|a, b| a.0.cmp(&b.0));

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }
}

fn is_tracking_param(name: &str) -> bool {
    let lowered = name.to_lowercase();
    lowered.starts_with("utm_") || TRACKING_QUERY_KEYS.contains(&lowered.as_str())
}

fn is_http_like(parsed: &Url) -> bool {
    matches!(parsed.scheme(), "http" | "https")
}

#[cfg(test)]
mod tests {
    use super::{domain_key, normalize_host, normalize_path, url_key};

    #[test]
    fn normalize_host_strips_stacked_prefixes() {
        assert_eq!(normalize_host("WWW.m.Example.com"), "example.com");
        assert_eq!(normalize_host("amp.srf.ch"), "srf.ch");
        assert_eq!(normalize_host("mail.example.com"), "mail.example.com");
    }

    #[test]
    fn normalize_path_handles_index_and_slashes() {
        assert_eq!(normalize_path("/a//b/index.HTML"), "/a/b");
        assert_eq!(normalize_path("/index.php"), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/news/"), "/news");
    }

    #[test]
    fn url_key_drops_default_port_but_keeps_custom_port() {
        assert_eq!(url_key("https://example.com:443/a"), "example.com/a");
        assert_eq!(url_key("http://example.com:8080/a/"), "example.com:8080/a");
    }

    #[test]
    fn url_key_falls_back_for_unparseable_input() {
        assert_eq!(url_key("  Not A Url/ "), "not a url");
        assert_eq!(url_key(""), "");
    }

    #[test]
    fn domain_key_is_empty_for_garbage() {
        assert_eq!(domain_key("https://m.blick.ch/politik"), "blick.ch");
        assert_eq!(domain_key("blick"), "");
    }
}
