use radar_core::canon::{domain_key, fingerprint, normalize_host, sanitize_url, url_key};
use radar_core::RadarValidationError;

#[test]
fn tracking_variants_share_one_url_key() {
    let noisy = sanitize_url("http://www.Example.com/a/b/?utm_source=x&gclid=y#frag").unwrap();
    let clean = sanitize_url("https://example.com/a/b").unwrap();

    assert_eq!(url_key(&noisy), url_key(&clean));
    assert_eq!(url_key(&clean), "example.com/a/b");
}

#[test]
fn sanitize_url_adds_scheme_and_sorts_query() {
    assert_eq!(
        sanitize_url("  nzz.ch/schweiz//tierschutz/index.html?b=2&a=1&fbclid=z ").unwrap(),
        "https://nzz.ch/schweiz/tierschutz?a=1&b=2"
    );
}

#[test]
fn sanitize_url_rejects_unusable_input() {
    assert_eq!(
        sanitize_url("   "),
        Err(RadarValidationError::MissingField("url"))
    );
    assert!(matches!(
        sanitize_url("ftp://example.com/file"),
        Err(RadarValidationError::InvalidUrl(_))
    ));
    assert!(matches!(
        sanitize_url(&format!("https://example.com/{}", "a".repeat(2_100))),
        Err(RadarValidationError::FieldTooLong { field: "url", .. })
    ));
}

#[test]
fn url_key_drops_default_ports_and_mobile_hosts() {
    assert_eq!(
        url_key("https://m.www.srf.ch:443/news/"),
        url_key("http://srf.ch:80/news")
    );
    assert_eq!(url_key("https://srf.ch:8443/news"), "srf.ch:8443/news");
}

#[test]
fn url_key_falls_back_for_unparseable_input() {
    assert_eq!(url_key(" Kein Link/ "), "kein link");
    assert_eq!(url_key(""), "");
}

#[test]
fn host_normalization_strips_repeated_prefixes() {
    assert_eq!(normalize_host("AMP.m.WWW.Blick.ch"), "blick.ch");
    assert_eq!(domain_key("https://mobile.watson.ch/x"), "watson.ch");
    assert_eq!(domain_key("no url"), "");
}

#[test]
fn fingerprints_ignore_case_and_punctuation() {
    let first = fingerprint(
        "Bundesrat lehnt Tierschutz-Initiative ab",
        "NZZ",
        "https://www.nzz.ch/a",
    );
    let second = fingerprint(
        "bundesrat lehnt tierschutz initiative ab",
        "NZZ",
        "https://nzz.ch/b",
    );

    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn short_titles_need_source_and_domain() {
    assert!(fingerprint("Pelz ab", "NZZ", "https://nzz.ch/a").is_none());
    assert!(fingerprint("Pelzverbot", "NZZ", "https://nzz.ch/a").is_none());
    assert!(fingerprint("Pelzverbot", "Blick", "https://blick.ch/a").is_some());
    assert!(fingerprint("Pelzverbot", "Blick", "kein link").is_none());
}
