//! Canonicalization helpers for radar deduplication.
//!
//! # Responsibility
//! - Sanitize user-facing text and URLs before persistence.
//! - Derive stable comparison keys (URL key, domain key, fingerprint) so
//!   near-duplicate signals collapse to one record.
//!
//! # Invariants
//! - Comparison keys are pure functions of their input.
//! - Two URLs are duplicates iff their URL keys are byte-equal.

pub mod fingerprint;
pub mod text;
pub mod url;

pub use self::fingerprint::{fingerprint, item_fingerprint};
pub use self::text::{collapse_whitespace, fold_diacritics, normalize_text, sanitize_text};
pub use self::url::{domain_key, normalize_host, sanitize_url, url_key};
