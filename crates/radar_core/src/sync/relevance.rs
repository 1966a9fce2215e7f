//! Relevance filter for feed items.

use crate::clock::{age_days, parse_timestamp};
use crate::config::SyncConfig;
use crate::sync::feed::FeedItem;
use chrono::{DateTime, Utc};

/// Age assigned to items without a usable `publishedAt`.
pub const UNKNOWN_AGE_DAYS: f64 = 999.0;

/// Verdict of the relevance filter, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relevance {
    Relevant,
    /// Matched a noise term.
    Noise,
    /// No relevant term.
    OffTopic,
    /// No region term.
    OutOfRegion,
    /// External score below the threshold.
    LowConfidence,
    /// Published too long ago, or publication date unknown.
    Stale,
}

impl Relevance {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relevant => "relevant",
            Self::Noise => "noise",
            Self::OffTopic => "off_topic",
            Self::OutOfRegion => "out_of_region",
            Self::LowConfidence => "low_confidence",
            Self::Stale => "stale",
        }
    }
}

/// Fractional days since `published_at`; unknown dates count as 999 days.
pub fn feed_age_days(published_at: Option<&str>, now: DateTime<Utc>) -> f64 {
    published_at
        .and_then(parse_timestamp)
        .map(|published| age_days(now, published))
        .unwrap_or(UNKNOWN_AGE_DAYS)
}

/// Classifies one feed item.
pub fn assess(item: &FeedItem, config: &SyncConfig, now: DateTime<Utc>) -> Relevance {
    let text = format!(
        "{} {} {} {}",
        item.title,
        item.summary,
        item.source_id,
        item.matched_keywords.join(" ")
    )
    .to_lowercase();
    let contains_any = |terms: &[String]| terms.iter().any(|term| text.contains(term.as_str()));

    if contains_any(&config.noise_terms) {
        return Relevance::Noise;
    }
    if !contains_any(&config.relevant_terms) {
        return Relevance::OffTopic;
    }
    if !contains_any(&config.region_terms) {
        return Relevance::OutOfRegion;
    }
    if item.score < config.min_feed_score {
        return Relevance::LowConfidence;
    }
    if feed_age_days(item.published_at.as_deref(), now) > config.max_age_days {
        return Relevance::Stale;
    }
    Relevance::Relevant
}
