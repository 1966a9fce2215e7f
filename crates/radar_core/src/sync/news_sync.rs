//! One pass of the news-sync job.
//!
//! # Invariants
//! - The feed is fetched before the store is read; an unavailable feed
//!   leaves the store untouched.
//! - Duplicates of stored items (or of items inserted earlier in the same
//!   run) are skipped, never merged.
//! - The collection is written once, after inserting and pruning.

use crate::canon::text::{collapse_whitespace, normalize_text};
use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::model::radar_item::{
    Kind, Lane, RadarItem, RadarStatus, TocAxis, MAX_SOURCE_CHARS, MAX_TITLE_CHARS,
};
use crate::repo::radar_repo::RadarRepository;
use crate::sync::feed::{FeedEntry, FeedItem, NewsFeed};
use crate::sync::relevance::{assess, feed_age_days, Relevance};
use crate::sync::scoring::{derive_impact, derive_urgency, synthesize_score, FeedbackProfile};
use crate::sync::SyncResult;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;
use url::Url;

const NEWS_ID_PREFIX: &str = "radar_news";
const LOCAL_ITEM_BASE: &str = "https://radar.local/item/";
const FEED_TRACKING_KEYS: &[&str] = &["fbclid", "gclid", "igshid", "mc_cid", "mc_eid"];
const COMPONENT_SAFE_MARKS: &[(&str, &str)] =
    &[("%21", "!"), ("%27", "'"), ("%28", "("), ("%29", ")"), ("%2A", "*")];

/// Counters reported after a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub inserted: usize,
    pub skipped: usize,
    /// Collection size after pruning.
    pub total: usize,
}

/// Runs one sync pass: fetch, filter, score, insert, prune, save.
///
/// # Errors
/// - `SyncError::UpstreamUnavailable` when the feed cannot be fetched.
/// - `SyncError::Store` when the collection cannot be read or saved.
pub fn run_news_sync<R, F>(
    repo: &mut R,
    feed: &F,
    config: &SyncConfig,
    clock: &dyn Clock,
) -> SyncResult<SyncReport>
where
    R: RadarRepository,
    F: NewsFeed + ?Sized,
{
    let started_at = Instant::now();
    info!("event=news_sync module=sync status=start");

    let entries = feed.fetch().map_err(|err| {
        warn!(
            "event=news_sync module=sync status=error error_code=upstream_unavailable duration_ms={}",
            started_at.elapsed().as_millis()
        );
        err
    })?;
    let mut items = repo.list_radar()?;
    let now = clock.now();

    let mut report = SyncReport::default();
    let mut candidates = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            FeedEntry::Item(item) => candidates.push(item),
            FeedEntry::Malformed { reason } => {
                debug!("event=news_sync_skip module=sync reason=malformed detail={reason}");
                report.skipped += 1;
            }
        }
    }
    // Newest first; missing dates sort last.
    candidates.sort_by(|a, b| {
        b.published_at
            .as_deref()
            .unwrap_or_default()
            .cmp(a.published_at.as_deref().unwrap_or_default())
    });

    let mut seen_titles: HashSet<String> =
        items.iter().map(|item| normalize_text(&item.title)).collect();
    let mut seen_urls: HashSet<String> = items
        .iter()
        .map(|item| canonicalize_feed_url(&item.url))
        .collect();
    let profile = FeedbackProfile::from_items(&items);

    for candidate in &candidates {
        if report.inserted >= config.max_inserts_per_run {
            break;
        }

        let relevance = assess(candidate, config, now);
        if relevance != Relevance::Relevant {
            debug!(
                "event=news_sync_skip module=sync reason={}",
                relevance.as_str()
            );
            report.skipped += 1;
            continue;
        }

        let Some(item) = build_news_item(candidate, &profile, now) else {
            report.skipped += 1;
            continue;
        };
        let title_key = normalize_text(&item.title);
        let url_key = canonicalize_feed_url(&item.url);
        if seen_titles.contains(&title_key) || seen_urls.contains(&url_key) {
            debug!("event=news_sync_skip module=sync reason=duplicate");
            report.skipped += 1;
            continue;
        }

        seen_titles.insert(title_key);
        seen_urls.insert(url_key);
        items.push(item);
        report.inserted += 1;
    }

    let kept = prune_radar(items, config);
    report.total = kept.len();
    repo.replace_radar(&kept).map_err(|err| {
        warn!(
            "event=news_sync module=sync status=error error_code=store_failed duration_ms={}",
            started_at.elapsed().as_millis()
        );
        err
    })?;

    info!(
        "event=news_sync module=sync status=ok inserted={} skipped={} total={} duration_ms={}",
        report.inserted,
        report.skipped,
        report.total,
        started_at.elapsed().as_millis()
    );
    Ok(report)
}

/// Builds the stored record for a relevant feed item.
///
/// Returns `None` when the item has no usable title or its URL is not a
/// valid http/https URL.
fn build_news_item(
    candidate: &FeedItem,
    profile: &FeedbackProfile,
    now: DateTime<Utc>,
) -> Option<RadarItem> {
    let title = truncate_chars(&collapse_whitespace(&candidate.title), MAX_TITLE_CHARS);
    if title.is_empty() || normalize_text(&title).is_empty() {
        return None;
    }

    let source_id = if candidate.source_id.trim().is_empty() {
        "source"
    } else {
        candidate.source_id.as_str()
    };
    let age = feed_age_days(candidate.published_at.as_deref(), now);
    let score = synthesize_score(candidate, profile, age);

    let item = RadarItem {
        id: RadarItem::generate_id(NEWS_ID_PREFIX),
        title,
        source: truncate_chars(&format!("News Feed ({source_id})"), MAX_SOURCE_CHARS),
        url: canonicalize_feed_url(&feed_item_url(&candidate.id)),
        lane: Lane::Medienarbeit,
        kind: Kind::News,
        score,
        impact: derive_impact(score),
        urgency: derive_urgency(age),
        toc_axis: Some(TocAxis::Weltbild),
        status: RadarStatus::New,
        created_at: now,
        updated_at: now,
    };
    item.validate().ok().map(|()| item)
}

/// Keeps curated or strong news items, then caps the collection by recency.
///
/// Survivors are `medienarbeit`/`news` items that are accepted or on the
/// watchlist, or score at least `retain_min_score` without being rejected.
/// Above `capacity`, the most recently updated items are kept.
pub fn prune_radar(items: Vec<RadarItem>, config: &SyncConfig) -> Vec<RadarItem> {
    let mut kept = items
        .into_iter()
        .filter(|item| item.lane == Lane::Medienarbeit && item.kind == Kind::News)
        .filter(|item| match item.status {
            RadarStatus::Accepted | RadarStatus::Watchlist => true,
            RadarStatus::Rejected => false,
            RadarStatus::New | RadarStatus::Unknown => item.score >= config.retain_min_score,
        })
        .collect::<Vec<_>>();

    if kept.len() > config.capacity {
        kept.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        kept.truncate(config.capacity);
    }
    kept
}

/// URL of a feed item: its id when it looks like a URL, otherwise a
/// synthetic `radar.local` address with the id as one encoded segment.
pub fn feed_item_url(id: &str) -> String {
    if id.contains("http") {
        return id.to_string();
    }

    let segment = if id.is_empty() { "unknown" } else { id };
    format!("{LOCAL_ITEM_BASE}{}", encode_component(segment))
}

/// URI-component encoding: everything but `A-Za-z0-9-_.~!'()*` is escaped.
fn encode_component(value: &str) -> String {
    COMPONENT_SAFE_MARKS.iter().fold(
        urlencoding::encode(value).into_owned(),
        |encoded, (escaped, mark)| encoded.replace(escaped, mark),
    )
}

/// Lightweight canonical form used for sync-time duplicate checks.
///
/// Drops the fragment and `utm_*`/click-id params and trims trailing
/// slashes. Unparseable input is returned trimmed.
pub fn canonicalize_feed_url(raw: &str) -> String {
    let candidate = raw.trim();
    if candidate.is_empty() {
        return String::new();
    }
    let Ok(mut parsed) = Url::parse(candidate) else {
        return candidate.to_string();
    };

    parsed.set_fragment(None);
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !is_feed_tracking_key(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }

    let trimmed = parsed.path().trim_end_matches('/');
    let path = if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    };
    parsed.set_path(&path);

    parsed.to_string()
}

fn is_feed_tracking_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    lower.starts_with("utm_") || FEED_TRACKING_KEYS.contains(&lower.as_str())
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect::<String>().trim_end().to_string()
}
