//! Pure ranking, deduplication and view projection over radar items.
//!
//! # Responsibility
//! - Collapse duplicate records for display (URL key, then fingerprint).
//! - Project the deduplicated collection into stats, top-N, board and
//!   actionable views.
//!
//! # Invariants
//! - Functions here never touch storage; the caller passes `now` and the
//!   region vocabulary through `RankingContext`.
//! - All sorts are stable, so equal keys keep first-seen order.
//! - Scores are clamped into `[0, 100]` before any comparison.

use crate::canon::fingerprint::item_fingerprint;
use crate::canon::text::fold_diacritics;
use crate::canon::url::url_key;
use crate::clock::age_days;
use crate::config::RankingConfig;
use crate::model::radar_item::{clamp_score, Lane, Level, RadarItem, RadarStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

pub const TOP_DEFAULT_LIMIT: usize = 3;
pub const TOP_MAX_LIMIT: usize = 20;
pub const BOARD_DEFAULT_LIMIT: usize = 200;
pub const BOARD_MAX_LIMIT: usize = 500;
pub const ACTIONABLE_DEFAULT_LIMIT: usize = 120;
pub const ACTIONABLE_MAX_LIMIT: usize = 300;

const HIGH_SCORE_THRESHOLD: f64 = 80.0;
const ACTIONABLE_MIN_SCORE: f64 = 70.0;
const FRESHNESS_WEIGHT: f64 = 6.0;
const REGION_WEIGHT: f64 = 3.0;
const POLITIK_BONUS: f64 = 6.0;

/// Requested projection of the radar collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    Stats,
    Top,
    Board,
    /// Default view: new items worth acting on.
    #[default]
    Actionable,
}

impl ViewMode {
    /// Parses a query `mode`; anything unrecognized selects `Actionable`.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|raw| raw.trim().to_ascii_lowercase()).as_deref() {
            Some("stats") => Self::Stats,
            Some("top") => Self::Top,
            Some("board") => Self::Board,
            _ => Self::Actionable,
        }
    }

    fn limits(self) -> (usize, usize) {
        match self {
            Self::Top => (TOP_DEFAULT_LIMIT, TOP_MAX_LIMIT),
            Self::Board => (BOARD_DEFAULT_LIMIT, BOARD_MAX_LIMIT),
            Self::Stats | Self::Actionable => (ACTIONABLE_DEFAULT_LIMIT, ACTIONABLE_MAX_LIMIT),
        }
    }
}

/// Query surface: mode plus the raw `limit` parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RadarQuery {
    pub mode: ViewMode,
    pub limit: Option<String>,
}

impl RadarQuery {
    pub fn new(mode: ViewMode) -> Self {
        Self { mode, limit: None }
    }

    pub fn parse(mode: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            mode: ViewMode::parse(mode),
            limit: limit.map(str::to_string),
        }
    }

    pub fn with_limit(mut self, limit: impl Into<String>) -> Self {
        self.limit = Some(limit.into());
        self
    }
}

/// Counters of the stats view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarStats {
    pub total: usize,
    pub accepted: usize,
    pub watchlist: usize,
    pub rejected: usize,
    /// Items with status `new`.
    pub fresh: usize,
    pub high_score: usize,
    pub lane_politik: usize,
    pub lane_medien: usize,
    pub lane_buch: usize,
}

/// Result of a radar query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RadarView {
    Stats(RadarStats),
    Items(Vec<RadarItem>),
}

/// Inputs of the time- and region-dependent ranking terms.
#[derive(Debug, Clone, Copy)]
pub struct RankingContext<'a> {
    pub now: DateTime<Utc>,
    pub config: &'a RankingConfig,
}

impl<'a> RankingContext<'a> {
    pub fn new(now: DateTime<Utc>, config: &'a RankingConfig) -> Self {
        Self { now, config }
    }
}

/// Orders two duplicate candidates: `Greater` means `incoming` should win.
///
/// Higher status dedupe rank, then higher clamped score, then newer
/// `updated_at`. Full ties are `Equal` and keep the current record.
pub fn compare_duplicates(current: &RadarItem, incoming: &RadarItem) -> Ordering {
    incoming
        .status
        .dedupe_rank()
        .cmp(&current.status.dedupe_rank())
        .then_with(|| clamp_score(incoming.score).total_cmp(&clamp_score(current.score)))
        .then_with(|| incoming.updated_at.cmp(&current.updated_at))
}

pub fn prefer_incoming(current: &RadarItem, incoming: &RadarItem) -> bool {
    compare_duplicates(current, incoming) == Ordering::Greater
}

/// Collapses duplicates by URL key, then by content fingerprint.
///
/// Records without a key fall back to `id:<id>` and never collapse. The
/// survivor of each group keeps the position of the group's first record.
pub fn dedupe_radar(items: Vec<RadarItem>) -> Vec<RadarItem> {
    let by_url = collapse_by(items, |item| {
        let key = url_key(&item.url);
        if key.is_empty() {
            format!("id:{}", item.id)
        } else {
            key
        }
    });
    collapse_by(by_url, |item| {
        item_fingerprint(item).unwrap_or_else(|| format!("id:{}", item.id))
    })
}

fn collapse_by(items: Vec<RadarItem>, key_of: impl Fn(&RadarItem) -> String) -> Vec<RadarItem> {
    let mut survivors: Vec<RadarItem> = Vec::with_capacity(items.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(items.len());

    for item in items {
        let key = key_of(&item);
        match positions.get(&key) {
            Some(&position) => {
                if prefer_incoming(&survivors[position], &item) {
                    survivors[position] = item;
                }
            }
            None => {
                positions.insert(key, survivors.len());
                survivors.push(item);
            }
        }
    }

    survivors
}

pub fn compute_stats(items: &[RadarItem]) -> RadarStats {
    let mut stats = RadarStats {
        total: items.len(),
        ..RadarStats::default()
    };

    for item in items {
        match item.status {
            RadarStatus::Accepted => stats.accepted += 1,
            RadarStatus::Watchlist => stats.watchlist += 1,
            RadarStatus::Rejected => stats.rejected += 1,
            RadarStatus::New => stats.fresh += 1,
            RadarStatus::Unknown => {}
        }
        match item.lane {
            Lane::Politik => stats.lane_politik += 1,
            Lane::Medienarbeit => stats.lane_medien += 1,
            Lane::Buchprojekt => stats.lane_buch += 1,
        }
        if clamp_score(item.score) >= HIGH_SCORE_THRESHOLD {
            stats.high_score += 1;
        }
    }

    stats
}

/// Freshness tier from `updated_at` age: <=2d 3, <=7d 2, <=21d 1, else 0.
pub fn freshness_tier(updated_at: DateTime<Utc>, now: DateTime<Utc>) -> u8 {
    let age = age_days(now, updated_at);
    if age <= 2.0 {
        3
    } else if age <= 7.0 {
        2
    } else if age <= 21.0 {
        1
    } else {
        0
    }
}

/// Region tier from folded `title source url`: Swiss 3, DACH 2, else 1.
pub fn region_tier(item: &RadarItem, config: &RankingConfig) -> u8 {
    let text = fold_diacritics(&format!("{} {} {}", item.title, item.source, item.url));
    let contains_any = |terms: &[String]| terms.iter().any(|term| text.contains(term.as_str()));

    if contains_any(&config.swiss_terms) {
        3
    } else if contains_any(&config.dach_terms) {
        2
    } else {
        1
    }
}

fn urgency_weight(level: Level) -> f64 {
    match level {
        Level::High => 15.0,
        Level::Med => 8.0,
        Level::Low => 2.0,
    }
}

fn impact_weight(level: Level) -> f64 {
    match level {
        Level::High => 9.0,
        Level::Med => 4.0,
        Level::Low => 0.0,
    }
}

/// Sort keys computed once per item.
#[derive(Debug, Clone, Copy)]
struct TriageKey {
    urgency: u8,
    impact: u8,
    freshness: u8,
    region: u8,
    score: f64,
    updated_at: DateTime<Utc>,
}

impl TriageKey {
    fn of(item: &RadarItem, ctx: &RankingContext<'_>) -> Self {
        Self {
            urgency: item.urgency.ordinal(),
            impact: item.impact.ordinal(),
            freshness: freshness_tier(item.updated_at, ctx.now),
            region: region_tier(item, ctx.config),
            score: clamp_score(item.score),
            updated_at: item.updated_at,
        }
    }

    /// Urgency, impact, freshness, region, score, `updated_at`; all descending.
    fn cmp_desc(&self, other: &Self) -> Ordering {
        other
            .urgency
            .cmp(&self.urgency)
            .then_with(|| other.impact.cmp(&self.impact))
            .then_with(|| other.freshness.cmp(&self.freshness))
            .then_with(|| other.region.cmp(&self.region))
            .then_with(|| other.score.total_cmp(&self.score))
            .then_with(|| other.updated_at.cmp(&self.updated_at))
    }
}

/// Composite rank used by the top view.
pub fn top_rank(item: &RadarItem, ctx: &RankingContext<'_>) -> f64 {
    let politik = if item.lane == Lane::Politik {
        POLITIK_BONUS
    } else {
        0.0
    };

    clamp_score(item.score)
        + urgency_weight(item.urgency)
        + impact_weight(item.impact)
        + f64::from(freshness_tier(item.updated_at, ctx.now)) * FRESHNESS_WEIGHT
        + f64::from(region_tier(item, ctx.config)) * REGION_WEIGHT
        + politik
}

/// Highest-ranked `new`/`watchlist` items.
pub fn top_view(items: &[RadarItem], ctx: &RankingContext<'_>, limit: usize) -> Vec<RadarItem> {
    let mut ranked = items
        .iter()
        .filter(|item| matches!(item.status, RadarStatus::New | RadarStatus::Watchlist))
        .map(|item| (top_rank(item, ctx), TriageKey::of(item, ctx), item))
        .collect::<Vec<_>>();

    ranked.sort_by(|(rank_a, key_a, _), (rank_b, key_b, _)| {
        rank_b.total_cmp(rank_a).then_with(|| key_a.cmp_desc(key_b))
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|(_, _, item)| item.clone())
        .collect()
}

/// Every item, grouped by status (new, watchlist, accepted, rejected).
pub fn board_view(items: &[RadarItem], ctx: &RankingContext<'_>, limit: usize) -> Vec<RadarItem> {
    let mut keyed = items
        .iter()
        .map(|item| (item.status.board_priority(), TriageKey::of(item, ctx), item))
        .collect::<Vec<_>>();

    keyed.sort_by(|(status_a, key_a, _), (status_b, key_b, _)| {
        status_a.cmp(status_b).then_with(|| key_a.cmp_desc(key_b))
    });

    keyed
        .into_iter()
        .take(limit)
        .map(|(_, _, item)| item.clone())
        .collect()
}

/// `new` items in lane `politik` or with score >= 70.
pub fn actionable_view(
    items: &[RadarItem],
    ctx: &RankingContext<'_>,
    limit: usize,
) -> Vec<RadarItem> {
    let mut keyed = items
        .iter()
        .filter(|item| item.status == RadarStatus::New)
        .filter(|item| item.lane == Lane::Politik || item.score >= ACTIONABLE_MIN_SCORE)
        .map(|item| (TriageKey::of(item, ctx), item))
        .collect::<Vec<_>>();

    keyed.sort_by(|(key_a, _), (key_b, _)| key_a.cmp_desc(key_b));

    keyed
        .into_iter()
        .take(limit)
        .map(|(_, item)| item.clone())
        .collect()
}

/// Parses a `limit` query value.
///
/// Absent, empty, non-numeric or non-finite values yield `fallback`;
/// everything else is truncated and clamped into `[1, max]`.
pub fn parse_limit(value: Option<&str>, fallback: usize, max: usize) -> usize {
    let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return fallback;
    };
    let Ok(parsed) = raw.parse::<f64>() else {
        return fallback;
    };
    if !parsed.is_finite() {
        return fallback;
    }

    let truncated = parsed.trunc();
    if truncated < 1.0 {
        1
    } else if truncated >= max as f64 {
        max
    } else {
        truncated as usize
    }
}

/// Deduplicates the raw collection and projects the requested view.
pub fn build_view(items: Vec<RadarItem>, query: &RadarQuery, ctx: &RankingContext<'_>) -> RadarView {
    let rows = dedupe_radar(items);
    let (fallback, max) = query.mode.limits();
    let limit = parse_limit(query.limit.as_deref(), fallback, max);

    match query.mode {
        ViewMode::Stats => RadarView::Stats(compute_stats(&rows)),
        ViewMode::Top => RadarView::Items(top_view(&rows, ctx, limit)),
        ViewMode::Board => RadarView::Items(board_view(&rows, ctx, limit)),
        ViewMode::Actionable => RadarView::Items(actionable_view(&rows, ctx, limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::{freshness_tier, parse_limit, region_tier, ViewMode};
    use crate::config::RankingConfig;
    use crate::model::radar_item::RadarItem;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn view_mode_defaults_to_actionable() {
        assert_eq!(ViewMode::parse(None), ViewMode::Actionable);
        assert_eq!(ViewMode::parse(Some("default")), ViewMode::Actionable);
        assert_eq!(ViewMode::parse(Some(" TOP ")), ViewMode::Top);
        assert_eq!(ViewMode::parse(Some("stats")), ViewMode::Stats);
    }

    #[test]
    fn parse_limit_falls_back_and_clamps() {
        assert_eq!(parse_limit(None, 3, 20), 3);
        assert_eq!(parse_limit(Some(""), 3, 20), 3);
        assert_eq!(parse_limit(Some("abc"), 3, 20), 3);
        assert_eq!(parse_limit(Some("inf"), 3, 20), 3);
        assert_eq!(parse_limit(Some("NaN"), 3, 20), 3);
        assert_eq!(parse_limit(Some("7.9"), 3, 20), 7);
        assert_eq!(parse_limit(Some("0"), 3, 20), 1);
        assert_eq!(parse_limit(Some("-5"), 3, 20), 1);
        assert_eq!(parse_limit(Some("999"), 3, 20), 20);
    }

    #[test]
    fn freshness_tiers_follow_age_boundaries() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(freshness_tier(now - Duration::days(2), now), 3);
        assert_eq!(freshness_tier(now - Duration::days(3), now), 2);
        assert_eq!(freshness_tier(now - Duration::days(21), now), 1);
        assert_eq!(freshness_tier(now - Duration::days(22), now), 0);
    }

    #[test]
    fn region_tier_matches_folded_terms() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut item = RadarItem {
            id: "radar_a".to_string(),
            title: "Debatte in Zürich".to_string(),
            source: "Blick".to_string(),
            url: "https://example.com/a".to_string(),
            lane: Default::default(),
            kind: Default::default(),
            score: 50.0,
            impact: Default::default(),
            urgency: Default::default(),
            toc_axis: None,
            status: Default::default(),
            created_at: at,
            updated_at: at,
        };
        let config = RankingConfig::default();
        assert_eq!(region_tier(&item, &config), 3);

        item.title = "Debatte in Österreich".to_string();
        assert_eq!(region_tier(&item, &config), 2);

        item.title = "Debatte in Paris".to_string();
        assert_eq!(region_tier(&item, &config), 1);
    }
}
