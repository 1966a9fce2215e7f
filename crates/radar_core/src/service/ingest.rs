//! Ingestion and duplicate merge.
//!
//! # Responsibility
//! - Sanitize one candidate signal and fill defaults.
//! - Find the best existing duplicate (URL key and content fingerprint).
//! - Merge into the duplicate in place, or create a new record.
//!
//! # Invariants
//! - Validation runs before any repository call; a rejected request leaves
//!   the store untouched.
//! - A merge keeps the duplicate's `id` and `created_at`, never lowers its
//!   score and always refreshes `updated_at`.

use crate::canon::fingerprint::{fingerprint, item_fingerprint};
use crate::canon::text::sanitize_text;
use crate::canon::url::{sanitize_url, url_key};
use crate::model::radar_item::{
    clamp_score, Kind, Lane, Level, RadarItem, RadarPatch, RadarStatus, RadarValidationError,
    TocAxis, DEFAULT_SCORE, MAX_SOURCE_CHARS, MAX_TITLE_CHARS,
};
use crate::repo::radar_repo::{RadarRepository, RepoResult};
use crate::service::ranking::prefer_incoming;
use chrono::{DateTime, Utc};
use serde::Serialize;

const INGEST_ID_PREFIX: &str = "radar";

/// One candidate signal as submitted by a caller.
///
/// `None` means "not supplied". `toc_axis: Some(None)` is an explicit clear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestRequest {
    pub title: String,
    pub source: String,
    pub url: String,
    pub lane: Option<Lane>,
    pub kind: Option<Kind>,
    pub score: Option<f64>,
    pub impact: Option<Level>,
    pub urgency: Option<Level>,
    pub toc_axis: Option<Option<TocAxis>>,
    pub status: Option<RadarStatus>,
}

impl IngestRequest {
    pub fn new(
        title: impl Into<String>,
        source: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Result of an ingestion: a fresh record or a merge into a duplicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "item", rename_all = "lowercase")]
pub enum IngestOutcome {
    Created(RadarItem),
    Merged(RadarItem),
}

impl IngestOutcome {
    pub fn item(&self) -> &RadarItem {
        match self {
            Self::Created(item) | Self::Merged(item) => item,
        }
    }

    pub fn into_item(self) -> RadarItem {
        match self {
            Self::Created(item) | Self::Merged(item) => item,
        }
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged(_))
    }
}

/// Sanitized request with defaults applied.
#[derive(Debug, Clone)]
struct Incoming<'a> {
    request: &'a IngestRequest,
    title: String,
    source: String,
    url: String,
    score: f64,
    impact: Level,
    urgency: Level,
    status: RadarStatus,
}

impl<'a> Incoming<'a> {
    fn sanitize(request: &'a IngestRequest) -> Result<Self, RadarValidationError> {
        let title = sanitize_text(&request.title, "title", MAX_TITLE_CHARS)?;
        let source = sanitize_text(&request.source, "source", MAX_SOURCE_CHARS)?;
        let url = sanitize_url(&request.url)?;
        let score = request
            .score
            .filter(|score| score.is_finite())
            .map(clamp_score)
            .unwrap_or(DEFAULT_SCORE);

        Ok(Self {
            request,
            title,
            source,
            url,
            score,
            impact: request.impact.unwrap_or_default(),
            urgency: request.urgency.unwrap_or_default(),
            status: request.status.unwrap_or_default(),
        })
    }

    fn into_item(self, now: DateTime<Utc>) -> RadarItem {
        RadarItem {
            id: RadarItem::generate_id(INGEST_ID_PREFIX),
            title: self.title,
            source: self.source,
            url: self.url,
            lane: self.request.lane.unwrap_or_default(),
            kind: self.request.kind.unwrap_or_default(),
            score: self.score,
            impact: self.impact,
            urgency: self.urgency,
            toc_axis: self.request.toc_axis.flatten(),
            status: self.status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds the in-place merge of this submission into `duplicate`.
    fn merge_patch(&self, duplicate: &RadarItem) -> RadarPatch {
        let status = match self.request.status {
            None if duplicate.status == RadarStatus::Rejected => RadarStatus::New,
            _ if self.status.dedupe_rank() > duplicate.status.dedupe_rank() => self.status,
            _ => duplicate.status,
        };

        RadarPatch {
            title: Some(self.title.clone()),
            source: Some(self.source.clone()),
            url: Some(self.url.clone()),
            lane: self.request.lane,
            kind: self.request.kind,
            score: Some(clamp_score(duplicate.score).max(self.score)),
            // Only explicitly supplied levels can raise the stored ones.
            impact: Some(raise_level(duplicate.impact, self.request.impact)),
            urgency: Some(raise_level(duplicate.urgency, self.request.urgency)),
            toc_axis: self.request.toc_axis,
            status: Some(status),
            touch: true,
        }
    }
}

fn raise_level(current: Level, supplied: Option<Level>) -> Level {
    supplied.map_or(current, |level| current.max_keep_self(level))
}

/// Ingests one signal against `repo`.
///
/// # Errors
/// - `RepoError::Validation` when title, source or URL are unusable.
/// - `RepoError::NotFound` when the chosen duplicate vanished before the
///   merge was written.
pub fn ingest<R: RadarRepository>(
    repo: &mut R,
    request: &IngestRequest,
    now: DateTime<Utc>,
) -> RepoResult<IngestOutcome> {
    let incoming = Incoming::sanitize(request)?;
    let existing = repo.list_radar()?;

    let duplicate = find_duplicate(
        &existing,
        &url_key(&incoming.url),
        fingerprint(&incoming.title, &incoming.source, &incoming.url).as_deref(),
    );

    match duplicate {
        Some(duplicate) => {
            let patch = incoming.merge_patch(duplicate);
            let merged = repo.patch_radar_item(&duplicate.id, &patch, now)?;
            Ok(IngestOutcome::Merged(merged))
        }
        None => {
            let item = incoming.into_item(now);
            repo.insert_radar_item(&item)?;
            Ok(IngestOutcome::Created(item))
        }
    }
}

/// Picks the record an incoming signal should merge into.
///
/// The best URL match and the best fingerprint match are searched
/// independently; when both exist the duplicate comparator decides.
pub fn find_duplicate<'a>(
    existing: &'a [RadarItem],
    incoming_url_key: &str,
    incoming_fingerprint: Option<&str>,
) -> Option<&'a RadarItem> {
    let by_url = best_match(existing, |item| url_key(&item.url) == incoming_url_key);
    let by_fingerprint = incoming_fingerprint.and_then(|wanted| {
        best_match(existing, |item| {
            item_fingerprint(item).as_deref() == Some(wanted)
        })
    });

    match (by_url, by_fingerprint) {
        (Some(by_url), Some(by_fingerprint)) => {
            if prefer_incoming(by_url, by_fingerprint) {
                Some(by_fingerprint)
            } else {
                Some(by_url)
            }
        }
        (by_url, by_fingerprint) => by_url.or(by_fingerprint),
    }
}

fn best_match<'a>(
    existing: &'a [RadarItem],
    matches: impl Fn(&RadarItem) -> bool,
) -> Option<&'a RadarItem> {
    existing
        .iter()
        .filter(|item| matches(item))
        .fold(None, |best, item| match best {
            Some(best) if !prefer_incoming(best, item) => Some(best),
            _ => Some(item),
        })
}
