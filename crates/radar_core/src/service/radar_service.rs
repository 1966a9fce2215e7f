//! Radar use-case service.
//!
//! # Responsibility
//! - Expose ingest, patch and query entry points over any `RadarRepository`.
//! - Supply `now` from an injected clock and the ranking vocabulary from
//!   configuration.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Query results are always computed over the deduplicated collection.

use crate::clock::{Clock, SystemClock};
use crate::config::RankingConfig;
use crate::model::radar_item::{RadarId, RadarItem, RadarPatch, RadarValidationError};
use crate::repo::radar_repo::{RadarRepository, RepoError};
use crate::service::ingest::{ingest, IngestOutcome, IngestRequest};
use crate::service::payload::{IngestPayload, PatchPayload};
use crate::service::ranking::{build_view, dedupe_radar, RadarQuery, RadarView, RankingContext};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for radar use-cases.
#[derive(Debug)]
pub enum RadarServiceError {
    /// Input rejected; nothing was written.
    Validation(RadarValidationError),
    /// Target item does not exist.
    NotFound(RadarId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for RadarServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "radar item not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RadarServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for RadarServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<RadarValidationError> for RadarServiceError {
    fn from(value: RadarValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type RadarServiceResult<T> = Result<T, RadarServiceError>;

/// Use-case service wrapper for radar operations.
pub struct RadarService<R: RadarRepository> {
    repo: R,
    clock: Box<dyn Clock>,
    ranking: RankingConfig,
}

impl<R: RadarRepository> RadarService<R> {
    /// Creates a service with the system clock and default ranking terms.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, Box::new(SystemClock))
    }

    pub fn with_clock(repo: R, clock: Box<dyn Clock>) -> Self {
        Self {
            repo,
            clock,
            ranking: RankingConfig::default(),
        }
    }

    pub fn with_ranking_config(mut self, ranking: RankingConfig) -> Self {
        self.ranking = ranking;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Ingests one signal, merging into an existing duplicate when found.
    ///
    /// # Errors
    /// - `Validation` when title, source or URL are unusable.
    /// - `NotFound` when the duplicate vanished mid-merge.
    pub fn ingest(&mut self, request: &IngestRequest) -> RadarServiceResult<IngestOutcome> {
        let started_at = Instant::now();
        let now = self.clock.now();

        match ingest(&mut self.repo, request, now) {
            Ok(outcome) => {
                info!(
                    "event=radar_ingest module=service status=ok outcome={} id={} duration_ms={}",
                    if outcome.is_merged() { "merged" } else { "created" },
                    outcome.item().id,
                    started_at.elapsed().as_millis()
                );
                Ok(outcome)
            }
            Err(err) => {
                let err = RadarServiceError::from(err);
                warn!(
                    "event=radar_ingest module=service status=error error_code={} duration_ms={}",
                    error_code(&err),
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    /// Ingests a loosely-typed JSON body.
    pub fn ingest_payload(&mut self, payload: IngestPayload) -> RadarServiceResult<IngestOutcome> {
        self.ingest(&payload.into_request())
    }

    /// Applies a strict field edit to one item.
    ///
    /// A patch that changes nothing returns the stored record unchanged.
    pub fn patch_payload(
        &mut self,
        id: &str,
        payload: PatchPayload,
    ) -> RadarServiceResult<RadarItem> {
        let patch = payload.into_patch().map_err(|err| {
            warn!(
                "event=radar_patch module=service status=error error_code=validation id={id}"
            );
            RadarServiceError::from(err)
        })?;
        self.patch(id, &patch)
    }

    /// Applies a typed patch to one item.
    ///
    /// # Errors
    /// - `Validation(EmptyPatch)` when the patch carries no field.
    /// - `NotFound` for an unknown `id`.
    pub fn patch(&mut self, id: &str, patch: &RadarPatch) -> RadarServiceResult<RadarItem> {
        if patch.is_empty() && !patch.touch {
            return Err(RadarServiceError::Validation(RadarValidationError::EmptyPatch));
        }

        let now = self.clock.now();
        match self.repo.patch_radar_item(id, patch, now) {
            Ok(item) => {
                info!("event=radar_patch module=service status=ok id={id}");
                Ok(item)
            }
            Err(err) => {
                let err = RadarServiceError::from(err);
                warn!(
                    "event=radar_patch module=service status=error error_code={} id={id}",
                    error_code(&err)
                );
                Err(err)
            }
        }
    }

    /// Lists the deduplicated collection in first-seen order.
    pub fn list(&self) -> RadarServiceResult<Vec<RadarItem>> {
        Ok(dedupe_radar(self.repo.list_radar()?))
    }

    /// Projects the requested view over the deduplicated collection.
    pub fn query(&self, query: &RadarQuery) -> RadarServiceResult<RadarView> {
        let rows = self.repo.list_radar()?;
        let ctx = RankingContext::new(self.clock.now(), &self.ranking);
        Ok(build_view(rows, query, &ctx))
    }
}

fn error_code(err: &RadarServiceError) -> &'static str {
    match err {
        RadarServiceError::Validation(_) => "validation",
        RadarServiceError::NotFound(_) => "not_found",
        RadarServiceError::Repo(_) => "store_failed",
    }
}
