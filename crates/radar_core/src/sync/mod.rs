//! Periodic news-sync job.
//!
//! # Responsibility
//! - Pull candidate items from an external news feed.
//! - Filter, score and insert relevant items, then prune the collection.
//!
//! # Invariants
//! - A run either persists one complete pass or nothing at all.
//! - Per-item feed failures are counted as skipped and never abort a run.

pub mod feed;
pub mod news_sync;
pub mod relevance;
pub mod scoring;

use crate::repo::radar_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SyncResult<T> = Result<T, SyncError>;

/// Error that aborts a sync run before anything is persisted.
#[derive(Debug)]
pub enum SyncError {
    /// Feed could not be read or decoded as a whole.
    UpstreamUnavailable { upstream: String, reason: String },
    /// Radar store could not be read or written.
    Store(RepoError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UpstreamUnavailable { upstream, reason } => {
                write!(f, "upstream `{upstream}` unavailable: {reason}")
            }
            Self::Store(err) => write!(f, "radar store unavailable: {err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UpstreamUnavailable { .. } => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<RepoError> for SyncError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}
