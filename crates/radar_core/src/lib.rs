//! Core domain logic for the radar: ingestion, deduplication, ranking and
//! news sync of candidate advocacy signals.
//! This crate is the single source of truth for radar invariants.

pub mod canon;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sync;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, RadarConfig, RankingConfig, SyncConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{
    active_config, init_logging, init_stderr_logging, LogConfig, LogLevel, LogSink, LoggingError,
};
pub use model::radar_item::{
    Kind, Lane, Level, RadarId, RadarItem, RadarPatch, RadarStatus, RadarValidationError, TocAxis,
};
pub use repo::json_store::JsonFileRadarRepository;
pub use repo::radar_repo::{RadarRepository, RepoError, RepoResult, SqliteRadarRepository};
pub use service::ingest::{IngestOutcome, IngestRequest};
pub use service::payload::{IngestPayload, PatchPayload};
pub use service::radar_service::{RadarService, RadarServiceError, RadarServiceResult};
pub use service::ranking::{RadarQuery, RadarStats, RadarView, ViewMode};
pub use sync::feed::{FeedEntry, FeedItem, JsonFileFeed, NewsFeed};
pub use sync::news_sync::{run_news_sync, SyncReport};
pub use sync::{SyncError, SyncResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
