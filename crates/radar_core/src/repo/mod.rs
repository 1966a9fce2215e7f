//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the radar storage contract consumed by services and sync.
//! - Isolate SQLite and JSON-file details from ranking and merge logic.
//!
//! # Invariants
//! - Repository writes enforce `RadarItem::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to
//!   transport errors.

pub mod json_store;
pub mod radar_repo;
