//! Domain model for radar signals.
//!
//! # Responsibility
//! - Define the canonical radar record and its categorical fields.
//! - Define partial-update semantics shared by every storage backend.
//!
//! # Invariants
//! - Every radar item is identified by a stable, immutable `RadarId`.
//! - `score` is always finite and inside `[0, 100]`.

pub mod radar_item;
