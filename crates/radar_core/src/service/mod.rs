//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep ranking and merge rules pure and storage-agnostic.

pub mod ingest;
pub mod payload;
pub mod radar_service;
pub mod ranking;
