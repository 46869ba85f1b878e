//! Response models for the admin API
//!
//! This module defines the DTOs (Data Transfer Objects) serialised by the
//! read-only admin endpoints.

pub mod responses;

// Re-export commonly used types
pub use responses::{EntriesResponse, EntryResponse, HealthResponse, StatsResponse};
