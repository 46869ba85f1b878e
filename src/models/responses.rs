//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheStats, SlotInfo};

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of bodies stored
    pub inserts: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Current number of allocated slots
    pub total_entries: usize,
    /// Fixed number of slots
    pub capacity: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            inserts: stats.inserts,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
            capacity: stats.capacity,
        }
    }
}

/// One cached object in the listing endpoint (GET /cache)
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    /// Slot the object lives in
    pub slot: usize,
    /// Request URI it is keyed by
    pub uri: String,
    /// Body size in bytes
    pub size: usize,
    /// LRU rank, higher = more recently written
    pub recency: i64,
}

impl From<SlotInfo> for EntryResponse {
    fn from(slot: SlotInfo) -> Self {
        Self {
            slot: slot.index,
            uri: slot.uri,
            size: slot.size,
            recency: slot.recency,
        }
    }
}

/// Response body for the listing endpoint (GET /cache)
#[derive(Debug, Clone, Serialize)]
pub struct EntriesResponse {
    pub entries: Vec<EntryResponse>,
}

impl EntriesResponse {
    /// Keeps only allocated slots, most recent first
    pub fn from_slots(slots: Vec<SlotInfo>) -> Self {
        let mut entries: Vec<EntryResponse> = slots
            .into_iter()
            .filter(|slot| slot.allocated)
            .map(EntryResponse::from)
            .collect();
        entries.sort_by(|a, b| b.recency.cmp(&a.recency));
        Self { entries }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
