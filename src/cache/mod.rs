//! Cache Module
//!
//! Fixed-capacity in-memory response cache with per-slot readers–writers
//! locking and LRU-on-insert eviction.

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::{promoted_rank, VictimScan};
pub use stats::{CacheStats, StatCounters};
pub use store::{CacheStore, SlotHandle, SlotInfo};

// == Public Constants ==
/// Default total cache budget in bytes
pub const DEFAULT_MAX_CACHE_SIZE: usize = 1_049_000;

/// Default largest cacheable response in bytes
pub const DEFAULT_MAX_OBJECT_SIZE: usize = 102_400; // 100 KiB

/// Maximum cache key length, also the longest request line the proxy reads
pub const MAX_URI_LENGTH: usize = 8192;
