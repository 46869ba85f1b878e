//! Caching Proxy - A forwarding HTTP proxy with an in-memory response cache
//!
//! Relays one GET request per client connection to the origin server and
//! keeps small responses in a fixed-capacity, concurrency-safe LRU cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;

pub use api::AppState;
pub use cache::CacheStore;
pub use config::Config;
pub use error::{ProxyError, Result};
pub use proxy::{Dispatcher, Outcome, Worker};
