//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Proxy Error Enum ==
/// Unified error type for the proxy and its cache.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Socket read/write failure on either side of the relay
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The origin server could not be reached
    #[error("Failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Body exceeds the per-object ceiling
    #[error("Object of {size} bytes exceeds the {limit} byte ceiling")]
    ObjectTooLarge { size: usize, limit: usize },

    /// Cache key exceeds the maximum URI length
    #[error("URI of {len} bytes exceeds the {limit} byte limit")]
    UriTooLong { len: usize, limit: usize },

    /// Startup configuration is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;
