//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;

use crate::cache::{DEFAULT_MAX_CACHE_SIZE, DEFAULT_MAX_OBJECT_SIZE};
use crate::error::{ProxyError, Result};

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the proxy listens on for client connections
    pub proxy_port: u16,
    /// Port of the read-only admin API, 0 = disabled
    pub admin_port: u16,
    /// Total cache budget in bytes
    pub max_cache_size: usize,
    /// Largest response body that may be cached, in bytes
    pub max_object_size: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PROXY_PORT` - Proxy listening port (default: 8080)
    /// - `ADMIN_PORT` - Admin API port, 0 disables it (default: 8081)
    /// - `MAX_CACHE_SIZE` - Total cache budget in bytes (default: 1049000)
    /// - `MAX_OBJECT_SIZE` - Per-object ceiling in bytes (default: 102400)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            proxy_port: env_or("PROXY_PORT", defaults.proxy_port),
            admin_port: env_or("ADMIN_PORT", defaults.admin_port),
            max_cache_size: env_or("MAX_CACHE_SIZE", defaults.max_cache_size),
            max_object_size: env_or("MAX_OBJECT_SIZE", defaults.max_object_size),
        }
    }

    /// Overrides the proxy port with the first positional CLI argument, if any.
    pub fn with_args<I>(mut self, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        if let Some(port) = args.into_iter().next() {
            self.proxy_port = port
                .parse()
                .map_err(|_| ProxyError::InvalidConfig(format!("invalid port '{}'", port)))?;
        }
        Ok(self)
    }

    /// Number of cache slots: `floor(max_cache_size / max_object_size)`.
    pub fn cache_capacity(&self) -> usize {
        if self.max_object_size == 0 {
            0
        } else {
            self.max_cache_size / self.max_object_size
        }
    }

    /// Rejects settings that would leave the cache without a single slot.
    pub fn validate(&self) -> Result<()> {
        if self.max_object_size == 0 {
            return Err(ProxyError::InvalidConfig(
                "MAX_OBJECT_SIZE must be greater than zero".to_string(),
            ));
        }
        if self.cache_capacity() == 0 {
            return Err(ProxyError::InvalidConfig(format!(
                "MAX_CACHE_SIZE ({}) must hold at least one object of {} bytes",
                self.max_cache_size, self.max_object_size
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_port: 8080,
            admin_port: 8081,
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            max_object_size: DEFAULT_MAX_OBJECT_SIZE,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
