//! Permission cache configuration.

use std::env;

/// Permission cache configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `PERMISSION_CACHE_TTL_SECONDS`: how long a role's permission list is
///   served before it is fetched again (default: `300`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            ttl_seconds: env::var("PERMISSION_CACHE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(300),
        }
    }

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_seconds.min(i64::MAX as u64) as i64)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 300 }
    }
}
