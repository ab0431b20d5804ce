//! Rate limiting configuration for API and authentication endpoints.
//!
//! Both limits are sliding windows: a key may issue at most `limit`
//! requests within any `window_ms` span.
//!
//! # Configuration
//!
//! - `RATE_LIMIT_API_MAX`: requests per window for general endpoints (default: 100)
//! - `RATE_LIMIT_API_WINDOW_MS`: general window length (default: 900000, 15 minutes)
//! - `RATE_LIMIT_AUTH_MAX`: login attempts per window (default: 5)
//! - `RATE_LIMIT_AUTH_WINDOW_MS`: login window length (default: 900000, 15 minutes)
//! - `RATE_LIMIT_CLEANUP_PROBABILITY`: chance per check of sweeping stale keys (default: 0.01)
//!
//! # Example
//!
//! ```ignore
//! use newsdesk_config::RateLimitConfig;
//!
//! let config = RateLimitConfig::from_env();
//! assert_eq!(config.auth.limit, 5);
//! ```

use crate::env_or;

/// A named limit/window pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowLimit {
    /// Maximum requests retained inside one window.
    pub limit: u32,
    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl WindowLimit {
    pub const fn new(limit: u32, window_ms: u64) -> Self {
        Self { limit, window_ms }
    }

    pub fn window_secs(&self) -> u64 {
        self.window_ms.div_ceil(1000)
    }
}

/// Rate limit configuration for the API.
///
/// Auth endpoints get a much stricter budget than general API calls to slow
/// down credential stuffing.
#[derive(Clone, Debug, PartialEq)]
pub struct RateLimitConfig {
    /// Limit for general API calls, keyed by IP or IP + user.
    pub api: WindowLimit,

    /// Limit for authentication attempts, keyed by IP.
    pub auth: WindowLimit,

    /// Probability in `[0, 1]` that a check also sweeps stale keys.
    pub cleanup_probability: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            api: WindowLimit::new(100, 15 * 60 * 1000),
            auth: WindowLimit::new(5, 15 * 60 * 1000),
            cleanup_probability: 0.01,
        }
    }
}

impl RateLimitConfig {
    /// Creates a new `RateLimitConfig` from environment variables.
    ///
    /// Falls back to default values if environment variables are not set
    /// or cannot be parsed.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api: WindowLimit::new(
                env_or("RATE_LIMIT_API_MAX", defaults.api.limit),
                env_or("RATE_LIMIT_API_WINDOW_MS", defaults.api.window_ms),
            ),
            auth: WindowLimit::new(
                env_or("RATE_LIMIT_AUTH_MAX", defaults.auth.limit),
                env_or("RATE_LIMIT_AUTH_WINDOW_MS", defaults.auth.window_ms),
            ),
            cleanup_probability: env_or(
                "RATE_LIMIT_CLEANUP_PROBABILITY",
                defaults.cleanup_probability,
            )
            .clamp(0.0, 1.0),
        }
    }
}
