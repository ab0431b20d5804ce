//! # Newsdesk Config
//!
//! Configuration types for the Newsdesk API, loaded from environment variables:
//!
//! - [`jwt`]: token signing secret, lifetime and session cookie
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`rate_limit`]: sliding-window limits for API and auth endpoints
//! - [`security`]: trusted IPs, master API key, screening and lockout settings
//!
//! # Example
//!
//! ```ignore
//! use newsdesk_config::{JwtConfig, CorsConfig, RateLimitConfig, SecurityConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let rate_limit_config = RateLimitConfig::from_env();
//! ```

use std::str::FromStr;

pub mod cors;
pub mod jwt;
pub mod rate_limit;
pub mod security;

// Re-export commonly used types at crate root
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use rate_limit::{RateLimitConfig, WindowLimit};
pub use security::SecurityConfig;

/// Reads and parses an environment variable, falling back to `default`.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
