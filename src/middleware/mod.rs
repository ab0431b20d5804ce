//! Middleware and extractors in front of the business handlers.
//!
//! # Modules
//!
//! - [`security`]: blocked-IP rejection and attack-signature screening
//! - [`rate_limit`]: per-IP limiting for public routes
//! - [`auth`]: the authorization gate as axum middleware, plus the
//!   [`AuthUser`](crate::gate::AuthUser) extractor and permission extractors
//!
//! # Layering
//!
//! ```text
//! request → security::screen_request → auth::authenticate → RequireX extractor → handler
//! ```
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::RequireSettingsUpdate;
//!
//! async fn update_role(
//!     RequireSettingsUpdate(auth_user): RequireSettingsUpdate,
//! ) -> impl IntoResponse {
//!     // Only executes if the caller holds "settings.update"
//! }
//! ```

pub mod auth;
pub mod rate_limit;
pub mod security;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use newsdesk_guard::RateLimitStatus;

const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Adds `X-RateLimit-*` headers; the reset is a unix timestamp in seconds.
pub fn insert_rate_limit_headers(headers: &mut HeaderMap, status: &RateLimitStatus) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(status.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(status.remaining));
    headers.insert(
        X_RATELIMIT_RESET,
        HeaderValue::from(status.reset_at.timestamp().max(0)),
    );
}
