//! # Newsdesk Guard
//!
//! In-memory request throttling and abuse screening.
//!
//! - [`rate_limit`]: sliding-window [`RateLimiter`] keyed by IP or IP + user
//! - [`signatures`]: SQL-injection, XSS and scanner user-agent detection
//! - [`suspicious`]: per-IP history of flagged requests and the blocked set
//!
//! All state is process-local and rebuilt from nothing after a restart.

pub mod rate_limit;
pub mod signatures;
pub mod suspicious;

pub use rate_limit::{RateLimitStatus, RateLimited, RateLimiter};
pub use signatures::{Finding, Location, ThreatKind, scan_request};
pub use suspicious::{BlockedIp, SuspiciousActivityTracker};
