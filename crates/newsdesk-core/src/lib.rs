//! # Newsdesk Core
//!
//! Core types, errors, and utilities for the Newsdesk API.
//!
//! - [`errors`]: [`AppError`] and the [`ErrorCode`] rejection taxonomy
//! - [`permissions`]: permission string constants and the super-admin role
//! - [`clock`]: injectable time source used by caches and limiters
//! - [`password`]: bcrypt password hashing and verification
//!
//! # Example
//!
//! ```ignore
//! use newsdesk_core::{AppError, ErrorCode};
//!
//! let error = AppError::unauthorized(ErrorCode::NoToken, "No token provided");
//! ```

pub mod clock;
pub mod errors;
pub mod password;
pub mod permissions;

// Re-export commonly used types at crate root
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{AppError, ErrorCode};
pub use password::{hash_password, verify_password};
