//! # Newsdesk Auth
//!
//! Authentication types and JWT utilities for the Newsdesk API.
//!
//! This crate provides:
//!
//! - [`claims`]: the access token claim structure
//! - [`jwt`]: token creation and verification with typed [`TokenError`]s
//! - [`token`]: cookie / header / query token lookup with fixed precedence
//!
//! # Example
//!
//! ```ignore
//! use newsdesk_auth::{select_token, verify_token};
//!
//! let (token, source) = select_token(cookie, authorization, query)
//!     .ok_or(TokenError::NoToken)?;
//! let claims = verify_token(token, &jwt_config)?;
//! ```

pub mod claims;
pub mod jwt;
pub mod token;

// Re-export commonly used types at crate root
pub use claims::Claims;
pub use jwt::{TokenError, create_access_token, create_access_token_at, verify_token};
pub use token::{TokenSource, bearer_from_header, select_token};
