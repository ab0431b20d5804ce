//! JWT (JSON Web Token) utilities for authentication.
//!
//! Tokens are HS256-signed with the shared secret from [`JwtConfig`] and
//! validated with zero leeway, so a token is rejected as soon as its `exp`
//! has passed.
//!
//! # Example
//!
//! ```ignore
//! use newsdesk_auth::{create_access_token, verify_token};
//! use newsdesk_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "editor@example.com", "editor", &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use newsdesk_config::JwtConfig;
use newsdesk_core::{AppError, ErrorCode};
use uuid::Uuid;

use crate::claims::Claims;

/// Why a bearer credential was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("No token provided")]
    NoToken,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,
}

impl TokenError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TokenError::NoToken => ErrorCode::NoToken,
            TokenError::Expired => ErrorCode::TokenExpired,
            TokenError::Invalid => ErrorCode::TokenInvalid,
        }
    }

    /// The 401 rejection for this failure.
    pub fn to_app_error(&self) -> AppError {
        AppError::unauthorized(self.code(), self.to_string())
    }
}

/// Creates an access token for the user, issued now.
///
/// # Errors
///
/// Returns an internal error if token encoding fails.
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    role: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    create_access_token_at(user_id, email, role, Utc::now(), jwt_config)
}

/// Creates an access token as if issued at `issued_at`.
///
/// The expiry is `issued_at + access_token_expiry`.
pub fn create_access_token_at(
    user_id: Uuid,
    email: &str,
    role: &str,
    issued_at: DateTime<Utc>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let iat = issued_at.timestamp().max(0);
    let exp = (iat + jwt_config.access_token_expiry).max(0);

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        exp: exp as usize,
        iat: iat as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(AppError::internal)
}

/// Verifies signature and expiry and returns the embedded claims.
///
/// # Errors
///
/// - [`TokenError::NoToken`] if the token is empty
/// - [`TokenError::Expired`] if the signature is valid but `exp` has passed
/// - [`TokenError::Invalid`] for any other decoding or signature failure
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, TokenError> {
    if token.trim().is_empty() {
        return Err(TokenError::NoToken);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })
}
