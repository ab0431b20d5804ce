//! Application error type and machine-readable rejection codes.
//!
//! Every failure in the request pipeline resolves into a single [`AppError`]
//! that carries the HTTP status, a stable [`ErrorCode`] and optional retry /
//! lock metadata. The JSON body rendered by [`IntoResponse`] has the shape:
//!
//! ```text
//! { "success": false, "message": "...", "code": "NO_TOKEN", "retryAfter": 42 }
//! ```
//!
//! The status stored on the error is the only status used for the response.

use std::fmt;

use anyhow::Error;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Machine-readable reason attached to every rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NoToken,
    TokenExpired,
    TokenInvalid,
    UserNotFound,
    AccountInactive,
    AccountLocked,
    InsufficientPermissions,
    IpBlocked,
    RateLimitExceeded,
    LoginRateLimit,
    InvalidCredentials,
    InvalidApiKey,
    ValidationError,
    NotFound,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NoToken => "NO_TOKEN",
            ErrorCode::TokenExpired => "TOKEN_EXPIRED",
            ErrorCode::TokenInvalid => "TOKEN_INVALID",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::AccountInactive => "ACCOUNT_INACTIVE",
            ErrorCode::AccountLocked => "ACCOUNT_LOCKED",
            ErrorCode::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            ErrorCode::IpBlocked => "IP_BLOCKED",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::LoginRateLimit => "LOGIN_RATE_LIMIT",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::InvalidApiKey => "INVALID_API_KEY",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub error: Error,
    /// Seconds until the caller may retry (rate limiting).
    pub retry_after: Option<u64>,
    /// Lock expiry for `ACCOUNT_LOCKED`.
    pub locked_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    message: String,
    code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locked_until: Option<DateTime<Utc>>,
}

impl AppError {
    pub fn new<E>(status: StatusCode, code: ErrorCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            code,
            error: err.into(),
            retry_after: None,
            locked_until: None,
        }
    }

    pub fn unauthorized(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, anyhow::anyhow!(message.into()))
    }

    pub fn forbidden(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, code, anyhow::anyhow!(message.into()))
    }

    pub fn locked(until: DateTime<Utc>) -> Self {
        let mut err = Self::new(
            StatusCode::LOCKED,
            ErrorCode::AccountLocked,
            anyhow::anyhow!("Account is temporarily locked"),
        );
        err.locked_until = Some(until);
        err
    }

    pub fn too_many_requests(code: ErrorCode, retry_after: u64) -> Self {
        let message = match code {
            ErrorCode::LoginRateLimit => "Too many login attempts, please try again later",
            _ => "Too many requests, please try again later",
        };
        let mut err = Self::new(StatusCode::TOO_MANY_REQUESTS, code, anyhow::anyhow!(message));
        err.retry_after = Some(retry_after);
        err
    }

    pub fn insufficient_permissions(permission: &str) -> Self {
        Self::forbidden(
            ErrorCode::InsufficientPermissions,
            format!("Access denied. Missing required permission: {}", permission),
        )
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, err)
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::ValidationError, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, err)
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError, err)
    }

    /// Message exposed to the client. Internal causes are never leaked.
    pub fn public_message(&self) -> String {
        if self.status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.error.to_string()
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status, self.error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = %self.code, error = ?self.error, "Request failed");
        }

        let body = ErrorBody {
            success: false,
            message: self.public_message(),
            code: self.code,
            retry_after: self.retry_after,
            locked_until: self.locked_until,
        };

        let mut response = (self.status, Json(body)).into_response();
        if let Some(retry_after) = self.retry_after {
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}
