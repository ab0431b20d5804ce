use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use newsdesk_core::{AppError, ErrorCode};
use tracing::warn;

use crate::context::RequestContext;
use crate::metrics::track_gate_rejection;
use crate::middleware::insert_rate_limit_headers;
use crate::state::AppState;

/// Applies the general API limit to unauthenticated routes, keyed by IP.
///
/// Authenticated routes are limited inside the gate instead, keyed by IP,
/// user and role.
pub async fn api_rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let ctx = RequestContext::from_parts(
        &parts,
        &state.jwt_config().cookie_name,
        state.security_config().trust_proxy,
    );

    if ctx
        .client_ip
        .is_some_and(|ip| state.security_config().is_trusted(&ip))
    {
        return next.run(Request::from_parts(parts, body)).await;
    }

    match state.api_limiter.check(&ctx.ip_key()) {
        Ok(status) => {
            let mut response = next.run(Request::from_parts(parts, body)).await;
            insert_rate_limit_headers(response.headers_mut(), &status);
            response
        }
        Err(limited) => {
            warn!(ip = %ctx.ip_key(), path = %ctx.path, "API rate limit exceeded");
            track_gate_rejection(ErrorCode::RateLimitExceeded.as_str());
            AppError::too_many_requests(ErrorCode::RateLimitExceeded, limited.retry_after_secs)
                .into_response()
        }
    }
}
