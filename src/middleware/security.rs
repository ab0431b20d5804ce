//! Blocked-IP rejection and attack-signature screening.

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use newsdesk_core::{AppError, ErrorCode};
use newsdesk_guard::scan_request;
use tracing::warn;

use crate::context::RequestContext;
use crate::metrics::{track_gate_rejection, track_ip_blocked};
use crate::state::AppState;

fn ip_blocked() -> Response {
    track_gate_rejection(ErrorCode::IpBlocked.as_str());
    AppError::forbidden(ErrorCode::IpBlocked, "Access denied").into_response()
}

/// Rejects blocked IPs and records requests that match attack signatures.
///
/// The body is buffered (up to `max_body_bytes`, 413 beyond that), its first
/// `max_scan_body_bytes` are scanned and it is then handed on unchanged.
/// Trusted IPs bypass screening entirely.
pub async fn screen_request(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let security = state.security_config();
    let (parts, body) = req.into_parts();
    let ctx = RequestContext::from_parts(&parts, &state.jwt_config().cookie_name, security.trust_proxy);

    let Some(ip) = ctx.client_ip else {
        return next.run(Request::from_parts(parts, body)).await;
    };
    if security.is_trusted(&ip) {
        return next.run(Request::from_parts(parts, body)).await;
    }
    if state.suspicious.is_blocked(&ip) {
        warn!(%ip, path = %ctx.path, "request from blocked IP");
        return ip_blocked();
    }

    let bytes = match to_bytes(body, security.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return AppError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorCode::ValidationError,
                anyhow::anyhow!("Request body too large: {e}"),
            )
            .into_response();
        }
    };
    let scanned = &bytes[..bytes.len().min(security.max_scan_body_bytes)];
    let snapshot = (!scanned.is_empty()).then(|| String::from_utf8_lossy(scanned).into_owned());
    let body = Body::from(bytes);
    let ctx = ctx.with_body(snapshot);

    let findings = scan_request(
        &ctx.path,
        ctx.query_values(),
        ctx.body.as_deref(),
        ctx.user_agent.as_deref(),
    );
    if !findings.is_empty() {
        let kinds: Vec<&str> = findings.iter().map(|f| f.kind.as_str()).collect();
        warn!(%ip, path = %ctx.path, threats = ?kinds, "suspicious request");
        if state.suspicious.record(ip, &findings) {
            track_ip_blocked();
            return ip_blocked();
        }
    }

    next.run(Request::from_parts(parts, body)).await
}
