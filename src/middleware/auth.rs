use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use newsdesk_core::permissions;
use newsdesk_core::{AppError, ErrorCode};

use crate::context::RequestContext;
use crate::gate::AuthUser;
use crate::middleware::insert_rate_limit_headers;
use crate::state::AppState;

/// Runs the authorization gate and attaches the [`AuthUser`] to the request.
///
/// Accepted responses carry the `X-RateLimit-*` headers. Rejections for an
/// invalid or expired token also clear the session cookie.
pub async fn authenticate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();
    let ctx = RequestContext::from_parts(
        &parts,
        &state.jwt_config().cookie_name,
        state.security_config().trust_proxy,
    );

    match state.gate.authorize(&ctx, None).await {
        Ok(authorized) => {
            parts.extensions.insert(authorized.user);
            let mut response = next.run(Request::from_parts(parts, body)).await;
            if let Some(rate) = &authorized.rate {
                insert_rate_limit_headers(response.headers_mut(), rate);
            }
            response
        }
        Err(err) => rejection_response(&state, err),
    }
}

pub(crate) fn rejection_response(state: &AppState, err: AppError) -> Response {
    if matches!(err.code, ErrorCode::TokenInvalid | ErrorCode::TokenExpired) {
        (clear_session_cookie(state), err).into_response()
    } else {
        err.into_response()
    }
}

/// A jar that removes the session cookie.
pub fn clear_session_cookie(state: &AppState) -> CookieJar {
    CookieJar::new().remove(Cookie::build(state.jwt_config().cookie_name.clone()).path("/"))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        // Route not behind `authenticate`: run the gate here.
        let ctx = RequestContext::from_parts(
            parts,
            &state.jwt_config().cookie_name,
            state.security_config().trust_proxy,
        );
        let authorized = state
            .gate
            .authorize(&ctx, None)
            .await
            .map_err(|err| rejection_response(state, err))?;
        parts.extensions.insert(authorized.user.clone());
        Ok(authorized.user)
    }
}

/// Helper macro to create permission check extractors.
#[macro_export]
macro_rules! require_permission {
    ($name:ident, $permission:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::gate::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = axum::response::Response;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user = <$crate::gate::AuthUser as axum::extract::FromRequestParts<
                    $crate::state::AppState,
                >>::from_request_parts(parts, state)
                .await?;

                $crate::gate::check_permission(&auth_user, $permission).map_err(|err| {
                    $crate::metrics::track_gate_rejection(err.code.as_str());
                    axum::response::IntoResponse::into_response(err)
                })?;

                Ok($name(auth_user))
            }
        }
    };
}

// Settings permissions
require_permission!(RequireSettingsRead, permissions::SETTINGS_READ);
require_permission!(RequireSettingsUpdate, permissions::SETTINGS_UPDATE);

// Security permissions
require_permission!(RequireSecurityManage, permissions::SECURITY_MANAGE);
