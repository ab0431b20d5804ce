use axum::Json;
use axum::extract::State;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use newsdesk_core::AppError;
use newsdesk_models::{LoginRequest, LoginResponse, MeResponse, MessageResponse};
use tracing::instrument;

use crate::context::RequestContext;
use crate::gate::AuthUser;
use crate::middleware::auth::clear_session_cookie;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::AuthService;

/// Login with email and password.
///
/// On success the access token is returned in the body and set as the
/// http-only session cookie.
#[instrument(skip_all, fields(ip = %ctx.ip_key()))]
pub async fn login_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let response = AuthService::login_user(&state, &ctx, dto).await?;

    let jwt = state.jwt_config();
    let cookie = Cookie::build((jwt.cookie_name.clone(), response.token.clone()))
        .http_only(true)
        .secure(jwt.secure_cookie)
        .same_site(SameSite::Lax)
        .path("/");

    Ok((jar.add(cookie), Json(response)))
}

pub async fn logout_user(State(state): State<AppState>) -> (CookieJar, Json<MessageResponse>) {
    (
        clear_session_cookie(&state),
        Json(MessageResponse::ok("Logged out successfully")),
    )
}

/// The caller as the gate sees it, with effective permissions.
pub async fn get_me(auth_user: AuthUser) -> Json<MeResponse> {
    let permissions = auth_user.grants().effective();
    Json(MeResponse {
        success: true,
        service: matches!(auth_user, AuthUser::Service),
        user: auth_user.principal().map(|p| p.user.clone()),
        permissions,
    })
}
