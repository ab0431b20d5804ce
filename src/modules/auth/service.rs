use chrono::Duration;
use newsdesk_auth::create_access_token;
use newsdesk_core::{AppError, ErrorCode, verify_password};
use newsdesk_models::{LoginRequest, LoginResponse, User};
use tracing::{info, instrument, warn};

use crate::context::RequestContext;
use crate::metrics::{track_gate_rejection, track_login};
use crate::state::AppState;

pub struct AuthService;

fn invalid_credentials() -> AppError {
    AppError::unauthorized(ErrorCode::InvalidCredentials, "Invalid email or password")
}

impl AuthService {
    /// Checks the login rate limit, the credentials and the account state,
    /// then issues an access token.
    ///
    /// Every attempt counts against the per-IP auth limit; a successful
    /// login clears both the IP counter and the account's failed attempts.
    /// Reaching the failed-attempt threshold locks the account.
    #[instrument(skip_all, fields(ip = %ctx.ip_key()))]
    pub async fn login_user(
        state: &AppState,
        ctx: &RequestContext,
        dto: LoginRequest,
    ) -> Result<LoginResponse, AppError> {
        let security = state.security_config();
        let ip_key = ctx.ip_key();
        let trusted = ctx.client_ip.is_some_and(|ip| security.is_trusted(&ip));

        if !trusted {
            if let Err(limited) = state.auth_limiter.check(&ip_key) {
                warn!(ip = %ip_key, "login rate limit exceeded");
                track_gate_rejection(ErrorCode::LoginRateLimit.as_str());
                return Err(AppError::too_many_requests(
                    ErrorCode::LoginRateLimit,
                    limited.retry_after_secs,
                ));
            }
        }

        let Some(creds) = state.users.find_credentials_by_email(&dto.email).await? else {
            track_login(false);
            return Err(invalid_credentials());
        };
        let mut user = creds.user;
        let now = state.clock.now();

        if !user.status.is_active() {
            track_login(false);
            return Err(AppError::forbidden(
                ErrorCode::AccountInactive,
                "Account is not active",
            ));
        }
        if let Some(until) = user.lock_until {
            if until > now {
                track_login(false);
                return Err(AppError::locked(until));
            }
            // Lock elapsed: the failed-attempt count starts over.
            state.users.reset_failed_logins(user.id).await?;
            user.failed_login_attempts = 0;
            user.lock_until = None;
        }

        if !verify_password(&dto.password, &creds.password)? {
            track_login(false);
            return Err(Self::record_failure(state, &user).await?);
        }

        if user.failed_login_attempts > 0 || user.lock_until.is_some() {
            state.users.reset_failed_logins(user.id).await?;
            user.failed_login_attempts = 0;
            user.lock_until = None;
        }
        state.auth_limiter.reset(&ip_key);
        if let Err(e) = state.users.touch_last_activity(user.id, now).await {
            warn!(user_id = %user.id, error = %e, "failed to update last activity");
        }
        user.last_activity = Some(now);

        let token = create_access_token(
            user.id.into_inner(),
            &user.email,
            &user.role,
            state.jwt_config(),
        )?;

        track_login(true);
        info!(user_id = %user.id, role = %user.role, "user logged in");

        Ok(LoginResponse {
            success: true,
            token,
            user,
        })
    }

    /// Counts a wrong password and returns the error to report.
    async fn record_failure(state: &AppState, user: &User) -> Result<AppError, AppError> {
        let security = state.security_config();
        let attempts = state.users.record_failed_login(user.id).await?;

        if attempts >= security.max_failed_logins as i32 {
            let until = state.clock.now() + Duration::minutes(security.lock_minutes);
            state.users.lock_account(user.id, until).await?;
            warn!(user_id = %user.id, attempts, %until, "account locked after failed logins");
            return Ok(AppError::locked(until));
        }

        Ok(invalid_credentials())
    }
}
