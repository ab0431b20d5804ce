//! The authorization gate.
//!
//! A request passes, in order: API key or token verification, principal
//! loading, rate limiting, permission resolution and the permission check.
//! The first failing stage decides the rejection.

use std::sync::Arc;

use newsdesk_auth::{TokenError, verify_token};
use newsdesk_cache::{CacheError, PermissionCache};
use newsdesk_config::{JwtConfig, SecurityConfig};
use newsdesk_core::{AppError, Clock, ErrorCode};
use newsdesk_db::UserStore;
use newsdesk_guard::{RateLimitStatus, RateLimiter};
use newsdesk_models::{Grants, Principal, User, UserId};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use crate::context::RequestContext;
use crate::metrics::{track_gate_rejection, track_permission_cache};

/// Who the gate let through.
#[derive(Debug, Clone)]
pub enum AuthUser {
    /// A logged-in user with the grants of their role.
    Member(Principal),
    /// A caller holding the master API key; full access.
    Service,
}

impl AuthUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        match self {
            AuthUser::Member(principal) => principal.has_permission(permission),
            AuthUser::Service => true,
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            AuthUser::Member(principal) => Some(principal),
            AuthUser::Service => None,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.principal().map(|p| p.user.id)
    }

    pub fn grants(&self) -> Grants {
        match self {
            AuthUser::Member(principal) => principal.grants.clone(),
            AuthUser::Service => Grants::Full,
        }
    }
}

/// A request that cleared the gate.
#[derive(Debug, Clone)]
pub struct Authorized {
    pub user: AuthUser,
    /// `None` when the client IP is trusted and rate limiting was skipped.
    pub rate: Option<RateLimitStatus>,
}

pub struct AuthGate {
    jwt: JwtConfig,
    security: SecurityConfig,
    api_key_digest: Option<[u8; 32]>,
    clock: Arc<dyn Clock>,
    users: Arc<dyn UserStore>,
    permissions: Arc<PermissionCache>,
    limiter: Arc<RateLimiter>,
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("limiter", &self.limiter)
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

impl AuthGate {
    pub fn new(
        jwt: JwtConfig,
        security: SecurityConfig,
        clock: Arc<dyn Clock>,
        users: Arc<dyn UserStore>,
        permissions: Arc<PermissionCache>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        let api_key_digest = security.master_api_key.as_deref().map(digest);
        Self {
            jwt,
            security,
            api_key_digest,
            clock,
            users,
            permissions,
            limiter,
        }
    }

    /// Runs every stage. `required` is the permission the route needs, if any.
    ///
    /// Rejections are logged at `warn` and counted before being returned.
    #[instrument(skip_all, fields(path = %ctx.path, ip = %ctx.ip_key()))]
    pub async fn authorize(
        &self,
        ctx: &RequestContext,
        required: Option<&str>,
    ) -> Result<Authorized, AppError> {
        let result = self.run(ctx, required).await;
        if let Err(err) = &result {
            if !err.status.is_server_error() {
                warn!(code = %err.code, ip = %ctx.ip_key(), path = %ctx.path, "request rejected");
            }
            track_gate_rejection(err.code.as_str());
        }
        result
    }

    async fn run(
        &self,
        ctx: &RequestContext,
        required: Option<&str>,
    ) -> Result<Authorized, AppError> {
        let member = match ctx.api_key.as_deref() {
            Some(key) => {
                self.check_api_key(key)?;
                None
            }
            None => Some(self.load_user(ctx).await?),
        };

        let rate_key = match &member {
            Some(user) => format!("{}:{}:{}", ctx.ip_key(), user.id, user.role),
            None => format!("{}:service", ctx.ip_key()),
        };
        let rate = self.rate_limit(ctx, &rate_key)?;

        let user = match member {
            Some(user) => {
                let grants = self.resolve_grants(&user.role).await?;
                AuthUser::Member(Principal { user, grants })
            }
            None => AuthUser::Service,
        };

        if let Some(permission) = required {
            check_permission(&user, permission)?;
        }

        Ok(Authorized { user, rate })
    }

    fn check_api_key(&self, key: &str) -> Result<(), AppError> {
        match &self.api_key_digest {
            Some(expected) if digest(key) == *expected => {
                debug!("service call authenticated by API key");
                Ok(())
            }
            _ => Err(AppError::unauthorized(
                ErrorCode::InvalidApiKey,
                "Invalid API key",
            )),
        }
    }

    /// Token verification and the principal loader.
    async fn load_user(&self, ctx: &RequestContext) -> Result<User, AppError> {
        let (token, source) = ctx
            .token()
            .ok_or_else(|| TokenError::NoToken.to_app_error())?;
        let claims = verify_token(token, &self.jwt).map_err(|e| e.to_app_error())?;
        debug!(%source, sub = %claims.sub, "token verified");

        let user_id: UserId = claims
            .sub
            .parse()
            .map_err(|_| TokenError::Invalid.to_app_error())?;

        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(AppError::internal)?
            .ok_or_else(|| AppError::unauthorized(ErrorCode::UserNotFound, "User not found"))?;

        if !user.status.is_active() {
            return Err(AppError::forbidden(
                ErrorCode::AccountInactive,
                "Account is not active",
            ));
        }

        let now = self.clock.now();
        if let Some(until) = user.lock_until.filter(|until| *until > now) {
            return Err(AppError::locked(until));
        }

        if let Err(e) = self.users.touch_last_activity(user.id, now).await {
            warn!(user_id = %user.id, error = %e, "failed to update last activity");
        }

        Ok(user)
    }

    fn rate_limit(
        &self,
        ctx: &RequestContext,
        key: &str,
    ) -> Result<Option<RateLimitStatus>, AppError> {
        if ctx
            .client_ip
            .is_some_and(|ip| self.security.is_trusted(&ip))
        {
            return Ok(None);
        }

        self.limiter.check(key).map(Some).map_err(|limited| {
            AppError::too_many_requests(ErrorCode::RateLimitExceeded, limited.retry_after_secs)
        })
    }

    async fn resolve_grants(&self, role: &str) -> Result<Grants, AppError> {
        let resolved = self
            .permissions
            .resolve(role)
            .await
            .map_err(|CacheError::Store(e)| AppError::internal(e))?;
        track_permission_cache(resolved.outcome.as_str());
        Ok(resolved.grants)
    }
}

/// The final permission check, also used by route extractors.
pub fn check_permission(user: &AuthUser, permission: &str) -> Result<(), AppError> {
    if user.has_permission(permission) {
        Ok(())
    } else {
        Err(AppError::insufficient_permissions(permission))
    }
}
