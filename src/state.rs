use std::sync::Arc;

use newsdesk_cache::{CacheConfig, PermissionCache};
use newsdesk_config::{CorsConfig, JwtConfig, RateLimitConfig, SecurityConfig};
use newsdesk_core::{Clock, SystemClock};
use newsdesk_db::{PgPool, PgStore, RoleStore, UserStore};
use newsdesk_guard::{RateLimiter, SuspiciousActivityTracker};

use crate::gate::AuthGate;

/// Every configuration section, loaded once at startup.
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub security: SecurityConfig,
    pub cache: CacheConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            jwt: JwtConfig::from_env(),
            cors: CorsConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            security: SecurityConfig::from_env(),
            cache: CacheConfig::from_env(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub clock: Arc<dyn Clock>,
    pub users: Arc<dyn UserStore>,
    pub roles: Arc<dyn RoleStore>,
    pub permissions: Arc<PermissionCache>,
    pub api_limiter: Arc<RateLimiter>,
    pub auth_limiter: Arc<RateLimiter>,
    pub suspicious: Arc<SuspiciousActivityTracker>,
    pub gate: Arc<AuthGate>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wires the caches, limiters and gate around the given stores.
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let permissions = Arc::new(PermissionCache::new(
            Arc::clone(&roles),
            Arc::clone(&clock),
            &config.cache,
        ));
        let api_limiter = Arc::new(RateLimiter::new(
            "api",
            config.rate_limit.api,
            config.rate_limit.cleanup_probability,
            Arc::clone(&clock),
        ));
        let auth_limiter = Arc::new(RateLimiter::new(
            "auth",
            config.rate_limit.auth,
            config.rate_limit.cleanup_probability,
            Arc::clone(&clock),
        ));
        let suspicious = Arc::new(SuspiciousActivityTracker::from_config(
            &config.security,
            Arc::clone(&clock),
        ));
        let gate = Arc::new(AuthGate::new(
            config.jwt.clone(),
            config.security.clone(),
            Arc::clone(&clock),
            Arc::clone(&users),
            Arc::clone(&permissions),
            Arc::clone(&api_limiter),
        ));

        Self {
            config: Arc::new(config),
            clock,
            users,
            roles,
            permissions,
            api_limiter,
            auth_limiter,
            suspicious,
            gate,
        }
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.config.jwt
    }

    pub fn security_config(&self) -> &SecurityConfig {
        &self.config.security
    }
}

/// Builds the production state on top of a Postgres pool.
pub fn init_app_state(pool: PgPool) -> AppState {
    let store = Arc::new(PgStore::new(pool));
    AppState::new(
        AppConfig::from_env(),
        store.clone(),
        store,
        Arc::new(SystemClock),
    )
}
