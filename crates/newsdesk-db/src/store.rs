use async_trait::async_trait;
use chrono::{DateTime, Utc};
use newsdesk_models::{NewUser, Role, User, UserCredentials, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent user records.
///
/// Lookups used by the gate never return the password hash; only
/// [`UserStore::find_credentials_by_email`] does, for the login flow.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>>;
    async fn find_credentials_by_email(&self, email: &str)
    -> StoreResult<Option<UserCredentials>>;
    async fn touch_last_activity(&self, id: UserId, at: DateTime<Utc>) -> StoreResult<()>;
    /// Increments the failed-login counter and returns the new count.
    async fn record_failed_login(&self, id: UserId) -> StoreResult<i32>;
    async fn lock_account(&self, id: UserId, until: DateTime<Utc>) -> StoreResult<()>;
    /// Clears the failed-login counter and any lock.
    async fn reset_failed_logins(&self, id: UserId) -> StoreResult<()>;
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
}

/// Persistent role → permission mapping.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// `None` when the role does not exist.
    async fn permissions_for_role(&self, role: &str) -> StoreResult<Option<Vec<String>>>;
    /// Creates the role if needed and replaces its permission list.
    async fn set_permissions(
        &self,
        role: &str,
        permissions: &[String],
        description: Option<&str>,
    ) -> StoreResult<Role>;
    async fn list_roles(&self) -> StoreResult<Vec<Role>>;
}
