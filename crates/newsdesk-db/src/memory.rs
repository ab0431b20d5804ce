//! In-memory implementation of the user and role stores.
//!
//! Backs the test suites and local runs without Postgres. State lives in
//! `tokio::sync::RwLock`-guarded maps and is lost on restart.
//!
//! The store also counts role lookups and can be told to fail or to stall
//! role lookups, so callers can observe caching and single-flight behavior.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use newsdesk_models::{NewUser, Role, User, UserCredentials, UserId};
use tokio::sync::RwLock;

use crate::store::{RoleStore, StoreError, StoreResult, UserStore};

#[derive(Debug, Default)]
struct Inner {
    users: RwLock<HashMap<UserId, UserCredentials>>,
    roles: RwLock<HashMap<String, Role>>,
    role_queries: AtomicUsize,
    role_delay_ms: AtomicUsize,
    fail_roles: AtomicBool,
    fail_activity: AtomicBool,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully-formed user record, replacing any with the same id.
    pub async fn insert_user(&self, user: User, password_hash: impl Into<String>) {
        let creds = UserCredentials {
            user,
            password: password_hash.into(),
        };
        self.inner.users.write().await.insert(creds.user.id, creds);
    }

    pub async fn user(&self, id: UserId) -> Option<User> {
        self.inner.users.read().await.get(&id).map(|c| c.user.clone())
    }

    /// Mutates a stored user in place.
    pub async fn update_user(&self, id: UserId, f: impl FnOnce(&mut User)) {
        if let Some(creds) = self.inner.users.write().await.get_mut(&id) {
            f(&mut creds.user);
        }
    }

    /// Number of `permissions_for_role` calls served so far.
    pub fn role_queries(&self) -> usize {
        self.inner.role_queries.load(Ordering::SeqCst)
    }

    /// Makes each role lookup sleep first, widening race windows in tests.
    pub fn set_role_delay(&self, delay: Duration) {
        self.inner
            .role_delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    pub fn fail_role_lookups(&self, fail: bool) {
        self.inner.fail_roles.store(fail, Ordering::SeqCst);
    }

    pub fn fail_activity_updates(&self, fail: bool) {
        self.inner.fail_activity.store(fail, Ordering::SeqCst);
    }

    fn unavailable(what: &str) -> StoreError {
        StoreError::Unexpected(anyhow::anyhow!("{what}: store unavailable"))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.user(id).await)
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> StoreResult<Option<UserCredentials>> {
        let users = self.inner.users.read().await;
        Ok(users
            .values()
            .find(|c| c.user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn touch_last_activity(&self, id: UserId, at: DateTime<Utc>) -> StoreResult<()> {
        if self.inner.fail_activity.load(Ordering::SeqCst) {
            return Err(Self::unavailable("touch_last_activity"));
        }
        self.update_user(id, |u| u.last_activity = Some(at)).await;
        Ok(())
    }

    async fn record_failed_login(&self, id: UserId) -> StoreResult<i32> {
        let mut users = self.inner.users.write().await;
        let creds = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        creds.user.failed_login_attempts += 1;
        Ok(creds.user.failed_login_attempts)
    }

    async fn lock_account(&self, id: UserId, until: DateTime<Utc>) -> StoreResult<()> {
        self.update_user(id, |u| u.lock_until = Some(until)).await;
        Ok(())
    }

    async fn reset_failed_logins(&self, id: UserId) -> StoreResult<()> {
        self.update_user(id, |u| {
            u.failed_login_attempts = 0;
            u.lock_until = None;
        })
        .await;
        Ok(())
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let mut users = self.inner.users.write().await;
        if users
            .values()
            .any(|c| c.user.email.eq_ignore_ascii_case(&new.email))
        {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                new.email
            )));
        }
        let user = User {
            id: UserId::new(),
            name: new.name,
            email: new.email,
            role: new.role,
            status: new.status,
            lock_until: None,
            last_activity: None,
            failed_login_attempts: 0,
            created_at: Utc::now(),
        };
        users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                password: new.password_hash,
            },
        );
        Ok(user)
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn permissions_for_role(&self, role: &str) -> StoreResult<Option<Vec<String>>> {
        self.inner.role_queries.fetch_add(1, Ordering::SeqCst);
        let delay = self.inner.role_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        if self.inner.fail_roles.load(Ordering::SeqCst) {
            return Err(Self::unavailable("permissions_for_role"));
        }
        let roles = self.inner.roles.read().await;
        Ok(roles.get(role).map(|r| r.permissions.clone()))
    }

    async fn set_permissions(
        &self,
        role: &str,
        permissions: &[String],
        description: Option<&str>,
    ) -> StoreResult<Role> {
        let mut roles = self.inner.roles.write().await;
        let entry = roles.entry(role.to_string()).or_insert_with(|| Role {
            name: role.to_string(),
            description: None,
            permissions: Vec::new(),
            updated_at: Utc::now(),
        });
        entry.permissions = permissions.to_vec();
        if let Some(description) = description {
            entry.description = Some(description.to_string());
        }
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        let mut roles: Vec<Role> = self.inner.roles.read().await.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdesk_models::AccountStatus;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".into(),
            email: email.into(),
            role: "editor".into(),
            password_hash: "hash".into(),
            status: AccountStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();

        assert_eq!(store.find_by_id(user.id).await.unwrap(), Some(user.clone()));
        let creds = store
            .find_credentials_by_email("A@Example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(creds.password, "hash");

        let dup = store.create_user(new_user("a@example.com")).await;
        assert!(matches!(dup, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_failed_login_counter_and_reset() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("b@example.com")).await.unwrap();

        assert_eq!(store.record_failed_login(user.id).await.unwrap(), 1);
        assert_eq!(store.record_failed_login(user.id).await.unwrap(), 2);
        store.lock_account(user.id, Utc::now()).await.unwrap();

        store.reset_failed_logins(user.id).await.unwrap();
        let user = store.user(user.id).await.unwrap();
        assert_eq!(user.failed_login_attempts, 0);
        assert!(user.lock_until.is_none());
    }

    #[tokio::test]
    async fn test_role_permissions_and_query_count() {
        let store = MemoryStore::new();
        assert_eq!(store.permissions_for_role("editor").await.unwrap(), None);

        store
            .set_permissions("editor", &["news.create".to_string()], Some("Editors"))
            .await
            .unwrap();
        assert_eq!(
            store.permissions_for_role("editor").await.unwrap(),
            Some(vec!["news.create".to_string()])
        );
        assert_eq!(store.role_queries(), 2);

        store.fail_role_lookups(true);
        assert!(store.permissions_for_role("editor").await.is_err());
    }
}
