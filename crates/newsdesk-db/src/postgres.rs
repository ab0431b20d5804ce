//! Postgres-backed user and role stores.
//!
//! Queries are plain runtime `sqlx::query_as` calls so the crate builds
//! without a live database. The schema lives in `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use newsdesk_models::{NewUser, Role, User, UserCredentials, UserId};
use sqlx::PgPool;
use tracing::instrument;

use crate::store::{RoleStore, StoreError, StoreResult, UserStore};

const USER_COLUMNS: &str = "id, name, email, role, status, lock_until, last_activity, \
                            failed_login_attempts, created_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> StoreResult<Option<UserCredentials>> {
        let sql = format!("SELECT {USER_COLUMNS}, password FROM users WHERE lower(email) = lower($1)");
        let creds = sqlx::query_as::<_, UserCredentials>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(creds)
    }

    async fn touch_last_activity(&self, id: UserId, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_activity = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn record_failed_login(&self, id: UserId) -> StoreResult<i32> {
        let count: Option<i32> = sqlx::query_scalar(
            "UPDATE users SET failed_login_attempts = failed_login_attempts + 1 \
             WHERE id = $1 RETURNING failed_login_attempts",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        count.ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    #[instrument(skip(self))]
    async fn lock_account(&self, id: UserId, until: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE users SET lock_until = $2 WHERE id = $1")
            .bind(id)
            .bind(until)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reset_failed_logins(&self, id: UserId) -> StoreResult<()> {
        sqlx::query("UPDATE users SET failed_login_attempts = 0, lock_until = NULL WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password, role, status) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(UserId::new())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.role)
            .bind(user.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    StoreError::Conflict(format!("email {} already registered", user.email))
                }
                _ => StoreError::Database(e),
            })?;
        Ok(created)
    }
}

#[async_trait]
impl RoleStore for PgStore {
    #[instrument(skip(self))]
    async fn permissions_for_role(&self, role: &str) -> StoreResult<Option<Vec<String>>> {
        let perms: Option<Vec<String>> =
            sqlx::query_scalar("SELECT permissions FROM roles WHERE name = $1")
                .bind(role)
                .fetch_optional(&self.pool)
                .await?;
        Ok(perms)
    }

    #[instrument(skip(self, permissions))]
    async fn set_permissions(
        &self,
        role: &str,
        permissions: &[String],
        description: Option<&str>,
    ) -> StoreResult<Role> {
        let row = sqlx::query_as::<_, Role>(
            "INSERT INTO roles (name, description, permissions, updated_at) \
             VALUES ($1, $2, $3, now()) \
             ON CONFLICT (name) DO UPDATE SET \
                permissions = EXCLUDED.permissions, \
                description = COALESCE(EXCLUDED.description, roles.description), \
                updated_at = now() \
             RETURNING name, description, permissions, updated_at",
        )
        .bind(role)
        .bind(description)
        .bind(permissions)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT name, description, permissions, updated_at FROM roles ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdesk_models::AccountStatus;

    async fn store() -> PgStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = crate::init_db_pool(&url).await.unwrap();
        PgStore::new(pool)
    }

    #[tokio::test]
    #[ignore = "requires Postgres"]
    async fn test_user_and_role_round_trip() {
        let store = store().await;
        let email = format!("pg-{}@example.com", UserId::new());
        let user = store
            .create_user(NewUser {
                name: "Pg Test".into(),
                email: email.clone(),
                role: "editor".into(),
                password_hash: "hash".into(),
                status: AccountStatus::Active,
            })
            .await
            .unwrap();

        let found = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found.email, email);

        let creds = store
            .find_credentials_by_email(&email.to_uppercase())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(creds.password, "hash");

        assert_eq!(store.record_failed_login(user.id).await.unwrap(), 1);
        store.reset_failed_logins(user.id).await.unwrap();

        let role = format!("role_{}", user.id.into_inner().simple());
        store
            .set_permissions(&role, &["news.read".to_string()], None)
            .await
            .unwrap();
        assert_eq!(
            store.permissions_for_role(&role).await.unwrap(),
            Some(vec!["news.read".to_string()])
        );
    }
}
