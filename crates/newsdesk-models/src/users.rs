//! User domain models.
//!
//! [`User`] is the principal record as the authorization pipeline sees it:
//! it never carries the password hash. The hash only travels inside
//! [`UserCredentials`], which is loaded by the login flow and nowhere else.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ids::UserId;

/// Account status as stored in the `users.status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
    Suspended,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Suspended => "suspended",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown account status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for AccountStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            "suspended" => Ok(AccountStatus::Suspended),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for AccountStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A user as loaded by the principal loader.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: String,
    #[sqlx(try_from = "String")]
    pub status: AccountStatus,
    pub lock_until: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(skip_serializing, default)]
    pub failed_login_attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether a lock is in force at `now`. An elapsed lock no longer counts.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.is_some_and(|until| until > now)
    }
}

/// A user together with the bcrypt hash, used only to verify a login.
#[derive(FromRow, Debug, Clone)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password: String,
}

/// Input for creating a user from the CLI or test fixtures.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: String,
    pub password_hash: String,
    pub status: AccountStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(lock_until: Option<DateTime<Utc>>) -> User {
        User {
            id: UserId::new(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            role: "editor".into(),
            status: AccountStatus::Active,
            lock_until,
            last_activity: None,
            failed_login_attempts: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Active".parse::<AccountStatus>(), Ok(AccountStatus::Active));
        assert_eq!(
            AccountStatus::try_from("suspended".to_string()),
            Ok(AccountStatus::Suspended)
        );
        assert!("banned".parse::<AccountStatus>().is_err());
        assert!(!AccountStatus::Inactive.is_active());
    }

    #[test]
    fn test_lock_only_in_force_until_expiry() {
        let now = Utc::now();
        assert!(user(Some(now + Duration::minutes(5))).is_locked_at(now));
        assert!(!user(Some(now - Duration::seconds(1))).is_locked_at(now));
        assert!(!user(Some(now)).is_locked_at(now));
        assert!(!user(None).is_locked_at(now));
    }

    #[test]
    fn test_serialization_hides_failed_attempts() {
        let json = serde_json::to_value(user(None)).unwrap();
        assert!(json.get("failedLoginAttempts").is_none());
        assert_eq!(json["status"], "active");
        assert!(json.get("lockUntil").is_some());
    }
}
