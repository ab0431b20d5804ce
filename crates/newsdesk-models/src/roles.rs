//! Role and permission models.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use newsdesk_core::permissions;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::users::User;

/// A role row: the role name and the permission strings it grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// What a principal is allowed to do.
///
/// `Full` is the super-admin bypass; every permission check passes
/// without consulting the enumerated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grants {
    Full,
    Listed(Arc<[String]>),
}

impl Grants {
    pub fn listed<I, S>(perms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Grants::Listed(perms.into_iter().map(Into::into).collect())
    }

    pub fn allows(&self, permission: &str) -> bool {
        match self {
            Grants::Full => true,
            Grants::Listed(perms) => perms.iter().any(|p| p == permission),
        }
    }

    /// Effective permission strings, expanding `Full` to every known permission.
    pub fn effective(&self) -> Vec<String> {
        match self {
            Grants::Full => permissions::ALL.iter().map(|p| p.to_string()).collect(),
            Grants::Listed(perms) => perms.to_vec(),
        }
    }
}

/// A loaded, verified user with the grants of their role.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: User,
    pub grants: Grants,
}

impl Principal {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.grants.allows(permission)
    }
}

/// Body of `PUT /api/roles/{role}/permissions`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRolePermissionsDto {
    pub permissions: Vec<String>,
    pub description: Option<String>,
}

impl UpdateRolePermissionsDto {
    /// Returns the permission names that are not part of the known set.
    pub fn unknown_permissions(&self) -> Vec<&str> {
        self.permissions
            .iter()
            .map(String::as_str)
            .filter(|p| !permissions::is_known(p))
            .collect()
    }

    /// Permissions with duplicates removed, order preserved.
    pub fn normalized(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.permissions.len());
        for p in &self.permissions {
            let p = p.trim();
            if !out.iter().any(|existing| existing == p) {
                out.push(p.to_string());
            }
        }
        out
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RolePermissionsResponse {
    pub success: bool,
    pub role: String,
    pub permissions: Vec<String>,
}
