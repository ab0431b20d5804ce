//! Permission constants for the Newsdesk API.
//!
//! Permissions are `resource.action` strings attached to roles in the role
//! store. Use these constants instead of string literals.
//!
//! # Example
//!
//! ```ignore
//! use newsdesk_core::permissions;
//!
//! if auth_user.has_permission(permissions::NEWS_PUBLISH) {
//!     // Publish the article
//! }
//! ```

/// Role name that bypasses every permission check.
pub const SUPER_ADMIN_ROLE: &str = "admin";

// =============================================================================
// News permissions
// =============================================================================

/// Permission to create articles
pub const NEWS_CREATE: &str = "news.create";
/// Permission to read unpublished articles
pub const NEWS_READ: &str = "news.read";
/// Permission to update articles
pub const NEWS_UPDATE: &str = "news.update";
/// Permission to delete articles
pub const NEWS_DELETE: &str = "news.delete";
/// Permission to publish articles
pub const NEWS_PUBLISH: &str = "news.publish";

// =============================================================================
// Categories permissions
// =============================================================================

pub const CATEGORIES_CREATE: &str = "categories.create";
pub const CATEGORIES_UPDATE: &str = "categories.update";
pub const CATEGORIES_DELETE: &str = "categories.delete";

// =============================================================================
// Comments permissions
// =============================================================================

pub const COMMENTS_MODERATE: &str = "comments.moderate";
pub const COMMENTS_DELETE: &str = "comments.delete";

// =============================================================================
// Users permissions
// =============================================================================

pub const USERS_READ: &str = "users.read";
pub const USERS_MANAGE: &str = "users.manage";

// =============================================================================
// Settings and security permissions
// =============================================================================

/// Permission to read site settings and role permission lists
pub const SETTINGS_READ: &str = "settings.read";
/// Permission to change site settings and role permission lists
pub const SETTINGS_UPDATE: &str = "settings.update";
/// Permission to inspect and lift IP blocks
pub const SECURITY_MANAGE: &str = "security.manage";
/// Permission to run the Sentinel feed ingestion
pub const SENTINEL_RUN: &str = "sentinel.run";

/// Every permission known to the API, used for validation of role updates.
pub const ALL: &[&str] = &[
    NEWS_CREATE,
    NEWS_READ,
    NEWS_UPDATE,
    NEWS_DELETE,
    NEWS_PUBLISH,
    CATEGORIES_CREATE,
    CATEGORIES_UPDATE,
    CATEGORIES_DELETE,
    COMMENTS_MODERATE,
    COMMENTS_DELETE,
    USERS_READ,
    USERS_MANAGE,
    SETTINGS_READ,
    SETTINGS_UPDATE,
    SECURITY_MANAGE,
    SENTINEL_RUN,
];

pub fn is_known(permission: &str) -> bool {
    ALL.contains(&permission)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_permissions() {
        assert!(is_known("news.delete"));
        assert!(is_known(SETTINGS_UPDATE));
        assert!(!is_known("news.destroy"));
        assert!(!is_known(""));
    }
}
