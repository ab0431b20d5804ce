use anyhow::{Context, Result, bail};
use newsdesk_auth::create_access_token;
use newsdesk_config::JwtConfig;
use newsdesk_core::permissions::{self, SUPER_ADMIN_ROLE};
use newsdesk_core::hash_password;
use newsdesk_db::{RoleStore, UserStore};
use newsdesk_models::{AccountStatus, NewUser, Role, User};

const MIN_PASSWORD_LEN: usize = 8;

/// Creates an active account with the super-admin role.
pub async fn create_admin(
    store: &dyn UserStore,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User> {
    if name.trim().is_empty() {
        bail!("name must not be empty");
    }
    if !email.contains('@') {
        bail!("'{email}' is not a valid email address");
    }
    if password.len() < MIN_PASSWORD_LEN {
        bail!("password must be at least {MIN_PASSWORD_LEN} characters");
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!("{e}"))?;
    let user = store
        .create_user(NewUser {
            name: name.trim().to_string(),
            email: email.trim().to_lowercase(),
            role: SUPER_ADMIN_ROLE.to_string(),
            password_hash,
            status: AccountStatus::Active,
        })
        .await
        .context("failed to create admin")?;
    Ok(user)
}

/// Issues an access token for an existing user, e.g. for a service account.
pub async fn issue_token(
    store: &dyn UserStore,
    email: &str,
    jwt_config: &JwtConfig,
) -> Result<String> {
    let creds = store
        .find_credentials_by_email(email)
        .await
        .context("failed to look up user")?
        .with_context(|| format!("no user with email {email}"))?;
    let user = creds.user;
    if !user.status.is_active() {
        bail!("user {email} is {}", user.status);
    }

    create_access_token(user.id.into_inner(), &user.email, &user.role, jwt_config)
        .map_err(|e| anyhow::anyhow!("{e}"))
}

/// Replaces a role's permission list after checking every name is known.
pub async fn set_permissions(
    store: &dyn RoleStore,
    role: &str,
    perms: &[String],
    description: Option<&str>,
) -> Result<Role> {
    let unknown: Vec<&str> = perms
        .iter()
        .map(String::as_str)
        .filter(|p| !permissions::is_known(p))
        .collect();
    if !unknown.is_empty() {
        bail!("unknown permissions: {}", unknown.join(", "));
    }
    store
        .set_permissions(role, perms, description)
        .await
        .context("failed to update role")
}
