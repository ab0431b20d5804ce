use newsdesk_core::{AppError, permissions};
use newsdesk_models::{Role, UpdateRolePermissionsDto};
use tracing::{info, instrument};

use crate::state::AppState;

pub struct RoleService;

impl RoleService {
    pub async fn list_roles(state: &AppState) -> Result<Vec<Role>, AppError> {
        Ok(state.roles.list_roles().await?)
    }

    /// The stored permission list of `role`. The super-admin role reports
    /// every known permission.
    #[instrument(skip(state))]
    pub async fn get_permissions(state: &AppState, role: &str) -> Result<Vec<String>, AppError> {
        if role == permissions::SUPER_ADMIN_ROLE {
            return Ok(permissions::ALL.iter().map(|p| p.to_string()).collect());
        }

        state
            .roles
            .permissions_for_role(role)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Role '{role}' not found")))
    }

    /// Replaces the permission list of `role` and drops its cached grants so
    /// the next request sees the change.
    #[instrument(skip(state, dto))]
    pub async fn update_permissions(
        state: &AppState,
        role: &str,
        dto: UpdateRolePermissionsDto,
    ) -> Result<Role, AppError> {
        let unknown = dto.unknown_permissions();
        if !unknown.is_empty() {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "Unknown permissions: {}",
                unknown.join(", ")
            )));
        }

        let perms = dto.normalized();
        let updated = state
            .roles
            .set_permissions(role, &perms, dto.description.as_deref())
            .await?;
        state.permissions.invalidate(role);

        info!(role, count = perms.len(), "role permissions updated");
        Ok(updated)
    }
}
