use axum::{
    Json,
    extract::{Path, State},
};
use newsdesk_core::AppError;
use newsdesk_models::{Role, RolePermissionsResponse, UpdateRolePermissionsDto};
use serde::Serialize;

use crate::middleware::auth::{RequireSettingsRead, RequireSettingsUpdate};
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::RoleService;

#[derive(Debug, Serialize)]
pub struct RolesResponse {
    pub success: bool,
    pub roles: Vec<Role>,
}

pub async fn list_roles(
    State(state): State<AppState>,
    _auth: RequireSettingsRead,
) -> Result<Json<RolesResponse>, AppError> {
    let roles = RoleService::list_roles(&state).await?;
    Ok(Json(RolesResponse {
        success: true,
        roles,
    }))
}

pub async fn get_role_permissions(
    State(state): State<AppState>,
    _auth: RequireSettingsRead,
    Path(role): Path<String>,
) -> Result<Json<RolePermissionsResponse>, AppError> {
    let permissions = RoleService::get_permissions(&state, &role).await?;
    Ok(Json(RolePermissionsResponse {
        success: true,
        role,
        permissions,
    }))
}

/// Replace a role's permissions. Cached grants for the role are invalidated.
pub async fn update_role_permissions(
    State(state): State<AppState>,
    _auth: RequireSettingsUpdate,
    Path(role): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateRolePermissionsDto>,
) -> Result<Json<RolePermissionsResponse>, AppError> {
    let updated = RoleService::update_permissions(&state, &role, dto).await?;
    Ok(Json(RolePermissionsResponse {
        success: true,
        role: updated.name,
        permissions: updated.permissions,
    }))
}
