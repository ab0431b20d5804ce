use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_role_permissions, list_roles, update_role_permissions};

pub fn init_roles_router() -> Router<AppState> {
    Router::new().route("/", get(list_roles)).route(
        "/{role}/permissions",
        get(get_role_permissions).put(update_role_permissions),
    )
}
