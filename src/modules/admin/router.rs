use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

use super::controller::{flush_permission_cache, list_blocked_ips, unblock_ip};

pub fn init_admin_router() -> Router<AppState> {
    Router::new()
        .route("/cache/permissions/flush", post(flush_permission_cache))
        .route("/security/blocked-ips", get(list_blocked_ips))
        .route("/security/blocked-ips/{ip}", delete(unblock_ip))
}
