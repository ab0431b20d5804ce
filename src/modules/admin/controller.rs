//! Operator endpoints for the permission cache and IP blocks.

use std::net::IpAddr;

use axum::{
    Json,
    extract::{Path, State},
};
use newsdesk_core::AppError;
use newsdesk_guard::BlockedIp;
use newsdesk_models::MessageResponse;
use serde::Serialize;
use tracing::info;

use crate::middleware::auth::{RequireSecurityManage, RequireSettingsUpdate};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BlockedIpsResponse {
    pub success: bool,
    pub blocked: Vec<BlockedIp>,
}

pub async fn flush_permission_cache(
    State(state): State<AppState>,
    _auth: RequireSettingsUpdate,
) -> Json<MessageResponse> {
    let dropped = state.permissions.len();
    state.permissions.invalidate_all();
    info!(dropped, "permission cache flushed");
    Json(MessageResponse::ok("Permission cache flushed"))
}

pub async fn list_blocked_ips(
    State(state): State<AppState>,
    _auth: RequireSecurityManage,
) -> Json<BlockedIpsResponse> {
    Json(BlockedIpsResponse {
        success: true,
        blocked: state.suspicious.blocked(),
    })
}

/// Lift a block. Blocks never expire on their own.
pub async fn unblock_ip(
    State(state): State<AppState>,
    _auth: RequireSecurityManage,
    Path(ip): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let ip: IpAddr = ip
        .parse()
        .map_err(|_| AppError::bad_request(anyhow::anyhow!("Invalid IP address: {ip}")))?;

    if !state.suspicious.unblock(&ip) {
        return Err(AppError::not_found(anyhow::anyhow!("IP {ip} is not blocked")));
    }

    info!(%ip, "IP unblocked");
    Ok(Json(MessageResponse::ok(format!("IP {ip} unblocked"))))
}
