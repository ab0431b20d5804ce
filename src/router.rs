use std::any::Any;
use std::time::Duration;

use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::auth::authenticate;
use crate::middleware::rate_limit::api_rate_limit;
use crate::middleware::security::screen_request;
use crate::modules::admin::router::init_admin_router;
use crate::modules::auth::router::init_auth_router;
use crate::modules::roles::router::init_roles_router;
use crate::state::AppState;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, middleware};
use newsdesk_core::AppError;
use serde_json::{Value, json};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::error;

use crate::context::API_KEY_HEADER;

async fn health_check() -> Json<Value> {
    Json(json!({ "success": true, "status": "ok" }))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "handler panicked");
    AppError::internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}

pub fn init_router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/roles", init_roles_router())
        .nest("/admin", init_admin_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    let public = Router::new()
        .route("/health", get(health_check))
        .route_layer(middleware::from_fn_with_state(state.clone(), api_rate_limit));

    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(public)
                .nest("/auth", init_auth_router(state.clone()))
                .merge(protected)
                .layer(middleware::from_fn_with_state(state.clone(), screen_request)),
        )
        .with_state(state.clone())
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.security_config().request_timeout_secs,
        )))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .config
                .cors
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                    HeaderName::from_static(API_KEY_HEADER),
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
