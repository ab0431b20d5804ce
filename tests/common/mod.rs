#![allow(dead_code)]

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use newsdesk::newsdesk_auth::{create_access_token, create_access_token_at};
use newsdesk::newsdesk_config::{JwtConfig, RateLimitConfig, SecurityConfig, WindowLimit};
use newsdesk::newsdesk_core::{ManualClock, hash_password};
use newsdesk::newsdesk_db::{MemoryStore, RoleStore};
use newsdesk::newsdesk_models::{AccountStatus, User, UserId};
use newsdesk::router::init_router;
use newsdesk::state::{AppConfig, AppState};
use serde_json::Value;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-characters-long";
pub const SERVICE_KEY: &str = "service-key-for-tests";
pub const TRUSTED_IP: &str = "10.0.0.1";
pub const API_LIMIT: u32 = 5;
pub const API_WINDOW_MS: u64 = 60_000;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: MemoryStore,
    pub clock: ManualClock,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            ..JwtConfig::default()
        },
        rate_limit: RateLimitConfig {
            api: WindowLimit::new(API_LIMIT, API_WINDOW_MS),
            auth: WindowLimit::new(5, 15 * 60 * 1000),
            cleanup_probability: 0.0,
        },
        security: SecurityConfig {
            trusted_ips: vec![TRUSTED_IP.parse().unwrap()],
            master_api_key: Some(SERVICE_KEY.to_string()),
            ..SecurityConfig::default()
        },
        ..AppConfig::default()
    }
}

/// Builds the full router over an in-memory store seeded with the default roles.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(test_config()).await
}

pub async fn setup_test_app_with(config: AppConfig) -> TestApp {
    let store = MemoryStore::new();
    let clock = ManualClock::default();

    seed_role(&store, "editor", &["news.create", "news.update"]).await;
    seed_role(&store, "viewer", &["news.read"]).await;
    seed_role(
        &store,
        "manager",
        &["settings.read", "settings.update", "security.manage"],
    )
    .await;

    let state = AppState::new(
        config,
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(clock.clone()),
    );
    TestApp {
        router: init_router(state.clone()),
        state,
        store,
        clock,
    }
}

pub async fn seed_role(store: &MemoryStore, role: &str, permissions: &[&str]) {
    let permissions: Vec<String> = permissions.iter().map(|p| p.to_string()).collect();
    store.set_permissions(role, &permissions, None).await.unwrap();
}

pub fn test_user(email: &str, role: &str) -> User {
    User {
        id: UserId::new(),
        name: "Test User".to_string(),
        email: email.to_string(),
        role: role.to_string(),
        status: AccountStatus::Active,
        lock_until: None,
        last_activity: None,
        failed_login_attempts: 0,
        created_at: Utc::now(),
    }
}

/// Inserts an active user. The password hash is only computed when a
/// password is given.
pub async fn create_test_user(app: &TestApp, email: &str, role: &str, password: Option<&str>) -> User {
    let user = test_user(email, role);
    let hash = match password {
        Some(password) => hash_password(password).unwrap(),
        None => "not-a-bcrypt-hash".to_string(),
    };
    app.store.insert_user(user.clone(), hash).await;
    user
}

pub fn token_for(user: &User, app: &TestApp) -> String {
    create_access_token(user.id.0, &user.email, &user.role, app.state.jwt_config()).unwrap()
}

pub fn token_issued_at(user: &User, app: &TestApp, issued_at: DateTime<Utc>) -> String {
    create_access_token_at(
        user.id.0,
        &user.email,
        &user.role,
        issued_at,
        app.state.jwt_config(),
    )
    .unwrap()
}

/// A request that arrived over a socket from `ip`.
pub fn request_from(ip: &str, builder: axum::http::request::Builder, body: Body) -> Request<Body> {
    let ip: IpAddr = ip.parse().unwrap();
    let mut request = builder.body(body).unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::new(ip, 40000)));
    request
}

pub fn get_from(ip: &str, uri: &str) -> Request<Body> {
    request_from(ip, Request::builder().method("GET").uri(uri), Body::empty())
}

pub fn authed_get(ip: &str, uri: &str, token: &str) -> Request<Body> {
    request_from(
        ip,
        Request::builder()
            .method("GET")
            .uri(uri)
            .header("authorization", format!("Bearer {token}")),
        Body::empty(),
    )
}

pub fn json_request(ip: &str, method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    request_from(ip, builder, Body::from(serde_json::to_vec(body).unwrap()))
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn header<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}
