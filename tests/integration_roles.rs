mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use newsdesk::context::RequestContext;
use newsdesk::newsdesk_core::permissions;
use serde_json::json;
use tower::ServiceExt;

const IP: &str = "192.0.2.60";

fn editor_context(token: &str) -> RequestContext {
    let (parts, _) = Request::builder()
        .uri("/api/news/7")
        .header("authorization", format!("Bearer {token}"))
        .body(())
        .unwrap()
        .into_parts();
    RequestContext::from_parts(&parts, "jwt", false)
}

#[tokio::test]
async fn test_update_permissions_invalidates_cache() {
    let app = setup_test_app().await;
    let manager = create_test_user(&app, "manager@example.com", "manager", None).await;
    let editor = create_test_user(&app, "editor@example.com", "editor", None).await;
    let ctx = editor_context(&token_for(&editor, &app));

    // Warm the cache with the old editor grants.
    assert!(
        app.state
            .gate
            .authorize(&ctx, Some(permissions::NEWS_DELETE))
            .await
            .is_err()
    );

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            IP,
            "PUT",
            "/api/roles/editor/permissions",
            Some(&token_for(&manager, &app)),
            &json!({ "permissions": ["news.create", "news.delete", "news.create"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["permissions"], json!(["news.create", "news.delete"]));

    // No TTL wait: the next check sees the new list.
    let authorized = app
        .state
        .gate
        .authorize(&ctx, Some(permissions::NEWS_DELETE))
        .await
        .unwrap();
    assert!(!authorized.user.has_permission(permissions::NEWS_UPDATE));
}

#[tokio::test]
async fn test_update_rejects_unknown_permissions() {
    let app = setup_test_app().await;
    let manager = create_test_user(&app, "manager@example.com", "manager", None).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            IP,
            "PUT",
            "/api/roles/editor/permissions",
            Some(&token_for(&manager, &app)),
            &json!({ "permissions": ["news.create", "news.teleport"] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("news.teleport"));
}

#[tokio::test]
async fn test_update_requires_settings_update() {
    let app = setup_test_app().await;
    let editor = create_test_user(&app, "editor@example.com", "editor", None).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            IP,
            "PUT",
            "/api/roles/editor/permissions",
            Some(&token_for(&editor, &app)),
            &json!({ "permissions": ["settings.update"] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "INSUFFICIENT_PERMISSIONS");
}

#[tokio::test]
async fn test_get_permissions() {
    let app = setup_test_app().await;
    let manager = create_test_user(&app, "manager@example.com", "manager", None).await;
    let token = token_for(&manager, &app);

    let response = app
        .router
        .clone()
        .oneshot(authed_get(IP, "/api/roles/unknown/permissions", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");

    let response = app
        .router
        .clone()
        .oneshot(authed_get(IP, "/api/roles/admin/permissions", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["permissions"].as_array().unwrap().len(),
        permissions::ALL.len()
    );

    let response = app
        .router
        .oneshot(authed_get(IP, "/api/roles", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["roles"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_flush_permission_cache() {
    let app = setup_test_app().await;
    let manager = create_test_user(&app, "manager@example.com", "manager", None).await;
    let token = token_for(&manager, &app);

    // Resolving the manager's own grants populates the cache.
    let response = app
        .router
        .clone()
        .oneshot(authed_get(IP, "/api/auth/me", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!app.state.permissions.is_empty());

    let request = request_from(
        IP,
        Request::builder()
            .method("POST")
            .uri("/api/admin/cache/permissions/flush")
            .header("authorization", format!("Bearer {token}")),
        Body::empty(),
    );
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.state.permissions.is_empty());
}
