// =================================
// tests/integration/auth_flow_tests.rs
// =================================
//! Registration, login and bearer-token flows against the full router
use axum::http::{Method, StatusCode};
use serde_json::json;
use social_backend::storage::{collections, Filter};

use crate::test_utils::{TestApp, PASSWORD};

#[tokio::test]
async fn test_register_login_and_me() {
    let app = TestApp::new().await;

    let (status, user) = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "email": "Ann@Example.com",
                "username": "ann",
                "password": PASSWORD,
                "first_name": "Ann"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "ann@example.com");
    assert_eq!(user["role"], "user");
    assert_eq!(user["is_active"], true);
    assert!(user.get("hashed_password").is_none());
    assert!(user.get("password").is_none());

    let (status, token) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "ann@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(token["token_type"], "bearer");
    assert_eq!(token["user_id"], user["id"]);

    let access_token = token["access_token"].as_str().unwrap();
    let (status, me) = app.get("/api/v1/auth/me", access_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], user["id"]);
    assert_eq!(me["first_name"], "Ann");
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = TestApp::new().await;
    app.signup("bob@example.com", "bob").await;

    // same address, different case
    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": "BOB@example.com", "username": "bobby", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT_001");
}

#[tokio::test]
async fn test_invalid_registration_creates_nothing() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": "not-an-email", "username": "x", "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VAL_001");
    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v["field"].as_str())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"username"));
    assert!(fields.contains(&"password"));

    let users = app
        .state
        .store
        .count(collections::USERS, &Filter::All)
        .await
        .unwrap();
    assert_eq!(users, 0);
}

#[tokio::test]
async fn test_wrong_password_rejected() {
    let app = TestApp::new().await;
    app.signup("carol@example.com", "carol").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "carol@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_002");

    // unknown accounts look the same
    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_002");
}

#[tokio::test]
async fn test_login_lockout() {
    let app = TestApp::new().await;
    app.signup("dave@example.com", "dave").await;

    for _ in 0..5 {
        let (status, _) = app
            .request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "email": "dave@example.com", "password": "wrong-password" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // even the right password is refused while locked
    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "dave@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "AUTH_003");
}

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/api/v1/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_001");

    let (status, _) = app.get("/api/v1/events", "garbage.token.value").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deactivated_account_loses_access() {
    let app = TestApp::new().await;
    let erin = app.signup("erin@example.com", "erin").await;

    let (status, _) = app
        .delete(&format!("/api/v1/users/{}", erin.id), &erin.token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // the token still verifies but the account is gone
    let (status, _) = app.get("/api/v1/auth/me", &erin.token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "erin@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Inactive user"));
}

#[tokio::test]
async fn test_admin_role_from_configured_email() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let (status, me) = app.get("/api/v1/auth/me", &admin.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "admin");
}

#[tokio::test]
async fn test_health_and_root() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    let (status, body) = app.request(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_username_length_checked_after_trimming() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": "pad@example.com", "username": "   a    ", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"][0]["field"], "username");
    let users = app.state.store.count(collections::USERS, &Filter::All).await.unwrap();
    assert_eq!(users, 0);

    let (status, user) = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": "pad@example.com", "username": "  ann  ", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["username"], "ann");

    let token = app.login("pad@example.com", PASSWORD).await;
    let uri = format!("/api/v1/users/{}", user["id"].as_str().unwrap());
    let (status, _) = app.put(&uri, &token, json!({ "username": "  x  " })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, updated) = app.put(&uri, &token, json!({ "username": " annie " })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["username"], "annie");
}

#[tokio::test]
async fn test_user_search() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let ann = app.signup("ann@example.com", "ann").await;
    let annabel = app.signup("annabel@example.com", "annabel").await;
    app.signup("bob@example.com", "bob").await;

    let (status, found) = app.get("/api/v1/users/search?q=ANN", &ann.token).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["ann", "annabel"]);

    let (status, _) = app.get("/api/v1/users/search?q=%20a%20", &ann.token).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // deactivated accounts drop out of results
    let (status, _) = app
        .delete(&format!("/api/v1/users/{}", annabel.id), &admin.token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, found) = app.get("/api/v1/users/search?q=ann", &ann.token).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["id"], ann.id.as_str());
}
