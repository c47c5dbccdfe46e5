// ======================================
// tests/integration/persistence_tests.rs
// ======================================
//! Data written through the API survives reopening the flat-file store
use axum::http::StatusCode;
use serde_json::json;
use tempfile::TempDir;

use crate::test_utils::{event_payload, TestApp, PASSWORD};

#[tokio::test]
async fn test_accounts_and_events_survive_restart() {
    let temp_dir = TempDir::new().unwrap();

    let (event_id, ann_id) = {
        let app = TestApp::on_disk(temp_dir.path()).await;
        let admin = app.admin().await;
        let ann = app.signup("ann@example.com", "ann").await;
        let event_id = app.create_event(&admin, event_payload("Reunion")).await;
        app.post(&format!("/api/v1/events/{event_id}/join"), &ann.token, json!({}))
            .await;
        app.state.store.close().await.unwrap();
        (event_id, ann.id)
    };

    let app = TestApp::on_disk(temp_dir.path()).await;
    let token = app.login("ann@example.com", PASSWORD).await;

    let (status, event) = app.get(&format!("/api/v1/events/{event_id}"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["name"], "Reunion");
    assert!(event["members"].as_array().unwrap().contains(&json!(ann_id)));

    // the unique email index is rebuilt on open
    let (status, _) = app
        .request(
            axum::http::Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": "ann@example.com", "username": "ann2", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_soft_deleted_users_stay_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let app = TestApp::on_disk(temp_dir.path()).await;
    let admin = app.admin().await;
    let bob = app.signup("bob@example.com", "bob").await;

    let (status, _) = app
        .delete(&format!("/api/v1/users/{}", bob.id), &admin.token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/v1/users/{}", bob.id), &admin.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let users_dir = temp_dir.path().join("users");
    assert!(users_dir.join(format!("{}.json", bob.id)).exists());
}
