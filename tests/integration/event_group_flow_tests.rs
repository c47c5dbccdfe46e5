// =========================================
// tests/integration/event_group_flow_tests.rs
// =========================================
//! Membership, visibility and discussion flows on events and groups
use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::test_utils::{event_payload, group_payload, TestApp};

fn ids(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_join_public_event() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let ann = app.signup("ann@example.com", "ann").await;
    let event_id = app.create_event(&admin, event_payload("Picnic")).await;
    let join = format!("/api/v1/events/{event_id}/join");

    let (status, event) = app.post(&join, &ann.token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(event["members"].as_array().unwrap().contains(&json!(ann.id)));

    let (status, _) = app.post(&join, &ann.token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // the creator is already an organizer
    let (status, _) = app.post(&join, &admin.token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, detail) = app.get(&format!("/api/v1/events/{event_id}"), &ann.token).await;
    assert_eq!(detail["participant_count"], 2);
    assert_eq!(detail["member_details"][0]["username"], "ann");

    let (_, mine) = app.get(&format!("/api/v1/events/user/{}", ann.id), &ann.token).await;
    assert_eq!(ids(&mine), vec![event_id]);
}

#[tokio::test]
async fn test_private_event_visibility() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let ann = app.signup("ann@example.com", "ann").await;
    let bob = app.signup("bob@example.com", "bob").await;

    let mut payload = event_payload("Surprise party");
    payload["privacy"] = json!("private");
    payload["members"] = json!([ann.id]);
    let event_id = app.create_event(&admin, payload).await;
    let public_id = app.create_event(&admin, event_payload("Open day")).await;
    let uri = format!("/api/v1/events/{event_id}");

    let (status, _) = app.get(&uri, &ann.token).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&uri, &bob.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.post(&format!("{uri}/join"), &bob.token, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // listings default to public events only
    let (_, listed) = app.get("/api/v1/events", &ann.token).await;
    assert_eq!(ids(&listed), vec![public_id.clone()]);

    let (_, listed) = app.get("/api/v1/events?public_only=false", &ann.token).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);
    let (_, listed) = app.get("/api/v1/events?public_only=false", &bob.token).await;
    assert_eq!(ids(&listed), vec![public_id]);
}

#[tokio::test]
async fn test_event_with_unknown_people_rejected() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let mut payload = event_payload("Ghost town");
    payload["organizers"] = json!(["user_missing"]);
    let (status, _) = app.post("/api/v1/events", &admin.token, payload).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut payload = event_payload("Orphan");
    payload["group_id"] = json!("group_missing");
    let (status, _) = app.post("/api/v1/events", &admin.token, payload).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_configuration_step() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let ann = app.signup("ann@example.com", "ann").await;
    let event_id = app.create_event(&admin, event_payload("Draft")).await;

    let mut config = event_payload("Final name");
    config["organizers"] = json!([ann.id]);
    let (status, event) = app
        .post(&format!("/api/v1/events/{event_id}/config"), &admin.token, config)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["name"], "Final name");
    let organizers = event["organizers"].as_array().unwrap();
    assert!(organizers.contains(&json!(ann.id)));
    assert!(organizers.contains(&json!(admin.id)));
}

#[tokio::test]
async fn test_update_keeps_creator_as_organizer() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let ann = app.signup("ann@example.com", "ann").await;
    let event_id = app.create_event(&admin, event_payload("Launch")).await;

    let (status, event) = app
        .put(
            &format!("/api/v1/events/{event_id}"),
            &admin.token,
            json!({ "organizers": [ann.id] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let organizers = event["organizers"].as_array().unwrap();
    assert_eq!(organizers.len(), 2);
    assert!(organizers.contains(&json!(ann.id)));
    assert!(organizers.contains(&json!(admin.id)));
}

#[tokio::test]
async fn test_group_membership() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let ann = app.signup("ann@example.com", "ann").await;
    let group_id = app.create_group(&admin, group_payload("Hikers")).await;
    let uri = format!("/api/v1/groups/{group_id}");

    let (status, _) = app.post(&format!("{uri}/join"), &ann.token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.post(&format!("{uri}/join"), &ann.token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, detail) = app.get(&uri, &ann.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["member_count"], 1);
    assert_eq!(detail["event_count"], 0);
    assert_eq!(detail["admin_details"][0]["email"], admin.email.as_str());

    // the only administrator may not leave
    let (status, _) = app.post(&format!("{uri}/leave"), &admin.token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, group) = app
        .post(&format!("{uri}/promote/{}", ann.id), &admin.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(group["admin_ids"].as_array().unwrap().contains(&json!(ann.id)));
    let (status, _) = app
        .post(&format!("{uri}/promote/{}", ann.id), &admin.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, group) = app.post(&format!("{uri}/leave"), &admin.token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!group["admin_ids"].as_array().unwrap().contains(&json!(admin.id)));

    let (status, group) = app.post(&format!("{uri}/leave"), &ann.token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "sole admin again: {group}");
}

#[tokio::test]
async fn test_secret_groups_stay_hidden() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let ann = app.signup("ann@example.com", "ann").await;

    let mut payload = group_payload("Inner circle");
    payload["type"] = json!("secret");
    let secret_id = app.create_group(&admin, payload).await;
    let public_id = app.create_group(&admin, group_payload("Everyone")).await;

    let (_, listed) = app.get("/api/v1/groups", &ann.token).await;
    assert_eq!(ids(&listed), vec![public_id]);
    let (_, listed) = app.get("/api/v1/groups?group_type=secret", &ann.token).await;
    assert!(listed.as_array().unwrap().is_empty());
    let (_, listed) = app.get("/api/v1/groups?group_type=secret", &admin.token).await;
    assert_eq!(ids(&listed), vec![secret_id.clone()]);

    let uri = format!("/api/v1/groups/{secret_id}");
    let (status, _) = app.get(&uri, &ann.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.post(&format!("{uri}/join"), &ann.token, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_auto_invite_pulls_group_members() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let ann = app.signup("ann@example.com", "ann").await;
    let group_id = app.create_group(&admin, group_payload("Runners")).await;
    app.post(&format!("/api/v1/groups/{group_id}/join"), &ann.token, json!({}))
        .await;

    let mut payload = event_payload("Group run");
    payload["group_id"] = json!(group_id);
    payload["auto_invite"] = json!(true);
    let (status, event) = app.post("/api/v1/events", &admin.token, payload).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(event["members"].as_array().unwrap().contains(&json!(ann.id)));

    let (_, detail) = app.get(&format!("/api/v1/groups/{group_id}"), &ann.token).await;
    assert_eq!(detail["event_count"], 1);
}

#[tokio::test]
async fn test_group_discussion_thread() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let ann = app.signup("ann@example.com", "ann").await;
    let bob = app.signup("bob@example.com", "bob").await;
    let group_id = app.create_group(&admin, group_payload("Readers")).await;
    app.post(&format!("/api/v1/groups/{group_id}/join"), &ann.token, json!({}))
        .await;

    let discussion = json!({
        "title": "Next book",
        "discussion_type": "group",
        "linked_id": group_id,
    });
    let (status, _) = app
        .post("/api/v1/discussions", &bob.token, discussion.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app.post("/api/v1/discussions", &ann.token, discussion).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap();
    assert!(id.starts_with("disc"));
    let messages = format!("/api/v1/discussions/{id}/messages");

    let (status, first) = app
        .post(&messages, &ann.token, json!({ "content": "Dune?" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .post(
            &messages,
            &admin.token,
            json!({ "content": "Seconded", "parent_message_id": first["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .post(
            &messages,
            &ann.token,
            json!({ "content": "Orphan", "parent_message_id": "msg_missing" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, detail) = app.get(&format!("/api/v1/discussions/{id}"), &ann.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["message_count"], 2);
    assert_eq!(detail["last_messages"].as_array().unwrap().len(), 2);
    assert_eq!(detail["author_details"]["username"], "ann");

    let (_, listed) = app
        .get(
            &format!("/api/v1/discussions?linked_type=group&linked_id={group_id}"),
            &ann.token,
        )
        .await;
    assert_eq!(ids(&listed), vec![id.to_string()]);
}

#[tokio::test]
async fn test_restricted_threads_stay_out_of_listings() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let ann = app.signup("ann@example.com", "ann").await;
    let bob = app.signup("bob@example.com", "bob").await;

    let mut secret = group_payload("Inner circle");
    secret["type"] = json!("secret");
    let secret_id = app.create_group(&admin, secret).await;
    let public_id = app.create_group(&admin, group_payload("Everyone")).await;

    let mut private = event_payload("Surprise party");
    private["privacy"] = json!("private");
    private["members"] = json!([ann.id]);
    let event_id = app.create_event(&admin, private).await;

    let thread = |title: &str, kind: &str, linked: &str| {
        json!({ "title": title, "discussion_type": kind, "linked_id": linked })
    };
    let (_, hidden) = app
        .post("/api/v1/discussions", &admin.token, thread("Secret plans", "group", &secret_id))
        .await;
    let (_, open) = app
        .post("/api/v1/discussions", &admin.token, thread("Trail maps", "group", &public_id))
        .await;
    let (status, party) = app
        .post("/api/v1/discussions", &ann.token, thread("Cake", "event", &event_id))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .get(
            &format!("/api/v1/discussions?linked_type=group&linked_id={secret_id}"),
            &bob.token,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .get(
            &format!("/api/v1/discussions?linked_type=event&linked_id={event_id}"),
            &bob.token,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, listed) = app.get("/api/v1/discussions", &bob.token).await;
    assert_eq!(ids(&listed), vec![open["id"].as_str().unwrap().to_string()]);

    let (_, listed) = app.get("/api/v1/discussions", &ann.token).await;
    let seen = ids(&listed);
    assert_eq!(seen.len(), 2);
    assert!(seen.contains(&party["id"].as_str().unwrap().to_string()));
    assert!(!seen.contains(&hidden["id"].as_str().unwrap().to_string()));

    let (_, listed) = app.get("/api/v1/discussions", &admin.token).await;
    assert_eq!(listed.as_array().unwrap().len(), 3);
}
