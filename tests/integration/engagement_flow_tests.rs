// =========================================
// tests/integration/engagement_flow_tests.rs
// =========================================
//! Albums, polls, tickets and shopping lists attached to an event
use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::test_utils::{event_payload, TestApp, TestUser};

/// Admin, one participant, one outsider and a public event.
async fn event_with_people(app: &TestApp) -> (TestUser, TestUser, TestUser, String) {
    let admin = app.admin().await;
    let guest = app.signup("guest@example.com", "guest").await;
    let outsider = app.signup("outsider@example.com", "outsider").await;
    let event_id = app.create_event(&admin, event_payload("Festival")).await;
    let (status, _) = app
        .post(&format!("/api/v1/events/{event_id}/join"), &guest.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    (admin, guest, outsider, event_id)
}

fn buyer() -> Value {
    json!({ "first_name": "Gus", "last_name": "Guest", "email": "guest@example.com" })
}

#[tokio::test]
async fn test_album_photo_comment_flow() {
    let app = TestApp::new().await;
    let (_admin, guest, outsider, event_id) = event_with_people(&app).await;
    let album = json!({ "event_id": event_id, "name": "Day one" });

    let (status, _) = app.post("/api/v1/albums", &outsider.token, album.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app.post("/api/v1/albums", &guest.token, album.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let album_id = created["id"].as_str().unwrap();

    let (status, _) = app.post("/api/v1/albums", &guest.token, album).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, photo) = app
        .post(
            "/api/v1/albums/photos",
            &guest.token,
            json!({ "album_id": album_id, "image_url": "https://img.example.com/1.jpg" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let photo_id = photo["id"].as_str().unwrap();
    assert_eq!(photo["event_id"], event_id.as_str());

    let comments = format!("/api/v1/albums/photos/{photo_id}/comments");
    let (status, _) = app.post(&comments, &outsider.token, json!({ "content": "Nice" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.post(&comments, &guest.token, json!({ "content": "Nice" })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, listed) = app.get(&comments, &guest.token).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (_, photos) = app
        .get(&format!("/api/v1/albums/{album_id}/photos"), &guest.token)
        .await;
    assert_eq!(photos[0]["comment_count"], 1);

    let (_, albums) = app
        .get(&format!("/api/v1/albums/events/{event_id}"), &guest.token)
        .await;
    assert_eq!(albums[0]["photo_count"], 1);
}

#[tokio::test]
async fn test_poll_voting() {
    let app = TestApp::new().await;
    let (admin, guest, outsider, event_id) = event_with_people(&app).await;
    let poll = json!({
        "event_id": event_id,
        "title": "Dinner",
        "questions": [{ "text": "Cuisine?", "answers": ["Thai", "Tacos"] }]
    });

    // only organizers create polls
    let (status, _) = app.post("/api/v1/polls", &guest.token, poll.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app.post("/api/v1/polls", &admin.token, poll).await;
    assert_eq!(status, StatusCode::CREATED);
    let poll_id = created["id"].as_str().unwrap();
    let question_id = created["questions"][0]["id"].as_str().unwrap();
    assert_eq!(created["questions"][0]["response_counts"]["Thai"], 0);

    let vote = |answer: &str| json!({ "poll_id": poll_id, "question_id": question_id, "answer": answer });

    let (status, response) = app.post("/api/v1/polls/vote", &guest.token, vote("Thai")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], true);
    assert_eq!(response["chosen_answer"], "Thai");
    assert_eq!(response["total_votes"], 1);

    let (status, _) = app.post("/api/v1/polls/vote", &guest.token, vote("Tacos")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.post("/api/v1/polls/vote", &admin.token, vote("Sushi")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.post("/api/v1/polls/vote", &outsider.token, vote("Thai")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, response) = app.post("/api/v1/polls/vote", &admin.token, vote("Tacos")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["total_votes"], 2);

    let (_, poll) = app.get(&format!("/api/v1/polls/{poll_id}"), &guest.token).await;
    assert_eq!(poll["total_responses"], 2);
    assert_eq!(poll["questions"][0]["response_counts"]["Thai"], 1);
    assert_eq!(poll["questions"][0]["response_counts"]["Tacos"], 1);

    let (_, polls) = app
        .get(&format!("/api/v1/polls/events/{event_id}"), &guest.token)
        .await;
    assert_eq!(polls.as_array().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_votes_are_all_counted() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let event_id = app.create_event(&admin, event_payload("Town hall")).await;
    let (_, created) = app
        .post(
            "/api/v1/polls",
            &admin.token,
            json!({
                "event_id": event_id,
                "title": "Agenda",
                "questions": [{ "text": "First topic?", "answers": ["Parks", "Roads"] }]
            }),
        )
        .await;
    let poll_id = created["id"].as_str().unwrap().to_string();
    let question_id = created["questions"][0]["id"].as_str().unwrap().to_string();

    let mut voters = Vec::new();
    for n in 0..4 {
        let voter = app.signup(&format!("voter{n}@example.com"), &format!("voter{n}")).await;
        app.post(&format!("/api/v1/events/{event_id}/join"), &voter.token, json!({}))
            .await;
        voters.push(voter);
    }

    let mut handles = Vec::new();
    for voter in voters {
        let app = app.clone();
        let vote = json!({ "poll_id": poll_id, "question_id": question_id, "answer": "Parks" });
        handles.push(tokio::spawn(async move {
            app.post("/api/v1/polls/vote", &voter.token, vote).await.0
        }));
    }
    let mut accepted = 0u64;
    for handle in handles {
        if handle.await.unwrap() == StatusCode::OK {
            accepted += 1;
        }
    }
    // one vote per voter, none lost to counter contention
    assert_eq!(accepted, 4);

    let (_, poll) = app.get(&format!("/api/v1/polls/{poll_id}"), &admin.token).await;
    assert_eq!(poll["total_responses"], 4);
    assert_eq!(poll["questions"][0]["response_counts"]["Parks"], 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_repeat_votes_count_once() {
    let app = TestApp::new().await;
    let (admin, guest, _outsider, event_id) = event_with_people(&app).await;
    let (_, created) = app
        .post(
            "/api/v1/polls",
            &admin.token,
            json!({
                "event_id": event_id,
                "title": "Headliner",
                "questions": [{ "text": "Who closes?", "answers": ["Band", "DJ"] }]
            }),
        )
        .await;
    let poll_id = created["id"].as_str().unwrap().to_string();
    let question_id = created["questions"][0]["id"].as_str().unwrap().to_string();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let app = app.clone();
        let token = guest.token.clone();
        let vote = json!({ "poll_id": poll_id, "question_id": question_id, "answer": "DJ" });
        handles.push(tokio::spawn(async move {
            app.post("/api/v1/polls/vote", &token, vote).await.0
        }));
    }
    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::BAD_REQUEST).count(), 7);

    let (_, poll) = app.get(&format!("/api/v1/polls/{poll_id}"), &admin.token).await;
    assert_eq!(poll["total_responses"], 1);
    assert_eq!(poll["questions"][0]["response_counts"]["DJ"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_purchases_respect_per_person_limit() {
    let app = TestApp::new().await;
    let (admin, guest, _outsider, event_id) = event_with_people(&app).await;
    let (_, created) = app
        .post(
            "/api/v1/tickets/types",
            &admin.token,
            json!({
                "event_id": event_id,
                "name": "Weekend pass",
                "price": 40.0,
                "quantity": 10,
                "max_per_person": 2
            }),
        )
        .await;
    let type_id = created["id"].as_str().unwrap().to_string();
    let purchase = json!({ "ticket_type_id": type_id, "buyer_info": buyer() });

    let mut handles = Vec::new();
    for _ in 0..6 {
        let app = app.clone();
        let token = guest.token.clone();
        let purchase = purchase.clone();
        handles.push(tokio::spawn(async move {
            app.post("/api/v1/tickets/purchase", &token, purchase).await.0
        }));
    }
    let mut bought = 0;
    for handle in handles {
        if handle.await.unwrap() == StatusCode::OK {
            bought += 1;
        }
    }
    assert!(bought <= 2);

    // top up sequentially until the limit bites
    while bought < 3 {
        let (status, _) = app
            .post("/api/v1/tickets/purchase", &guest.token, purchase.clone())
            .await;
        if status != StatusCode::OK {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            break;
        }
        bought += 1;
    }
    assert_eq!(bought, 2);

    let (_, mine) = app
        .get(&format!("/api/v1/tickets/user/{}", guest.id), &guest.token)
        .await;
    assert_eq!(mine.as_array().unwrap().len(), 2);
    let (_, types) = app
        .get(&format!("/api/v1/tickets/types/events/{event_id}"), &guest.token)
        .await;
    assert_eq!(types[0]["sold_count"], 2);
}

#[tokio::test]
async fn test_private_event_extras_hidden_from_outsiders() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let guest = app.signup("guest@example.com", "guest").await;
    let outsider = app.signup("outsider@example.com", "outsider").await;

    let mut payload = event_payload("Private dinner");
    payload["privacy"] = json!("private");
    payload["members"] = json!([guest.id]);
    let event_id = app.create_event(&admin, payload).await;

    let (_, album) = app
        .post("/api/v1/albums", &admin.token, json!({ "event_id": event_id, "name": "Menu" }))
        .await;
    let album_id = album["id"].as_str().unwrap();
    let (_, photo) = app
        .post(
            "/api/v1/albums/photos",
            &admin.token,
            json!({ "album_id": album_id, "image_url": "https://img.example.com/menu.jpg" }),
        )
        .await;
    let photo_id = photo["id"].as_str().unwrap();
    let (_, poll) = app
        .post(
            "/api/v1/polls",
            &admin.token,
            json!({
                "event_id": event_id,
                "title": "Dessert",
                "questions": [{ "text": "Which?", "answers": ["Flan", "Tart"] }]
            }),
        )
        .await;
    let poll_id = poll["id"].as_str().unwrap();
    let (_, ticket_type) = app
        .post(
            "/api/v1/tickets/types",
            &admin.token,
            json!({ "event_id": event_id, "name": "Seat", "price": 25.0, "quantity": 8 }),
        )
        .await;
    let type_id = ticket_type["id"].as_str().unwrap();

    let reads = [
        format!("/api/v1/albums/events/{event_id}"),
        format!("/api/v1/albums/{album_id}/photos"),
        format!("/api/v1/albums/photos/{photo_id}/comments"),
        format!("/api/v1/polls/events/{event_id}"),
        format!("/api/v1/polls/{poll_id}"),
        format!("/api/v1/tickets/types/events/{event_id}"),
    ];
    for uri in &reads {
        let (status, _) = app.get(uri, &outsider.token).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        let (status, _) = app.get(uri, &guest.token).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }

    let purchase = json!({ "ticket_type_id": type_id, "buyer_info": buyer() });
    let (status, _) = app
        .post("/api/v1/tickets/purchase", &outsider.token, purchase)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_ticket_sales() {
    let app = TestApp::new().await;
    let (admin, guest, outsider, event_id) = event_with_people(&app).await;

    let ticket_type = json!({ "event_id": event_id, "name": "Early bird", "price": 10.0, "quantity": 2 });
    let (status, _) = app.post("/api/v1/tickets/types", &guest.token, ticket_type.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, created) = app.post("/api/v1/tickets/types", &admin.token, ticket_type).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["max_per_person"], 1);
    let type_id = created["id"].as_str().unwrap();
    let purchase = json!({ "ticket_type_id": type_id, "buyer_info": buyer() });

    let (status, ticket) = app
        .post("/api/v1/tickets/purchase", &guest.token, purchase.clone())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ticket["buyer_id"], guest.id.as_str());
    assert_eq!(ticket["is_valid"], true);
    let number = ticket["ticket_number"].as_str().unwrap();
    assert!(number.starts_with("TKT-"));
    assert_eq!(number.split('-').count(), 4);

    // one per person
    let (status, _) = app
        .post("/api/v1/tickets/purchase", &guest.token, purchase.clone())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/v1/tickets/purchase", &outsider.token, purchase.clone())
        .await;
    assert_eq!(status, StatusCode::OK);

    // sold out
    let (status, _) = app
        .post("/api/v1/tickets/purchase", &admin.token, purchase)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, types) = app
        .get(&format!("/api/v1/tickets/types/events/{event_id}"), &guest.token)
        .await;
    assert_eq!(types[0]["sold_count"], 2);
    assert_eq!(types[0]["available_count"], 0);

    let (status, mine) = app
        .get(&format!("/api/v1/tickets/user/{}", guest.id), &guest.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
    let (status, _) = app
        .get(&format!("/api/v1/tickets/user/{}", guest.id), &outsider.token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_ticket_type_rejected() {
    let app = TestApp::new().await;
    let (admin, _guest, _outsider, event_id) = event_with_people(&app).await;

    let (status, body) = app
        .post(
            "/api/v1/tickets/types",
            &admin.token,
            json!({ "event_id": event_id, "name": "Free", "price": -1.0, "quantity": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let details = body["error"]["details"].as_array().unwrap();
    assert!(details.iter().any(|d| d["field"] == "price"));
    assert!(details.iter().any(|d| d["field"] == "quantity"));
}

#[tokio::test]
async fn test_shopping_list() {
    let app = TestApp::new().await;
    let (_admin, guest, outsider, event_id) = event_with_people(&app).await;
    let list = format!("/api/v1/shopping/events/{event_id}");

    let chips = json!({ "event_id": event_id, "name": "Chips", "quantity": 3, "arrival_time": "18:30:00" });
    let (status, _) = app.post("/api/v1/shopping", &outsider.token, chips.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, item) = app.post("/api/v1/shopping", &guest.token, chips.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["is_brought"], false);
    let item_id = item["id"].as_str().unwrap();

    let (status, _) = app.post("/api/v1/shopping", &guest.token, chips).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, soda) = app
        .post(
            "/api/v1/shopping",
            &guest.token,
            json!({ "event_id": event_id, "name": "Soda", "quantity": 6, "unit": "cans" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, updated) = app
        .put(&format!("/api/v1/shopping/{item_id}"), &guest.token, json!({ "is_brought": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["is_brought"], true);
    assert_eq!(updated["quantity"], 3);

    // renaming onto another item's name conflicts
    let (status, _) = app
        .put(&format!("/api/v1/shopping/{}", soda["id"].as_str().unwrap()), &guest.token, json!({ "name": "Chips" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, summary) = app.get(&list, &guest.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_items"], 2);
    assert_eq!(summary["brought_items"], 1);
    assert_eq!(summary["pending_items"], 1);

    let (status, _) = app.get(&list, &outsider.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
