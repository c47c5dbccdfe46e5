// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP router: health checks plus the versioned API.
use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{albums, auth, discussions, events, groups, polls, shopping, tickets, users};
use crate::middleware::rate_limit;
use crate::AppState;

pub const API_PREFIX: &str = "/api/v1";

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/events", events::router())
        .nest("/groups", groups::router())
        .nest("/discussions", discussions::router())
        .nest("/albums", albums::router())
        .nest("/polls", polls::router())
        .nest("/tickets", tickets::router())
        .nest("/shopping", shopping::router());

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest(API_PREFIX, api)
        .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Social network API",
        "version": env!("CARGO_PKG_VERSION"),
        "api": API_PREFIX,
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let database = if state.store.ping().await {
        "connected"
    } else {
        "disconnected"
    };
    Json(json!({
        "status": "healthy",
        "database": database,
    }))
}
