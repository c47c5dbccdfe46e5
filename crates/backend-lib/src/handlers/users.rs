//! Account listing, search and self-service updates.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use social_common::{Page, User, UserCreate, UserUpdate};

use super::{active_user, touch};
use crate::auth::password::hash_password_blocking;
use crate::auth::Identity;
use crate::error::AppError;
use crate::models::UserRecord;
use crate::storage::{repo, Filter, FindOptions, ID_FIELD};
use crate::validation::{validate_search_query, ValidatedJson};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/search", get(search_users))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: String,
}

fn page_options(page: &Page) -> FindOptions {
    FindOptions::new()
        .sort_asc("created_at")
        .skip(page.skip)
        .limit(page.clamped_limit())
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    _identity: Identity,
    Query(page): Query<Page>,
) -> Result<Json<Vec<User>>, AppError> {
    let records: Vec<UserRecord> = repo::find(
        state.store.as_ref(),
        &Filter::eq("is_active", true),
        &page_options(&page),
    )
    .await?;
    Ok(Json(records.into_iter().map(|r| r.user).collect()))
}

async fn search_users(
    State(state): State<Arc<AppState>>,
    _identity: Identity,
    Query(params): Query<SearchParams>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<User>>, AppError> {
    let q = validate_search_query(&params.q)?;
    let filter = Filter::eq("is_active", true).and(Filter::any(vec![
        Filter::matches("username", q),
        Filter::matches("first_name", q),
        Filter::matches("last_name", q),
        Filter::matches("email", q),
    ]));
    let records: Vec<UserRecord> =
        repo::find(state.store.as_ref(), &filter, &page_options(&page)).await?;
    Ok(Json(records.into_iter().map(|r| r.user).collect()))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    _identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    Ok(Json(active_user(state.store.as_ref(), &id).await?.user))
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ValidatedJson(payload): ValidatedJson<UserCreate>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = super::auth::create_account(&state, payload).await?;
    tracing::info!(user_id = %user.id, created_by = %identity.user_id, "account created");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UserUpdate>,
) -> Result<Json<User>, AppError> {
    let store = state.store.as_ref();
    active_user(store, &id).await?;
    if !identity.is_self_or_admin(&id) {
        return Err(AppError::Forbidden("Not authorized to update this user".to_string()));
    }

    let mut update = touch();
    if let Some(email) = &payload.email {
        let clash = Filter::eq("email", email.as_str()).and(Filter::ne(ID_FIELD, id.as_str()));
        if repo::count::<UserRecord>(store, &clash).await? > 0 {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        update = update.set("email", email.as_str());
    }
    if let Some(username) = &payload.username {
        update = update.set("username", username.as_str());
    }
    if let Some(first_name) = &payload.first_name {
        update = update.set("first_name", first_name.as_str());
    }
    if let Some(last_name) = &payload.last_name {
        update = update.set("last_name", last_name.as_str());
    }
    if let Some(picture) = &payload.profile_picture {
        update = update.set("profile_picture", picture.as_str());
    }
    if let Some(password) = payload.password {
        let hashed = hash_password_blocking(password)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        update = update.set("hashed_password", hashed);
    }

    let record: UserRecord = repo::update(store, &repo::active(&id), &update)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(record.user))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let store = state.store.as_ref();
    active_user(store, &id).await?;
    if !identity.is_self_or_admin(&id) {
        return Err(AppError::Forbidden("Not authorized to delete this user".to_string()));
    }

    repo::update::<UserRecord>(store, &repo::active(&id), &touch().set("is_active", false)).await?;
    tracing::info!(user_id = %id, deleted_by = %identity.user_id, "user deactivated");
    Ok(StatusCode::NO_CONTENT)
}
