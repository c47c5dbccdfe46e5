//! Event albums, photos (by URL) and photo comments.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use social_common::{
    generate_id, Album, AlbumCreate, Comment, CommentCreate, Photo, PhotoCreate,
};

use super::{active_event, require_participant, touch, viewable_event};
use crate::auth::Identity;
use crate::error::AppError;
use crate::storage::{repo, DocumentStore, Filter, FindOptions};
use crate::validation::ValidatedJson;
use crate::{metrics, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_album))
        .route("/events/{event_id}", get(event_albums))
        .route("/{id}/photos", get(album_photos))
        .route("/photos", post(add_photo))
        .route(
            "/photos/{photo_id}/comments",
            get(photo_comments).post(add_comment),
        )
}

async fn active_album(store: &dyn DocumentStore, id: &str) -> Result<Album, AppError> {
    repo::find_one(store, &repo::active(id))
        .await?
        .ok_or_else(|| AppError::not_found("Album"))
}

async fn active_photo(store: &dyn DocumentStore, id: &str) -> Result<Photo, AppError> {
    repo::find_one(store, &repo::active(id))
        .await?
        .ok_or_else(|| AppError::not_found("Photo"))
}

async fn event_albums(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<Album>>, AppError> {
    let store = state.store.as_ref();
    viewable_event(store, &identity, &event_id).await?;
    let filter = Filter::eq("event_id", event_id).and(Filter::eq("is_active", true));
    let albums = repo::find(store, &filter, &FindOptions::new().sort_asc("created_at")).await?;
    Ok(Json(albums))
}

async fn create_album(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ValidatedJson(payload): ValidatedJson<AlbumCreate>,
) -> Result<(StatusCode, Json<Album>), AppError> {
    let store = state.store.as_ref();
    let event = active_event(store, &payload.event_id).await?;
    require_participant(&identity, &event, "create album")?;

    let same_name = Filter::eq("event_id", payload.event_id.as_str())
        .and(Filter::eq("name", payload.name.as_str()))
        .and(Filter::eq("is_active", true));
    if repo::count::<Album>(store, &same_name).await? > 0 {
        return Err(AppError::Conflict(
            "An album with this name already exists for this event".to_string(),
        ));
    }

    let now = Utc::now();
    let album = Album {
        id: generate_id("album"),
        event_id: payload.event_id,
        name: payload.name,
        description: payload.description,
        creator_id: identity.user_id.clone(),
        photo_count: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    repo::insert(store, &album).await?;

    metrics::resource_created("album");
    Ok((StatusCode::CREATED, Json(album)))
}

async fn album_photos(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Vec<Photo>>, AppError> {
    let store = state.store.as_ref();
    let album = active_album(store, &id).await?;
    viewable_event(store, &identity, &album.event_id).await?;
    let filter = Filter::eq("album_id", id).and(Filter::eq("is_active", true));
    let photos = repo::find(store, &filter, &FindOptions::new().sort_desc("created_at")).await?;
    Ok(Json(photos))
}

async fn add_photo(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ValidatedJson(payload): ValidatedJson<PhotoCreate>,
) -> Result<(StatusCode, Json<Photo>), AppError> {
    let store = state.store.as_ref();
    let album = active_album(store, &payload.album_id).await?;
    let event = active_event(store, &album.event_id).await?;
    require_participant(&identity, &event, "add photos")?;

    let now = Utc::now();
    let photo = Photo {
        id: generate_id("photo"),
        album_id: album.id.clone(),
        event_id: album.event_id,
        author_id: identity.user_id.clone(),
        caption: payload.caption,
        image_url: payload.image_url,
        like_count: 0,
        comment_count: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    repo::insert(store, &photo).await?;
    repo::update::<Album>(store, &Filter::id(album.id), &touch().inc("photo_count", 1)).await?;

    metrics::resource_created("photo");
    Ok((StatusCode::CREATED, Json(photo)))
}

async fn photo_comments(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(photo_id): Path<String>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let store = state.store.as_ref();
    let photo = active_photo(store, &photo_id).await?;
    viewable_event(store, &identity, &photo.event_id).await?;
    let comments = repo::find(
        store,
        &Filter::eq("photo_id", photo_id),
        &FindOptions::new().sort_asc("created_at"),
    )
    .await?;
    Ok(Json(comments))
}

async fn add_comment(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(photo_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<CommentCreate>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let store = state.store.as_ref();
    let photo = active_photo(store, &photo_id).await?;
    let event = active_event(store, &photo.event_id).await?;
    require_participant(&identity, &event, "comment on photos")?;

    let now = Utc::now();
    let comment = Comment {
        id: generate_id("comment"),
        photo_id: photo.id.clone(),
        author_id: identity.user_id.clone(),
        content: payload.content,
        is_edited: false,
        created_at: now,
        updated_at: now,
    };
    repo::insert(store, &comment).await?;
    repo::update::<Photo>(store, &Filter::id(photo.id), &touch().inc("comment_count", 1)).await?;

    metrics::resource_created("comment");
    Ok((StatusCode::CREATED, Json(comment)))
}
