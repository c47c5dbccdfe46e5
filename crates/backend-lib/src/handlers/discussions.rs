//! Discussion threads on groups and events.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use social_common::{
    generate_id, Discussion, DiscussionCreate, DiscussionDetail, DiscussionType, Event, Group,
    Message, MessageCreate, Page, UserSummary,
};

use super::{can_view_event, can_view_group, events, groups, touch};
use crate::auth::Identity;
use crate::error::AppError;
use crate::models::UserRecord;
use crate::storage::{repo, DocumentStore, Filter, FindOptions};
use crate::validation::ValidatedJson;
use crate::{metrics, AppState};

/// Messages embedded in a discussion's detail view
const LAST_MESSAGES: u64 = 10;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_discussions).post(create_discussion))
        .route("/{id}", get(get_discussion))
        .route("/{id}/messages", post(create_message))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default)]
    linked_type: Option<DiscussionType>,
    #[serde(default)]
    linked_id: Option<String>,
}

async fn active_discussion(store: &dyn DocumentStore, id: &str) -> Result<Discussion, AppError> {
    repo::find_one(store, &repo::active(id))
        .await?
        .ok_or_else(|| AppError::not_found("Discussion"))
}

/// Threads on secret groups and private events are limited to their members.
async fn ensure_access(
    store: &dyn DocumentStore,
    identity: &Identity,
    linked_type: DiscussionType,
    linked_id: &str,
) -> Result<(), AppError> {
    if identity.is_admin() {
        return Ok(());
    }
    let allowed = match linked_type {
        DiscussionType::Group => repo::find_one::<Group>(store, &repo::active(linked_id))
            .await?
            .map_or(true, |group| can_view_group(identity, &group)),
        DiscussionType::Event => repo::find_one::<Event>(store, &repo::active(linked_id))
            .await?
            .map_or(true, |event| can_view_event(identity, &event)),
    };
    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not authorized to access this discussion".to_string()))
    }
}

/// Threads whose group or event `identity` can see.
async fn visible_threads(store: &dyn DocumentStore, identity: &Identity) -> Result<Filter, AppError> {
    let active = Filter::eq("is_active", true);
    let all = FindOptions::new();
    let visible_groups: Vec<Group> =
        repo::find(store, &active.clone().and(groups::visible_to(identity)), &all).await?;
    let visible_events: Vec<Event> =
        repo::find(store, &active.and(events::visible_to(identity)), &all).await?;
    Ok(Filter::any(vec![
        Filter::eq("discussion_type", DiscussionType::Group.as_str())
            .and(Filter::one_of("linked_id", visible_groups.into_iter().map(|g| g.id))),
        Filter::eq("discussion_type", DiscussionType::Event.as_str())
            .and(Filter::one_of("linked_id", visible_events.into_iter().map(|e| e.id))),
    ]))
}

async fn list_discussions(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Query(params): Query<ListParams>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Discussion>>, AppError> {
    let store = state.store.as_ref();
    let mut filter = Filter::eq("is_active", true);
    if let (Some(linked_type), Some(linked_id)) = (params.linked_type, params.linked_id) {
        ensure_access(store, &identity, linked_type, &linked_id).await?;
        filter = filter
            .and(Filter::eq("discussion_type", linked_type.as_str()))
            .and(Filter::eq("linked_id", linked_id));
    } else if !identity.is_admin() {
        filter = filter.and(visible_threads(store, &identity).await?);
    }
    let options = FindOptions::new()
        .sort_desc("is_pinned")
        .sort_desc("updated_at")
        .skip(page.skip)
        .limit(page.clamped_limit());
    let discussions = repo::find(store, &filter, &options).await?;
    Ok(Json(discussions))
}

async fn get_discussion(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<DiscussionDetail>, AppError> {
    let store = state.store.as_ref();
    let discussion = active_discussion(store, &id).await?;
    ensure_access(store, &identity, discussion.discussion_type, &discussion.linked_id).await?;

    let last_messages: Vec<Message> = repo::find(
        store,
        &Filter::eq("discussion_id", id.as_str()).and(Filter::eq("is_active", true)),
        &FindOptions::new().sort_desc("created_at").limit(LAST_MESSAGES),
    )
    .await?;
    let author: Option<UserRecord> =
        repo::find_one(store, &repo::active(&discussion.creator_id)).await?;

    Ok(Json(DiscussionDetail {
        discussion,
        last_messages,
        author_details: author.map(|a| UserSummary::from(&a.user)),
    }))
}

async fn create_discussion(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ValidatedJson(payload): ValidatedJson<DiscussionCreate>,
) -> Result<(StatusCode, Json<Discussion>), AppError> {
    let store = state.store.as_ref();
    let user_id = identity.user_id.as_str();

    match payload.discussion_type {
        DiscussionType::Group => {
            let group: Group = repo::find_one(store, &repo::active(&payload.linked_id))
                .await?
                .ok_or_else(|| AppError::not_found("Linked group"))?;
            if !identity.is_admin() && !group.is_member(user_id) && !group.is_group_admin(user_id) {
                return Err(AppError::Forbidden(
                    "Not authorized to create discussion in this group".to_string(),
                ));
            }
        },
        DiscussionType::Event => {
            let event: Event = repo::find_one(store, &repo::active(&payload.linked_id))
                .await?
                .ok_or_else(|| AppError::not_found("Linked event"))?;
            if !identity.is_admin() && !event.is_participant(user_id) {
                return Err(AppError::Forbidden(
                    "Not authorized to create discussion for this event".to_string(),
                ));
            }
        },
    }

    let now = Utc::now();
    let discussion = Discussion {
        id: generate_id("disc"),
        title: payload.title,
        description: payload.description,
        discussion_type: payload.discussion_type,
        linked_id: payload.linked_id,
        creator_id: identity.user_id.clone(),
        is_pinned: payload.is_pinned,
        message_count: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    repo::insert(store, &discussion).await?;

    metrics::resource_created("discussion");
    Ok((StatusCode::CREATED, Json(discussion)))
}

async fn create_message(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<MessageCreate>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let store = state.store.as_ref();
    let discussion = active_discussion(store, &id).await?;
    ensure_access(store, &identity, discussion.discussion_type, &discussion.linked_id).await?;

    if let Some(parent_id) = &payload.parent_message_id {
        let parent = repo::active(parent_id).and(Filter::eq("discussion_id", id.as_str()));
        if repo::count::<Message>(store, &parent).await? == 0 {
            return Err(AppError::not_found("Parent message"));
        }
    }

    let now = Utc::now();
    let message = Message {
        id: generate_id("msg"),
        discussion_id: id.clone(),
        parent_message_id: payload.parent_message_id,
        content: payload.content,
        author_id: identity.user_id.clone(),
        is_edited: false,
        reply_count: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    repo::insert(store, &message).await?;

    repo::update::<Discussion>(store, &Filter::id(id.as_str()), &touch().inc("message_count", 1))
        .await?;
    if let Some(parent_id) = &message.parent_message_id {
        repo::update::<Message>(store, &Filter::id(parent_id.as_str()), &touch().inc("reply_count", 1))
            .await?;
    }

    metrics::resource_created("message");
    Ok((StatusCode::CREATED, Json(message)))
}
