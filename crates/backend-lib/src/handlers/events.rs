//! Events: three-step creation, details, membership.
//!
//! Creating, configuring, updating and deleting events is reserved for
//! administrators; the `Authorized<..>` extractor enforces that before the
//! request body is read.

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
    generate_id, Event, EventConfig, EventCreate, EventDetail, EventPrivacy, EventUpdate, Page,
};

use super::{
    active_event, active_group, ensure_users_exist, touch, user_summaries, viewable_event,
};
use crate::auth::policy::{CreateEvent, DeleteEvent, JoinEvent, ReadEvent, UpdateEvent};
use crate::auth::{Authorized, Identity, Operation, Resource};
use crate::error::AppError;
use crate::logging::{log_admin_action, log_membership};
use crate::storage::{repo, Filter, FindOptions};
use crate::validation::{ValidatedJson, ValidationErrors};
use crate::{metrics, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route(
            "/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/{id}/config", post(configure_event))
        .route("/{id}/join", post(join_event))
        .route("/user/{user_id}", get(user_events))
}

fn yes() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default = "yes")]
    public_only: bool,
}

/// Events `identity` may see: public ones plus those they take part in.
pub(super) fn visible_to(identity: &Identity) -> Filter {
    if identity.is_admin() {
        return Filter::All;
    }
    Filter::any(vec![
        Filter::eq("privacy", "public"),
        Filter::contains("members", identity.user_id.as_str()),
        Filter::contains("organizers", identity.user_id.as_str()),
        Filter::eq("creator_id", identity.user_id.as_str()),
    ])
}

fn by_start_date(page: &Page) -> FindOptions {
    FindOptions::new()
        .sort_asc("start_date")
        .skip(page.skip)
        .limit(page.clamped_limit())
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    identity: Authorized<ReadEvent>,
    Query(params): Query<ListParams>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Event>>, AppError> {
    let visibility = if params.public_only {
        Filter::eq("privacy", "public")
    } else {
        visible_to(&identity)
    };
    let filter = Filter::eq("is_active", true).and(visibility);
    let events = repo::find(state.store.as_ref(), &filter, &by_start_date(&page)).await?;
    Ok(Json(events))
}

async fn get_event(
    State(state): State<Arc<AppState>>,
    identity: Authorized<ReadEvent>,
    Path(id): Path<String>,
) -> Result<Json<EventDetail>, AppError> {
    let store = state.store.as_ref();
    let event = viewable_event(store, &identity, &id).await?;

    let organizer_details = user_summaries(store, &event.organizers).await?;
    let member_details = user_summaries(store, &event.members).await?;
    let participant_count = event.organizers.len() + event.members.len();
    Ok(Json(EventDetail {
        event,
        organizer_details,
        member_details,
        participant_count,
    }))
}

/// Step one: create the event.
async fn create_event(
    State(state): State<Arc<AppState>>,
    identity: Authorized<CreateEvent>,
    ValidatedJson(payload): ValidatedJson<EventCreate>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let store = state.store.as_ref();
    let EventCreate {
        config,
        group_id,
        auto_invite,
    } = payload;

    ensure_users_exist(store, &config.organizers).await?;
    ensure_users_exist(store, &config.members).await?;

    let mut members = config.members;
    if let Some(group_id) = &group_id {
        let group = active_group(store, group_id).await?;
        if auto_invite {
            for member in group.member_ids {
                if !members.contains(&member) {
                    members.push(member);
                }
            }
        }
    }

    let mut organizers = config.organizers;
    if !organizers.contains(&identity.user_id) {
        organizers.push(identity.user_id.clone());
    }

    let now = Utc::now();
    let event = Event {
        id: generate_id("event"),
        name: config.name,
        description: config.description,
        start_date: config.start_date,
        end_date: config.end_date,
        location: config.location,
        cover_photo: config.cover_photo,
        privacy: config.privacy,
        organizers,
        members,
        group_id,
        auto_invite,
        creator_id: identity.user_id.clone(),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    repo::insert(store, &event).await?;

    metrics::resource_created("event");
    log_admin_action(&identity.user_id, Resource::Event, Operation::Create, &event.id);
    Ok((StatusCode::CREATED, Json(event)))
}

/// Step two: replace the event's configuration.
async fn configure_event(
    State(state): State<Arc<AppState>>,
    identity: Authorized<UpdateEvent>,
    Path(id): Path<String>,
    ValidatedJson(mut config): ValidatedJson<EventConfig>,
) -> Result<Json<Event>, AppError> {
    let store = state.store.as_ref();
    let event = active_event(store, &id).await?;

    ensure_users_exist(store, &config.organizers).await?;
    ensure_users_exist(store, &config.members).await?;
    if !config.organizers.contains(&event.creator_id) {
        config.organizers.push(event.creator_id.clone());
    }

    let update = touch().set_present(repo::to_document(&config)?);
    let event: Event = repo::update(store, &repo::active(&id), &update)
        .await?
        .ok_or_else(|| AppError::not_found("Event"))?;

    log_admin_action(&identity.user_id, Resource::Event, Operation::Update, &id);
    Ok(Json(event))
}

/// Step three and later edits: amend individual fields.
async fn update_event(
    State(state): State<Arc<AppState>>,
    identity: Authorized<UpdateEvent>,
    Path(id): Path<String>,
    ValidatedJson(mut payload): ValidatedJson<EventUpdate>,
) -> Result<Json<Event>, AppError> {
    let store = state.store.as_ref();
    let event = active_event(store, &id).await?;

    let start = payload.start_date.unwrap_or(event.start_date);
    let end = payload.end_date.unwrap_or(event.end_date);
    if end <= start {
        return Err(ValidationErrors::single("end_date", "must be after start_date").into());
    }
    if let Some(organizers) = payload.organizers.as_mut() {
        ensure_users_exist(store, organizers).await?;
        if !organizers.contains(&event.creator_id) {
            organizers.push(event.creator_id.clone());
        }
    }
    if let Some(members) = &payload.members {
        ensure_users_exist(store, members).await?;
    }

    let update = touch().set_present(repo::to_document(&payload)?);
    let event: Event = repo::update(store, &repo::active(&id), &update)
        .await?
        .ok_or_else(|| AppError::not_found("Event"))?;

    log_admin_action(&identity.user_id, Resource::Event, Operation::Update, &id);
    Ok(Json(event))
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    identity: Authorized<DeleteEvent>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let store = state.store.as_ref();
    active_event(store, &id).await?;
    repo::update::<Event>(store, &repo::active(&id), &touch().set("is_active", false)).await?;

    log_admin_action(&identity.user_id, Resource::Event, Operation::Delete, &id);
    Ok(StatusCode::NO_CONTENT)
}

async fn join_event(
    State(state): State<Arc<AppState>>,
    identity: Authorized<JoinEvent>,
    Path(id): Path<String>,
) -> Result<Json<Event>, AppError> {
    let store = state.store.as_ref();
    let event = active_event(store, &id).await?;

    if event.privacy != EventPrivacy::Public {
        return Err(AppError::Forbidden(
            "Cannot join a private event without invitation".to_string(),
        ));
    }
    if event.members.contains(&identity.user_id) {
        return Err(AppError::BadRequest("Already a member of this event".to_string()));
    }
    if event.organizers.contains(&identity.user_id) {
        return Err(AppError::BadRequest("Already an organizer of this event".to_string()));
    }

    let update = touch().add_to_set("members", identity.user_id.as_str());
    let event: Event = repo::update(store, &repo::active(&id), &update)
        .await?
        .ok_or_else(|| AppError::not_found("Event"))?;

    log_membership(&identity.user_id, Resource::Event, &id, "joined");
    Ok(Json(event))
}

async fn user_events(
    State(state): State<Arc<AppState>>,
    identity: Authorized<ReadEvent>,
    Path(user_id): Path<String>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Event>>, AppError> {
    let involved = Filter::any(vec![
        Filter::eq("creator_id", user_id.as_str()),
        Filter::contains("organizers", user_id.as_str()),
        Filter::contains("members", user_id.as_str()),
    ]);
    let mut filter = Filter::eq("is_active", true).and(involved);
    if !identity.is_self_or_admin(&user_id) {
        filter = filter.and(visible_to(&identity));
    }
    let events = repo::find(state.store.as_ref(), &filter, &by_start_date(&page)).await?;
    Ok(Json(events))
}
