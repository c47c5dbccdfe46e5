//! Groups: administration, visibility and membership.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use social_common::{generate_id, Event, Group, GroupCreate, GroupDetail, GroupType, GroupUpdate, Page};

use super::{active_group, can_view_group, ensure_users_exist, touch, user_summaries};
use crate::auth::policy::{CreateGroup, DeleteGroup, JoinGroup, ReadGroup, UpdateGroup};
use crate::auth::{Authorized, Identity, Operation, Resource};
use crate::error::AppError;
use crate::logging::{log_admin_action, log_membership};
use crate::storage::{repo, Filter, FindOptions};
use crate::validation::ValidatedJson;
use crate::{metrics, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_groups).post(create_group))
        .route(
            "/{id}",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route("/{id}/join", post(join_group))
        .route("/{id}/leave", post(leave_group))
        .route("/{id}/promote/{user_id}", post(promote_member))
        .route("/user/{user_id}", get(user_groups))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default)]
    group_type: Option<GroupType>,
}

fn involving(user_id: &str) -> Filter {
    Filter::any(vec![
        Filter::eq("creator_id", user_id),
        Filter::contains("admin_ids", user_id),
        Filter::contains("member_ids", user_id),
    ])
}

/// Groups `identity` may see: everything but secret groups they are not in.
pub(super) fn visible_to(identity: &Identity) -> Filter {
    if identity.is_admin() {
        return Filter::All;
    }
    Filter::any(vec![
        Filter::ne("type", GroupType::Secret.as_str()),
        involving(&identity.user_id),
    ])
}

fn newest_first(page: &Page) -> FindOptions {
    FindOptions::new()
        .sort_desc("created_at")
        .skip(page.skip)
        .limit(page.clamped_limit())
}

async fn list_groups(
    State(state): State<Arc<AppState>>,
    identity: Authorized<ReadGroup>,
    Query(params): Query<ListParams>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Group>>, AppError> {
    let by_type = match params.group_type {
        Some(GroupType::Secret) => {
            Filter::eq("type", GroupType::Secret.as_str()).and(visible_to(&identity))
        },
        Some(group_type) => Filter::eq("type", group_type.as_str()),
        None => Filter::one_of(
            "type",
            [GroupType::Public.as_str(), GroupType::Private.as_str()],
        ),
    };
    let filter = Filter::eq("is_active", true).and(by_type);
    let groups = repo::find(state.store.as_ref(), &filter, &newest_first(&page)).await?;
    Ok(Json(groups))
}

async fn get_group(
    State(state): State<Arc<AppState>>,
    identity: Authorized<ReadGroup>,
    Path(id): Path<String>,
) -> Result<Json<GroupDetail>, AppError> {
    let store = state.store.as_ref();
    let group = active_group(store, &id).await?;
    if !can_view_group(&identity, &group) {
        return Err(AppError::Forbidden(
            "Not authorized to view this secret group".to_string(),
        ));
    }

    let admin_details = user_summaries(store, &group.admin_ids).await?;
    let member_details = user_summaries(store, &group.member_ids).await?;
    let event_count = repo::count::<Event>(
        store,
        &Filter::eq("group_id", id.as_str()).and(Filter::eq("is_active", true)),
    )
    .await?;
    let member_count = group.member_ids.len();
    Ok(Json(GroupDetail {
        group,
        admin_details,
        member_details,
        member_count,
        event_count,
    }))
}

async fn create_group(
    State(state): State<Arc<AppState>>,
    identity: Authorized<CreateGroup>,
    ValidatedJson(payload): ValidatedJson<GroupCreate>,
) -> Result<(StatusCode, Json<Group>), AppError> {
    let store = state.store.as_ref();
    ensure_users_exist(store, &payload.admin_ids).await?;

    let mut admin_ids = payload.admin_ids;
    if !admin_ids.contains(&identity.user_id) {
        admin_ids.push(identity.user_id.clone());
    }

    let now = Utc::now();
    let group = Group {
        id: generate_id("group"),
        name: payload.name,
        description: payload.description,
        icon: payload.icon,
        cover_photo: payload.cover_photo,
        group_type: payload.group_type,
        allow_member_posts: payload.allow_member_posts,
        allow_member_events: payload.allow_member_events,
        admin_ids,
        member_ids: Vec::new(),
        creator_id: identity.user_id.clone(),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    repo::insert(store, &group).await?;

    metrics::resource_created("group");
    log_admin_action(&identity.user_id, Resource::Group, Operation::Create, &group.id);
    Ok((StatusCode::CREATED, Json(group)))
}

async fn update_group(
    State(state): State<Arc<AppState>>,
    identity: Authorized<UpdateGroup>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<GroupUpdate>,
) -> Result<Json<Group>, AppError> {
    let store = state.store.as_ref();
    active_group(store, &id).await?;

    let update = touch().set_present(repo::to_document(&payload)?);
    let group: Group = repo::update(store, &repo::active(&id), &update)
        .await?
        .ok_or_else(|| AppError::not_found("Group"))?;

    log_admin_action(&identity.user_id, Resource::Group, Operation::Update, &id);
    Ok(Json(group))
}

async fn delete_group(
    State(state): State<Arc<AppState>>,
    identity: Authorized<DeleteGroup>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let store = state.store.as_ref();
    active_group(store, &id).await?;
    repo::update::<Group>(store, &repo::active(&id), &touch().set("is_active", false)).await?;

    log_admin_action(&identity.user_id, Resource::Group, Operation::Delete, &id);
    Ok(StatusCode::NO_CONTENT)
}

async fn join_group(
    State(state): State<Arc<AppState>>,
    identity: Authorized<JoinGroup>,
    Path(id): Path<String>,
) -> Result<Json<Group>, AppError> {
    let store = state.store.as_ref();
    let group = active_group(store, &id).await?;

    if group.group_type == GroupType::Secret {
        return Err(AppError::Forbidden(
            "Cannot join a secret group without invitation".to_string(),
        ));
    }
    if group.is_member(&identity.user_id) {
        return Err(AppError::BadRequest("Already a member of this group".to_string()));
    }
    if group.is_group_admin(&identity.user_id) {
        return Err(AppError::BadRequest(
            "Already an administrator of this group".to_string(),
        ));
    }

    let update = touch().add_to_set("member_ids", identity.user_id.as_str());
    let group: Group = repo::update(store, &repo::active(&id), &update)
        .await?
        .ok_or_else(|| AppError::not_found("Group"))?;

    log_membership(&identity.user_id, Resource::Group, &id, "joined");
    Ok(Json(group))
}

async fn leave_group(
    State(state): State<Arc<AppState>>,
    identity: Authorized<JoinGroup>,
    Path(id): Path<String>,
) -> Result<Json<Group>, AppError> {
    let store = state.store.as_ref();
    let group = active_group(store, &id).await?;

    let is_member = group.is_member(&identity.user_id);
    let is_admin = group.is_group_admin(&identity.user_id);
    if !is_member && !is_admin {
        return Err(AppError::BadRequest("Not a member of this group".to_string()));
    }
    if is_admin && group.admin_ids.len() == 1 {
        return Err(AppError::BadRequest(
            "Cannot leave group as the only administrator".to_string(),
        ));
    }

    let mut update = touch();
    if is_member {
        update = update.pull("member_ids", identity.user_id.as_str());
    }
    if is_admin {
        update = update.pull("admin_ids", identity.user_id.as_str());
    }
    let group: Group = repo::update(store, &repo::active(&id), &update)
        .await?
        .ok_or_else(|| AppError::not_found("Group"))?;

    log_membership(&identity.user_id, Resource::Group, &id, "left");
    Ok(Json(group))
}

async fn promote_member(
    State(state): State<Arc<AppState>>,
    identity: Authorized<UpdateGroup>,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<Json<Group>, AppError> {
    let store = state.store.as_ref();
    let group = active_group(store, &id).await?;

    if !group.is_member(&user_id) {
        return Err(AppError::BadRequest("User is not a member of this group".to_string()));
    }
    if group.is_group_admin(&user_id) {
        return Err(AppError::BadRequest("User is already an administrator".to_string()));
    }

    let update = touch().add_to_set("admin_ids", user_id.as_str());
    let group: Group = repo::update(store, &repo::active(&id), &update)
        .await?
        .ok_or_else(|| AppError::not_found("Group"))?;

    log_admin_action(&identity.user_id, Resource::Group, Operation::Update, &id);
    log_membership(&user_id, Resource::Group, &id, "promoted");
    Ok(Json(group))
}

async fn user_groups(
    State(state): State<Arc<AppState>>,
    identity: Authorized<ReadGroup>,
    Path(user_id): Path<String>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Group>>, AppError> {
    let mut filter = Filter::eq("is_active", true).and(involving(&user_id));
    if !identity.is_self_or_admin(&user_id) {
        filter = filter.and(visible_to(&identity));
    }
    let groups = repo::find(state.store.as_ref(), &filter, &newest_first(&page)).await?;
    Ok(Json(groups))
}
