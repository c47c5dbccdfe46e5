//! HTTP handlers, one router per resource.
//!
//! Helpers here load the parent objects most handlers hang off, so every
//! route reports a missing or deactivated parent the same way.

pub mod albums;
pub mod auth;
pub mod discussions;
pub mod events;
pub mod groups;
pub mod polls;
pub mod shopping;
pub mod tickets;
pub mod users;

use chrono::Utc;
use serde_json::json;
use social_common::{Event, EventPrivacy, Group, GroupType, UserSummary};

use crate::auth::Identity;
use crate::error::AppError;
use crate::models::UserRecord;
use crate::storage::{repo, DocumentStore, Filter, FindOptions, Update, ID_FIELD};

/// An update that only bumps `updated_at`.
pub(crate) fn touch() -> Update {
    Update::new().set("updated_at", json!(Utc::now()))
}

pub(crate) async fn active_user(store: &dyn DocumentStore, id: &str) -> Result<UserRecord, AppError> {
    repo::find_one(store, &repo::active(id))
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

pub(crate) async fn active_event(store: &dyn DocumentStore, id: &str) -> Result<Event, AppError> {
    repo::find_one(store, &repo::active(id))
        .await?
        .ok_or_else(|| AppError::not_found("Event"))
}

pub(crate) async fn active_group(store: &dyn DocumentStore, id: &str) -> Result<Group, AppError> {
    repo::find_one(store, &repo::active(id))
        .await?
        .ok_or_else(|| AppError::not_found("Group"))
}

/// Public events, or private ones the caller takes part in.
pub(crate) fn can_view_event(identity: &Identity, event: &Event) -> bool {
    event.privacy == EventPrivacy::Public
        || identity.is_admin()
        || event.is_participant(&identity.user_id)
}

/// Anything but a secret group the caller has no place in.
pub(crate) fn can_view_group(identity: &Identity, group: &Group) -> bool {
    group.group_type != GroupType::Secret
        || identity.is_admin()
        || group.creator_id == identity.user_id
        || group.is_member(&identity.user_id)
        || group.is_group_admin(&identity.user_id)
}

/// Load an event and make sure the caller may read it and what hangs off it.
pub(crate) async fn viewable_event(
    store: &dyn DocumentStore,
    identity: &Identity,
    id: &str,
) -> Result<Event, AppError> {
    let event = active_event(store, id).await?;
    if can_view_event(identity, &event) {
        Ok(event)
    } else {
        Err(AppError::Forbidden(
            "Not authorized to view this private event".to_string(),
        ))
    }
}

/// Fail with `NotFound` naming the first id without an active account.
pub(crate) async fn ensure_users_exist(
    store: &dyn DocumentStore,
    ids: &[String],
) -> Result<(), AppError> {
    for id in ids {
        let found = repo::count::<UserRecord>(store, &repo::active(id)).await?;
        if found == 0 {
            return Err(AppError::NotFound(format!("User with ID {id} not found")));
        }
    }
    Ok(())
}

/// Summaries of the active accounts among `ids`, in `ids` order.
pub(crate) async fn user_summaries(
    store: &dyn DocumentStore,
    ids: &[String],
) -> Result<Vec<UserSummary>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let filter = Filter::one_of(ID_FIELD, ids.iter().cloned()).and(Filter::eq("is_active", true));
    let records: Vec<UserRecord> = repo::find(store, &filter, &FindOptions::new()).await?;
    Ok(ids
        .iter()
        .filter_map(|id| records.iter().find(|r| &r.user.id == id))
        .map(|r| UserSummary::from(&r.user))
        .collect())
}

/// Participants of an event (and admins) may use its albums, polls and lists.
pub(crate) fn require_participant(
    identity: &Identity,
    event: &Event,
    action: &str,
) -> Result<(), AppError> {
    if identity.is_admin() || event.is_participant(&identity.user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Not authorized to {action} for this event")))
    }
}

/// Organizers of an event (and admins) may attach polls and ticket types.
pub(crate) fn require_organizer(
    identity: &Identity,
    event: &Event,
    action: &str,
) -> Result<(), AppError> {
    let is_organizer = event.creator_id == identity.user_id
        || event.organizers.iter().any(|id| id == &identity.user_id);
    if identity.is_admin() || is_organizer {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Only event organizers can {action}")))
    }
}
