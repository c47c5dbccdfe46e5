//! Shared shopping list for an event.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use social_common::{
    generate_id, ShoppingItem, ShoppingItemCreate, ShoppingItemUpdate, ShoppingList,
};

use super::{active_event, require_participant, touch};
use crate::auth::Identity;
use crate::error::AppError;
use crate::storage::{repo, DocumentStore, Filter, FindOptions, ID_FIELD};
use crate::validation::ValidatedJson;
use crate::{metrics, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_item))
        .route("/events/{event_id}", get(event_list))
        .route("/{item_id}", put(update_item))
}

async fn name_taken(
    store: &dyn DocumentStore,
    event_id: &str,
    name: &str,
    except: Option<&str>,
) -> Result<bool, AppError> {
    let mut filter = Filter::eq("event_id", event_id)
        .and(Filter::eq("name", name))
        .and(Filter::eq("is_active", true));
    if let Some(id) = except {
        filter = filter.and(Filter::ne(ID_FIELD, id));
    }
    Ok(repo::count::<ShoppingItem>(store, &filter).await? > 0)
}

async fn event_list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(event_id): Path<String>,
) -> Result<Json<ShoppingList>, AppError> {
    let store = state.store.as_ref();
    let event = active_event(store, &event_id).await?;
    require_participant(&identity, &event, "view the shopping list")?;

    let filter = Filter::eq("event_id", event_id.as_str()).and(Filter::eq("is_active", true));
    let items = repo::find(store, &filter, &FindOptions::new().sort_asc("created_at")).await?;
    Ok(Json(ShoppingList::new(event_id, items)))
}

async fn create_item(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ValidatedJson(payload): ValidatedJson<ShoppingItemCreate>,
) -> Result<(StatusCode, Json<ShoppingItem>), AppError> {
    let store = state.store.as_ref();
    let event = active_event(store, &payload.event_id).await?;
    require_participant(&identity, &event, "add items to the shopping list")?;

    if name_taken(store, &payload.event_id, &payload.name, None).await? {
        return Err(AppError::Conflict(
            "An item with this name already exists for this event".to_string(),
        ));
    }

    let now = Utc::now();
    let item = ShoppingItem {
        id: generate_id("shopping"),
        event_id: payload.event_id,
        user_id: identity.user_id.clone(),
        name: payload.name,
        quantity: payload.quantity,
        unit: payload.unit,
        arrival_time: payload.arrival_time,
        notes: payload.notes,
        is_brought: false,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    repo::insert(store, &item).await?;

    metrics::resource_created("shopping_item");
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_item(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(item_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<ShoppingItemUpdate>,
) -> Result<Json<ShoppingItem>, AppError> {
    let store = state.store.as_ref();
    let item: ShoppingItem = repo::find_one(store, &repo::active(&item_id))
        .await?
        .ok_or_else(|| AppError::not_found("Shopping item"))?;
    let event = active_event(store, &item.event_id).await?;
    require_participant(&identity, &event, "edit the shopping list")?;

    if let Some(name) = &payload.name {
        if name_taken(store, &item.event_id, name, Some(&item_id)).await? {
            return Err(AppError::Conflict(
                "An item with this name already exists for this event".to_string(),
            ));
        }
    }

    let update = touch().set_present(repo::to_document(&payload)?);
    let item: ShoppingItem = repo::update(store, &repo::active(&item_id), &update)
        .await?
        .ok_or_else(|| AppError::not_found("Shopping item"))?;
    Ok(Json(item))
}
