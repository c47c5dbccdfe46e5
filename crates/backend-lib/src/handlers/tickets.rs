//! Ticket types and purchases.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use social_common::{
    generate_id, BuyerInfo, Ticket, TicketPurchase, TicketType, TicketTypeCreate,
};

use super::{active_event, require_organizer, touch, viewable_event};
use crate::auth::Identity;
use crate::error::AppError;
use crate::storage::{repo, DocumentStore, Filter, FindOptions, StoreError};
use crate::validation::ValidatedJson;
use crate::{metrics, AppState};

/// Attempts at reserving a ticket before reporting contention
const MAX_RESERVE_ATTEMPTS: usize = 5;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/types", post(create_ticket_type))
        .route("/types/events/{event_id}", get(event_ticket_types))
        .route("/purchase", post(purchase_ticket))
        .route("/user/{user_id}", get(user_tickets))
}

async fn active_ticket_type(store: &dyn DocumentStore, id: &str) -> Result<TicketType, AppError> {
    repo::find_one(store, &repo::active(id))
        .await?
        .ok_or_else(|| AppError::not_found("Ticket type"))
}

fn last_chars(s: &str, n: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    chars[chars.len().saturating_sub(n)..].iter().collect()
}

/// `TKT-<purchase day>-<last six chars of buyer id>-<ticket suffix>`
fn ticket_number(buyer_id: &str, ticket_id: &str) -> String {
    let tail = last_chars(buyer_id, 6);
    let suffix = last_chars(ticket_id, 4);
    format!(
        "TKT-{}-{}-{}",
        Utc::now().format("%Y%m%d"),
        tail,
        suffix.to_uppercase()
    )
}

async fn event_ticket_types(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<TicketType>>, AppError> {
    let store = state.store.as_ref();
    viewable_event(store, &identity, &event_id).await?;
    let filter = Filter::eq("event_id", event_id).and(Filter::eq("is_active", true));
    let types: Vec<TicketType> =
        repo::find(store, &filter, &FindOptions::new().sort_asc("price")).await?;
    Ok(Json(types.into_iter().map(TicketType::with_availability).collect()))
}

async fn create_ticket_type(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ValidatedJson(payload): ValidatedJson<TicketTypeCreate>,
) -> Result<(StatusCode, Json<TicketType>), AppError> {
    let store = state.store.as_ref();
    let event = active_event(store, &payload.event_id).await?;
    require_organizer(&identity, &event, "create ticket types")?;

    let now = Utc::now();
    let ticket_type = TicketType {
        id: generate_id("ticket_type"),
        event_id: payload.event_id,
        name: payload.name,
        description: payload.description,
        price: payload.price,
        quantity: payload.quantity,
        max_per_person: payload.max_per_person,
        sold_count: 0,
        available_count: payload.quantity,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    repo::insert(store, &ticket_type).await?;

    metrics::resource_created("ticket_type");
    Ok((StatusCode::CREATED, Json(ticket_type)))
}

/// Bump `sold_count` if it still holds the value availability was judged on.
async fn reserve(store: &dyn DocumentStore, type_id: &str) -> Result<TicketType, AppError> {
    for _ in 0..MAX_RESERVE_ATTEMPTS {
        let ticket_type = active_ticket_type(store, type_id).await?;
        if ticket_type.available() == 0 {
            return Err(AppError::BadRequest(
                "No tickets available for this type".to_string(),
            ));
        }
        let unchanged =
            repo::active(type_id).and(Filter::eq("sold_count", ticket_type.sold_count));
        if let Some(updated) =
            repo::update::<TicketType>(store, &unchanged, &touch().inc("sold_count", 1)).await?
        {
            return Ok(updated);
        }
        tracing::debug!(ticket_type_id = type_id, "sold count changed concurrently, retrying");
    }
    Err(AppError::Conflict(
        "Ticket type was modified concurrently, please retry".to_string(),
    ))
}

/// Insert a ticket into the first of the buyer's free slots.
async fn issue(
    store: &dyn DocumentStore,
    ticket_type: &TicketType,
    buyer_id: &str,
    buyer_info: BuyerInfo,
) -> Result<Ticket, AppError> {
    for slot in 0..ticket_type.max_per_person {
        let id = generate_id("ticket");
        let ticket = Ticket {
            ticket_number: ticket_number(buyer_id, &id),
            id,
            ticket_type_id: ticket_type.id.clone(),
            event_id: ticket_type.event_id.clone(),
            buyer_id: buyer_id.to_string(),
            buyer_info: buyer_info.clone(),
            purchase_date: Utc::now(),
            is_valid: true,
            checked_in: false,
            checked_in_at: None,
            holder_slot: Some(format!("{}:{buyer_id}:{slot}", ticket_type.id)),
        };
        match repo::insert(store, &ticket).await {
            Ok(_) => return Ok(ticket),
            Err(StoreError::DuplicateKey { .. }) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(max_reached(ticket_type))
}

fn max_reached(ticket_type: &TicketType) -> AppError {
    AppError::BadRequest(format!(
        "Maximum {} ticket(s) per person reached",
        ticket_type.max_per_person
    ))
}

async fn purchase_ticket(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ValidatedJson(payload): ValidatedJson<TicketPurchase>,
) -> Result<Json<Ticket>, AppError> {
    let store = state.store.as_ref();
    let ticket_type = active_ticket_type(store, &payload.ticket_type_id).await?;
    viewable_event(store, &identity, &ticket_type.event_id).await?;

    let held = Filter::eq("ticket_type_id", ticket_type.id.as_str())
        .and(Filter::eq("buyer_id", identity.user_id.as_str()))
        .and(Filter::eq("is_valid", true));
    if repo::count::<Ticket>(store, &held).await? >= ticket_type.max_per_person {
        return Err(max_reached(&ticket_type));
    }

    let reserved = reserve(store, &ticket_type.id).await?;
    let ticket = match issue(store, &reserved, &identity.user_id, payload.buyer_info).await {
        Ok(ticket) => ticket,
        Err(e) => {
            // release the reservation
            repo::update::<TicketType>(
                store,
                &Filter::id(reserved.id.as_str()),
                &touch().inc("sold_count", -1),
            )
            .await?;
            return Err(e);
        },
    };

    metrics::resource_created("ticket");
    tracing::info!(
        ticket_id = %ticket.id,
        ticket_type_id = %reserved.id,
        buyer_id = %identity.user_id,
        "ticket purchased"
    );
    Ok(Json(ticket))
}

async fn user_tickets(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Ticket>>, AppError> {
    if !identity.is_self_or_admin(&user_id) {
        return Err(AppError::Forbidden(
            "Not authorized to view other users' tickets".to_string(),
        ));
    }
    let filter = Filter::eq("buyer_id", user_id).and(Filter::eq("is_valid", true));
    let tickets = repo::find(
        state.store.as_ref(),
        &filter,
        &FindOptions::new().sort_desc("purchase_date"),
    )
    .await?;
    Ok(Json(tickets))
}
