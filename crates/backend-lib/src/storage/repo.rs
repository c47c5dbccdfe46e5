//! Typed access to collections.
//!
//! Entities use `id` on the wire and `_id` in the store; [`to_document`]
//! and [`from_document`] translate between the two.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use social_common::{
    Album, Comment, Discussion, Event, Group, Message, Photo, Poll, ShoppingItem, Ticket,
    TicketType, Vote,
};

use super::bootstrap::collections;
use super::query::{Document, Filter, FindOptions, Update, ID_FIELD};
use super::{DocumentStore, StoreError};

/// A type persisted in a fixed collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;
}

macro_rules! entity {
    ($($ty:ty => $collection:expr),* $(,)?) => {
        $(impl Entity for $ty {
            const COLLECTION: &'static str = $collection;
        })*
    };
}

entity! {
    Event => collections::EVENTS,
    Group => collections::GROUPS,
    Discussion => collections::DISCUSSIONS,
    Message => collections::MESSAGES,
    Album => collections::ALBUMS,
    Photo => collections::PHOTOS,
    Comment => collections::COMMENTS,
    Poll => collections::POLLS,
    Vote => collections::VOTES,
    TicketType => collections::TICKET_TYPES,
    Ticket => collections::TICKETS,
    ShoppingItem => collections::SHOPPING_ITEMS,
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(mut map) => {
            if let Some(id) = map.remove("id") {
                map.insert(ID_FIELD.to_string(), id);
            }
            Ok(map)
        },
        _ => Err(StoreError::NotAnObject),
    }
}

pub fn from_document<T: DeserializeOwned>(mut doc: Document) -> Result<T, StoreError> {
    if let Some(id) = doc.remove(ID_FIELD) {
        doc.insert("id".to_string(), id);
    }
    Ok(serde_json::from_value(Value::Object(doc))?)
}

pub async fn insert<T: Entity>(store: &dyn DocumentStore, entity: &T) -> Result<String, StoreError> {
    store.insert_one(T::COLLECTION, to_document(entity)?).await
}

pub async fn find_one<T: Entity>(
    store: &dyn DocumentStore,
    filter: &Filter,
) -> Result<Option<T>, StoreError> {
    store
        .find_one(T::COLLECTION, filter)
        .await?
        .map(from_document)
        .transpose()
}

pub async fn find<T: Entity>(
    store: &dyn DocumentStore,
    filter: &Filter,
    options: &FindOptions,
) -> Result<Vec<T>, StoreError> {
    store
        .find(T::COLLECTION, filter, options)
        .await?
        .into_iter()
        .map(from_document)
        .collect()
}

pub async fn count<T: Entity>(store: &dyn DocumentStore, filter: &Filter) -> Result<u64, StoreError> {
    store.count(T::COLLECTION, filter).await
}

pub async fn update<T: Entity>(
    store: &dyn DocumentStore,
    filter: &Filter,
    update: &Update,
) -> Result<Option<T>, StoreError> {
    store
        .update_one(T::COLLECTION, filter, update)
        .await?
        .map(from_document)
        .transpose()
}

/// Live (not soft-deleted) entity by id.
pub fn active(id: &str) -> Filter {
    Filter::id(id).and(Filter::eq("is_active", true))
}
