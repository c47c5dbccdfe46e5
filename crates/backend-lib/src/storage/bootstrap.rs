//! Collection setup run once at start-up.

use tracing::{debug, info};

use super::{CollectionOptions, DocumentStore, FieldKind, SchemaValidator, StoreError};

/// Names of every collection the service uses.
pub mod collections {
    pub const USERS: &str = "users";
    pub const EVENTS: &str = "events";
    pub const GROUPS: &str = "groups";
    pub const DISCUSSIONS: &str = "discussions";
    pub const MESSAGES: &str = "messages";
    pub const ALBUMS: &str = "albums";
    pub const PHOTOS: &str = "photos";
    pub const COMMENTS: &str = "comments";
    pub const POLLS: &str = "polls";
    pub const VOTES: &str = "votes";
    pub const TICKET_TYPES: &str = "ticket_types";
    pub const TICKETS: &str = "tickets";
    pub const SHOPPING_ITEMS: &str = "shopping_items";

    pub const ALL: &[&str] = &[
        USERS,
        EVENTS,
        GROUPS,
        DISCUSSIONS,
        MESSAGES,
        ALBUMS,
        PHOTOS,
        COMMENTS,
        POLLS,
        VOTES,
        TICKET_TYPES,
        TICKETS,
        SHOPPING_ITEMS,
    ];
}

/// Options each collection is created with.
pub fn options_for(name: &str) -> CollectionOptions {
    match name {
        collections::USERS => CollectionOptions::default()
            .with_validator(
                SchemaValidator::default()
                    .require("email", FieldKind::String)
                    .require("username", FieldKind::String)
                    .require("hashed_password", FieldKind::String),
            )
            .with_unique("email"),
        collections::VOTES => CollectionOptions::default().with_unique("ballot"),
        collections::TICKETS => CollectionOptions::default().with_unique("holder_slot"),
        _ => CollectionOptions::default(),
    }
}

/// Create every collection; safe to run against an initialised store.
pub async fn init_database(store: &dyn DocumentStore) -> Result<(), StoreError> {
    for &name in collections::ALL {
        if store.create_collection(name, options_for(name)).await? {
            info!(collection = name, "created collection");
        } else {
            debug!(collection = name, "collection already present");
        }
    }
    info!(collections = collections::ALL.len(), "database initialised");
    Ok(())
}
