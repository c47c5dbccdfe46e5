// ============================
// crates/backend-lib/src/storage/mod.rs
// ============================
//! Document store abstraction: named collections of JSON documents.
//!
//! Two backends implement [`DocumentStore`]: [`MemoryStore`] keeps
//! everything in process, [`FlatFileStore`] persists one JSON file per
//! document. Both share the same collection engine, so filters, updates,
//! schema validators and unique indexes behave identically.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod bootstrap;
mod collection;
mod flat_file;
mod memory;
pub mod query;
pub mod repo;

pub use bootstrap::{collections, init_database};
pub use flat_file::FlatFileStore;
pub use memory::MemoryStore;
pub use query::{Document, Filter, FindOptions, SortOrder, Update, ID_FIELD};

/// Errors raised by a document store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate key in `{collection}`: {field} = {value}")]
    DuplicateKey {
        collection: String,
        field: String,
        value: String,
    },

    #[error("document rejected by `{collection}` validator: {reason}")]
    SchemaViolation { collection: String, reason: String },

    #[error("invalid update: {0}")]
    InvalidUpdate(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("document is not a JSON object")]
    NotAnObject,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Primitive types a schema validator can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Bool,
    Number,
    Array,
    Object,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Number => value.is_number(),
            FieldKind::Array => value.is_array(),
            FieldKind::Object => value.is_object(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredField {
    pub name: String,
    pub kind: FieldKind,
}

/// Store-side schema check run on every insert and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaValidator {
    pub required: Vec<RequiredField>,
}

impl SchemaValidator {
    pub fn require(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.required.push(RequiredField {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn check(&self, doc: &Document) -> Result<(), String> {
        for field in &self.required {
            match doc.get(&field.name) {
                None | Some(Value::Null) => return Err(format!("`{}` is required", field.name)),
                Some(value) if !field.kind.accepts(value) => {
                    return Err(format!(
                        "`{}` must be of type {:?}",
                        field.name, field.kind
                    ))
                },
                Some(_) => {},
            }
        }
        Ok(())
    }
}

/// Per-collection settings recorded at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionOptions {
    #[serde(default)]
    pub validator: Option<SchemaValidator>,
    /// Fields whose non-null values must be unique; `_id` always is.
    #[serde(default)]
    pub unique: Vec<String>,
}

impl CollectionOptions {
    pub fn with_validator(mut self, validator: SchemaValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_unique(mut self, field: impl Into<String>) -> Self {
        self.unique.push(field.into());
        self
    }
}

/// Trait for document store backends
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a collection, or replace the options of an existing one.
    /// Returns `true` when the collection did not exist before.
    async fn create_collection(
        &self,
        name: &str,
        options: CollectionOptions,
    ) -> Result<bool, StoreError>;

    async fn list_collections(&self) -> Result<Vec<String>, StoreError>;

    /// Insert a document carrying a string `_id`; returns that id.
    async fn insert_one(&self, collection: &str, doc: Document) -> Result<String, StoreError>;

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError>;

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Apply `update` to the first match; returns the updated document.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<Option<Document>, StoreError>;

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<bool, StoreError>;

    /// Whether the backend is reachable.
    async fn ping(&self) -> bool;

    /// Release backend resources on shutdown.
    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Collection and document ids end up in file names.
pub(crate) fn check_identifier(id: &str) -> Result<(), StoreError> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(id.to_string()))
    }
}
