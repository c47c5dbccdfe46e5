//! Process-local document store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::collection::Collection;
use super::query::{Document, Filter, FindOptions, Update};
use super::{check_identifier, CollectionOptions, DocumentStore, StoreError};

/// Document store held entirely in memory. Cloning shares the data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write<T>(
        &self,
        name: &str,
        op: impl FnOnce(&mut Collection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        check_identifier(name)?;
        let mut collections = self.collections.write();
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| Collection::new(name, CollectionOptions::default()));
        op(collection)
    }

    fn read<T>(&self, name: &str, op: impl FnOnce(&Collection) -> T, empty: T) -> T {
        self.collections.read().get(name).map(op).unwrap_or(empty)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_collection(
        &self,
        name: &str,
        options: CollectionOptions,
    ) -> Result<bool, StoreError> {
        check_identifier(name)?;
        let mut collections = self.collections.write();
        match collections.get_mut(name) {
            Some(existing) => {
                existing.options = options;
                Ok(false)
            },
            None => {
                collections.insert(name.to_string(), Collection::new(name, options));
                Ok(true)
            },
        }
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> Result<String, StoreError> {
        self.write(collection, |c| c.insert(doc))
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self.read(collection, |c| c.find_one(filter), None))
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        Ok(self.read(collection, |c| c.find(filter, options), Vec::new()))
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        Ok(self.read(collection, |c| c.count(filter), 0))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<Option<Document>, StoreError> {
        self.write(collection, |c| c.update_one(filter, update))
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<bool, StoreError> {
        self.write(collection, |c| Ok(c.delete_one(filter).is_some()))
    }

    async fn ping(&self) -> bool {
        true
    }
}
