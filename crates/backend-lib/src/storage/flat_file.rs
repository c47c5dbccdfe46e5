// ============================
// crates/backend-lib/src/storage/flat_file.rs
// ============================
//! Flat-file backend: one directory per collection, one JSON file per document.
//!
//! ```text
//! <root>/
//!   _collections.json      collection catalog (options)
//!   users/user_<id>.json
//!   events/event_<id>.json
//! ```
//!
//! Everything is loaded at open time and written through on each mutation.
//! A single lock serialises writes for the whole database.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs as tokio_fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::collection::Collection;
use super::query::{Document, Filter, FindOptions, Update, ID_FIELD};
use super::{check_identifier, CollectionOptions, DocumentStore, StoreError};

const CATALOG_FILE: &str = "_collections.json";

/// Flat-file implementation of the `DocumentStore` trait
pub struct FlatFileStore {
    root: PathBuf,
    collections: RwLock<HashMap<String, Collection>>,
}

impl FlatFileStore {
    /// Open (or create) the database rooted at `root`.
    pub async fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        tokio_fs::create_dir_all(&root).await?;

        let catalog_path = root.join(CATALOG_FILE);
        let catalog: HashMap<String, CollectionOptions> = if catalog_path.exists() {
            serde_json::from_str(&tokio_fs::read_to_string(&catalog_path).await?)?
        } else {
            HashMap::new()
        };

        let mut collections = HashMap::new();
        for (name, options) in catalog {
            check_identifier(&name)?;
            let mut collection = Collection::new(&name, options);
            collection.restore(read_documents(&root.join(&name)).await?);
            collections.insert(name, collection);
        }

        info!(path = %root.display(), collections = collections.len(), "opened flat-file store");
        Ok(Self {
            root,
            collections: RwLock::new(collections),
        })
    }

    fn doc_path(&self, collection: &str, id: &str) -> PathBuf {
        self.root.join(collection).join(format!("{id}.json"))
    }

    async fn write_catalog(&self, collections: &HashMap<String, Collection>) -> Result<(), StoreError> {
        let catalog: HashMap<&str, &CollectionOptions> = collections
            .iter()
            .map(|(name, c)| (name.as_str(), &c.options))
            .collect();
        write_atomic(&self.root.join(CATALOG_FILE), &serde_json::to_vec_pretty(&catalog)?).await
    }

    async fn write_document(&self, collection: &str, doc: &Document) -> Result<(), StoreError> {
        let id = doc
            .get(ID_FIELD)
            .and_then(|v| v.as_str())
            .ok_or(StoreError::NotAnObject)?;
        let path = self.doc_path(collection, id);
        write_atomic(&path, &serde_json::to_vec_pretty(doc)?).await
    }

    /// Make sure `name` exists in memory, the catalog and on disk.
    async fn ensure_collection(
        &self,
        collections: &mut HashMap<String, Collection>,
        name: &str,
    ) -> Result<(), StoreError> {
        check_identifier(name)?;
        if !collections.contains_key(name) {
            collections.insert(name.to_string(), Collection::new(name, CollectionOptions::default()));
            tokio_fs::create_dir_all(self.root.join(name)).await?;
            self.write_catalog(collections).await?;
        }
        Ok(())
    }
}

async fn read_documents(dir: &Path) -> Result<Vec<Document>, StoreError> {
    let mut docs = Vec::new();
    if !dir.exists() {
        return Ok(docs);
    }
    let mut entries = tokio_fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let content = tokio_fs::read_to_string(&path).await?;
        match serde_json::from_str::<serde_json::Value>(&content)? {
            serde_json::Value::Object(doc) => docs.push(doc),
            _ => return Err(StoreError::NotAnObject),
        }
    }
    Ok(docs)
}

/// Write to a sibling temp file, then rename over the target.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio_fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio_fs::write(&tmp, bytes).await?;
    tokio_fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl DocumentStore for FlatFileStore {
    async fn create_collection(
        &self,
        name: &str,
        options: CollectionOptions,
    ) -> Result<bool, StoreError> {
        check_identifier(name)?;
        let mut collections = self.collections.write().await;
        let created = match collections.get_mut(name) {
            Some(existing) => {
                existing.options = options;
                false
            },
            None => {
                collections.insert(name.to_string(), Collection::new(name, options));
                true
            },
        };
        tokio_fs::create_dir_all(self.root.join(name)).await?;
        self.write_catalog(&collections).await?;
        Ok(created)
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> Result<String, StoreError> {
        let mut collections = self.collections.write().await;
        self.ensure_collection(&mut collections, collection).await?;
        let Some(target) = collections.get_mut(collection) else {
            return Err(StoreError::InvalidIdentifier(collection.to_string()));
        };
        let snapshot = doc.clone();
        let id = target.insert(doc)?;
        if let Err(e) = self.write_document(collection, &snapshot).await {
            target.delete_one(&Filter::id(id.as_str()));
            return Err(e);
        }
        debug!(collection, id = %id, "document inserted");
        Ok(id)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|c| c.find_one(filter)))
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|c| c.find(filter, options))
            .unwrap_or_default())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|c| c.count(filter))
            .unwrap_or(0))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(target) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let previous = target.find_one(filter);
        let Some(updated) = target.update_one(filter, update)? else {
            return Ok(None);
        };
        if let Err(e) = self.write_document(collection, &updated).await {
            if let Some(previous) = previous {
                target.replace(previous);
            }
            return Err(e);
        }
        Ok(Some(updated))
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(target) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(removed) = target.delete_one(filter) else {
            return Ok(false);
        };
        if let Some(id) = removed.get(ID_FIELD).and_then(|v| v.as_str()) {
            let path = self.doc_path(collection, id);
            if path.exists() {
                tokio_fs::remove_file(path).await?;
            }
        }
        Ok(true)
    }

    async fn ping(&self) -> bool {
        tokio_fs::metadata(&self.root).await.is_ok()
    }

    async fn close(&self) -> Result<(), StoreError> {
        let collections = self.collections.read().await;
        self.write_catalog(&collections).await?;
        info!(path = %self.root.display(), "flat-file store closed");
        Ok(())
    }
}
