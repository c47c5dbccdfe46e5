//! In-memory collection engine shared by every backend.

use serde_json::Value;

use super::query::{Document, Filter, FindOptions, Update, ID_FIELD};
use super::{check_identifier, CollectionOptions, StoreError};

#[derive(Debug, Default, Clone)]
pub(crate) struct Collection {
    name: String,
    pub(crate) options: CollectionOptions,
    docs: Vec<Document>,
}

fn document_id(doc: &Document) -> Result<&str, StoreError> {
    match doc.get(ID_FIELD) {
        Some(Value::String(id)) => {
            check_identifier(id)?;
            Ok(id)
        },
        _ => Err(StoreError::InvalidIdentifier(format!("missing string `{ID_FIELD}`"))),
    }
}

impl Collection {
    pub(crate) fn new(name: &str, options: CollectionOptions) -> Self {
        Self {
            name: name.to_string(),
            options,
            docs: Vec::new(),
        }
    }

    /// Load documents read back from disk, bypassing constraint checks.
    pub(crate) fn restore(&mut self, mut docs: Vec<Document>) {
        let order = FindOptions::new().sort_asc("created_at").sort_asc(ID_FIELD);
        docs.sort_by(|a, b| order.compare(a, b));
        self.docs = docs;
    }

    fn check_constraints(&self, doc: &Document, skip: Option<usize>) -> Result<(), StoreError> {
        if let Some(validator) = &self.options.validator {
            validator
                .check(doc)
                .map_err(|reason| StoreError::SchemaViolation {
                    collection: self.name.clone(),
                    reason,
                })?;
        }

        let unique = std::iter::once(ID_FIELD).chain(self.options.unique.iter().map(String::as_str));
        for field in unique {
            let Some(value) = doc.get(field).filter(|v| !v.is_null()) else {
                continue;
            };
            let taken = self
                .docs
                .iter()
                .enumerate()
                .filter(|(index, _)| Some(*index) != skip)
                .any(|(_, existing)| existing.get(field) == Some(value));
            if taken {
                return Err(StoreError::DuplicateKey {
                    collection: self.name.clone(),
                    field: field.to_string(),
                    value: match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    },
                });
            }
        }
        Ok(())
    }

    pub(crate) fn insert(&mut self, doc: Document) -> Result<String, StoreError> {
        let id = document_id(&doc)?.to_string();
        self.check_constraints(&doc, None)?;
        self.docs.push(doc);
        Ok(id)
    }

    fn position(&self, filter: &Filter) -> Option<usize> {
        self.docs.iter().position(|doc| filter.matches_doc(doc))
    }

    pub(crate) fn find_one(&self, filter: &Filter) -> Option<Document> {
        self.position(filter).map(|index| self.docs[index].clone())
    }

    pub(crate) fn find(&self, filter: &Filter, options: &FindOptions) -> Vec<Document> {
        let mut matched: Vec<&Document> =
            self.docs.iter().filter(|doc| filter.matches_doc(doc)).collect();
        if !options.sort.is_empty() {
            matched.sort_by(|a, b| options.compare(a, b));
        }
        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);
        matched.into_iter().skip(skip).take(limit).cloned().collect()
    }

    pub(crate) fn count(&self, filter: &Filter) -> u64 {
        self.docs.iter().filter(|doc| filter.matches_doc(doc)).count() as u64
    }

    pub(crate) fn update_one(
        &mut self,
        filter: &Filter,
        update: &Update,
    ) -> Result<Option<Document>, StoreError> {
        let Some(index) = self.position(filter) else {
            return Ok(None);
        };
        let mut next = self.docs[index].clone();
        update.apply(&mut next)?;
        self.check_constraints(&next, Some(index))?;
        self.docs[index] = next.clone();
        Ok(Some(next))
    }

    /// Put back a previous version of a document, keyed by `_id`.
    pub(crate) fn replace(&mut self, doc: Document) {
        let id = doc.get(ID_FIELD).cloned();
        match self.docs.iter().position(|d| d.get(ID_FIELD) == id.as_ref()) {
            Some(index) => self.docs[index] = doc,
            None => self.docs.push(doc),
        }
    }

    pub(crate) fn delete_one(&mut self, filter: &Filter) -> Option<Document> {
        self.position(filter).map(|index| self.docs.remove(index))
    }
}
