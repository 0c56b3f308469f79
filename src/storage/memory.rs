//! In-process storage
//!
//! Holds documents in insertion order and evaluates [`Filter`]s directly.
//! Behaves like a MongoDB collection for the operations the engines use:
//! a missing `_id` is generated on insert and duplicate `_id`s are rejected.

use async_trait::async_trait;
use mongodb::bson::{Bson, Document, oid::ObjectId};
use tokio::sync::RwLock;

use super::{Filter, Storage};
use crate::error::{ExecutionError, Result};
use crate::utils::values::{sort_order, values_equal};

#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with documents
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }

    /// Snapshot of every stored document, in insertion order
    pub async fn documents(&self) -> Vec<Document> {
        self.documents.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn find(
        &self,
        filter: &Filter,
        limit: u64,
        sort_by: Option<&str>,
    ) -> Result<Vec<Document>> {
        let docs = self.documents.read().await;
        let mut found: Vec<Document> = docs.iter().filter(|d| filter.matches(d)).cloned().collect();

        if let Some(field) = sort_by {
            found.sort_by(|a, b| sort_order(a.get(field), b.get(field)));
        }

        found.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(found)
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>> {
        let docs = self.documents.read().await;
        Ok(docs.iter().find(|d| filter.matches(d)).cloned())
    }

    async fn insert_one(&self, mut document: Document) -> Result<()> {
        let mut docs = self.documents.write().await;

        let id = match document.get("_id") {
            Some(id) => id.clone(),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                document.insert("_id", id.clone());
                id
            }
        };

        let duplicate = docs
            .iter()
            .any(|d| d.get("_id").is_some_and(|existing| values_equal(existing, &id)));
        if duplicate {
            return Err(ExecutionError::DuplicateKey(id.to_string()).into());
        }

        docs.push(document);
        Ok(())
    }

    async fn update_one(&self, filter: &Filter, fields: Document) -> Result<()> {
        let mut docs = self.documents.write().await;

        if let Some(target) = docs.iter_mut().find(|d| filter.matches(d)) {
            for (key, value) in fields {
                target.insert(key, value);
            }
        }

        Ok(())
    }
}
