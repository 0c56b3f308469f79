//! Storage collaborator used by both engines
//!
//! The engines only need four operations from the document store. They are
//! expressed as the [`Storage`] trait so the engines can run against MongoDB
//! ([`MongoStore`]) or an in-process collection ([`MemoryStore`]).

pub mod filter;
pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use mongodb::bson::Document;

use crate::error::Result;

pub use filter::{Condition, Filter};
pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Operations the upsert engine and the export pipeline consume
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fetch up to `limit` documents matching `filter`
    ///
    /// # Arguments
    /// * `filter` - Conjunctive predicate
    /// * `limit` - Maximum number of documents to return
    /// * `sort_by` - Field to sort ascending on, if any
    async fn find(
        &self,
        filter: &Filter,
        limit: u64,
        sort_by: Option<&str>,
    ) -> Result<Vec<Document>>;

    /// Fetch the first document matching `filter`
    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>>;

    /// Insert a new document
    async fn insert_one(&self, document: Document) -> Result<()>;

    /// Set `fields` on the first document matching `filter`, keeping its other fields
    async fn update_one(&self, filter: &Filter, fields: Document) -> Result<()>;
}
