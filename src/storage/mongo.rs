//! MongoDB-backed storage

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::{Document, doc};
use tracing::debug;

use super::{Filter, Storage};
use crate::error::Result;

/// Storage over a single MongoDB collection
#[derive(Clone)]
pub struct MongoStore {
    collection: Collection<Document>,
}

impl MongoStore {
    pub fn new(collection: Collection<Document>) -> Self {
        Self { collection }
    }

    /// Namespace of the underlying collection, `db.collection`
    pub fn namespace(&self) -> String {
        self.collection.namespace().to_string()
    }
}

#[async_trait]
impl Storage for MongoStore {
    async fn find(
        &self,
        filter: &Filter,
        limit: u64,
        sort_by: Option<&str>,
    ) -> Result<Vec<Document>> {
        let query = filter.to_document();
        debug!("find on {} with filter: {:?}", self.namespace(), query);

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut action = self.collection.find(query).limit(limit);
        if let Some(field) = sort_by {
            let mut sort = Document::new();
            sort.insert(field, 1);
            action = action.sort(sort);
        }

        let cursor = action.await?;
        let docs: Vec<Document> = cursor.try_collect().await?;
        Ok(docs)
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>> {
        let query = filter.to_document();
        Ok(self.collection.find_one(query).await?)
    }

    async fn insert_one(&self, document: Document) -> Result<()> {
        self.collection.insert_one(document).await?;
        Ok(())
    }

    async fn update_one(&self, filter: &Filter, fields: Document) -> Result<()> {
        let query = filter.to_document();
        let result = self
            .collection
            .update_one(query, doc! { "$set": fields })
            .await?;
        debug!(
            "update_one matched {} modified {}",
            result.matched_count, result.modified_count
        );
        Ok(())
    }
}
