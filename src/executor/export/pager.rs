//! Keyset pagination over the storage collaborator
//!
//! Pages are fetched in ascending identifier order. After the first page every
//! query carries `identifier > last_seen_id`, so a page never repeats a record
//! already emitted and never skips an unread one, provided identifiers are
//! totally ordered and nothing is inserted below `last_seen_id` mid-run.

use mongodb::bson::{Bson, Document};
use tracing::debug;

use crate::config::ExportConfig;
use crate::error::{ExecutionError, Result};
use crate::storage::{Filter, Storage};

/// Transient per-run pagination state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CursorState {
    /// Identifier of the last record fetched, `None` before the first page
    pub last_seen_id: Option<Bson>,
    /// Number of pages emitted so far
    pub batch_index: u64,
    /// Number of records emitted so far
    pub records_emitted: u64,
}

/// Fetches successive pages from a storage collaborator
pub struct KeysetPager<'a> {
    store: &'a dyn Storage,
    id_field: String,
    base: Filter,
    state: CursorState,
    exhausted: bool,
}

impl<'a> KeysetPager<'a> {
    /// # Arguments
    /// * `store` - Storage to page through
    /// * `id_field` - Field used for ordering and the keyset predicate
    /// * `base` - Predicate applied to every page
    pub fn new(store: &'a dyn Storage, id_field: &str, base: Filter) -> Self {
        Self {
            store,
            id_field: id_field.to_string(),
            base,
            state: CursorState::default(),
            exhausted: false,
        }
    }

    /// Build a pager whose base predicate is the configured regex queries
    pub fn from_config(store: &'a dyn Storage, config: &ExportConfig) -> Self {
        let base = config
            .queries
            .iter()
            .fold(Filter::new(), |filter, (field, pattern)| {
                filter.regex(field, pattern.clone())
            });
        Self::new(store, &config.id_field, base)
    }

    pub fn state(&self) -> &CursorState {
        &self.state
    }

    fn page_filter(&self) -> Filter {
        match &self.state.last_seen_id {
            Some(last) => self.base.clone().gt(&self.id_field, last.clone()),
            None => self.base.clone(),
        }
    }

    /// Fetch the next page of at most `page_size` records
    ///
    /// # Returns
    /// * `Result<Option<Vec<Document>>>` - The raw page, or `None` once the
    ///   collection is exhausted
    pub async fn next_page(&mut self, page_size: u64) -> Result<Option<Vec<Document>>> {
        if self.exhausted || page_size == 0 {
            return Ok(None);
        }

        let filter = self.page_filter();
        let page = self
            .store
            .find(&filter, page_size, Some(self.id_field.as_str()))
            .await?;

        let Some(last) = page.last() else {
            debug!(
                "Pagination exhausted after {} pages",
                self.state.batch_index
            );
            self.exhausted = true;
            return Ok(None);
        };

        let last_id = last.get(&self.id_field).cloned().ok_or_else(|| {
            ExecutionError::CursorError(format!(
                "record without '{}' ends page {}",
                self.id_field, self.state.batch_index
            ))
        })?;

        debug!(
            "Fetched page {} with {} records, last {}={}",
            self.state.batch_index,
            page.len(),
            self.id_field,
            last_id
        );
        self.state.last_seen_id = Some(last_id);
        Ok(Some(page))
    }

    /// Record that a fetched page of `count` records was emitted
    pub fn advance(&mut self, count: u64) {
        self.state.batch_index += 1;
        self.state.records_emitted += count;
    }
}
