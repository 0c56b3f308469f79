//! Record comparator
//!
//! Decides whether an incoming record differs from the stored one. Only the
//! *comparable view* of each record takes part: the identifier field and the
//! managed timestamps are always ignored, as are explicitly excluded fields,
//! and a non-empty include list narrows the view further.

use std::collections::{BTreeMap, BTreeSet};

use mongodb::bson::{Bson, Document};

use crate::config::UpsertConfig;
use crate::config::engine::DEFAULT_ID_FIELD;
use crate::utils::values::values_equal;

/// Timestamp stamped on insert
pub const CREATED_AT: &str = "created_at";

/// Timestamp stamped on update
pub const UPDATED_AT: &str = "updated_at";

/// Which fields take part in a comparison
#[derive(Debug, Clone)]
pub struct CompareScope {
    include: BTreeSet<String>,
    ignore: BTreeSet<String>,
}

impl CompareScope {
    /// # Arguments
    /// * `id_field` - Identifier field, always ignored
    /// * `include` - Fields to compare; empty means all
    /// * `exclude` - Fields never compared
    pub fn new(id_field: &str, include: &[String], exclude: &[String]) -> Self {
        let mut ignore: BTreeSet<String> = exclude.iter().cloned().collect();
        ignore.insert(id_field.to_string());
        ignore.insert(CREATED_AT.to_string());
        ignore.insert(UPDATED_AT.to_string());

        Self {
            include: include.iter().cloned().collect(),
            ignore,
        }
    }

    pub fn from_config(config: &UpsertConfig) -> Self {
        Self::new(
            &config.id_field,
            &config.compare_fields,
            &config.compare_ignore_fields,
        )
    }

    fn takes_part(&self, field: &str) -> bool {
        !self.ignore.contains(field) && (self.include.is_empty() || self.include.contains(field))
    }

    fn comparable_view<'a>(&self, record: &'a Document) -> BTreeMap<&'a str, &'a Bson> {
        record
            .iter()
            .filter(|(key, _)| self.takes_part(key))
            .map(|(key, value)| (key.as_str(), value))
            .collect()
    }

    /// Whether the comparable views of the two records are not structurally equal
    pub fn differs(&self, new_record: &Document, old_record: &Document) -> bool {
        let new_view = self.comparable_view(new_record);
        let old_view = self.comparable_view(old_record);

        new_view.len() != old_view.len()
            || new_view.iter().any(|(key, value)| {
                old_view
                    .get(key)
                    .is_none_or(|other| !values_equal(value, other))
            })
    }
}

/// Compare two records using the default identifier field
pub fn differs(new_record: &Document, old_record: &Document, include: &[String], exclude: &[String]) -> bool {
    CompareScope::new(DEFAULT_ID_FIELD, include, exclude).differs(new_record, old_record)
}
