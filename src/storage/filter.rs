//! Conjunctive per-field predicates
//!
//! A [`Filter`] is rendered to a MongoDB query document for the driver and
//! evaluated directly by the in-memory store.

use std::cmp::Ordering;

use mongodb::bson::{Bson, Document};
use regex::Regex;

use crate::utils::values::{compare_values, values_equal};

/// A single condition on one field
#[derive(Debug, Clone)]
pub enum Condition {
    /// Field equals the value
    Equals(Bson),
    /// Field is a string matching the pattern
    Matches(Regex),
    /// Field is greater than the value, within the same type bracket
    GreaterThan(Bson),
}

impl Condition {
    fn operator(&self) -> (&'static str, Bson) {
        match self {
            Condition::Equals(v) => ("$eq", v.clone()),
            Condition::Matches(re) => ("$regex", Bson::String(re.as_str().to_string())),
            Condition::GreaterThan(v) => ("$gt", v.clone()),
        }
    }

    fn holds_for(&self, value: Option<&Bson>) -> bool {
        let Some(value) = value else {
            return false;
        };

        match self {
            Condition::Equals(expected) => values_equal(value, expected),
            Condition::Matches(re) => match value {
                Bson::String(s) => re.is_match(s),
                Bson::Array(items) => items
                    .iter()
                    .any(|item| matches!(item, Bson::String(s) if re.is_match(s))),
                _ => false,
            },
            Condition::GreaterThan(bound) => {
                compare_values(value, bound) == Some(Ordering::Greater)
            }
        }
    }
}

/// Conjunction of field conditions
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(String, Condition)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter matching a single field by exact value
    pub fn by_field(field: &str, value: Bson) -> Self {
        Self::new().eq(field, value)
    }

    pub fn eq(mut self, field: &str, value: Bson) -> Self {
        self.conditions
            .push((field.to_string(), Condition::Equals(value)));
        self
    }

    pub fn regex(mut self, field: &str, pattern: Regex) -> Self {
        self.conditions
            .push((field.to_string(), Condition::Matches(pattern)));
        self
    }

    pub fn gt(mut self, field: &str, value: Bson) -> Self {
        self.conditions
            .push((field.to_string(), Condition::GreaterThan(value)));
        self
    }

    pub fn conditions(&self) -> &[(String, Condition)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render as a MongoDB query document
    ///
    /// Conditions on the same field share one operator document, e.g.
    /// `{"_id": {"$regex": "^a", "$gt": 10}}`.
    pub fn to_document(&self) -> Document {
        let mut query = Document::new();

        for (field, condition) in &self.conditions {
            let (op, value) = condition.operator();
            match query.get_mut(field) {
                Some(Bson::Document(ops)) => {
                    ops.insert(op, value);
                }
                _ => {
                    let mut ops = Document::new();
                    ops.insert(op, value);
                    query.insert(field.clone(), ops);
                }
            }
        }

        query
    }

    /// Evaluate the filter against a document
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition.holds_for(doc.get(field)))
    }
}
