//! CSV serializer
//!
//! The column set of a batch is the sorted union of the keys of its
//! documents. Columns are batch-local: two batches of the same run may carry
//! different headers when record shapes differ.

use std::collections::BTreeSet;

use mongodb::bson::Document;
use tracing::debug;

use crate::error::{ExecutionError, Result};
use crate::formatter::bson_utils::{BsonConverter, PlainTextConverter};

use super::BatchSerializer;

#[derive(Debug, Default)]
pub struct CsvSerializer {
    converter: PlainTextConverter,
}

impl CsvSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the sorted union of field names across a batch
    fn collect_headers(docs: &[Document]) -> Vec<&str> {
        let fields: BTreeSet<&str> = docs
            .iter()
            .flat_map(|doc| doc.keys().map(String::as_str))
            .collect();
        fields.into_iter().collect()
    }
}

impl BatchSerializer for CsvSerializer {
    fn serialize(&self, docs: &[Document], include_header: bool) -> Result<Vec<u8>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }

        let headers = Self::collect_headers(docs);
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        if include_header {
            writer.write_record(&headers)?;
        }

        for doc in docs {
            let row = headers
                .iter()
                .map(|field| self.converter.convert_optional(doc.get(*field)));
            writer.write_record(row)?;
        }

        debug!("Serialized {} rows with {} columns", docs.len(), headers.len());
        writer
            .into_inner()
            .map_err(|e| ExecutionError::WriteFailed(e.to_string()).into())
    }
}
