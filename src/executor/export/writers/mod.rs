//! Batch serializers for export operations
//!
//! A serializer turns one batch of documents into the bytes a sink writes.
//! It keeps no state between batches, so every batch is self-contained.

use mongodb::bson::Document;

use crate::config::FileType;
use crate::error::Result;

pub mod csv;
pub mod jsonl;

pub use csv::CsvSerializer;
pub use jsonl::JsonLinesSerializer;

/// Trait for serializing a batch of documents into an output format
pub trait BatchSerializer: Send + Sync {
    /// Serialize a batch
    ///
    /// # Arguments
    /// * `docs` - Documents of the batch, already projected
    /// * `include_header` - Whether to emit a header row, for formats that have one
    ///
    /// # Returns
    /// * `Result<Vec<u8>>` - Serialized batch, newline-terminated
    fn serialize(&self, docs: &[Document], include_header: bool) -> Result<Vec<u8>>;
}

/// Select the serializer for a file type
pub fn for_file_type(file_type: FileType) -> Box<dyn BatchSerializer> {
    match file_type {
        FileType::Csv => Box::new(CsvSerializer::new()),
        FileType::Json => Box::new(JsonLinesSerializer::new()),
    }
}
