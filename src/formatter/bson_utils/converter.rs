//! Core converter trait for BSON value conversion

use mongodb::bson::{Bson, Document};

/// Core trait for BSON value conversion
///
/// Different strategies produce different outputs (text cells, JSON values).
pub trait BsonConverter {
    /// Output type of the conversion
    type Output;

    /// Convert a BSON value to the output type
    fn convert(&self, value: &Bson) -> Self::Output;

    /// Convert an optional BSON value, using the output's default for `None`
    fn convert_optional(&self, value: Option<&Bson>) -> Self::Output
    where
        Self::Output: Default,
    {
        value.map(|v| self.convert(v)).unwrap_or_default()
    }

    /// Convert a whole document
    fn convert_document(&self, doc: &Document) -> Self::Output {
        self.convert(&Bson::Document(doc.clone()))
    }
}
