//! JSON Lines serializer
//!
//! One relaxed extended JSON document per line, so store-specific scalars
//! such as object ids and datetimes survive a round trip through the file.

use mongodb::bson::Document;

use crate::error::Result;
use crate::formatter::bson_utils::{BsonConverter, ExtendedJsonConverter};

use super::BatchSerializer;

#[derive(Debug, Default)]
pub struct JsonLinesSerializer {
    converter: ExtendedJsonConverter,
}

impl JsonLinesSerializer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BatchSerializer for JsonLinesSerializer {
    fn serialize(&self, docs: &[Document], _include_header: bool) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for doc in docs {
            let json = self.converter.convert_document(doc);
            serde_json::to_writer(&mut out, &json)?;
            out.push(b'\n');
        }
        Ok(out)
    }
}
