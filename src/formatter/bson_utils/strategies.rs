//! Strategy implementations for BSON conversion
//!
//! - PlainTextConverter: flat text for CSV cells
//! - ExtendedJsonConverter: relaxed extended JSON for JSON lines

use mongodb::bson::{Bson, Document};
use serde_json::Value as JsonValue;

use super::converter::BsonConverter;
use super::helpers::{binary_to_base64, datetime_to_iso_string, to_relaxed_json_string};

/// Plain text converter for CSV cells
///
/// Scalars render bare, nested documents and arrays render as compact
/// extended JSON so a cell can be parsed back.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextConverter;

impl PlainTextConverter {
    pub fn new() -> Self {
        Self
    }
}

impl BsonConverter for PlainTextConverter {
    type Output = String;

    fn convert(&self, value: &Bson) -> String {
        match value {
            Bson::String(s) | Bson::Symbol(s) => s.clone(),
            Bson::Int32(n) => n.to_string(),
            Bson::Int64(n) => n.to_string(),
            Bson::Double(f) => f.to_string(),
            Bson::Boolean(b) => b.to_string(),
            Bson::Null | Bson::Undefined => String::new(),
            Bson::ObjectId(oid) => oid.to_hex(),
            Bson::DateTime(dt) => datetime_to_iso_string(dt),
            Bson::Decimal128(d) => d.to_string(),
            Bson::Binary(bin) => binary_to_base64(bin),
            Bson::RegularExpression(regex) => format!("/{}/{}", regex.pattern, regex.options),
            Bson::Timestamp(ts) => format!("Timestamp({}, {})", ts.time, ts.increment),
            // Arrays, documents and the remaining rare types
            other => to_relaxed_json_string(other),
        }
    }
}

/// Relaxed extended JSON converter
///
/// Keeps MongoDB-specific scalars (ObjectId, DateTime, Decimal128, ...)
/// as `{"$oid": ...}`-style wrappers so they parse back to the same type.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtendedJsonConverter;

impl ExtendedJsonConverter {
    pub fn new() -> Self {
        Self
    }

    /// Parse relaxed or canonical extended JSON back into a document
    pub fn parse_document(&self, value: JsonValue) -> Option<Document> {
        match Bson::try_from(value) {
            Ok(Bson::Document(doc)) => Some(doc),
            _ => None,
        }
    }
}

impl BsonConverter for ExtendedJsonConverter {
    type Output = JsonValue;

    fn convert(&self, value: &Bson) -> JsonValue {
        value.clone().into_relaxed_extjson()
    }
}
