//! Value formatting for exported records
//!
//! Exported records are rendered either as flat text cells (CSV) or as
//! relaxed extended JSON (JSON lines); see [`bson_utils`].

pub mod bson_utils;

pub use bson_utils::{BsonConverter, ExtendedJsonConverter, PlainTextConverter};
