//! BSON value conversion utilities
//!
//! Conversion strategies share the [`BsonConverter`] trait:
//! - Plain text conversion for CSV cells
//! - Relaxed extended JSON for JSON lines output and input parsing

mod converter;
mod helpers;
mod strategies;

pub use converter::BsonConverter;
pub use helpers::{datetime_to_iso_string, to_relaxed_json_string};
pub use strategies::{ExtendedJsonConverter, PlainTextConverter};
