//! Helper functions for BSON value conversion

use mongodb::bson::{Binary, Bson, DateTime};

/// Convert DateTime to an RFC 3339 string, falling back to epoch millis
pub fn datetime_to_iso_string(dt: &DateTime) -> String {
    dt.try_to_rfc3339_string()
        .unwrap_or_else(|_| format!("{}", dt.timestamp_millis()))
}

/// Convert Binary data to Base64 string
pub fn binary_to_base64(bin: &Binary) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(&bin.bytes)
}

/// Render a value as compact relaxed extended JSON
pub fn to_relaxed_json_string(value: &Bson) -> String {
    value.clone().into_relaxed_extjson().to_string()
}
