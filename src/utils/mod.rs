//! Utility functions and helpers for dbutils
//!
//! - Command-line value parsing (field lists, booleans, query terms)
//! - BSON value comparison shared by the comparator and the in-memory store

/// Command-line value parsing
pub mod fields {
    use regex::Regex;

    use crate::error::{ConfigError, ParseError, Result};

    /// Split a comma-separated list, trimming entries and dropping empty ones
    ///
    /// # Arguments
    /// * `s` - Comma-separated values
    ///
    /// # Returns
    /// * `Vec<String>` - Field names in input order
    pub fn split_comma_separated(s: &str) -> Vec<String> {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Parse a boolean flag value
    ///
    /// Accepts `yes/true/t/y/1` and `no/false/f/n/0`, case-insensitive.
    pub fn parse_bool(value: &str) -> std::result::Result<bool, String> {
        match value.trim().to_lowercase().as_str() {
            "yes" | "true" | "t" | "y" | "1" => Ok(true),
            "no" | "false" | "f" | "n" | "0" => Ok(false),
            _ => Err(format!("boolean value expected, given '{value}'")),
        }
    }

    /// Parse a `KEY=REGEX` query term, splitting at the first `=`
    ///
    /// # Returns
    /// * `Result<(String, Regex)>` - Field name and compiled pattern
    pub fn parse_query_term(term: &str) -> Result<(String, Regex)> {
        let (key, pattern) = term
            .split_once('=')
            .ok_or_else(|| ParseError::InvalidQuery(term.to_string()))?;

        let key = key.trim();
        if key.is_empty() {
            return Err(ParseError::InvalidQuery(term.to_string()).into());
        }

        let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidValue {
            field: format!("queries.{key}"),
            value: format!("{pattern} ({e})"),
        })?;

        Ok((key.to_string(), regex))
    }
}

/// BSON value comparison
///
/// Numbers compare by value across int32, int64 and double. Ordering is only
/// defined within a type bracket, mirroring how MongoDB evaluates `$gt`.
pub mod values {
    use std::cmp::Ordering;

    use mongodb::bson::Bson;

    /// Rank of a value's type in MongoDB's cross-type sort order
    pub fn type_rank(value: &Bson) -> u8 {
        match value {
            Bson::MinKey => 0,
            Bson::Null | Bson::Undefined => 1,
            Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
            Bson::String(_) | Bson::Symbol(_) => 3,
            Bson::Document(_) => 4,
            Bson::Array(_) => 5,
            Bson::Binary(_) => 6,
            Bson::ObjectId(_) => 7,
            Bson::Boolean(_) => 8,
            Bson::DateTime(_) => 9,
            Bson::Timestamp(_) => 10,
            Bson::RegularExpression(_) => 11,
            Bson::MaxKey => 13,
            _ => 12,
        }
    }

    fn as_i64(value: &Bson) -> Option<i64> {
        match value {
            Bson::Int32(n) => Some(i64::from(*n)),
            Bson::Int64(n) => Some(*n),
            _ => None,
        }
    }

    fn as_f64(value: &Bson) -> Option<f64> {
        match value {
            Bson::Int32(n) => Some(f64::from(*n)),
            Bson::Int64(n) => Some(*n as f64),
            Bson::Double(f) => Some(*f),
            Bson::Decimal128(d) => d.to_string().parse().ok(),
            _ => None,
        }
    }

    /// Compare two values of the same type bracket
    ///
    /// Returns `None` when the values are in different brackets or the
    /// bracket has no ordering here.
    pub fn compare_values(a: &Bson, b: &Bson) -> Option<Ordering> {
        if let (Bson::Decimal128(x), Bson::Decimal128(y)) = (a, b) {
            if x == y {
                return Some(Ordering::Equal);
            }
        }
        if let (Some(x), Some(y)) = (as_i64(a), as_i64(b)) {
            return Some(x.cmp(&y));
        }
        if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
            return x.partial_cmp(&y);
        }

        match (a, b) {
            (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
            (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
            (Bson::DateTime(x), Bson::DateTime(y)) => {
                Some(x.timestamp_millis().cmp(&y.timestamp_millis()))
            }
            (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
            (Bson::Timestamp(x), Bson::Timestamp(y)) => {
                Some((x.time, x.increment).cmp(&(y.time, y.increment)))
            }
            (Bson::Null, Bson::Null) => Some(Ordering::Equal),
            _ => None,
        }
    }

    /// Total order used for sorting: type bracket first, then value
    pub fn sort_order(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
        let a = a.unwrap_or(&Bson::Null);
        let b = b.unwrap_or(&Bson::Null);
        type_rank(a)
            .cmp(&type_rank(b))
            .then_with(|| compare_values(a, b).unwrap_or(Ordering::Equal))
    }

    /// Structural equality over nested documents and arrays
    ///
    /// Document key order is ignored. Numeric values are equal when their
    /// values are equal, whatever their BSON width.
    pub fn values_equal(a: &Bson, b: &Bson) -> bool {
        match (a, b) {
            (Bson::Document(x), Bson::Document(y)) => {
                x.len() == y.len()
                    && x
                        .iter()
                        .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
            }
            (Bson::Array(x), Bson::Array(y)) => {
                x.len() == y.len() && x.iter().zip(y).all(|(v, w)| values_equal(v, w))
            }
            _ if type_rank(a) == 2 && type_rank(b) == 2 => match compare_values(a, b) {
                Some(ordering) => ordering == Ordering::Equal,
                None => a == b,
            },
            _ => a == b,
        }
    }
}
