//! Error handling for dbutils.
//!
//! - Application-specific error kinds (connection, parse, execution, config)
//! - A crate-wide `Result` alias
//! - Compact rendering of MongoDB driver errors
//!
//! Per-record errors raised by the upsert engine are classified with
//! [`DbUtilsError::is_conflict`] so a rejected record can be told apart from a
//! failed one without string matching.

pub mod kinds;
pub mod mongo;

pub use kinds::{ConfigError, ConnectionError, DbUtilsError, ExecutionError, ParseError, Result};
pub use mongo::{ErrorInfo, extract_error_info};
