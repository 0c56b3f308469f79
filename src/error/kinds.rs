use std::{fmt, io};

use crate::error::mongo::format_mongodb_error;

/// Crate-wide `Result` type using [`DbUtilsError`] as the error.
pub type Result<T> = std::result::Result<T, DbUtilsError>;

/// Top-level error type for dbutils operations.
///
/// Wraps the more specific error kinds so that every fallible function in the
/// crate can share a single error type.
#[derive(Debug)]
pub enum DbUtilsError {
    /// Connection-related errors.
    Connection(ConnectionError),

    /// Input parsing errors.
    Parse(ParseError),

    /// Engine execution errors.
    Execution(ExecutionError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// MongoDB driver errors.
    MongoDb(mongodb::error::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Connection-specific errors.
#[derive(Debug)]
pub enum ConnectionError {
    /// Failed to establish a connection.
    ConnectionFailed(String),

    /// Invalid connection URI.
    InvalidUri(String),

    /// Not currently connected to MongoDB.
    NotConnected,

    /// Ping command failed.
    PingFailed(String),
}

/// Input parsing errors.
#[derive(Debug)]
pub enum ParseError {
    /// A line of the input file is not a JSON object.
    InvalidRecord { line: usize, message: String },

    /// A query term is not of the form `KEY=REGEX`.
    InvalidQuery(String),
}

/// Execution-specific errors.
#[derive(Debug)]
pub enum ExecutionError {
    /// A record with the same identifier already exists and updates are disabled.
    RecordExists(String),

    /// A write would duplicate a unique key.
    DuplicateKey(String),

    /// Pagination could not advance.
    CursorError(String),

    /// Writing export output failed.
    WriteFailed(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Missing required field or flag.
    MissingField(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

impl DbUtilsError {
    /// Whether this error is a strict-insert conflict rather than a failure.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DbUtilsError::Execution(ExecutionError::RecordExists(_))
        )
    }

    /// Whether this error comes from invalid operator input (flags or config).
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            DbUtilsError::Config(_) | DbUtilsError::Parse(ParseError::InvalidQuery(_))
        )
    }
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for DbUtilsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbUtilsError::Connection(e) => write!(f, "Connection error: {e}"),
            DbUtilsError::Parse(e) => write!(f, "{e}"),
            DbUtilsError::Execution(e) => write!(f, "Execution error: {e}"),
            DbUtilsError::Config(e) => write!(f, "Configuration error: {e}"),
            DbUtilsError::Io(e) => write!(f, "I/O error: {e}"),
            DbUtilsError::MongoDb(e) => format_mongodb_error(f, e),
            DbUtilsError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::ConnectionFailed(msg) => write!(f, "Failed to connect: {msg}"),
            ConnectionError::InvalidUri(uri) => write!(f, "Invalid connection URI: {uri}"),
            ConnectionError::NotConnected => write!(f, "Not connected to MongoDB"),
            ConnectionError::PingFailed(msg) => write!(f, "Ping failed: {msg}"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidRecord { line, message } => {
                write!(f, "Invalid record on line {line}: {message}")
            }
            ParseError::InvalidQuery(term) => {
                write!(f, "Invalid query '{term}', expected KEY=REGEX")
            }
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::RecordExists(id) => write!(f, "Record already exists: {id}"),
            ExecutionError::DuplicateKey(id) => write!(f, "Duplicate key: {id}"),
            ExecutionError::CursorError(msg) => write!(f, "Cursor error: {msg}"),
            ExecutionError::WriteFailed(msg) => write!(f, "Write failed: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::MissingField(field) => write!(f, "Missing required field: {field}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for DbUtilsError {}
impl std::error::Error for ConnectionError {}
impl std::error::Error for ParseError {}
impl std::error::Error for ExecutionError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to DbUtilsError ========================= */

impl From<io::Error> for DbUtilsError {
    fn from(err: io::Error) -> Self {
        DbUtilsError::Io(err)
    }
}

impl From<mongodb::error::Error> for DbUtilsError {
    fn from(err: mongodb::error::Error) -> Self {
        DbUtilsError::MongoDb(err)
    }
}

impl From<ConnectionError> for DbUtilsError {
    fn from(err: ConnectionError) -> Self {
        DbUtilsError::Connection(err)
    }
}

impl From<ParseError> for DbUtilsError {
    fn from(err: ParseError) -> Self {
        DbUtilsError::Parse(err)
    }
}

impl From<ExecutionError> for DbUtilsError {
    fn from(err: ExecutionError) -> Self {
        DbUtilsError::Execution(err)
    }
}

impl From<ConfigError> for DbUtilsError {
    fn from(err: ConfigError) -> Self {
        DbUtilsError::Config(err)
    }
}

impl From<csv::Error> for DbUtilsError {
    fn from(err: csv::Error) -> Self {
        DbUtilsError::Execution(ExecutionError::WriteFailed(format!("CSV: {err}")))
    }
}

impl From<serde_json::Error> for DbUtilsError {
    fn from(err: serde_json::Error) -> Self {
        DbUtilsError::Execution(ExecutionError::WriteFailed(format!("JSON: {err}")))
    }
}

impl From<String> for DbUtilsError {
    fn from(msg: String) -> Self {
        DbUtilsError::Generic(msg)
    }
}

impl From<&str> for DbUtilsError {
    fn from(msg: &str) -> Self {
        DbUtilsError::Generic(msg.to_owned())
    }
}
