//! DbUtils Library
//!
//! Data migration utilities for MongoDB collections: a compare-then-upsert
//! engine fed by newline-delimited JSON, and a paginated export pipeline
//! writing CSV or JSON lines.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `connection`: MongoDB connection management
//! - `error`: Error types and handling
//! - `executor`: Upsert engine and export pipeline
//! - `formatter`: BSON value conversion for output
//! - `storage`: Storage collaborator trait and implementations
//! - `utils`: Utility functions and helpers
//!
//! # Example
//!
//! ```no_run
//! use dbutils::config::{ExportConfig, FileType, OutputMode};
//! use dbutils::executor::run_export;
//! use dbutils::storage::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new();
//!     let config = ExportConfig::new(OutputMode::Stdout, FileType::Json);
//!
//!     let summary = run_export(&store, &config, false).await?;
//!     eprintln!("{}", summary);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, ExportConfig, UpsertConfig};
pub use connection::ConnectionManager;
pub use error::{DbUtilsError, Result};
pub use executor::{ExportPipeline, ExportSummary, UpsertEngine, UpsertSummary};
pub use storage::{MemoryStore, MongoStore, Storage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}
