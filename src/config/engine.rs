//! Immutable engine configurations
//!
//! Built once from command-line arguments and passed by reference into the
//! upsert engine and the export pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::ValueEnum;
use regex::Regex;

use crate::error::{ConfigError, Result};

/// Default identifier field
pub const DEFAULT_ID_FIELD: &str = "_id";

/// Default export page size
pub const DEFAULT_BATCH_SIZE: u64 = 500;

/// Default extension for chunk files
pub const DEFAULT_FILE_EXTENSION: &str = "txt";

/// Configuration for the upsert engine
#[derive(Debug, Clone)]
pub struct UpsertConfig {
    /// Field used to match incoming records against stored ones
    pub id_field: String,

    /// Update existing records instead of rejecting them
    pub create_or_update: bool,

    /// Stamp `created_at` on insert and `updated_at` on update
    pub auto_manage_timestamps: bool,

    /// Fields to compare; empty means every field
    pub compare_fields: Vec<String>,

    /// Fields excluded from comparison
    pub compare_ignore_fields: Vec<String>,
}

impl Default for UpsertConfig {
    fn default() -> Self {
        Self {
            id_field: DEFAULT_ID_FIELD.to_string(),
            create_or_update: true,
            auto_manage_timestamps: true,
            compare_fields: Vec::new(),
            compare_ignore_fields: Vec::new(),
        }
    }
}

impl UpsertConfig {
    pub fn validate(&self) -> Result<()> {
        if self.id_field.trim().is_empty() {
            return Err(ConfigError::MissingField("id-field".to_string()).into());
        }
        Ok(())
    }
}

/// Where exported batches go
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Standard output
    Stdout,
    /// A single file, appended batch by batch
    File,
    /// One file per batch inside a directory
    FileChunks,
}

/// Serialization format of exported batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileType {
    Csv,
    Json,
}

/// Configuration for the export pipeline
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Field used for keyset pagination
    pub id_field: String,

    /// Columns to project; empty means every column
    pub columns: Vec<String>,

    /// Page size, also the number of records per chunk file
    pub batch_size: u64,

    /// Maximum number of records to export
    pub limit: Option<u64>,

    pub output_mode: OutputMode,

    pub file_type: FileType,

    /// Emit a CSV header row
    pub include_header: bool,

    /// Output file (file mode) or directory (file-chunks mode)
    pub output_path: Option<PathBuf>,

    /// Chunk file name prefix
    pub output_file_prefix: Option<String>,

    /// Chunk file name extension, without the dot
    pub output_file_extension: String,

    /// Per-field regex predicates, ANDed together
    pub queries: BTreeMap<String, Regex>,
}

impl ExportConfig {
    /// Create a configuration with default settings for the given output
    pub fn new(output_mode: OutputMode, file_type: FileType) -> Self {
        Self {
            id_field: DEFAULT_ID_FIELD.to_string(),
            columns: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            limit: None,
            output_mode,
            file_type,
            include_header: false,
            output_path: None,
            output_file_prefix: None,
            output_file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            queries: BTreeMap::new(),
        }
    }

    /// Effective record limit; zero means unlimited
    pub fn effective_limit(&self) -> Option<u64> {
        self.limit.filter(|&n| n > 0)
    }

    /// Check flag combinations that depend on the output mode
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch-size".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        if self.id_field.trim().is_empty() {
            return Err(ConfigError::MissingField("id-field".to_string()).into());
        }

        let has_path = self
            .output_path
            .as_ref()
            .is_some_and(|p| !p.as_os_str().is_empty());
        if self.output_mode != OutputMode::Stdout && !has_path {
            return Err(ConfigError::MissingField(
                "output-path is required when output-mode is file or file-chunks".to_string(),
            )
            .into());
        }

        let has_prefix = self
            .output_file_prefix
            .as_ref()
            .is_some_and(|p| !p.is_empty());
        if self.output_mode == OutputMode::FileChunks && !has_prefix {
            return Err(ConfigError::MissingField(
                "output-file-prefix is required when output-mode is file-chunks".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
