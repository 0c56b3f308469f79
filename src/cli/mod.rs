//! Command-line interface for dbutils
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and connection URI precedence
//! - Conversion of subcommand flags into engine configurations

use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};

use crate::config::engine::{DEFAULT_BATCH_SIZE, DEFAULT_FILE_EXTENSION, DEFAULT_ID_FIELD};
use crate::config::{Config, ExportConfig, FileType, OutputMode, UpsertConfig};
use crate::error::{DbUtilsError, Result};
use crate::utils::fields::{parse_bool, parse_query_term, split_comma_separated};

/// DbUtils - MongoDB data migration utilities
#[derive(Parser, Debug)]
#[command(
    name = "dbutils",
    version,
    about = "MongoDB data migration utilities",
    long_about = "Upsert newline-delimited JSON into a collection, or export a collection
to stdout, a single file or chunked files as CSV or JSON lines."
)]
pub struct CliArgs {
    /// MongoDB connection URI
    ///
    /// Takes precedence over DBUTILS_URI and the configuration file.
    #[arg(long, global = true, value_name = "URI")]
    pub uri: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long = "config", global = true, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Quiet mode (errors only, no progress)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv", global = true)]
    pub very_verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for dbutils
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Insert or update records from a newline-delimited JSON file
    Insert(InsertArgs),

    /// Export records matching regex queries
    Query(QueryArgs),
}

#[derive(Args, Debug)]
pub struct InsertArgs {
    /// MongoDB database name
    #[arg(long, value_name = "NAME")]
    pub database: String,

    /// MongoDB collection name
    #[arg(long, value_name = "NAME")]
    pub collection: String,

    /// Identifier field used to match existing records
    #[arg(long, value_name = "FIELD", default_value = DEFAULT_ID_FIELD)]
    pub id_field: String,

    /// Manage created_at and updated_at fields
    #[arg(long, value_name = "BOOL", default_value = "true", value_parser = parse_bool, action = ArgAction::Set)]
    pub auto_manage_timestamps: bool,

    /// Update records that already exist; when false they are rejected
    #[arg(long, value_name = "BOOL", default_value = "true", value_parser = parse_bool, action = ArgAction::Set)]
    pub create_or_update: bool,

    /// Input file, one JSON object per line
    #[arg(long, value_name = "FILE")]
    pub input_file: PathBuf,

    /// Comma-separated fields to compare (default: all fields)
    #[arg(long, value_name = "FIELDS", default_value = "")]
    pub compare_fields: String,

    /// Comma-separated fields to ignore when comparing
    #[arg(long, value_name = "FIELDS", default_value = "")]
    pub compare_ignore_fields: String,
}

impl InsertArgs {
    /// Build the upsert engine configuration
    pub fn to_upsert_config(&self) -> Result<UpsertConfig> {
        let config = UpsertConfig {
            id_field: self.id_field.trim().to_string(),
            create_or_update: self.create_or_update,
            auto_manage_timestamps: self.auto_manage_timestamps,
            compare_fields: split_comma_separated(&self.compare_fields),
            compare_ignore_fields: split_comma_separated(&self.compare_ignore_fields),
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// MongoDB database name
    #[arg(long, value_name = "NAME")]
    pub database: String,

    /// MongoDB collection name
    #[arg(long, value_name = "NAME")]
    pub collection: String,

    /// Comma-separated columns to project (default: all columns)
    #[arg(long, value_name = "FIELDS", default_value = "")]
    pub columns: String,

    /// Records per page, and per file in file-chunks mode
    #[arg(long, value_name = "N", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: u64,

    /// Maximum number of records; zero or negative means unlimited
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Output mode
    #[arg(long, value_enum)]
    pub output_mode: OutputMode,

    /// Output file type
    #[arg(long, value_enum)]
    pub output_file_type: FileType,

    /// Include a header row in CSV output
    #[arg(long, value_name = "BOOL", default_value = "false", value_parser = parse_bool, action = ArgAction::Set)]
    pub include_header: bool,

    /// Output file for file mode, output directory for file-chunks mode
    #[arg(long, value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// File name prefix for file-chunks mode
    #[arg(long, value_name = "PREFIX")]
    pub output_file_prefix: Option<String>,

    /// File extension for file-chunks mode
    #[arg(long, value_name = "EXT", default_value = DEFAULT_FILE_EXTENSION)]
    pub output_file_extension: String,

    /// Identifier field used for ordering and pagination
    #[arg(long, value_name = "FIELD", default_value = DEFAULT_ID_FIELD)]
    pub id_field: String,

    /// Regex queries, ANDed across fields
    #[arg(long, value_name = "KEY=REGEX", num_args = 1..)]
    pub queries: Vec<String>,
}

impl QueryArgs {
    /// Build the export pipeline configuration
    pub fn to_export_config(&self) -> Result<ExportConfig> {
        let mut config = ExportConfig::new(self.output_mode, self.output_file_type);
        config.id_field = self.id_field.trim().to_string();
        config.columns = split_comma_separated(&self.columns);
        config.batch_size = self.batch_size;
        config.limit = self.limit.and_then(|n| u64::try_from(n).ok());
        config.include_header = self.include_header;
        config.output_path = self.output_path.clone();
        config.output_file_prefix = self.output_file_prefix.clone();
        config.output_file_extension = self.output_file_extension.clone();

        for term in &self.queries {
            let (field, regex) = parse_query_term(term)?;
            config.queries.insert(field, regex);
        }

        config.validate()?;
        Ok(config)
    }
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Parse the process arguments and load configuration
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Load configuration for already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Load configuration from file, then apply `DBUTILS_URI` and `--uri`
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load_from_file(args.config_file.as_deref())?;
        config.apply_env();
        config.apply_uri_override(args.uri.clone());
        config.validate()?;
        Ok(config)
    }

    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.args.config_file.as_deref()
    }

    /// Logging level chosen by the verbosity flags, falling back to the configuration
    pub fn log_level(&self) -> tracing::Level {
        if self.args.very_verbose {
            tracing::Level::TRACE
        } else if self.args.verbose {
            tracing::Level::DEBUG
        } else if self.args.quiet {
            tracing::Level::ERROR
        } else {
            self.config.logging.level.to_tracing_level()
        }
    }
}

/// Render an error as a clap usage error, which exits with status 2
pub fn usage_error(err: &DbUtilsError) -> clap::Error {
    CliArgs::command().error(ErrorKind::ValueValidation, err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    fn query_args(extra: &[&str]) -> QueryArgs {
        let mut args = vec!["dbutils", "query", "--database", "db", "--collection", "c"];
        args.extend_from_slice(extra);
        match parse(&args).command {
            Commands::Query(q) => q,
            other => panic!("expected query, got {other:?}"),
        }
    }

    #[test]
    fn test_insert_defaults() {
        let cli = parse(&[
            "dbutils", "insert", "--database", "db", "--collection", "c", "--input-file", "in.json",
        ]);

        let Commands::Insert(args) = cli.command else {
            panic!("expected insert");
        };
        let config = args.to_upsert_config().unwrap();
        assert_eq!(config.id_field, "_id");
        assert!(config.create_or_update);
        assert!(config.auto_manage_timestamps);
        assert!(config.compare_fields.is_empty());
        assert_eq!(args.input_file, PathBuf::from("in.json"));
    }

    #[test]
    fn test_insert_flags() {
        let cli = parse(&[
            "dbutils",
            "insert",
            "--database",
            "db",
            "--collection",
            "c",
            "--input-file",
            "in.json",
            "--id-field",
            "sku",
            "--create-or-update",
            "no",
            "--auto-manage-timestamps",
            "F",
            "--compare-fields",
            " price, qty ,,",
            "--compare-ignore-fields",
            "note",
        ]);

        let Commands::Insert(args) = cli.command else {
            panic!("expected insert");
        };
        let config = args.to_upsert_config().unwrap();
        assert_eq!(config.id_field, "sku");
        assert!(!config.create_or_update);
        assert!(!config.auto_manage_timestamps);
        assert_eq!(config.compare_fields, vec!["price", "qty"]);
        assert_eq!(config.compare_ignore_fields, vec!["note"]);
    }

    #[test]
    fn test_invalid_bool_is_rejected() {
        let result = CliArgs::try_parse_from([
            "dbutils", "insert", "--database", "db", "--collection", "c", "--input-file", "x",
            "--create-or-update", "maybe",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_required_flags_are_rejected() {
        let result = CliArgs::try_parse_from(["dbutils", "query", "--database", "db"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_query_to_export_config() {
        let args = query_args(&[
            "--output-mode",
            "file-chunks",
            "--output-file-type",
            "csv",
            "--output-path",
            "out",
            "--output-file-prefix",
            "p",
            "--output-file-extension",
            "csv",
            "--include-header",
            "yes",
            "--columns",
            "name,age",
            "--batch-size",
            "100",
            "--limit",
            "250",
            "--queries",
            "name=^a",
            "city=Par=is",
        ]);

        let config = args.to_export_config().unwrap();
        assert_eq!(config.output_mode, OutputMode::FileChunks);
        assert_eq!(config.file_type, FileType::Csv);
        assert!(config.include_header);
        assert_eq!(config.columns, vec!["name", "age"]);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.effective_limit(), Some(250));
        assert_eq!(config.output_file_prefix.as_deref(), Some("p"));
        assert_eq!(config.queries["name"].as_str(), "^a");
        assert_eq!(config.queries["city"].as_str(), "Par=is");
    }

    #[test]
    fn test_query_defaults() {
        let args = query_args(&["--output-mode", "stdout", "--output-file-type", "json"]);
        let config = args.to_export_config().unwrap();

        assert_eq!(config.batch_size, 500);
        assert_eq!(config.effective_limit(), None);
        assert!(!config.include_header);
        assert_eq!(config.output_file_extension, "txt");
        assert!(config.queries.is_empty());
    }

    #[test]
    fn test_negative_limit_is_unlimited() {
        let args = query_args(&[
            "--output-mode", "stdout", "--output-file-type", "json", "--limit", "-1",
        ]);
        assert_eq!(args.to_export_config().unwrap().effective_limit(), None);
    }

    #[test]
    fn test_repeated_queries_flag() {
        let args = query_args(&[
            "--output-mode", "stdout", "--output-file-type", "json", "--queries", "a=1",
            "--queries", "b=2",
        ]);
        assert_eq!(args.to_export_config().unwrap().queries.len(), 2);
    }

    #[test]
    fn test_file_mode_requires_output_path() {
        let args = query_args(&["--output-mode", "file", "--output-file-type", "json"]);
        let err = args.to_export_config().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_chunks_require_prefix() {
        let args = query_args(&[
            "--output-mode", "file-chunks", "--output-file-type", "csv", "--output-path", "out",
        ]);
        let err = args.to_export_config().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("output-file-prefix"));
    }

    #[test]
    fn test_malformed_query_term() {
        for term in ["noequals", "=value", "name=(unclosed"] {
            let args = query_args(&[
                "--output-mode", "stdout", "--output-file-type", "json", "--queries", term,
            ]);
            let err = args.to_export_config().unwrap_err();
            assert!(err.is_config(), "{term} should be a configuration error");
        }
    }

    #[test]
    fn test_usage_error_exit_code() {
        let err: DbUtilsError = crate::error::ConfigError::MissingField("output-path".into()).into();
        assert_eq!(usage_error(&err).exit_code(), 2);
    }

    #[test]
    fn test_verbosity_selects_level() {
        let cli = CliInterface::from_args(parse(&[
            "dbutils",
            "--vv",
            "--uri",
            "mongodb://db.example.net",
            "query",
            "--database",
            "db",
            "--collection",
            "c",
            "--output-mode",
            "stdout",
            "--output-file-type",
            "json",
        ]))
        .unwrap();

        assert_eq!(cli.log_level(), tracing::Level::TRACE);
        assert_eq!(cli.config().connection.uri, "mongodb://db.example.net");
    }
}
