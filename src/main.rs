//! DbUtils - MongoDB data migration utilities
//!
//! # Usage
//!
//! ```bash
//! # Upsert records from a newline-delimited JSON file
//! dbutils insert --database shop --collection items --input-file items.json
//!
//! # Export matching records as CSV, one file per 500 records
//! dbutils query --database shop --collection items \
//!     --output-mode file-chunks --output-file-type csv \
//!     --output-path out --output-file-prefix items --include-header true \
//!     --queries 'name=^A'
//! ```

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use dbutils::cli::{CliInterface, Commands, InsertArgs, QueryArgs, usage_error};
use dbutils::connection::{ConnectionManager, sanitize_uri};
use dbutils::error::Result;
use dbutils::executor::export::run_export;
use dbutils::executor::upsert::UpsertEngine;

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        if e.is_config() {
            usage_error(&e).exit();
        }
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Build the engine configuration, so flag errors surface before connecting
/// 4. Connect and run the selected subcommand
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;
    initialize_logging(&cli);

    if let Some(path) = cli.config_path() {
        debug!("Using configuration file {}", path.display());
    }

    match &cli.args().command {
        Commands::Insert(args) => run_insert(&cli, args).await,
        Commands::Query(args) => run_query(&cli, args).await,
    }
}

/// Connect to the configured server
async fn connect(cli: &CliInterface) -> Result<ConnectionManager> {
    let connection = &cli.config().connection;
    debug!("Connecting to {}", sanitize_uri(&connection.uri));

    let mut manager = ConnectionManager::new(connection.clone());
    manager.connect().await?;
    Ok(manager)
}

async fn run_insert(cli: &CliInterface, args: &InsertArgs) -> Result<()> {
    let config = args.to_upsert_config()?;

    let mut manager = connect(cli).await?;
    let store = manager.store(&args.database, &args.collection)?;
    info!("Upserting into {}", store.namespace());

    let result = UpsertEngine::new(&store, &config)
        .run_file(&args.input_file)
        .await;
    manager.disconnect().await;

    let summary = result?;
    if !cli.args().quiet || summary.has_problems() {
        eprintln!("{}", summary);
    }
    Ok(())
}

async fn run_query(cli: &CliInterface, args: &QueryArgs) -> Result<()> {
    let config = args.to_export_config()?;

    let mut manager = connect(cli).await?;
    let store = manager.store(&args.database, &args.collection)?;
    info!("Exporting from {}", store.namespace());

    let result = run_export(&store, &config, !cli.args().quiet).await;
    manager.disconnect().await;

    let summary = result?;
    if !cli.args().quiet && config.output_path.is_some() {
        eprintln!("{}", summary);
    }
    Ok(())
}

/// Initialize logging on stderr; stdout carries exported data
///
/// `RUST_LOG` takes precedence over the verbosity flags when set.
fn initialize_logging(cli: &CliInterface) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string().to_lowercase()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
