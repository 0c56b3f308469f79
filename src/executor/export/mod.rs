//! Export pipeline
//!
//! Pages through a collection in ascending identifier order and writes every
//! page to the configured destination.
//!
//! # Architecture
//!
//! 1. **KeysetPager**: fetches pages with `identifier > last_seen_id`
//! 2. **BatchSerializer**: renders a page as CSV or JSON lines
//! 3. **OutputSink**: writes the rendered page to stdout, one file or one file per page
//! 4. **ProgressTracker**: spinner feedback for file outputs
//!
//! These components are orchestrated by the **ExportPipeline**.

pub mod coordinator;
pub mod pager;
pub mod progress;
pub mod sinks;
pub mod writers;

use std::fmt;

use tracing::info;

use crate::config::{ExportConfig, OutputMode};
use crate::error::Result;
use crate::storage::Storage;

pub use coordinator::{ExportPipeline, project};
pub use pager::{CursorState, KeysetPager};
pub use progress::ProgressTracker;
pub use sinks::{BatchContext, ChunkedFilesSink, OutputSink, SingleFileSink, StreamSink, chunk_file_name};
pub use writers::{BatchSerializer, CsvSerializer, JsonLinesSerializer};

/// Result of an export run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Number of records written
    pub records: u64,
    /// Number of pages written
    pub batches: u64,
    /// Time taken for the run
    pub elapsed_ms: u64,
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Exported {} records in {} batches ({} ms)",
            self.records, self.batches, self.elapsed_ms
        )
    }
}

/// Run an export with the sink selected by the configuration
///
/// # Arguments
/// * `store` - Storage to export from
/// * `config` - Validated export configuration
/// * `show_progress` - Whether to show a spinner; ignored for stdout output
pub async fn run_export(
    store: &dyn Storage,
    config: &ExportConfig,
    show_progress: bool,
) -> Result<ExportSummary> {
    config.validate()?;

    let mut sink = sinks::for_config(config).await?;
    let tracker = ProgressTracker::new(
        config.effective_limit(),
        show_progress && config.output_mode != OutputMode::Stdout,
    );

    info!(
        "Export: mode={:?} type={:?} batch_size={} limit={:?}",
        config.output_mode,
        config.file_type,
        config.batch_size,
        config.effective_limit()
    );

    ExportPipeline::new(store, config)
        .with_progress(tracker)
        .run(sink.as_mut())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileType;
    use crate::storage::MemoryStore;
    use mongodb::bson::doc;

    #[test]
    fn test_summary_display() {
        let summary = ExportSummary {
            records: 1200,
            batches: 3,
            elapsed_ms: 42,
        };
        assert_eq!(summary.to_string(), "Exported 1200 records in 3 batches (42 ms)");
    }

    #[tokio::test]
    async fn test_run_export_to_single_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let store = MemoryStore::with_documents(vec![doc! { "_id": 1 }, doc! { "_id": 2 }]);

        let mut config = ExportConfig::new(OutputMode::File, FileType::Json);
        config.output_path = Some(path.clone());

        let summary = run_export(&store, &config, false).await.unwrap();
        assert_eq!(summary.records, 2);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\"_id\":1}\n{\"_id\":2}\n"
        );
    }

    #[tokio::test]
    async fn test_run_export_rejects_invalid_config() {
        let store = MemoryStore::new();
        let config = ExportConfig::new(OutputMode::File, FileType::Json);

        let err = run_export(&store, &config, false).await.unwrap_err();
        assert!(err.is_config());
    }
}
