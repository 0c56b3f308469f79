//! Export coordinator
//!
//! Drives one export run: fetch a page, project it, serialize it, hand it to
//! the sink, advance the cursor. Every step completes before the next page
//! is requested. Any storage or write error aborts the run.

use std::time::Instant;

use mongodb::bson::Document;
use tracing::{debug, info};

use crate::config::ExportConfig;
use crate::error::Result;
use crate::storage::Storage;

use super::ExportSummary;
use super::pager::KeysetPager;
use super::progress::ProgressTracker;
use super::sinks::{BatchContext, OutputSink};
use super::writers::{self, BatchSerializer};

/// Keep only the configured columns of a record, in record order
///
/// An empty column list passes the record through unchanged.
pub fn project(doc: &Document, columns: &[String]) -> Document {
    if columns.is_empty() {
        return doc.clone();
    }

    doc.iter()
        .filter(|(key, _)| columns.iter().any(|c| c == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Coordinator for a single export run
pub struct ExportPipeline<'a> {
    config: &'a ExportConfig,
    pager: KeysetPager<'a>,
    serializer: Box<dyn BatchSerializer>,
    tracker: ProgressTracker,
}

impl<'a> ExportPipeline<'a> {
    pub fn new(store: &'a dyn Storage, config: &'a ExportConfig) -> Self {
        Self {
            config,
            pager: KeysetPager::from_config(store, config),
            serializer: writers::for_file_type(config.file_type),
            tracker: ProgressTracker::hidden(),
        }
    }

    /// Set progress tracker for this run
    pub fn with_progress(mut self, tracker: ProgressTracker) -> Self {
        self.tracker = tracker;
        self
    }

    /// Size of the next page, or zero once the record limit is reached
    fn next_page_size(&self) -> u64 {
        let emitted = self.pager.state().records_emitted;
        match self.config.effective_limit() {
            Some(limit) => self.config.batch_size.min(limit.saturating_sub(emitted)),
            None => self.config.batch_size,
        }
    }

    /// Execute the export
    ///
    /// # Arguments
    /// * `sink` - Destination for the serialized batches
    ///
    /// # Returns
    /// * `Result<ExportSummary>` - Export statistics or the first fatal error
    pub async fn run(mut self, sink: &mut dyn OutputSink) -> Result<ExportSummary> {
        let start_time = Instant::now();
        info!("Starting export to {}", sink.describe());

        loop {
            let page_size = self.next_page_size();
            if page_size == 0 {
                info!(
                    "Record limit reached after {} records",
                    self.pager.state().records_emitted
                );
                break;
            }

            let Some(page) = self.pager.next_page(page_size).await? else {
                debug!("No more records available");
                break;
            };

            let batch: Vec<Document> = page
                .iter()
                .map(|doc| project(doc, &self.config.columns))
                .collect();

            let context = BatchContext {
                batch_index: self.pager.state().batch_index,
                records: batch.len(),
            };
            let header =
                self.config.include_header && (sink.repeats_header() || context.batch_index == 0);

            let payload = self.serializer.serialize(&batch, header)?;
            sink.write(&payload, &context).await?;

            self.pager.advance(batch.len() as u64);
            let state = self.pager.state();
            self.tracker.update(state.records_emitted);

            if state.batch_index % 10 == 0 {
                info!(
                    "Progress: {} records exported ({} batches)",
                    state.records_emitted, state.batch_index
                );
            }
        }

        self.tracker.finish();

        let state = self.pager.state();
        let summary = ExportSummary {
            records: state.records_emitted,
            batches: state.batch_index,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        };
        info!("{}", summary);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileType, OutputMode};
    use crate::executor::export::sinks::{ChunkedFilesSink, SingleFileSink, StreamSink};
    use crate::error::DbUtilsError;
    use crate::storage::{Filter, MemoryStore};
    use async_trait::async_trait;
    use mongodb::bson::doc;
    use regex::Regex;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn people(n: i32) -> MemoryStore {
        let docs = (1..=n)
            .map(|i| doc! { "_id": i, "name": format!("user{i}"), "score": i * 10 })
            .collect();
        MemoryStore::with_documents(docs)
    }

    async fn export_to_buffer(store: &MemoryStore, config: &ExportConfig) -> (ExportSummary, String) {
        let mut sink = StreamSink::new(Vec::new(), "buffer");
        let summary = ExportPipeline::new(store, config)
            .run(&mut sink)
            .await
            .unwrap();
        (summary, String::from_utf8(sink.into_inner()).unwrap())
    }

    fn json_ids(output: &str) -> Vec<i64> {
        output
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["_id"].as_i64().unwrap()
            })
            .collect()
    }

    #[test]
    fn test_project_keeps_listed_columns() {
        let record = doc! { "_id": 1, "name": "a", "score": 3 };
        let columns = vec!["score".to_string(), "name".to_string()];

        assert_eq!(project(&record, &columns), doc! { "name": "a", "score": 3 });
        assert_eq!(project(&record, &[]), record);
    }

    #[tokio::test]
    async fn test_pagination_completeness() {
        let store = people(23);
        let mut config = ExportConfig::new(OutputMode::Stdout, FileType::Json);
        config.batch_size = 5;

        let (summary, output) = export_to_buffer(&store, &config).await;
        let ids = json_ids(&output);

        assert_eq!(summary.records, 23);
        assert_eq!(summary.batches, 5);
        assert_eq!(ids, (1..=23).collect::<Vec<_>>());
        assert_eq!(ids.iter().collect::<BTreeSet<_>>().len(), 23);
    }

    #[tokio::test]
    async fn test_limit_is_exact() {
        let store = people(10);
        let mut config = ExportConfig::new(OutputMode::Stdout, FileType::Json);
        config.batch_size = 4;
        config.limit = Some(6);

        let (summary, output) = export_to_buffer(&store, &config).await;

        assert_eq!(summary.records, 6);
        assert_eq!(summary.batches, 2);
        assert_eq!(json_ids(&output), vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn test_zero_limit_means_unlimited() {
        let store = people(7);
        let mut config = ExportConfig::new(OutputMode::Stdout, FileType::Json);
        config.batch_size = 3;
        config.limit = Some(0);

        let (summary, _) = export_to_buffer(&store, &config).await;
        assert_eq!(summary.records, 7);
    }

    #[tokio::test]
    async fn test_queries_filter_every_page() {
        let store = people(30);
        let mut config = ExportConfig::new(OutputMode::Stdout, FileType::Json);
        config.batch_size = 2;
        config
            .queries
            .insert("name".to_string(), Regex::new("^user1").unwrap());

        let (summary, output) = export_to_buffer(&store, &config).await;

        // user1, user10..user19
        assert_eq!(summary.records, 11);
        assert_eq!(json_ids(&output)[0], 1);
    }

    #[tokio::test]
    async fn test_projection_in_csv_output() {
        let store = people(3);
        let mut config = ExportConfig::new(OutputMode::Stdout, FileType::Csv);
        config.columns = vec!["name".to_string()];
        config.include_header = true;

        let (_, output) = export_to_buffer(&store, &config).await;
        assert_eq!(output, "name\nuser1\nuser2\nuser3\n");
    }

    #[tokio::test]
    async fn test_empty_collection_emits_nothing() {
        let store = MemoryStore::new();
        let config = ExportConfig::new(OutputMode::Stdout, FileType::Csv);

        let (summary, output) = export_to_buffer(&store, &config).await;
        assert_eq!(summary.records, 0);
        assert_eq!(summary.batches, 0);
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_single_file_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("people.csv");
        let store = people(5);
        let mut config = ExportConfig::new(OutputMode::File, FileType::Csv);
        config.batch_size = 2;
        config.include_header = true;
        config.output_path = Some(path.clone());

        let mut sink = SingleFileSink::create(&path).await.unwrap();
        let summary = ExportPipeline::new(&store, &config)
            .run(&mut sink)
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(summary.batches, 3);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "_id,name,score");
        assert_eq!(lines.iter().filter(|l| l.starts_with("_id")).count(), 1);
    }

    #[tokio::test]
    async fn test_csv_export_chunking() {
        let dir = tempfile::tempdir().unwrap();
        let store = people(1200);
        let mut config = ExportConfig::new(OutputMode::FileChunks, FileType::Csv);
        config.include_header = true;
        config.output_path = Some(dir.path().join("chunks"));
        config.output_file_prefix = Some("p".to_string());
        config.output_file_extension = "csv".to_string();

        let mut sink = ChunkedFilesSink::create(&dir.path().join("chunks"), "p", "csv")
            .await
            .unwrap();
        let summary = ExportPipeline::new(&store, &config)
            .run(&mut sink)
            .await
            .unwrap();

        assert_eq!(summary.records, 1200);
        assert_eq!(summary.batches, 3);

        let mut names: Vec<String> = std::fs::read_dir(dir.path().join("chunks"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["p-0.csv", "p-1.csv", "p-2.csv"]);

        for (index, expected_rows) in [(0, 500), (1, 500), (2, 200)] {
            let content =
                std::fs::read_to_string(dir.path().join("chunks").join(format!("p-{index}.csv")))
                    .unwrap();
            let lines: Vec<&str> = content.lines().collect();
            assert_eq!(lines[0], "_id,name,score");
            assert_eq!(lines.len(), expected_rows + 1);
        }
    }

    #[tokio::test]
    async fn test_chunks_use_batch_local_headers() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::with_documents(vec![
            doc! { "_id": 1, "a": 1 },
            doc! { "_id": 2, "b": 2 },
        ]);
        let mut config = ExportConfig::new(OutputMode::FileChunks, FileType::Csv);
        config.batch_size = 1;
        config.include_header = true;

        let mut sink = ChunkedFilesSink::create(dir.path(), "p", "csv").await.unwrap();
        ExportPipeline::new(&store, &config)
            .run(&mut sink)
            .await
            .unwrap();

        let first = std::fs::read_to_string(dir.path().join("p-0.csv")).unwrap();
        let second = std::fs::read_to_string(dir.path().join("p-1.csv")).unwrap();
        assert_eq!(first, "_id,a\n1,1\n");
        assert_eq!(second, "_id,b\n2,2\n");
    }

    /// Serves the first page from memory, then loses the connection
    struct FlakyStore {
        inner: MemoryStore,
        finds: AtomicUsize,
    }

    #[async_trait]
    impl Storage for FlakyStore {
        async fn find(
            &self,
            filter: &Filter,
            limit: u64,
            sort_by: Option<&str>,
        ) -> Result<Vec<Document>> {
            if self.finds.fetch_add(1, Ordering::SeqCst) > 0 {
                return Err(DbUtilsError::Generic("connection reset".to_string()));
            }
            self.inner.find(filter, limit, sort_by).await
        }

        async fn find_one(&self, filter: &Filter) -> Result<Option<Document>> {
            self.inner.find_one(filter).await
        }

        async fn insert_one(&self, document: Document) -> Result<()> {
            self.inner.insert_one(document).await
        }

        async fn update_one(&self, filter: &Filter, update: Document) -> Result<()> {
            self.inner.update_one(filter, update).await
        }
    }

    #[tokio::test]
    async fn test_storage_error_aborts_export() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlakyStore {
            inner: people(10),
            finds: AtomicUsize::new(0),
        };
        let mut config = ExportConfig::new(OutputMode::FileChunks, FileType::Json);
        config.batch_size = 3;

        let mut sink = ChunkedFilesSink::create(dir.path(), "p", "json").await.unwrap();
        let err = ExportPipeline::new(&store, &config)
            .run(&mut sink)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "connection reset");
        assert_eq!(store.finds.load(Ordering::SeqCst), 2);

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["p-0.json"]);

        let first = std::fs::read_to_string(dir.path().join("p-0.json")).unwrap();
        assert_eq!(json_ids(&first), vec![1, 2, 3]);
    }
}
