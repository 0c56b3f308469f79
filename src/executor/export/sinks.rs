//! Output sinks for export operations
//!
//! A sink receives each serialized batch together with its position in the
//! run. File handles never outlive the write that opened them.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::config::{ExportConfig, OutputMode};
use crate::error::{ConfigError, Result};

/// Position of a batch within an export run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchContext {
    /// Zero-based page index
    pub batch_index: u64,
    /// Number of records in the batch
    pub records: usize,
}

/// Trait for writing serialized batches to a destination
#[async_trait]
pub trait OutputSink: Send {
    /// Write one serialized batch
    ///
    /// # Arguments
    /// * `payload` - Serialized batch
    /// * `context` - Position of the batch in the run
    async fn write(&mut self, payload: &[u8], context: &BatchContext) -> Result<()>;

    /// Whether every batch lands in its own output, each needing its own header
    fn repeats_header(&self) -> bool {
        false
    }

    /// Human-readable destination, for logging
    fn describe(&self) -> String;
}

/// Sink over a long-lived stream such as standard output; never closed between batches
pub struct StreamSink<W> {
    writer: W,
    name: &'static str,
}

impl StreamSink<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout(), "stdout")
    }
}

impl<W: AsyncWrite + Unpin + Send> StreamSink<W> {
    pub fn new(writer: W, name: &'static str) -> Self {
        Self { writer, name }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> OutputSink for StreamSink<W> {
    async fn write(&mut self, payload: &[u8], _context: &BatchContext) -> Result<()> {
        self.writer.write_all(payload).await?;
        self.writer.flush().await?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.name.to_string()
    }
}

/// Sink appending every batch to one file
///
/// The file is opened in append mode for each batch and closed after the
/// write. Any pre-existing file is removed when the sink is created.
pub struct SingleFileSink {
    path: PathBuf,
}

impl SingleFileSink {
    /// Prepare the output file, creating its parent directory if needed
    pub async fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        match fs::remove_file(path).await {
            Ok(()) => debug!("Removed existing output file: {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

#[async_trait]
impl OutputSink for SingleFileSink {
    async fn write(&mut self, payload: &[u8], context: &BatchContext) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(payload).await?;
        file.flush().await?;

        debug!(
            "Appended batch {} ({} records) to {}",
            context.batch_index,
            context.records,
            self.path.display()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Name of the chunk file for a batch: `{prefix}-{index}.{extension}`
pub fn chunk_file_name(prefix: &str, batch_index: u64, extension: &str) -> String {
    format!("{prefix}-{batch_index}.{extension}")
}

/// Sink writing every batch to its own file inside a directory
pub struct ChunkedFilesSink {
    dir: PathBuf,
    prefix: String,
    extension: String,
}

impl ChunkedFilesSink {
    /// Prepare the output directory, creating it if absent
    pub async fn create(dir: &Path, prefix: &str, extension: &str) -> Result<Self> {
        fs::create_dir_all(dir).await?;
        Ok(Self {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
            extension: extension.to_string(),
        })
    }

    pub fn chunk_path(&self, batch_index: u64) -> PathBuf {
        self.dir
            .join(chunk_file_name(&self.prefix, batch_index, &self.extension))
    }
}

#[async_trait]
impl OutputSink for ChunkedFilesSink {
    async fn write(&mut self, payload: &[u8], context: &BatchContext) -> Result<()> {
        let path = self.chunk_path(context.batch_index);
        let mut file = File::create(&path).await?;
        file.write_all(payload).await?;
        file.flush().await?;

        debug!("Wrote {} records to {}", context.records, path.display());
        Ok(())
    }

    fn repeats_header(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        self.dir
            .join(format!("{}-*.{}", self.prefix, self.extension))
            .display()
            .to_string()
    }
}

/// Build the sink selected by the configured output mode
pub async fn for_config(config: &ExportConfig) -> Result<Box<dyn OutputSink>> {
    let output_path = || {
        config
            .output_path
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField("output-path".to_string()))
    };

    let sink: Box<dyn OutputSink> = match config.output_mode {
        OutputMode::Stdout => Box::new(StreamSink::stdout()),
        OutputMode::File => Box::new(SingleFileSink::create(output_path()?).await?),
        OutputMode::FileChunks => {
            let prefix = config
                .output_file_prefix
                .as_deref()
                .ok_or_else(|| ConfigError::MissingField("output-file-prefix".to_string()))?;
            Box::new(
                ChunkedFilesSink::create(output_path()?, prefix, &config.output_file_extension)
                    .await?,
            )
        }
    };

    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileType;

    fn ctx(batch_index: u64) -> BatchContext {
        BatchContext {
            batch_index,
            records: 1,
        }
    }

    #[test]
    fn test_chunk_file_name() {
        assert_eq!(chunk_file_name("p", 0, "csv"), "p-0.csv");
        assert_eq!(chunk_file_name("p", 12, "csv"), "p-12.csv");
        assert_eq!(chunk_file_name("users", 3, "txt"), "users-3.txt");
    }

    #[tokio::test]
    async fn test_stream_sink_keeps_writing() {
        let mut sink = StreamSink::new(Vec::new(), "buffer");
        sink.write(b"a\n", &ctx(0)).await.unwrap();
        sink.write(b"b\n", &ctx(1)).await.unwrap();
        assert_eq!(sink.into_inner(), b"a\nb\n");
    }

    #[tokio::test]
    async fn test_single_file_truncates_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.txt");
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(&path, "stale\n").await.unwrap();

        let mut sink = SingleFileSink::create(&path).await.unwrap();
        sink.write(b"one\n", &ctx(0)).await.unwrap();
        sink.write(b"two\n", &ctx(1)).await.unwrap();

        assert_eq!(fs::read_to_string(&path).await.unwrap(), "one\ntwo\n");
        assert!(!sink.repeats_header());
    }

    #[tokio::test]
    async fn test_single_file_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("out.csv");

        let mut sink = SingleFileSink::create(&path).await.unwrap();
        sink.write(b"x\n", &ctx(0)).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_chunked_files_one_file_per_batch() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("chunks");

        let mut sink = ChunkedFilesSink::create(&out, "p", "csv").await.unwrap();
        sink.write(b"first\n", &ctx(0)).await.unwrap();
        sink.write(b"second\n", &ctx(1)).await.unwrap();

        assert!(sink.repeats_header());
        assert_eq!(fs::read_to_string(out.join("p-0.csv")).await.unwrap(), "first\n");
        assert_eq!(fs::read_to_string(out.join("p-1.csv")).await.unwrap(), "second\n");
    }

    #[tokio::test]
    async fn test_for_config_requires_prefix_for_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ExportConfig::new(OutputMode::FileChunks, FileType::Csv);
        config.output_path = Some(dir.path().to_path_buf());

        let err = for_config(&config).await.err().unwrap();
        assert!(err.is_config());
    }
}
