//! Upsert engine
//!
//! For every incoming record:
//!
//! 1. Look up the stored record by identifier (records without one are new)
//! 2. Decide:
//!    - no stored record: insert, stamping `created_at`
//!    - stored and updates enabled: update when the comparable views differ,
//!      stamping `updated_at`, otherwise leave it unchanged
//!    - stored and updates disabled: reject with a "record already exists" error
//!
//! Records are processed one at a time in input order. A rejected, malformed
//! or failed record never stops the run; every outcome is counted in the
//! [`UpsertSummary`].

pub mod reader;

use std::fmt;
use std::path::Path;
use std::time::Instant;

use mongodb::bson::{Bson, DateTime, Document};
use tokio::io::AsyncBufRead;
use tracing::{debug, info, warn};

use crate::config::UpsertConfig;
use crate::error::{ExecutionError, Result};
use crate::executor::compare::{CREATED_AT, CompareScope, UPDATED_AT};
use crate::formatter::{BsonConverter, PlainTextConverter};
use crate::storage::{Filter, Storage};

pub use reader::{RecordLine, RecordReader};

/// What a successful upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Inserted,
    Updated,
    Unchanged,
}

/// A record that was rejected or failed
#[derive(Debug, Clone)]
pub struct RecordFailure {
    /// 1-based input line
    pub line: usize,
    /// Identifier value, when the line parsed and had one
    pub id: Option<String>,
    /// Rejected as already existing, as opposed to failed
    pub rejected: bool,
    pub reason: String,
}

/// Per-outcome counts for one run
#[derive(Debug, Default, Clone)]
pub struct UpsertSummary {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub rejected: usize,
    pub failed: usize,
    pub failures: Vec<RecordFailure>,
    pub elapsed_ms: u64,
}

impl UpsertSummary {
    /// Number of records processed, whatever their outcome
    pub fn processed(&self) -> usize {
        self.inserted + self.updated + self.unchanged + self.rejected + self.failed
    }

    /// Whether any record was rejected or failed
    pub fn has_problems(&self) -> bool {
        self.rejected + self.failed > 0
    }

    fn record(&mut self, line: usize, id: Option<String>, result: Result<UpsertAction>) {
        match result {
            Ok(UpsertAction::Inserted) => self.inserted += 1,
            Ok(UpsertAction::Updated) => self.updated += 1,
            Ok(UpsertAction::Unchanged) => self.unchanged += 1,
            Err(e) => {
                let rejected = e.is_conflict();
                if rejected {
                    self.rejected += 1;
                    warn!("Line {}: rejected: {}", line, e);
                } else {
                    self.failed += 1;
                    warn!("Line {}: failed: {}", line, e);
                }
                self.failures.push(RecordFailure {
                    line,
                    id,
                    rejected,
                    reason: e.to_string(),
                });
            }
        }
    }
}

impl fmt::Display for UpsertSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} records: {} inserted, {} updated, {} unchanged, {} rejected, {} failed",
            self.processed(),
            self.inserted,
            self.updated,
            self.unchanged,
            self.rejected,
            self.failed
        )
    }
}

/// Compare-then-upsert engine over a storage collaborator
pub struct UpsertEngine<'a> {
    store: &'a dyn Storage,
    config: &'a UpsertConfig,
    scope: CompareScope,
    clock: fn() -> DateTime,
}

impl<'a> UpsertEngine<'a> {
    pub fn new(store: &'a dyn Storage, config: &'a UpsertConfig) -> Self {
        Self {
            store,
            config,
            scope: CompareScope::from_config(config),
            clock: DateTime::now,
        }
    }

    /// Replace the timestamp source
    pub fn with_clock(mut self, clock: fn() -> DateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Insert, update or skip a single record
    ///
    /// # Returns
    /// * `Result<UpsertAction>` - The action taken; `ExecutionError::RecordExists`
    ///   when the record exists and updates are disabled
    pub async fn upsert_one(&self, record: Document) -> Result<UpsertAction> {
        let id_field = self.config.id_field.as_str();
        // A null identifier would also match stored records lacking the field
        let id = match record.get(id_field) {
            Some(Bson::Null) | None => {
                debug!("Record has no '{}' value, inserting", id_field);
                return self.insert(record).await;
            }
            Some(id) => id.clone(),
        };

        let filter = Filter::by_field(id_field, id.clone());
        let existing = self.store.find_one(&filter).await?;

        match existing {
            None => self.insert(record).await,
            Some(_) if !self.config.create_or_update => {
                Err(ExecutionError::RecordExists(format!(
                    "{id_field}={}",
                    PlainTextConverter.convert(&id)
                ))
                .into())
            }
            Some(old) if self.scope.differs(&record, &old) => self.update(record, filter).await,
            Some(_) => {
                debug!("Record {}={} unchanged", id_field, id);
                Ok(UpsertAction::Unchanged)
            }
        }
    }

    async fn insert(&self, mut record: Document) -> Result<UpsertAction> {
        if self.config.auto_manage_timestamps {
            record.insert(CREATED_AT, Bson::DateTime((self.clock)()));
        }

        self.store.insert_one(record).await?;
        Ok(UpsertAction::Inserted)
    }

    /// Set every field of the incoming record on the stored one; managed
    /// timestamps and the identifier are never taken from the input.
    async fn update(&self, record: Document, filter: Filter) -> Result<UpsertAction> {
        let managed = self.config.auto_manage_timestamps;

        let mut fields: Document = record
            .into_iter()
            .filter(|(key, _)| {
                key != &self.config.id_field
                    && !(managed && (key == CREATED_AT || key == UPDATED_AT))
            })
            .collect();

        if managed {
            fields.insert(UPDATED_AT, Bson::DateTime((self.clock)()));
        }

        self.store.update_one(&filter, fields).await?;
        Ok(UpsertAction::Updated)
    }

    /// Process every record from a reader, in order
    ///
    /// # Returns
    /// * `Result<UpsertSummary>` - Outcome counts; only input I/O errors are fatal
    pub async fn run<R>(&self, mut reader: RecordReader<R>) -> Result<UpsertSummary>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let start_time = Instant::now();
        let mut summary = UpsertSummary::default();

        while let Some((line, parsed)) = reader.next_record().await? {
            let id = parsed
                .as_ref()
                .ok()
                .and_then(|record| record.get(&self.config.id_field))
                .map(|id| PlainTextConverter.convert(id));

            let result = match parsed {
                Ok(record) => self.upsert_one(record).await,
                Err(e) => Err(e),
            };

            if let Ok(action) = &result {
                debug!("Line {}: {:?}", line, action);
            }
            summary.record(line, id, result);

            if summary.processed() % 1000 == 0 {
                info!("Progress: {} records processed", summary.processed());
            }
        }

        summary.elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!("{} in {} ms", summary, summary.elapsed_ms);
        Ok(summary)
    }

    /// Process a newline-delimited JSON file
    pub async fn run_file(&self, path: &Path) -> Result<UpsertSummary> {
        info!("Reading records from {}", path.display());
        let reader = RecordReader::open(path).await?;
        self.run(reader).await
    }
}
