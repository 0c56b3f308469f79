//! Execution engines for dbutils
//!
//! - `compare`: decides whether an incoming record differs from the stored one
//! - `upsert`: compare-then-upsert of newline-delimited JSON records
//! - `export`: keyset-paginated export to stdout, a file or chunked files

pub mod compare;
pub mod export;
pub mod upsert;

pub use compare::{CompareScope, differs};
pub use export::{ExportPipeline, ExportSummary, run_export};
pub use upsert::{UpsertAction, UpsertEngine, UpsertSummary};
