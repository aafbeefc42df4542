//! Loads request snapshots exported from the `requests` table.

mod normalizer;
mod parser;

pub use normalizer::normalize_code;

use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::workflows::prioritization::domain::RequestRecord;
use parser::ParsedRow;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("failed to read request snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid request snapshot CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Requests read from one export, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSnapshot {
    pub records: Vec<RequestRecord>,
    pub skipped_rows: usize,
}

impl RequestSnapshot {
    /// Records still awaiting a clerk; everything else is outside the queue.
    pub fn pending(&self) -> Vec<RequestRecord> {
        self.records
            .iter()
            .filter(|record| record.status.is_pending())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct SnapshotImporter;

impl SnapshotImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<RequestSnapshot, IntakeError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<RequestSnapshot, IntakeError> {
        let mut snapshot = RequestSnapshot::default();

        for row in parser::parse_rows(reader)? {
            match row {
                ParsedRow::Record(record) => snapshot.records.push(record),
                ParsedRow::MissingId { line } => {
                    warn!(line, "skipping snapshot row without an id");
                    snapshot.skipped_rows += 1;
                }
            }
        }

        debug!(
            records = snapshot.records.len(),
            skipped = snapshot.skipped_rows,
            "request snapshot loaded"
        );
        Ok(snapshot)
    }
}
