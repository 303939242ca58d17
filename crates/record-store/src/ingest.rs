use crate::error::{Result, StoreError};
use crate::Store;
use rdb_core::{Provenance, Record};
use std::io::BufRead;
use tracing::{info, warn};

/// Outcome of one best-effort ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub stored: usize,
    pub skipped_malformed: usize,
    pub failed_inserts: usize,
}

impl Store {
    /// Stores one record per JSON line read from `reader`.
    ///
    /// Blank lines are ignored. Lines that do not parse and rows the database
    /// rejects are logged and skipped; the rest of the stream is still stored.
    /// Only a failure to read the stream aborts the run.
    pub fn ingest<R: BufRead>(&self, reader: R, provenance: &Provenance) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        for (idx, line) in reader.split(b'\n').enumerate() {
            let line = line?;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let lineno = idx + 1;
            let mut record = match Record::from_json(&line) {
                Ok(r) => r,
                Err(source) => {
                    let err = StoreError::Deserialization { line: lineno, source };
                    warn!("{err}");
                    report.skipped_malformed += 1;
                    continue;
                }
            };
            provenance.apply(&mut record);
            match self.insert(&record) {
                Ok(_) => report.stored += 1,
                Err(err) => {
                    warn!(line = lineno, url = %record.url, "{err}");
                    report.failed_inserts += 1;
                }
            }
        }
        info!(
            stored = report.stored,
            skipped = report.skipped_malformed,
            failed = report.failed_inserts,
            "ingestion finished"
        );
        Ok(report)
    }
}
