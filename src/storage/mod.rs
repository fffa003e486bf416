//! Output persistence for crawl records
//!
//! This module defines the [`RecordSink`] seam the crawler writes through and a
//! CSV implementation of it.

pub mod csv;

pub use self::csv::CsvWriter;

use anyhow::Result;

use crate::models::OutputRecord;

/// Destination for output records
pub trait RecordSink: Send {
    /// Append one record
    fn write_record(&mut self, record: &OutputRecord) -> Result<()>;

    /// Flush buffered records
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory sink
impl RecordSink for Vec<OutputRecord> {
    fn write_record(&mut self, record: &OutputRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}
