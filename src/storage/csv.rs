//! Quoted CSV output
//!
//! Format:
//! - header row `"URL","keywords","description","title"`
//! - every field quoted, embedded quotes doubled
//! - UTF-8, one `\n`-terminated line per record

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::RecordSink;
use crate::models::OutputRecord;

/// Column names of the output file
pub const HEADER: [&str; 4] = ["URL", "keywords", "description", "title"];

/// CSV writer with every field quoted
pub struct CsvWriter<W: Write> {
    writer: W,
    rows: u64,
}

impl CsvWriter<BufWriter<File>> {
    /// Create (or truncate) `path` and write the header row
    ///
    /// # Example
    /// ```no_run
    /// use pathcrawl::storage::CsvWriter;
    /// use std::path::Path;
    ///
    /// let writer = CsvWriter::create(Path::new("crawl_output.csv")).unwrap();
    /// ```
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> CsvWriter<W> {
    /// Wrap `writer` and write the header row
    pub fn new(writer: W) -> Result<Self> {
        let mut csv = Self { writer, rows: 0 };
        csv.write_row(&HEADER).context("Failed to write CSV header")?;
        Ok(csv)
    }

    /// Data rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush().context("Failed to flush CSV output")?;
        Ok(self.writer)
    }

    fn write_row(&mut self, fields: &[&str]) -> std::io::Result<()> {
        let line = fields
            .iter()
            .map(|field| quote(field))
            .collect::<Vec<_>>()
            .join(",");

        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

impl<W: Write + Send> RecordSink for CsvWriter<W> {
    fn write_record(&mut self, record: &OutputRecord) -> Result<()> {
        self.write_row(&record.fields())
            .with_context(|| format!("Failed to write CSV record for {}", record.url))?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush CSV output")
    }
}
