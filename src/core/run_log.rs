//! Per-file record of a distribute run.
//!
//! One header line, then one line per processed file:
//! `ImageName,Labels,Category,Status`. `Category` is the destination class
//! or `N/A` when nothing was placed.

use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::core::operations::ensure_dir;
use crate::error::PartitionResult;

pub const RUN_LOG_HEADER: [&str; 4] = ["ImageName", "Labels", "Category", "Status"];

/// Placeholder for the category column when a file was not placed
pub const NOT_APPLICABLE: &str = "N/A";

pub struct RunLog<W: Write> {
    writer: Writer<W>,
}

impl RunLog<File> {
    /// Create (truncate) the log file, creating its parent directory if needed
    pub fn create(path: &Path) -> PartitionResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }
        let file = File::create(path)?;
        RunLog::new(file)
    }
}

impl<W: Write> RunLog<W> {
    /// Wrap a writer and emit the header line
    pub fn new(inner: W) -> PartitionResult<Self> {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(inner);
        writer.write_record(RUN_LOG_HEADER)?;
        Ok(Self { writer })
    }

    pub fn record(
        &mut self,
        filename: &str,
        labels: &str,
        category: Option<&str>,
        status: &str,
    ) -> PartitionResult<()> {
        self.writer.write_record([
            filename,
            labels,
            category.unwrap_or(NOT_APPLICABLE),
            status,
        ])?;
        Ok(())
    }

    pub fn flush(&mut self) -> PartitionResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> PartitionResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| e.into_error().into())
    }
}
