//! CSV result sink
//!
//! Writes one header row followed by one row per product record, using the
//! column names declared on [`ProductRecord`].

use crate::output::traits::{ResultSink, SinkError, SinkResult};
use crate::state::ProductRecord;
use async_trait::async_trait;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Appends product records to a CSV file or any other writer
pub struct CsvSink<W: Write + Send = File> {
    writer: Mutex<Option<csv::Writer<W>>>,
}

impl CsvSink<File> {
    /// Creates (or truncates) the CSV file at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(CsvSink)` - The file was created
    /// * `Err(SinkError)` - The file could not be created
    pub fn create(path: &Path) -> SinkResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self::from_writer(file))
    }
}

impl<W: Write + Send> CsvSink<W> {
    /// Wraps an arbitrary writer
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: Mutex::new(Some(csv::Writer::from_writer(writer))),
        }
    }

    /// Closes the sink and hands back the underlying writer
    pub fn into_inner(self) -> SinkResult<Option<W>> {
        let writer = self
            .writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        match writer {
            Some(writer) => writer
                .into_inner()
                .map(Some)
                .map_err(|e| SinkError::Io(e.into_error())),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<W: Write + Send> ResultSink for CsvSink<W> {
    async fn emit(&self, record: ProductRecord) -> SinkResult<()> {
        let mut guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let writer = guard.as_mut().ok_or(SinkError::Closed)?;
        writer.serialize(&record)?;
        Ok(())
    }

    async fn close(&self) -> SinkResult<()> {
        let mut guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut writer) = guard.take() {
            writer.flush()?;
        }
        Ok(())
    }
}
