//! Result sink trait and errors
//!
//! A sink is the durable destination of product records. It is append-only:
//! records are emitted one at a time and never updated or removed.

use crate::state::ProductRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while writing records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Sink is already closed")]
    Closed,
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for product records
///
/// Implementations must be thread-safe; the crawl engine emits from several
/// workers at once.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Appends one record
    ///
    /// # Arguments
    ///
    /// * `record` - A fully built product record
    async fn emit(&self, record: ProductRecord) -> SinkResult<()>;

    /// Flushes buffered records and finalizes the sink
    ///
    /// Emitting after `close` fails with [`SinkError::Closed`].
    async fn close(&self) -> SinkResult<()>;
}
