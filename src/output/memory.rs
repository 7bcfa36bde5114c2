use crate::output::traits::{ResultSink, SinkError, SinkResult};
use crate::state::ProductRecord;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Keeps emitted records in memory, in emission order
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ProductRecord>>,
    closed: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every record emitted so far
    pub fn records(&self) -> Vec<ProductRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the URLs of every record emitted so far
    pub fn urls(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.url).collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn emit(&self, record: ProductRecord) -> SinkResult<()> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
        Ok(())
    }

    async fn close(&self) -> SinkResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collects_in_order() {
        let sink = MemorySink::new();
        for id in 0..3 {
            let record =
                ProductRecord::new(format!("https://example.com/{}", id), None, None, None, None);
            sink.emit(record).await.unwrap();
        }
        assert_eq!(
            sink.urls(),
            vec![
                "https://example.com/0",
                "https://example.com/1",
                "https://example.com/2"
            ]
        );
    }

    #[tokio::test]
    async fn test_rejects_after_close() {
        let sink = MemorySink::new();
        sink.close().await.unwrap();
        assert!(sink.is_closed());
        let record = ProductRecord::new("https://example.com/x", None, None, None, None);
        assert!(sink.emit(record).await.is_err());
        assert!(sink.is_empty());
    }
}
