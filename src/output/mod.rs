//! Output module for product records and crawl statistics
//!
//! This module handles:
//! - The [`ResultSink`] trait the crawl engine emits records through
//! - A CSV sink for the command-line tool and an in-memory sink
//! - Crawl counters and the end-of-run summary

mod csv_sink;
mod memory;
pub mod stats;
mod traits;

pub use csv_sink::CsvSink;
pub use memory::MemorySink;
pub use stats::{print_summary, CrawlStats, CrawlSummary};
pub use traits::{ResultSink, SinkError, SinkResult};
