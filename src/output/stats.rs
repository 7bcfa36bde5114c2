//! Crawl statistics
//!
//! Counters are shared by every worker and updated atomically; a
//! [`CrawlSummary`] is a point-in-time copy handed to callers at the end of a
//! run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live counters updated by the crawl engine
#[derive(Debug, Default)]
pub struct CrawlStats {
    listing_pages_fetched: AtomicU64,
    detail_pages_fetched: AtomicU64,
    products_emitted: AtomicU64,
    retries_issued: AtomicU64,
    permanent_failures: AtomicU64,
    exhausted_retries: AtomicU64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_listing_fetched(&self) {
        self.listing_pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detail_fetched(&self) {
        self.detail_pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_product_emitted(&self) {
        self.products_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_permanent_failure(&self) {
        self.permanent_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A target ran out of retries; this also counts as a permanent failure
    pub fn record_exhausted(&self) {
        self.exhausted_retries.fetch_add(1, Ordering::Relaxed);
        self.permanent_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Pages fetched successfully, listing and detail combined
    pub fn pages_fetched(&self) -> u64 {
        self.listing_pages_fetched.load(Ordering::Relaxed)
            + self.detail_pages_fetched.load(Ordering::Relaxed)
    }

    /// Takes a snapshot of the counters
    pub fn snapshot(&self) -> CrawlSummary {
        CrawlSummary {
            listing_pages_fetched: self.listing_pages_fetched.load(Ordering::Relaxed),
            detail_pages_fetched: self.detail_pages_fetched.load(Ordering::Relaxed),
            products_emitted: self.products_emitted.load(Ordering::Relaxed),
            retries_issued: self.retries_issued.load(Ordering::Relaxed),
            permanent_failures: self.permanent_failures.load(Ordering::Relaxed),
            exhausted_retries: self.exhausted_retries.load(Ordering::Relaxed),
            ..CrawlSummary::default()
        }
    }
}

/// Summary statistics for a finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub listing_pages_fetched: u64,
    pub detail_pages_fetched: u64,
    pub products_emitted: u64,
    pub retries_issued: u64,

    /// Targets given up on, including those that exhausted their retries
    pub permanent_failures: u64,
    pub exhausted_retries: u64,

    /// Whether the run stopped because the product cap was reached
    pub cap_reached: bool,

    /// Whether the run stopped because it was cancelled
    pub cancelled: bool,

    pub duration: Duration,
}

impl CrawlSummary {
    /// Pages fetched successfully, listing and detail combined
    pub fn pages_fetched(&self) -> u64 {
        self.listing_pages_fetched + self.detail_pages_fetched
    }

    /// Returns true if any target was given up on
    pub fn has_failures(&self) -> bool {
        self.permanent_failures > 0
    }

    /// Returns the share of fetch outcomes that succeeded, as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.pages_fetched() + self.permanent_failures;
        if total == 0 {
            return 0.0;
        }
        (self.pages_fetched() as f64 / total as f64) * 100.0
    }
}

/// Prints a summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Pages:");
    println!("  Listing pages fetched: {}", summary.listing_pages_fetched);
    println!("  Detail pages fetched: {}", summary.detail_pages_fetched);
    println!();

    println!("Products emitted: {}", summary.products_emitted);
    println!();

    println!("Failures:");
    println!("  Retries issued: {}", summary.retries_issued);
    println!("  Permanent failures: {}", summary.permanent_failures);
    println!("  Exhausted retries: {}", summary.exhausted_retries);
    println!();

    let stop_reason = if summary.cancelled {
        "cancelled"
    } else if summary.cap_reached {
        "product cap reached"
    } else {
        "frontier drained"
    };
    println!("Stopped: {}", stop_reason);
    println!(
        "Duration: {:.1}s ({:.1}% of fetched targets succeeded)",
        summary.duration.as_secs_f64(),
        summary.success_rate()
    );
}
