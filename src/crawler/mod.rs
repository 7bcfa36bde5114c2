//! Crawler module for listing and product page harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and response classification
//! - The deduplicating frontier shared by all workers
//! - Per-origin rate limiting
//! - Retry policy with exponential backoff
//! - The worker pool that ties them together

mod engine;
mod fetcher;
mod frontier;
mod rate_limiter;
mod retry;

pub use engine::{run_crawl, CrawlEngine};
pub use fetcher::{
    build_http_client, classify_status, fetch_url, FetchError, FetchOutcome, Fetcher, HttpFetcher,
};
pub use frontier::{Frontier, FrontierError};
pub use rate_limiter::RateLimiter;
pub use retry::{RetryDecision, RetryPolicy};
