//! State module for tracking crawl progress
//!
//! This module provides the data carried through a crawl.
//!
//! # Components
//!
//! - `CrawlTarget`: a URL to fetch, with its kind and retry bookkeeping
//! - `RetryState`: per-target retry phase, attempt count and next delay
//! - `OriginState`: per-origin grant history used by the rate limiter
//! - `ProductRecord`: the fields scraped from one product page

mod origin_state;
mod record;
mod retry_state;
mod target;

// Re-export main types
pub use origin_state::OriginState;
pub use record::{ProductRecord, MISSING_FIELD};
pub use retry_state::{InvalidTransition, RetryPhase, RetryState};
pub use target::{CrawlTarget, TargetKind};
