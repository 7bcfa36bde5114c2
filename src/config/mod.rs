//! Configuration module for Listing-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so a file containing only the seed URL is enough:
//!
//! ```toml
//! [crawl]
//! seed-url = "https://shop.example.com/s?k=bags"
//! ```
//!
//! # Example
//!
//! ```no_run
//! use listing_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawler will visit at most {} pages", config.crawl.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlConfig, ExtractConfig, FetchConfig, OutputConfig, RateLimitConfig, RetryConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, parse_config, parse_config_with_hash};
pub use validation::{parse_selector, validate, MAX_WORKERS};
