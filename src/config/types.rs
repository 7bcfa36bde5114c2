use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Listing-Harvester
///
/// Every section and key is optional in the TOML file; missing values fall
/// back to the defaults below. Only `crawl.seed-url` has no usable default and
/// must come from the file or the command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub crawl: CrawlConfig,
    pub fetch: FetchConfig,
    pub retry: RetryConfig,
    pub rate_limit: RateLimitConfig,
    pub extract: ExtractConfig,
    pub output: OutputConfig,
}

/// Crawl scope and concurrency configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// First listing page; later pages are derived from it
    pub seed_url: String,

    /// Maximum number of listing pages to visit
    pub max_pages: u32,

    /// Maximum number of product records to emit
    pub max_products: usize,

    /// Number of concurrent workers
    pub workers: usize,

    /// Query parameter carrying the listing page number
    pub page_param: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seed_url: String::new(),
            max_pages: 20,
            max_products: 200,
            workers: 4,
            page_param: "page".to_string(),
        }
    }
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Identity sent in the User-Agent header
    pub user_agent: String,

    /// Whole-request timeout (milliseconds)
    pub timeout_ms: u64,

    /// Connection establishment timeout (milliseconds)
    pub connect_timeout_ms: u64,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("listing-harvester/{}", env!("CARGO_PKG_VERSION")),
            timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
        }
    }
}

/// Retry and backoff configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Delay before the first retry (milliseconds), doubled per attempt
    pub base_delay_ms: u64,

    /// Retries allowed per target before it is given up
    pub max_retries: u32,

    /// Upper bound of the random jitter added to each delay (milliseconds)
    pub max_jitter_ms: u64,

    /// Ceiling for the exponential part of the delay (milliseconds)
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 5_000,
            max_retries: 3,
            max_jitter_ms: 3_000,
            max_backoff_ms: 300_000,
        }
    }
}

/// Per-origin politeness configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RateLimitConfig {
    /// Minimum time between two requests to the same origin (milliseconds)
    pub min_interval_ms: u64,
}

impl RateLimitConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 2_000,
        }
    }
}

/// Selectors and labels used by the built-in extractor
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractConfig {
    /// Selects the anchors on a listing page that point at product pages
    pub detail_link_selector: String,

    /// Matches when a listing page has a following page; empty means the
    /// listing continues for as long as pages yield product links
    pub next_page_selector: String,

    /// Selects the element holding the product title
    pub title_selector: String,

    /// `name` of the `<meta>` tag carrying the description
    pub description_meta: String,

    /// Table header text labelling the ASIN value
    pub asin_label: String,

    /// Table header text labelling the manufacturer value
    pub manufacturer_label: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            detail_link_selector: "a.product-link[href]".to_string(),
            next_page_selector: "a[rel~='next']".to_string(),
            title_selector: "title".to_string(),
            description_meta: "description".to_string(),
            asin_label: "ASIN".to_string(),
            manufacturer_label: "Manufacturer".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path of the CSV file receiving product records
    pub csv_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: "products.csv".to_string(),
        }
    }
}
