//! Crawl engine - worker pool orchestration
//!
//! The engine seeds the frontier with the first listing page and runs a fixed
//! pool of workers over it. Each worker repeatedly:
//! - Takes a target from the frontier
//! - Waits for a rate limiter grant for the target's origin
//! - Fetches the page
//! - Extracts product links (listing pages) or a product record (detail pages)
//! - Schedules a retry, or gives up, when the fetch failed
//!
//! The crawl ends when the frontier is drained with nothing in flight, when
//! the product cap is reached, or when the cancellation token fires.

use crate::config::{validate, Config};
use crate::crawler::frontier::{Frontier, FrontierError};
use crate::crawler::{
    FetchError, FetchOutcome, Fetcher, HttpFetcher, RateLimiter, RetryDecision, RetryPolicy,
};
use crate::extract::{Extractor, SelectorExtractor};
use crate::output::{CrawlStats, CrawlSummary, CsvSink, ResultSink, SinkError};
use crate::state::{CrawlTarget, ProductRecord, RetryPhase, TargetKind};
use crate::url::{origin_of, page_url, resolve_link};
use crate::{HarvestError, Result};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Crawl scope copied out of the configuration
#[derive(Debug, Clone)]
struct CrawlSettings {
    seed_url: String,
    page_param: String,
    max_pages: u32,
    max_products: usize,
    workers: usize,
}

/// State shared by every worker and retry timer
struct Shared {
    settings: CrawlSettings,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    sink: Arc<dyn ResultSink>,
    limiter: RateLimiter,
    retry_policy: RetryPolicy,
    frontier: Frontier,
    stats: CrawlStats,

    /// Child of the caller's token; also fired internally on cap or sink failure
    stop: CancellationToken,

    /// Detail targets pushed to the frontier and not given up on
    details_scheduled: AtomicUsize,

    /// Emission slots taken; never exceeds `max_products`
    emitted: AtomicUsize,

    /// Product links found while the cap was fully scheduled, in page order
    deferred_links: Mutex<VecDeque<String>>,

    /// Listing page held back while the cap was fully scheduled
    deferred_listing: Mutex<Option<u32>>,

    cap_reached: AtomicBool,
    sink_failure: Mutex<Option<SinkError>>,
    completed: AtomicU64,
}

/// Takes one slot below `cap`, returning the slot index on success
fn try_reserve(counter: &AtomicUsize, cap: usize) -> Option<usize> {
    counter
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |taken| {
            (taken < cap).then_some(taken + 1)
        })
        .ok()
}

/// Runs a crawl over a paginated listing
pub struct CrawlEngine {
    shared: Arc<Shared>,
    cancel: CancellationToken,
}

impl CrawlEngine {
    /// Creates an engine from a validated configuration and its collaborators
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `fetcher` - Performs page requests
    /// * `extractor` - Turns page bodies into links and product fields
    /// * `sink` - Receives product records
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlEngine)` - Ready to run
    /// * `Err(HarvestError)` - The configuration is invalid
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        sink: Arc<dyn ResultSink>,
    ) -> Result<Self> {
        validate(config)?;

        let cancel = CancellationToken::new();
        let settings = CrawlSettings {
            seed_url: config.crawl.seed_url.clone(),
            page_param: config.crawl.page_param.clone(),
            max_pages: config.crawl.max_pages,
            max_products: config.crawl.max_products,
            workers: config.crawl.workers,
        };

        let shared = Shared {
            settings,
            fetcher,
            extractor,
            sink,
            limiter: RateLimiter::new(config.rate_limit.min_interval()),
            retry_policy: RetryPolicy::from_config(&config.retry),
            frontier: Frontier::new(),
            stats: CrawlStats::new(),
            stop: cancel.child_token(),
            details_scheduled: AtomicUsize::new(0),
            emitted: AtomicUsize::new(0),
            deferred_links: Mutex::new(VecDeque::new()),
            deferred_listing: Mutex::new(None),
            cap_reached: AtomicBool::new(false),
            sink_failure: Mutex::new(None),
            completed: AtomicU64::new(0),
        };

        Ok(Self {
            shared: Arc::new(shared),
            cancel,
        })
    }

    /// Token that cancels the crawl when fired
    ///
    /// Workers finish the fetch they are on, nothing new is dispatched and
    /// pending retries are dropped. `run` then returns the summary so far.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the crawl to completion
    ///
    /// An engine crawls once; calling `run` again returns right away with
    /// the counts of the first run.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - The crawl finished, was capped or was cancelled
    /// * `Err(HarvestError)` - The result sink failed or a worker panicked
    pub async fn run(&self) -> Result<CrawlSummary> {
        let shared = &self.shared;
        let settings = &shared.settings;
        let start_time = Instant::now();

        tracing::info!(
            "Starting crawl of {} with {} workers (max {} pages, {} products)",
            settings.seed_url,
            settings.workers,
            settings.max_pages,
            settings.max_products
        );

        shared
            .frontier
            .push(CrawlTarget::listing(settings.seed_url.clone(), 1));

        let mut workers = JoinSet::new();
        for id in 0..settings.workers {
            workers.spawn(Arc::clone(shared).worker(id));
        }

        let mut join_error = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
                shared.stop.cancel();
                shared.frontier.close();
                join_error.get_or_insert(e);
            }
        }

        // Releases any retry timer still sleeping after a cap or cancellation
        shared.stop.cancel();

        let close_result = shared.sink.close().await;

        let sink_failure = shared
            .sink_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(e) = sink_failure {
            return Err(HarvestError::Sink(e));
        }
        if let Some(e) = join_error {
            return Err(HarvestError::Join(e));
        }
        close_result?;

        let mut summary = shared.stats.snapshot();
        summary.duration = start_time.elapsed();
        summary.cap_reached = shared.cap_reached.load(Ordering::Acquire);
        summary.cancelled = self.cancel.is_cancelled();

        tracing::info!(
            "Crawl finished: {} products from {} pages in {:?}",
            summary.products_emitted,
            summary.pages_fetched(),
            summary.duration
        );

        Ok(summary)
    }
}

impl Shared {
    async fn worker(self: Arc<Self>, id: usize) {
        tracing::debug!("Worker {} started", id);

        loop {
            let target = tokio::select! {
                biased;
                _ = self.stop.cancelled() => {
                    self.frontier.close();
                    break;
                }
                popped = self.frontier.pop() => match popped {
                    Ok(target) => target,
                    Err(FrontierError::Empty) => {
                        tracing::debug!("Worker {}: frontier drained", id);
                        break;
                    }
                    Err(FrontierError::Closed) => break,
                },
            };

            self.process(target).await;

            let completed = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
            if completed % 10 == 0 {
                tracing::info!(
                    "Progress: {} pages fetched, {} products, {} queued, {} in flight",
                    self.stats.pages_fetched(),
                    self.emitted.load(Ordering::Relaxed),
                    self.frontier.size(),
                    self.frontier.in_flight()
                );
            }
        }

        tracing::debug!("Worker {} stopped", id);
    }

    /// Handles one popped target; the frontier's in-flight token is released
    /// here or handed to a retry timer
    async fn process(self: &Arc<Self>, mut target: CrawlTarget) {
        if target.retry.phase() == RetryPhase::Waiting {
            if let Err(e) = target.retry.reissue() {
                tracing::warn!("Cannot reissue {}: {}", target.url, e);
            }
        }

        // A URL without an origin is malformed; the fetcher reports it
        if let Some(origin) = origin_of(&target.url) {
            self.limiter.acquire(&origin).await;
        }

        tracing::debug!(
            "Fetching {} {} (attempt {})",
            target.kind,
            target.url,
            target.attempt() + 1
        );

        match self.fetcher.fetch(&target.url).await {
            FetchOutcome::Success { body, .. } => {
                match target.kind {
                    TargetKind::Listing { page } => self.handle_listing(&target, page, &body),
                    TargetKind::Detail => self.handle_detail(&target, &body).await,
                }
                self.frontier.complete();
            }
            FetchOutcome::RetryableFailure { error } => self.handle_retryable(target, error),
            FetchOutcome::PermanentFailure { error } => {
                tracing::warn!("Giving up on {} {}: {}", target.kind, target.url, error);
                self.give_up(&target);
                self.stats.record_permanent_failure();
                self.frontier.complete();
            }
        }
    }

    fn handle_listing(&self, target: &CrawlTarget, page: u32, body: &str) {
        self.stats.record_listing_fetched();
        let listing = self.extractor.extract_listing_page(body);
        let base = Url::parse(&target.url).ok();
        let cap = self.settings.max_products;

        let mut scheduled = 0;
        let mut deferred = Vec::new();
        for href in &listing.detail_urls {
            let resolved = match &base {
                Some(base) => resolve_link(href, base),
                None => Some(href.clone()),
            };
            let Some(url) = resolved else {
                continue;
            };

            if !deferred.is_empty() || try_reserve(&self.details_scheduled, cap).is_none() {
                deferred.push(url);
                continue;
            }
            if self.frontier.push(CrawlTarget::detail(url)) {
                scheduled += 1;
            } else {
                self.details_scheduled.fetch_sub(1, Ordering::AcqRel);
            }
        }

        tracing::debug!(
            "Listing page {}: {} links, {} new product pages, {} held back",
            page,
            listing.detail_urls.len(),
            scheduled,
            deferred.len()
        );

        if !deferred.is_empty() {
            self.deferred_links
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend(deferred);
            // A slot may have been freed while the links were being collected
            self.refill();
        }

        if !listing.has_next_page {
            tracing::info!("Listing ends at page {}", page);
            return;
        }
        self.schedule_next_listing(page);
    }

    /// Queues the listing page after `page`, or holds it back while every
    /// product slot is scheduled
    fn schedule_next_listing(&self, page: u32) {
        if page >= self.settings.max_pages {
            tracing::info!("Reached max-pages ({}), not following further pages", page);
            return;
        }

        let cap = self.settings.max_products;
        if self.details_scheduled.load(Ordering::Acquire) < cap {
            self.push_listing(page + 1);
            return;
        }

        let mut held = self
            .deferred_listing
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *held = Some(page + 1);
        // Re-checked under the lock so a concurrent refill cannot miss it
        if self.details_scheduled.load(Ordering::Acquire) < cap {
            if let Some(next) = held.take() {
                self.push_listing(next);
            }
        }
    }

    fn push_listing(&self, page: u32) {
        match page_url(&self.settings.seed_url, &self.settings.page_param, page) {
            Ok(url) => {
                self.frontier.push(CrawlTarget::listing(url, page));
            }
            Err(e) => tracing::warn!("Cannot build URL for listing page {}: {}", page, e),
        }
    }

    /// Fills free product slots from held-back links, then resumes a
    /// held-back listing page once no links are left
    fn refill(&self) {
        let cap = self.settings.max_products;
        while try_reserve(&self.details_scheduled, cap).is_some() {
            let next = self
                .deferred_links
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();

            match next {
                Some(url) => {
                    if !self.frontier.push(CrawlTarget::detail(url)) {
                        self.details_scheduled.fetch_sub(1, Ordering::AcqRel);
                    }
                }
                None => {
                    self.details_scheduled.fetch_sub(1, Ordering::AcqRel);
                    let held = self
                        .deferred_listing
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .take();
                    if let Some(page) = held {
                        tracing::debug!("Product slot freed; resuming at listing page {}", page);
                        self.push_listing(page);
                    }
                    return;
                }
            }
        }
    }

    async fn handle_detail(&self, target: &CrawlTarget, body: &str) {
        self.stats.record_detail_fetched();
        let fields = self.extractor.extract_detail_page(body);
        let record = ProductRecord::new(
            target.url.clone(),
            fields.title,
            fields.asin,
            fields.description,
            fields.manufacturer,
        );

        let cap = self.settings.max_products;
        let Some(slot) = try_reserve(&self.emitted, cap) else {
            tracing::debug!("Product cap reached; discarding {}", target.url);
            return;
        };

        match self.sink.emit(record).await {
            Ok(()) => {
                self.stats.record_product_emitted();
                if slot + 1 == cap {
                    tracing::info!("Reached max-products ({}), stopping", cap);
                    self.cap_reached.store(true, Ordering::Release);
                    self.frontier.close();
                    self.stop.cancel();
                }
            }
            Err(e) => {
                self.emitted.fetch_sub(1, Ordering::AcqRel);
                tracing::error!("Failed to write record for {}: {}", target.url, e);
                self.sink_failure
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get_or_insert(e);
                self.frontier.close();
                self.stop.cancel();
            }
        }
    }

    fn handle_retryable(self: &Arc<Self>, mut target: CrawlTarget, error: FetchError) {
        match self.retry_policy.on_retryable_failure(&mut target.retry) {
            Ok(RetryDecision::RetryAfter(delay)) => {
                tracing::debug!(
                    "{} for {}; retry {} in {:?}",
                    error,
                    target.url,
                    target.attempt(),
                    delay
                );
                self.stats.record_retry();
                self.schedule_retry(target, delay);
            }
            Ok(RetryDecision::Exhausted) => {
                tracing::warn!(
                    "Retries exhausted for {} {} after {} attempts: {}",
                    target.kind,
                    target.url,
                    target.attempt() + 1,
                    error
                );
                self.give_up(&target);
                self.stats.record_exhausted();
                self.frontier.complete();
            }
            Err(e) => {
                tracing::warn!("Giving up on {}: {}", target.url, e);
                self.give_up(&target);
                self.stats.record_permanent_failure();
                self.frontier.complete();
            }
        }
    }

    /// Requeues `target` once `delay` has passed; the target stays in flight
    /// meanwhile so the crawl cannot finish under a pending retry
    fn schedule_retry(self: &Arc<Self>, target: CrawlTarget, delay: Duration) {
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = shared.stop.cancelled() => shared.frontier.complete(),
                _ = tokio::time::sleep(delay) => {
                    if !shared.frontier.requeue(target) {
                        tracing::debug!("Frontier closed; dropping pending retry");
                    }
                }
            }
        });
    }

    /// Keeps the crawl going past a target that failed for good
    ///
    /// A failed product page frees its slot for a held-back link; a failed
    /// listing page moves on to the next page. Must run before the target's
    /// in-flight token is released.
    fn give_up(&self, target: &CrawlTarget) {
        match target.kind {
            TargetKind::Detail => {
                self.details_scheduled.fetch_sub(1, Ordering::AcqRel);
                self.refill();
            }
            TargetKind::Listing { page } => self.schedule_next_listing(page),
        }
    }
}

/// Runs a complete crawl with the built-in HTTP fetcher, selector extractor
/// and CSV sink
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `cancel` - Fired to stop the crawl early (e.g. on Ctrl-C)
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl finished
/// * `Err(HarvestError)` - Setup failed or the CSV file could not be written
pub async fn run_crawl(config: &Config, cancel: CancellationToken) -> Result<CrawlSummary> {
    let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
    let extractor = Arc::new(SelectorExtractor::from_config(&config.extract)?);

    // Validated before the CSV file is created, which truncates it
    validate(config)?;
    let sink = Arc::new(CsvSink::create(Path::new(&config.output.csv_path))?);

    let engine = CrawlEngine::new(config, fetcher, extractor, sink)?;

    let token = engine.cancellation_token();
    let forward = tokio::spawn(async move {
        cancel.cancelled().await;
        token.cancel();
    });

    let result = engine.run().await;
    forward.abort();
    result
}
