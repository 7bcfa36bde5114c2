//! Frontier of pending crawl targets
//!
//! The frontier is a FIFO queue guarded by a seen-set, shared by all workers.
//! It also tracks how many targets are in flight, which is what lets a worker
//! tell "nothing left at all" apart from "nothing queued right now, but other
//! workers may still discover more".

use crate::state::CrawlTarget;
use crate::url::dedup_key;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::Notify;

/// Reasons `pop` returns without a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrontierError {
    /// Nothing is queued and nothing is in flight; the crawl is finished
    #[error("frontier is empty and no work is in flight")]
    Empty,

    /// The frontier was closed; no further work is dispatched
    #[error("frontier is closed")]
    Closed,
}

#[derive(Debug, Default)]
struct FrontierInner {
    queue: VecDeque<CrawlTarget>,
    seen: HashSet<String>,
    in_flight: usize,
    closed: bool,
}

/// Deduplicated FIFO queue of crawl targets
#[derive(Debug, Default)]
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    changed: Notify,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a target unless its URL has been seen before
    ///
    /// # Returns
    ///
    /// * `true` - The target was queued
    /// * `false` - The URL was already seen or the frontier is closed
    pub fn push(&self, target: CrawlTarget) -> bool {
        let key = dedup_key(&target.url);
        {
            let mut inner = self.lock();
            if inner.closed || !inner.seen.insert(key) {
                return false;
            }
            inner.queue.push_back(target);
        }
        self.changed.notify_waiters();
        true
    }

    /// Takes the next pending target, waiting while other work is in flight
    ///
    /// A successful pop marks the target as in flight; the caller must later
    /// call [`complete`](Self::complete) or [`requeue`](Self::requeue) for it.
    pub async fn pop(&self) -> Result<CrawlTarget, FrontierError> {
        loop {
            // Registered before inspecting the queue so a concurrent push or
            // complete between the check and the await is not missed.
            let changed = self.changed.notified();
            {
                let mut inner = self.lock();
                if inner.closed {
                    return Err(FrontierError::Closed);
                }
                if let Some(target) = inner.queue.pop_front() {
                    inner.in_flight += 1;
                    return Ok(target);
                }
                if inner.in_flight == 0 {
                    return Err(FrontierError::Empty);
                }
            }
            changed.await;
        }
    }

    /// Marks one in-flight target as finished
    pub fn complete(&self) {
        {
            let mut inner = self.lock();
            inner.in_flight = inner.in_flight.saturating_sub(1);
        }
        self.changed.notify_waiters();
    }

    /// Returns an in-flight target to the back of the queue
    ///
    /// The seen-set is bypassed because the URL is already in it. When the
    /// frontier has been closed the target is dropped instead.
    ///
    /// # Returns
    ///
    /// * `true` - The target was queued again
    /// * `false` - The frontier is closed and the target was dropped
    pub fn requeue(&self, target: CrawlTarget) -> bool {
        let queued = {
            let mut inner = self.lock();
            inner.in_flight = inner.in_flight.saturating_sub(1);
            if inner.closed {
                false
            } else {
                inner.queue.push_back(target);
                true
            }
        };
        self.changed.notify_waiters();
        queued
    }

    /// Stops dispatching; every waiting and future `pop` returns `Closed`
    pub fn close(&self) {
        self.lock().closed = true;
        self.changed.notify_waiters();
    }

    /// Returns whether the frontier has been closed
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Returns the number of queued targets
    pub fn size(&self) -> usize {
        self.lock().queue.len()
    }

    /// Returns the number of targets popped but not yet finished
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// Returns the number of distinct URLs ever accepted
    pub fn seen_count(&self) -> usize {
        self.lock().seen.len()
    }
}
