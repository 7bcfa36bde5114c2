//! Per-origin rate limiting
//!
//! Every origin gets its own gate: a fair async mutex around the origin's
//! grant history. A caller holds the gate while it sleeps out the remaining
//! interval, so grants for one origin are handed out one at a time, in the
//! order `acquire` was called, and at least `min_interval` apart. Origins never
//! wait on each other.

use crate::state::OriginState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;

/// Spaces out requests to the same origin
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    gates: Mutex<HashMap<String, Arc<AsyncMutex<OriginState>>>>,
}

impl RateLimiter {
    /// Creates a limiter enforcing `min_interval` between grants per origin
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    fn gate(&self, origin: &str) -> Arc<AsyncMutex<OriginState>> {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            gates
                .entry(origin.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(OriginState::new()))),
        )
    }

    /// Waits until a request to `origin` may be sent
    ///
    /// Returns once at least `min_interval` has passed since the previous
    /// grant for the same origin. Callers are served in FIFO order because
    /// tokio's mutex queues waiters fairly.
    pub async fn acquire(&self, origin: &str) {
        let gate = self.gate(origin);
        let mut state = gate.lock().await;

        if let Some(wait) = state.time_until_next_request(self.min_interval, Instant::now()) {
            tracing::trace!("Rate limiting {} for {:?}", origin, wait);
            tokio::time::sleep(wait).await;
        }

        state.record_grant(Instant::now());
    }

    /// Returns how many grants have been handed out for `origin`
    pub async fn grant_count(&self, origin: &str) -> u64 {
        self.gate(origin).lock().await.grant_count
    }
}
