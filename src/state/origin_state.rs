use std::time::Duration;
use tokio::time::Instant;

/// Tracks the request history of one origin during crawling
///
/// The rate limiter keeps one of these per origin behind a fair lock; it holds
/// everything needed to decide how long the next caller has to wait.
#[derive(Debug, Clone, Default)]
pub struct OriginState {
    /// Number of grants handed out for this origin
    pub grant_count: u64,

    /// When the most recent grant was handed out
    pub last_grant: Option<Instant>,
}

impl OriginState {
    /// Creates a new OriginState with no grants recorded
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if a request can be granted now
    pub fn can_request(&self, min_interval: Duration, now: Instant) -> bool {
        self.time_until_next_request(min_interval, now).is_none()
    }

    /// Records that a grant was handed out at `now`
    pub fn record_grant(&mut self, now: Instant) {
        self.grant_count += 1;
        self.last_grant = Some(now);
    }

    /// Calculates the time until the next request can be granted
    ///
    /// Returns None if a request can be granted now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, min_interval: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_grant?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < min_interval {
            Some(min_interval - elapsed)
        } else {
            None
        }
    }
}
