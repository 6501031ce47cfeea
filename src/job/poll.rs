//! Polling configuration.

use std::time::Duration;

/// How [`ScanJob::wait_for_completion`](crate::job::ScanJob::wait_for_completion)
/// paces its results fetches.
///
/// Polling is not retrying: a failed fetch ends the wait immediately.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between two fetches of an incomplete scan.
    pub poll_interval: Duration,

    /// Give up once this much time has passed since the first fetch.
    pub max_poll_time: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            max_poll_time: Duration::from_secs(300),
        }
    }
}

impl PollConfig {
    /// Creates a new poll configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the overall deadline.
    pub fn with_max_poll_time(mut self, max: Duration) -> Self {
        self.max_poll_time = max;
        self
    }

    /// Returns how long to sleep before the next fetch, or `None` if the
    /// deadline has passed.
    pub fn next_delay(&self, elapsed: Duration) -> Option<Duration> {
        let remaining = self.max_poll_time.checked_sub(elapsed)?;
        if remaining.is_zero() {
            return None;
        }
        Some(self.poll_interval.min(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PollConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.max_poll_time, Duration::from_secs(300));
    }

    #[test]
    fn test_next_delay_capped_by_deadline() {
        let config = PollConfig::new()
            .with_poll_interval(Duration::from_secs(10))
            .with_max_poll_time(Duration::from_secs(25));

        assert_eq!(config.next_delay(Duration::ZERO), Some(Duration::from_secs(10)));
        assert_eq!(config.next_delay(Duration::from_secs(20)), Some(Duration::from_secs(5)));
        assert_eq!(config.next_delay(Duration::from_secs(25)), None);
        assert_eq!(config.next_delay(Duration::from_secs(30)), None);
    }
}
