//! Backoff schedule for service calls.

use std::time::Duration;

/// Ordered wait durations, one per retry attempt.
///
/// The schedule's length is the maximum number of retries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrySchedule(Vec<Duration>);

impl RetrySchedule {
    /// Creates a schedule from explicit durations.
    #[must_use]
    pub fn new(durations: Vec<Duration>) -> Self {
        Self(durations)
    }

    /// Creates a schedule from millisecond values.
    #[must_use]
    pub fn from_millis(millis: &[u64]) -> Self {
        Self(millis.iter().copied().map(Duration::from_millis).collect())
    }

    /// Maximum number of retries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the schedule allows no retries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wait before the retry with the given zero-based index.
    #[must_use]
    pub fn delay(&self, attempt: usize) -> Option<Duration> {
        self.0.get(attempt).copied()
    }

    /// Sum of all waits, the implicit timeout of a failing call.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.0.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_sum_of_delays() {
        let schedule = RetrySchedule::from_millis(&[100, 250, 1000]);
        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule.delay(1), Some(Duration::from_millis(250)));
        assert_eq!(schedule.delay(3), None);
        assert_eq!(schedule.total(), Duration::from_millis(1350));
    }
}
