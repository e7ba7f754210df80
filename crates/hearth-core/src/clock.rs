//! Injectable time source
//!
//! Every component that needs "now" takes a `Clock` instead of calling
//! `Utc::now()` directly, so tests can travel time deterministically.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

/// A source of the current time
pub trait Clock: Send + Sync {
    /// The current time according to this clock
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the real wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A controllable clock for tests
///
/// Shared clones see the same time, so a test can hold one handle while the
/// component under test holds another.
#[derive(Clone)]
pub struct MockClock {
    current: Arc<RwLock<DateTime<Utc>>>,
}

impl MockClock {
    /// Create a mock clock starting at the current wall-clock time
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Create a mock clock starting at a specific time
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(RwLock::new(time)),
        }
    }

    /// Set the current time
    pub fn set(&self, time: DateTime<Utc>) {
        *self.current.write().unwrap() = time;
    }

    /// Advance time by a duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.write().unwrap();
        *current = *current + duration;
    }

    /// Advance time by seconds
    pub fn advance_seconds(&self, seconds: i64) {
        self.advance(Duration::seconds(seconds));
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.read().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_advance() {
        let clock = MockClock::new();
        let initial = clock.now();

        clock.advance_seconds(60);
        let after = clock.now();

        assert_eq!((after - initial).num_seconds(), 60);
    }

    #[test]
    fn test_mock_clock_shared_handles() {
        let clock = MockClock::new();
        let other = clock.clone();

        clock.advance_seconds(5);
        assert_eq!(clock.now(), other.now());
    }

    #[test]
    fn test_mock_clock_set() {
        let clock = MockClock::new();
        let fixed = DateTime::parse_from_rfc3339("2025-06-15T12:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        clock.set(fixed);
        assert_eq!(clock.now(), fixed);
    }
}
