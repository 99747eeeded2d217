use chrono::{DateTime, Utc};
use std::time::Duration;
#[cfg(test)]
use std::sync::Mutex;

/// Trait for wall-clock reads and blocking waits, so polling loops can be
/// driven without real delay in tests
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> DateTime<Utc>;

    /// Block the current thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// Real clock backed by the system time and `std::thread::sleep`
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Mock clock: `sleep` returns immediately and advances `now`
#[cfg(test)]
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

#[cfg(test)]
impl MockClock {
    /// Create a mock clock starting at 2024-05-01T09:30:00Z
    pub fn new() -> Self {
        Self::starting_at(DateTime::<Utc>::from_timestamp(1_714_555_800, 0).unwrap())
    }

    /// Create a mock clock starting at `start`
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Move the clock forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(duration).unwrap();
    }

    /// Every sleep requested so far
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    /// Number of sleeps requested so far
    pub fn sleep_count(&self) -> usize {
        self.sleeps.lock().unwrap().len()
    }
}

#[cfg(test)]
impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_sleep_advances_time() {
        let clock = MockClock::new();
        let start = clock.now();

        clock.sleep(Duration::from_secs(2));
        clock.sleep(Duration::from_secs(2));

        assert_eq!(clock.sleep_count(), 2);
        assert_eq!((clock.now() - start).num_seconds(), 4);
    }

    #[test]
    fn test_mock_clock_advance_does_not_record_sleep() {
        let clock = MockClock::new();
        let start = clock.now();

        clock.advance(Duration::from_secs(90));

        assert_eq!(clock.sleep_count(), 0);
        assert_eq!((clock.now() - start).num_seconds(), 90);
    }
}
