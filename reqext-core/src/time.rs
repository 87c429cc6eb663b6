//! Time source used for cache expiry.
//!
//! Expiry timestamps are absolute [`DateTime<Utc>`] values. The clock is
//! abstracted behind [`TimeProvider`] so that tests can move time forward
//! without sleeping.

use std::fmt::Debug;

use chrono::{DateTime, Utc};

/// Source of the current time.
pub trait TimeProvider: Debug + Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use mock::MockTimeProvider;

#[cfg(any(test, feature = "test-helpers"))]
mod mock {
    use std::sync::{Arc, Mutex, PoisonError};
    use std::time::Duration;

    use chrono::{DateTime, Utc};

    use super::TimeProvider;

    /// Manually driven clock for tests.
    ///
    /// Clones share the same instant, so a test can keep one copy and hand
    /// another to the code under test.
    #[derive(Debug, Clone)]
    pub struct MockTimeProvider {
        now: Arc<Mutex<DateTime<Utc>>>,
    }

    impl MockTimeProvider {
        /// Creates a clock frozen at `start`.
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                now: Arc::new(Mutex::new(start)),
            }
        }

        /// Creates a clock frozen at the current wall-clock time.
        pub fn starting_now() -> Self {
            Self::new(Utc::now())
        }

        /// Move the clock forward.
        pub fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
            let delta = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
            *now = now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC);
        }

        /// Move the clock forward by `millis` milliseconds.
        pub fn advance_millis(&self, millis: u64) {
            self.advance(Duration::from_millis(millis));
        }

        /// Move the clock forward by `secs` seconds.
        pub fn advance_secs(&self, secs: u64) {
            self.advance(Duration::from_secs(secs));
        }
    }

    impl TimeProvider for MockTimeProvider {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_clock_advances_shared_instant() {
        let clock = MockTimeProvider::starting_now();
        let copy = clock.clone();
        let start = clock.now();
        copy.advance_millis(1500);
        assert_eq!(clock.now() - start, chrono::Duration::milliseconds(1500));
        copy.advance_secs(2);
        assert_eq!(clock.now() - start, chrono::Duration::milliseconds(3500));
    }
}
