//! # Bashi Testing
//!
//! Testing utilities for reducers written against `bashi-core`.
//!
//! This crate provides:
//! - Deterministic implementations of Environment traits
//! - A Given-When-Then harness for reducers
//! - Assertion helpers for returned effects
//!
//! ## Example
//!
//! ```
//! use bashi_core::environment::{Clock, IdGenerator};
//! use bashi_testing::{test_clock, SequentialIdGenerator, SteppingClock};
//!
//! let start = test_clock().now();
//! let clock = SteppingClock::new(start, chrono::Duration::seconds(1));
//! assert_eq!(clock.now(), start);
//! assert_eq!(clock.now(), start + chrono::Duration::seconds(1));
//!
//! let ids = SequentialIdGenerator::new();
//! assert_eq!(ids.next_token(), "000000001");
//! ```

use bashi_core::environment::{Clock, IdGenerator};
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Deterministic implementations of Environment traits
pub mod mocks {
    use super::{AtomicU64, Clock, DateTime, Duration, IdGenerator, Mutex, Ordering, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use bashi_testing::mocks::FixedClock;
    /// use bashi_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that moves forward by a fixed step on every read
    ///
    /// Useful where consecutive timestamps must differ, such as ids built
    /// from the current millisecond.
    #[derive(Debug)]
    pub struct SteppingClock {
        next: Mutex<DateTime<Utc>>,
        step: Duration,
    }

    impl SteppingClock {
        /// Start at `start`, advancing by `step` after each read
        #[must_use]
        pub const fn new(start: DateTime<Utc>, step: Duration) -> Self {
            Self {
                next: Mutex::new(start),
                step,
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            match self.next.lock() {
                Ok(mut next) => {
                    let now = *next;
                    *next = now + self.step;
                    now
                },
                Err(poisoned) => *poisoned.into_inner(),
            }
        }
    }

    /// Predictable id tokens: `000000001`, `000000002`, ...
    #[derive(Debug, Default)]
    pub struct SequentialIdGenerator {
        counter: AtomicU64,
    }

    impl SequentialIdGenerator {
        /// Create a generator whose first token is `000000001`
        #[must_use]
        pub const fn new() -> Self {
            Self {
                counter: AtomicU64::new(0),
            }
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn next_token(&self) -> String {
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            format!("{n:09}")
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Given-When-Then harness for reducers
pub mod reducer_test;

// Re-export commonly used items
pub use mocks::{FixedClock, SequentialIdGenerator, SteppingClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
