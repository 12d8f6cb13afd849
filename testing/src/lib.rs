//! # Ticket Registry Testing
//!
//! Testing utilities for the ticket registry.
//!
//! This crate provides:
//! - [`InMemoryTicketStore`]: TTL-emulating store driven by an injected clock
//! - [`ManualClock`] / [`FixedClock`]: deterministic time
//! - [`fixtures`]: one ticket of each kind with consistent parent/child ids
//! - [`properties`]: proptest strategies for tickets
//! - [`init_test_tracing`]: log output for failing tests
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use ticket_registry_core::{DefaultTicketCatalog, TicketRegistry};
//! use ticket_registry_testing::{InMemoryTicketStore, ManualClock, fixtures};
//!
//! # tokio_test::block_on(async {
//! let clock = Arc::new(ManualClock::default());
//! let registry = TicketRegistry::new(
//!     InMemoryTicketStore::with_clock(clock.clone()),
//!     DefaultTicketCatalog::with_defaults(),
//! );
//!
//! let ticket = fixtures::ticket_granting_ticket("TGT-1-abc", clock.current());
//! registry.add_ticket(&ticket).await.unwrap();
//! assert!(registry.get_ticket(ticket.id()).await.unwrap().is_some());
//! # });
//! ```

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Once, RwLock};
use ticket_registry_core::environment::Clock;

pub mod fixtures;
pub mod properties;
pub mod store;

pub use store::{InMemoryTicketStore, StoreOperation};

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, RwLock, TimeDelta, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use ticket_registry_testing::mocks::FixedClock;
    /// use ticket_registry_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
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

    /// Clock that only moves when told to.
    ///
    /// Share it (`Arc<ManualClock>`) between an [`InMemoryTicketStore`](crate::InMemoryTicketStore)
    /// and the test to expire records on demand.
    #[derive(Debug)]
    pub struct ManualClock {
        time: RwLock<DateTime<Utc>>,
    }

    impl ManualClock {
        /// Clock starting at `time`.
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: RwLock::new(time),
            }
        }

        /// Current reading.
        #[must_use]
        pub fn current(&self) -> DateTime<Utc> {
            *self.time.read().unwrap()
        }

        /// Move the clock forward.
        pub fn advance(&self, delta: TimeDelta) {
            *self.time.write().unwrap() += delta;
        }

        /// Jump to `time`.
        pub fn set(&self, time: DateTime<Utc>) {
            *self.time.write().unwrap() = time;
        }
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::new(test_clock().now())
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.current()
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

pub use mocks::{FixedClock, ManualClock, test_clock};

/// Install a `tracing` subscriber for tests (once per process).
///
/// Honours `RUST_LOG`; defaults to `ticket_registry=debug`. Output goes
/// through the test writer so it only shows for failing tests.
pub fn init_test_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "ticket_registry=debug".into());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::default();
        let start = clock.now();
        clock.advance(TimeDelta::seconds(300));
        assert_eq!(clock.now() - start, TimeDelta::seconds(300));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_test_tracing();
        init_test_tracing();
    }
}
