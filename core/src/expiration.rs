//! Expiration policies attached to ticket instances.
//!
//! A policy answers two questions: is this ticket expired right now, and how
//! long may the store keep it after its last write (`time_to_idle`). The second
//! answer becomes the record's native TTL.

use crate::ticket::TicketState;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Idle/live window reported by [`ExpirationPolicy::NeverExpires`].
pub const NEVER_EXPIRES_SECONDS: u64 = i32::MAX as u64;

/// Expiration policy for a single ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpirationPolicy {
    /// Expires once unused for `time_to_kill` (sliding window).
    Timeout {
        /// Idle window measured from the last use.
        time_to_kill: Duration,
    },

    /// Expires `time_to_kill` after creation regardless of use.
    HardTimeout {
        /// Absolute lifetime measured from creation.
        time_to_kill: Duration,
    },

    /// Expires after a number of uses or once idle for `time_to_kill`.
    MultiTimeUse {
        /// Uses allowed before the ticket is spent.
        number_of_uses: u32,
        /// Idle window measured from the last use.
        time_to_kill: Duration,
    },

    /// Ticket-granting ticket policy: hard cap plus idle timeout.
    TicketGranting {
        /// Absolute lifetime measured from creation.
        max_time_to_live: Duration,
        /// Idle window measured from the last use.
        time_to_kill: Duration,
    },

    /// Never expires.
    NeverExpires,
}

impl ExpirationPolicy {
    /// Sliding idle-timeout policy.
    #[must_use]
    pub const fn timeout(time_to_kill: Duration) -> Self {
        Self::Timeout { time_to_kill }
    }

    /// Hard-timeout policy.
    #[must_use]
    pub const fn hard_timeout(time_to_kill: Duration) -> Self {
        Self::HardTimeout { time_to_kill }
    }

    /// Use-count-or-timeout policy.
    #[must_use]
    pub const fn multi_time_use(number_of_uses: u32, time_to_kill: Duration) -> Self {
        Self::MultiTimeUse {
            number_of_uses,
            time_to_kill,
        }
    }

    /// Ticket-granting policy.
    #[must_use]
    pub const fn ticket_granting(max_time_to_live: Duration, time_to_kill: Duration) -> Self {
        Self::TicketGranting {
            max_time_to_live,
            time_to_kill,
        }
    }

    /// Short policy name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::HardTimeout { .. } => "hard_timeout",
            Self::MultiTimeUse { .. } => "multi_time_use",
            Self::TicketGranting { .. } => "ticket_granting",
            Self::NeverExpires => "never_expires",
        }
    }

    /// How long the ticket may sit unused before it lapses.
    ///
    /// Every finite policy reports a non-zero idle window that is no longer
    /// than its overall lifetime, so the store never keeps a record past the
    /// point where it could still be valid.
    #[must_use]
    pub const fn time_to_idle(&self) -> Duration {
        match self {
            Self::Timeout { time_to_kill }
            | Self::HardTimeout { time_to_kill }
            | Self::MultiTimeUse { time_to_kill, .. }
            | Self::TicketGranting { time_to_kill, .. } => *time_to_kill,
            Self::NeverExpires => Duration::from_secs(NEVER_EXPIRES_SECONDS),
        }
    }

    /// Upper bound on the ticket's total lifetime.
    #[must_use]
    pub const fn time_to_live(&self) -> Duration {
        match self {
            Self::Timeout { time_to_kill }
            | Self::HardTimeout { time_to_kill }
            | Self::MultiTimeUse { time_to_kill, .. } => *time_to_kill,
            Self::TicketGranting {
                max_time_to_live, ..
            } => *max_time_to_live,
            Self::NeverExpires => Duration::from_secs(NEVER_EXPIRES_SECONDS),
        }
    }

    /// Whether a ticket in `state` is expired at `now`.
    #[must_use]
    pub fn is_expired(&self, state: &TicketState, now: DateTime<Utc>) -> bool {
        match self {
            Self::Timeout { time_to_kill } => past(state.last_time_used, *time_to_kill, now),
            Self::HardTimeout { time_to_kill } => past(state.creation_time, *time_to_kill, now),
            Self::MultiTimeUse {
                number_of_uses,
                time_to_kill,
            } => {
                state.count_of_uses >= *number_of_uses
                    || past(state.last_time_used, *time_to_kill, now)
            }
            Self::TicketGranting {
                max_time_to_live,
                time_to_kill,
            } => {
                past(state.creation_time, *max_time_to_live, now)
                    || past(state.last_time_used, *time_to_kill, now)
            }
            Self::NeverExpires => false,
        }
    }
}

/// `now` is strictly after `since + window`. Windows too large for chrono never elapse.
fn past(since: DateTime<Utc>, window: Duration, now: DateTime<Utc>) -> bool {
    TimeDelta::from_std(window)
        .ok()
        .and_then(|delta| since.checked_add_signed(delta))
        .is_some_and(|deadline| now > deadline)
}
