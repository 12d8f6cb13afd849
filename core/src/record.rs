//! Kind-agnostic persistence unit.

use crate::error::{RegistryError, Result};
use crate::expiration::ExpirationPolicy;
use crate::id::TicketId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The only shape the store knows about: `{id, data}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    /// Ticket identifier (the store key).
    pub id: TicketId,

    /// Encoded ticket payload.
    pub data: Vec<u8>,
}

impl TicketRecord {
    /// New record.
    #[must_use]
    pub const fn new(id: TicketId, data: Vec<u8>) -> Self {
        Self { id, data }
    }
}

/// Native per-record expiration in whole seconds.
///
/// Always fits a signed 32-bit integer. Zero means the record does not expire
/// at the store level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordTtl(u32);

impl RecordTtl {
    /// Record that never expires in the store.
    pub const NONE: Self = Self(0);

    /// Largest TTL the store accepts.
    pub const MAX_SECONDS: u64 = i32::MAX as u64;

    /// Build a TTL from whole seconds.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::TtlOutOfRange`] above `i32::MAX`.
    pub fn from_seconds(id: &TicketId, seconds: u64) -> Result<Self> {
        if seconds > Self::MAX_SECONDS {
            return Err(RegistryError::TtlOutOfRange {
                id: id.to_string(),
                seconds,
            });
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(seconds as u32))
    }

    /// TTL for a ticket: its policy's time-to-idle, fractional seconds dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::TtlOutOfRange`] if the time-to-idle does not
    /// fit in 32 bits of seconds.
    pub fn from_policy(id: &TicketId, policy: &ExpirationPolicy) -> Result<Self> {
        Self::from_seconds(id, policy.time_to_idle().as_secs())
    }

    /// Seconds until expiry; zero means none.
    #[must_use]
    pub const fn as_secs(self) -> u32 {
        self.0
    }

    /// Whether the record expires at all.
    #[must_use]
    pub const fn expires(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for RecordTtl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn id() -> TicketId {
        TicketId::new("ST-1-abc")
    }

    #[test]
    fn fractional_seconds_truncate() {
        let policy = ExpirationPolicy::timeout(Duration::from_millis(10_999));
        assert_eq!(RecordTtl::from_policy(&id(), &policy).unwrap().as_secs(), 10);
    }

    #[test]
    fn sub_second_idle_means_no_store_expiry() {
        let policy = ExpirationPolicy::timeout(Duration::from_millis(999));
        let ttl = RecordTtl::from_policy(&id(), &policy).unwrap();
        assert_eq!(ttl, RecordTtl::NONE);
        assert!(!ttl.expires());
    }

    #[test]
    fn i32_max_is_accepted() {
        let ttl = RecordTtl::from_policy(&id(), &ExpirationPolicy::NeverExpires).unwrap();
        assert_eq!(u64::from(ttl.as_secs()), RecordTtl::MAX_SECONDS);
    }

    #[test]
    fn overflow_fails_fast() {
        let policy = ExpirationPolicy::timeout(Duration::from_secs(RecordTtl::MAX_SECONDS + 1));
        let error = RecordTtl::from_policy(&id(), &policy).unwrap_err();
        assert_eq!(
            error,
            RegistryError::TtlOutOfRange {
                id: "ST-1-abc".to_string(),
                seconds: 2_147_483_648,
            }
        );
    }
}
