//! Error types for ticket registry operations.

use crate::ticket::TicketKind;
use thiserror::Error;

/// Result type alias for ticket registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Error taxonomy for the ticket registry.
///
/// A missing ticket is not an error: reads return `Ok(None)` and deletes of
/// absent ids succeed. Everything here is surfaced to the immediate caller;
/// nothing is retried inside the registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    // ═══════════════════════════════════════════════════════════
    // Catalog Errors
    // ═══════════════════════════════════════════════════════════

    /// The identifier's kind tag has no catalog entry.
    #[error("Ticket catalog has no metadata for {prefix} tickets")]
    UnknownTicketKind {
        /// Kind tag extracted from the identifier
        prefix: String,
    },

    /// The identifier carries no extractable kind tag.
    #[error("Malformed ticket identifier: {0:?}")]
    MalformedTicketId(String),

    /// The catalog resolved a kind that differs from the ticket's concrete type.
    #[error("Ticket {id} resolves to {expected} but is a {actual}")]
    KindMismatch {
        /// Ticket identifier
        id: String,
        /// Kind the catalog (or caller) expected
        expected: TicketKind,
        /// Kind actually present
        actual: TicketKind,
    },

    // ═══════════════════════════════════════════════════════════
    // Codec Errors
    // ═══════════════════════════════════════════════════════════

    /// Payload could not be reconstructed into the resolved type.
    #[error("Failed to decode ticket {id}: {reason}")]
    Decode {
        /// Ticket identifier
        id: String,
        /// Underlying codec failure
        reason: String,
    },

    /// Ticket could not be encoded.
    #[error("Failed to encode ticket {id}: {reason}")]
    Encode {
        /// Ticket identifier
        id: String,
        /// Underlying codec failure
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Expiration Errors
    // ═══════════════════════════════════════════════════════════

    /// Time-to-idle does not fit the store's 32-bit TTL.
    #[error("TTL of {seconds}s for ticket {id} exceeds the store limit")]
    TtlOutOfRange {
        /// Ticket identifier
        id: String,
        /// Requested TTL in whole seconds
        seconds: u64,
    },

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// The backing store failed or could not meet the consistency level.
    #[error("Ticket store unavailable: {0}")]
    StoreUnavailable(String),

    /// Configuration value rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RegistryError {
    /// Returns `true` for catalog lookup failures.
    ///
    /// These indicate a configuration or programming error rather than a
    /// routine miss.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ticket_registry_core::RegistryError;
    /// let err = RegistryError::UnknownTicketKind { prefix: "XYZ".into() };
    /// assert!(err.is_fatal_lookup());
    /// assert!(!RegistryError::StoreUnavailable("timeout".into()).is_fatal_lookup());
    /// ```
    #[must_use]
    pub const fn is_fatal_lookup(&self) -> bool {
        matches!(
            self,
            Self::UnknownTicketKind { .. } | Self::MalformedTicketId(_)
        )
    }

    /// Returns `true` if a caller-side retry may succeed.
    ///
    /// The registry itself never retries.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ticket_registry_core::RegistryError;
    /// assert!(RegistryError::StoreUnavailable("no quorum".into()).is_retryable());
    /// assert!(!RegistryError::MalformedTicketId("abc".into()).is_retryable());
    /// ```
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}
