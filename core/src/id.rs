//! Ticket identifiers.
//!
//! Identifiers are opaque strings. By convention the text before the first
//! `-` is the kind tag (`TGT-1-…`, `ST-42-…`); [`TicketId::kind_tag`] is the
//! only place that convention is parsed.

use crate::error::{RegistryError, Result};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Separator between the kind tag and the rest of an identifier.
pub const KIND_TAG_DELIMITER: char = '-';

/// Opaque ticket identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Wrap an existing identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the kind tag (everything before the first `-`).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MalformedTicketId`] if the identifier has no
    /// delimiter or the tag before it is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ticket_registry_core::TicketId;
    /// assert_eq!(TicketId::new("TGT-1-abc-node1").kind_tag().unwrap(), "TGT");
    /// assert!(TicketId::new("no_delimiter").kind_tag().is_err());
    /// assert!(TicketId::new("-1-abc").kind_tag().is_err());
    /// ```
    pub fn kind_tag(&self) -> Result<&str> {
        match self.0.split_once(KIND_TAG_DELIMITER) {
            Some((tag, _)) if !tag.is_empty() => Ok(tag),
            _ => Err(RegistryError::MalformedTicketId(self.0.clone())),
        }
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TicketId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TicketId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for TicketId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Generates identifiers of the form `{PREFIX}-{counter}-{random}[-{suffix}]`.
///
/// The counter is process-local and only makes ids easier to eyeball in logs;
/// uniqueness comes from the random part. The optional suffix usually names
/// the issuing node.
#[derive(Debug)]
pub struct TicketIdGenerator {
    counter: AtomicU64,
    random_length: usize,
    suffix: Option<String>,
}

impl TicketIdGenerator {
    /// Default length of the random segment.
    pub const DEFAULT_RANDOM_LENGTH: usize = 32;

    /// Create a generator without a node suffix.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
            random_length: Self::DEFAULT_RANDOM_LENGTH,
            suffix: None,
        }
    }

    /// Append `-{suffix}` to every generated id.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.suffix = (!suffix.is_empty()).then_some(suffix);
        self
    }

    /// Set the length of the random segment.
    #[must_use]
    pub const fn with_random_length(mut self, random_length: usize) -> Self {
        self.random_length = random_length;
        self
    }

    /// Generate a new identifier for the given kind tag.
    #[must_use]
    pub fn next_id(&self, prefix: &str) -> TicketId {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let random: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.random_length)
            .map(char::from)
            .collect();

        let id = match &self.suffix {
            Some(suffix) => format!("{prefix}-{sequence}-{random}-{suffix}"),
            None => format!("{prefix}-{sequence}-{random}"),
        };
        TicketId(id)
    }
}

impl Default for TicketIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
