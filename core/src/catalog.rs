//! Ticket catalog: kind-tag → definition lookup.
//!
//! The registry consults the catalog on every read and write. Changing the
//! catalog therefore changes how already-persisted payloads decode.

use crate::error::{RegistryError, Result};
use crate::expiration::ExpirationPolicy;
use crate::id::TicketId;
use crate::ticket::TicketKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Catalog entry for one kind tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDefinition {
    /// Identifier prefix this definition answers for.
    pub prefix: String,

    /// Kind payloads under this prefix decode into.
    pub kind: TicketKind,

    /// Policy issuance should attach to new tickets of this kind.
    pub default_expiration: ExpirationPolicy,
}

impl TicketDefinition {
    /// New definition.
    #[must_use]
    pub fn new(
        prefix: impl Into<String>,
        kind: TicketKind,
        default_expiration: ExpirationPolicy,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            kind,
            default_expiration,
        }
    }

    /// Name of the concrete type payloads decode into.
    #[must_use]
    pub const fn implementation_type(&self) -> &'static str {
        self.kind.implementation_type()
    }
}

/// Lookup service resolving identifiers to definitions.
///
/// Injected into the registry; tests substitute a fixed map.
pub trait TicketCatalog: Send + Sync {
    /// Find the definition for `id`'s kind tag.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MalformedTicketId`] if no kind tag can be
    /// extracted from `id`.
    fn find(&self, id: &TicketId) -> Result<Option<TicketDefinition>>;

    /// Resolve `id` or fail.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::MalformedTicketId`] if `id` has no kind tag
    /// - [`RegistryError::UnknownTicketKind`] if the tag is not registered
    fn resolve(&self, id: &TicketId) -> Result<TicketDefinition> {
        match self.find(id)? {
            Some(definition) => Ok(definition),
            None => Err(RegistryError::UnknownTicketKind {
                prefix: id.kind_tag()?.to_string(),
            }),
        }
    }
}

impl<T: TicketCatalog + ?Sized> TicketCatalog for std::sync::Arc<T> {
    fn find(&self, id: &TicketId) -> Result<Option<TicketDefinition>> {
        (**self).find(id)
    }
}

/// In-memory catalog keyed by prefix.
#[derive(Debug, Clone, Default)]
pub struct DefaultTicketCatalog {
    definitions: HashMap<String, TicketDefinition>,
}

impl DefaultTicketCatalog {
    /// Empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the five standard kinds under their conventional prefixes.
    ///
    /// | Prefix | Kind | Default policy |
    /// |---|---|---|
    /// | `TGT` | ticket-granting | 8h hard cap, 2h idle |
    /// | `ST` | service | 1 use or 10s |
    /// | `PGT` | proxy-granting | 8h hard cap, 2h idle |
    /// | `PT` | proxy | 1 use or 10s |
    /// | `TST` | transient session | 5 min |
    #[must_use]
    pub fn with_defaults() -> Self {
        let session = ExpirationPolicy::ticket_granting(
            Duration::from_secs(8 * 60 * 60),
            Duration::from_secs(2 * 60 * 60),
        );
        let one_shot = ExpirationPolicy::multi_time_use(1, Duration::from_secs(10));

        let mut catalog = Self::new();
        for kind in TicketKind::ALL {
            let policy = match kind {
                TicketKind::TicketGranting | TicketKind::ProxyGranting => session.clone(),
                TicketKind::Service | TicketKind::Proxy => one_shot.clone(),
                TicketKind::TransientSession => {
                    ExpirationPolicy::hard_timeout(Duration::from_secs(5 * 60))
                }
            };
            catalog.register(TicketDefinition::new(kind.default_prefix(), kind, policy));
        }
        catalog
    }

    /// Register (or replace) a definition. Returns the one it replaced.
    pub fn register(&mut self, definition: TicketDefinition) -> Option<TicketDefinition> {
        tracing::debug!(
            prefix = %definition.prefix,
            kind = %definition.kind,
            "Registered ticket definition"
        );
        self.definitions.insert(definition.prefix.clone(), definition)
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with_definition(mut self, definition: TicketDefinition) -> Self {
        self.register(definition);
        self
    }

    /// All registered definitions.
    pub fn definitions(&self) -> impl Iterator<Item = &TicketDefinition> {
        self.definitions.values()
    }

    /// Definition registered for `prefix`.
    #[must_use]
    pub fn by_prefix(&self, prefix: &str) -> Option<&TicketDefinition> {
        self.definitions.get(prefix)
    }
}

impl TicketCatalog for DefaultTicketCatalog {
    fn find(&self, id: &TicketId) -> Result<Option<TicketDefinition>> {
        let tag = id.kind_tag()?;
        Ok(self.definitions.get(tag).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_kind() {
        let catalog = DefaultTicketCatalog::with_defaults();
        assert_eq!(catalog.definitions().count(), TicketKind::ALL.len());

        let definition = catalog.resolve(&TicketId::new("PT-9-abc")).unwrap();
        assert_eq!(definition.kind, TicketKind::Proxy);
        assert_eq!(definition.implementation_type(), "ProxyTicket");
    }

    #[test]
    fn unknown_prefix_is_an_error_not_absence() {
        let catalog = DefaultTicketCatalog::with_defaults();
        let error = catalog.resolve(&TicketId::new("bogusprefix-123")).unwrap_err();
        assert_eq!(
            error,
            RegistryError::UnknownTicketKind {
                prefix: "bogusprefix".to_string()
            }
        );
        assert!(catalog.find(&TicketId::new("bogusprefix-123")).unwrap().is_none());
    }

    #[test]
    fn malformed_id_fails_before_lookup() {
        let catalog = DefaultTicketCatalog::with_defaults();
        let error = catalog.resolve(&TicketId::new("TGT")).unwrap_err();
        assert!(matches!(error, RegistryError::MalformedTicketId(_)));
    }

    #[test]
    fn prefix_match_is_exact() {
        let catalog = DefaultTicketCatalog::with_defaults();
        // "STX" must not fall back to "ST"
        assert!(catalog.find(&TicketId::new("STX-1-abc")).unwrap().is_none());
    }

    #[test]
    fn register_replaces_and_changes_decode_target() {
        let mut catalog = DefaultTicketCatalog::with_defaults();
        let previous = catalog.register(TicketDefinition::new(
            "ST",
            TicketKind::TransientSession,
            ExpirationPolicy::NeverExpires,
        ));

        assert_eq!(previous.unwrap().kind, TicketKind::Service);
        assert_eq!(
            catalog.by_prefix("ST").unwrap().kind,
            TicketKind::TransientSession
        );
    }
}
