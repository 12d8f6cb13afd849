//! Ticket registry: the public CRUD surface.
//!
//! The registry composes a [`TicketCatalog`], a [`TicketCodec`] and a
//! [`TicketStore`]. It holds no ticket state between calls; every operation is
//! an independent sequence of store requests.
//!
//! # Read path
//!
//! ```text
//! id ──► catalog.resolve(id) ──► store.get(id) ──► codec.deserialize(data, kind) ──► Ticket
//!              │                       │
//!              ▼                       ▼
//!     UnknownTicketKind            None (not found)
//! ```
//!
//! # Write path
//!
//! ```text
//! Ticket ──► catalog.resolve(id) ──► codec.serialize ──► RecordTtl::from_policy ──► store.put
//! ```
//!
//! # Consistency
//!
//! Single-ticket operations are one store round trip. Multi-ticket operations
//! (`get_tickets`, `delete_all`, `delete_ticket`) are not atomic: tickets
//! written or removed by other actors mid-sequence may or may not be observed.
//!
//! # Example
//!
//! ```ignore
//! use ticket_registry_core::{DefaultTicketCatalog, TicketRegistry};
//!
//! let registry = TicketRegistry::new(store, DefaultTicketCatalog::with_defaults());
//!
//! registry.add_ticket(&ticket).await?;
//! let found = registry.get_ticket(ticket.id()).await?;
//! assert_eq!(found.as_ref(), Some(&ticket));
//! ```

use crate::catalog::TicketCatalog;
use crate::codec::{JsonTicketCodec, TicketCodec};
use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::id::TicketId;
use crate::record::{RecordTtl, TicketRecord};
use crate::store::TicketStore;
use crate::ticket::{Ticket, TicketKind};
use chrono::{DateTime, Utc};
use futures::future;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use std::collections::HashSet;

/// Stateless ticket registry over a TTL-capable store.
#[derive(Debug, Clone)]
pub struct TicketRegistry<S, K, C = JsonTicketCodec> {
    store: S,
    catalog: K,
    codec: C,
    config: RegistryConfig,
}

impl<S, K> TicketRegistry<S, K, JsonTicketCodec>
where
    S: TicketStore,
    K: TicketCatalog,
{
    /// Registry using the JSON codec and default consistency.
    #[must_use]
    pub fn new(store: S, catalog: K) -> Self {
        Self::with_codec(store, catalog, JsonTicketCodec)
    }
}

impl<S, K, C> TicketRegistry<S, K, C>
where
    S: TicketStore,
    K: TicketCatalog,
    C: TicketCodec,
{
    /// Registry using `codec`.
    #[must_use]
    pub fn with_codec(store: S, catalog: K, codec: C) -> Self {
        tracing::info!(codec = codec.name(), "Ticket registry initialized");
        Self {
            store,
            catalog,
            codec,
            config: RegistryConfig::default(),
        }
    }

    /// Replace the consistency configuration.
    #[must_use]
    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Catalog in use.
    pub const fn catalog(&self) -> &K {
        &self.catalog
    }

    /// Active configuration.
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Fetch a ticket by id.
    ///
    /// The id is resolved through the catalog before the store is touched, so
    /// an unknown kind fails even when nothing is stored under the id.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ticket))`: found and decoded
    /// - `Ok(None)`: not found (possibly replication lag, possibly expired)
    ///
    /// # Errors
    ///
    /// - `UnknownTicketKind` / `MalformedTicketId`: id does not resolve
    /// - `Decode`: payload does not decode into the resolved kind
    /// - `StoreUnavailable`: store read failed
    pub async fn get_ticket(&self, id: &TicketId) -> Result<Option<Ticket>> {
        let definition = self.catalog.resolve(id)?;

        let Some(record) = self.store.get(id, self.config.read_consistency).await? else {
            metrics::counter!("ticket_registry.tickets.missing", "kind" => definition.kind.label())
                .increment(1);
            tracing::debug!(ticket_id = %id, "Ticket not found");
            return Ok(None);
        };

        let ticket = self.decode_as(&record, definition.kind)?;
        metrics::counter!("ticket_registry.tickets.read", "kind" => definition.kind.label())
            .increment(1);
        Ok(Some(ticket))
    }

    /// Fetch a ticket and keep it only if `predicate` accepts it.
    ///
    /// A rejected ticket is reported as absent; the store is not modified.
    ///
    /// # Errors
    ///
    /// Same as [`get_ticket`](Self::get_ticket).
    pub async fn get_ticket_matching<P>(&self, id: &TicketId, predicate: P) -> Result<Option<Ticket>>
    where
        P: FnOnce(&Ticket) -> bool + Send,
    {
        Ok(self.get_ticket(id).await?.filter(|ticket| predicate(ticket)))
    }

    /// Fetch a ticket that is not expired at `now` under its own policy.
    ///
    /// # Errors
    ///
    /// Same as [`get_ticket`](Self::get_ticket).
    pub async fn get_unexpired(&self, id: &TicketId, now: DateTime<Utc>) -> Result<Option<Ticket>> {
        self.get_ticket_matching(id, |ticket| !ticket.is_expired(now))
            .await
    }

    /// Fetch a ticket as a concrete type.
    ///
    /// # Errors
    ///
    /// Same as [`get_ticket`](Self::get_ticket), plus `KindMismatch` if the
    /// stored ticket is a different concrete type.
    pub async fn get_ticket_as<T>(&self, id: &TicketId) -> Result<Option<T>>
    where
        T: TryFrom<Ticket, Error = RegistryError>,
    {
        self.get_ticket(id).await?.map(T::try_from).transpose()
    }

    /// Lazily decode every stored ticket.
    ///
    /// The first record that fails to resolve or decode is yielded as an
    /// error; consumers are expected to stop there.
    pub fn stream_tickets(&self) -> BoxStream<'_, Result<Ticket>> {
        self.store
            .scan_all(self.config.read_consistency)
            .map(move |record| record.and_then(|record| self.decode(&record)))
            .boxed()
    }

    /// Every stored ticket.
    ///
    /// Fail-fast: one record with an unknown kind or undecodable payload
    /// aborts the whole call rather than being skipped.
    ///
    /// # Errors
    ///
    /// - `UnknownTicketKind` / `MalformedTicketId`: a stored id does not resolve
    /// - `Decode`: a payload does not decode
    /// - `StoreUnavailable`: the scan failed part way
    pub async fn get_tickets(&self) -> Result<Vec<Ticket>> {
        let tickets: Vec<Ticket> = self.stream_tickets().try_collect().await?;
        tracing::debug!(count = tickets.len(), "Loaded all tickets");
        Ok(tickets)
    }

    /// Persist a ticket with its policy's time-to-idle as the store TTL.
    ///
    /// # Errors
    ///
    /// - `UnknownTicketKind` / `MalformedTicketId`: id does not resolve
    /// - `KindMismatch`: the id resolves to a different kind than the ticket
    /// - `Encode`: codec rejected the ticket
    /// - `TtlOutOfRange`: time-to-idle exceeds `i32::MAX` seconds
    /// - `StoreUnavailable`: store write failed
    pub async fn add_ticket(&self, ticket: &Ticket) -> Result<()> {
        let id = ticket.id();
        let definition = self.catalog.resolve(id)?;
        if definition.kind != ticket.kind() {
            return Err(RegistryError::KindMismatch {
                id: id.to_string(),
                expected: definition.kind,
                actual: ticket.kind(),
            });
        }

        let data = self
            .codec
            .serialize(ticket)
            .map_err(|e| RegistryError::Encode {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
        let ttl = RecordTtl::from_policy(id, ticket.expiration_policy())?;

        self.store
            .put(
                TicketRecord::new(id.clone(), data),
                ttl,
                self.config.write_consistency,
            )
            .await?;

        metrics::counter!("ticket_registry.tickets.written", "kind" => definition.kind.label())
            .increment(1);
        tracing::debug!(
            ticket_id = %id,
            kind = %definition.kind,
            policy = ticket.expiration_policy().name(),
            ttl_seconds = ttl.as_secs(),
            consistency = %self.config.write_consistency,
            "Stored ticket"
        );

        Ok(())
    }

    /// Overwrite a ticket; identical to [`add_ticket`](Self::add_ticket).
    ///
    /// The TTL is recomputed and replaces the previous one.
    ///
    /// # Errors
    ///
    /// Same as [`add_ticket`](Self::add_ticket).
    pub async fn update_ticket(&self, ticket: Ticket) -> Result<Ticket> {
        self.add_ticket(&ticket).await?;
        Ok(ticket)
    }

    /// Delete one record by id.
    ///
    /// Returns `true` once the store accepts the delete, whether or not the id
    /// existed.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the delete is not accepted.
    pub async fn delete_single_ticket(&self, id: &TicketId) -> Result<bool> {
        self.store
            .delete(id, self.config.write_consistency)
            .await?;

        metrics::counter!("ticket_registry.tickets.deleted").increment(1);
        tracing::debug!(ticket_id = %id, "Deleted ticket");
        Ok(true)
    }

    /// Delete a ticket and everything that descends from it.
    ///
    /// Deleting a ticket-granting ticket removes its service tickets and
    /// proxy-granting tickets; deleting a proxy-granting ticket removes its
    /// proxy tickets. Descendants already gone are skipped.
    ///
    /// The whole tree is read before anything is removed, so a descendant
    /// that cannot be resolved or decoded leaves every ticket in place.
    ///
    /// Returns the number of tickets found and deleted (0 if `id` is absent).
    ///
    /// # Errors
    ///
    /// Any error from [`get_ticket`](Self::get_ticket) (nothing is deleted)
    /// or from [`delete_single_ticket`](Self::delete_single_ticket) (earlier
    /// deletes stand).
    pub async fn delete_ticket(&self, id: &TicketId) -> Result<usize> {
        let tree = self.collect_tree(id).await?;

        for next in &tree {
            self.delete_single_ticket(next).await?;
        }

        let deleted = tree.len();
        tracing::info!(ticket_id = %id, deleted, "Deleted ticket and descendants");
        Ok(deleted)
    }

    /// Ids of `root` and its present descendants, parents before children.
    async fn collect_tree(&self, root: &TicketId) -> Result<Vec<TicketId>> {
        let mut pending = vec![root.clone()];
        let mut visited = HashSet::new();
        let mut tree = Vec::new();

        while let Some(next) = pending.pop() {
            if !visited.insert(next.clone()) {
                continue;
            }
            let Some(ticket) = self.get_ticket(&next).await? else {
                continue;
            };

            match &ticket {
                Ticket::TicketGranting(tgt) => pending.extend(tgt.descendant_ids().cloned()),
                Ticket::ProxyGranting(pgt) => pending.extend(pgt.proxy_tickets.iter().cloned()),
                Ticket::Service(_) | Ticket::Proxy(_) | Ticket::TransientSession(_) => {}
            }
            tree.push(next);
        }

        Ok(tree)
    }

    /// Delete every ticket observed by one scan.
    ///
    /// Not atomic: tickets written after the scan survive, and the count only
    /// reflects what the scan saw.
    ///
    /// # Errors
    ///
    /// Any error from [`get_tickets`](Self::get_tickets) (nothing is deleted)
    /// or from a delete (earlier deletes stand).
    pub async fn delete_all(&self) -> Result<usize> {
        let tickets = self.get_tickets().await?;
        for ticket in &tickets {
            self.delete_single_ticket(ticket.id()).await?;
        }

        tracing::info!(count = tickets.len(), "Deleted all tickets");
        Ok(tickets.len())
    }

    /// Number of stored ticket-granting tickets (active single sign-on sessions).
    ///
    /// # Errors
    ///
    /// Same as [`get_tickets`](Self::get_tickets).
    pub async fn session_count(&self) -> Result<usize> {
        self.count_kind(TicketKind::TicketGranting).await
    }

    /// Number of stored service tickets.
    ///
    /// # Errors
    ///
    /// Same as [`get_tickets`](Self::get_tickets).
    pub async fn service_ticket_count(&self) -> Result<usize> {
        self.count_kind(TicketKind::Service).await
    }

    async fn count_kind(&self, kind: TicketKind) -> Result<usize> {
        self.stream_tickets()
            .try_fold(0, |count, ticket| {
                future::ready(Ok(count + usize::from(ticket.kind() == kind)))
            })
            .await
    }

    fn decode(&self, record: &TicketRecord) -> Result<Ticket> {
        let definition = self.catalog.resolve(&record.id)?;
        self.decode_as(record, definition.kind)
    }

    fn decode_as(&self, record: &TicketRecord, kind: TicketKind) -> Result<Ticket> {
        let ticket = self
            .codec
            .deserialize(&record.data, kind)
            .map_err(|e| {
                metrics::counter!("ticket_registry.decode.failures", "kind" => kind.label())
                    .increment(1);
                RegistryError::Decode {
                    id: record.id.to_string(),
                    reason: e.to_string(),
                }
            })?;

        if ticket.id() != &record.id {
            return Err(RegistryError::Decode {
                id: record.id.to_string(),
                reason: format!("payload belongs to {}", ticket.id()),
            });
        }
        Ok(ticket)
    }
}
