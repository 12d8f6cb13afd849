//! Ticket store trait.
//!
//! The store is a tunable-consistency keyed store with native per-record TTL.
//! It knows nothing about ticket kinds: it moves [`TicketRecord`]s.
//!
//! # Implementation Notes
//!
//! - `put` is an upsert; payload and TTL are replaced together
//! - `delete` of an absent key succeeds
//! - `scan_all` is lazy, finite, unordered and not restartable
//! - Every failure surfaces as [`RegistryError::StoreUnavailable`](crate::RegistryError::StoreUnavailable);
//!   implementations never retry
//! - Reads may observe stale replicas; `None` means "not found here, now"

use crate::consistency::ConsistencyLevel;
use crate::error::Result;
use crate::id::TicketId;
use crate::record::{RecordTtl, TicketRecord};
use futures::stream::BoxStream;
use std::future::Future;
use std::sync::Arc;

/// Keyed record store with per-record TTL.
pub trait TicketStore: Send + Sync {
    /// Point read.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot serve the read at `consistency`.
    fn get(
        &self,
        id: &TicketId,
        consistency: ConsistencyLevel,
    ) -> impl Future<Output = Result<Option<TicketRecord>>> + Send;

    /// Upsert `record`, expiring it after `ttl` (never, if `ttl` is zero).
    ///
    /// # Errors
    ///
    /// Returns error if the write fails or is not acknowledged at `consistency`.
    fn put(
        &self,
        record: TicketRecord,
        ttl: RecordTtl,
        consistency: ConsistencyLevel,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete `id`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns error if the delete fails or is not acknowledged at `consistency`.
    fn delete(
        &self,
        id: &TicketId,
        consistency: ConsistencyLevel,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Full-table read.
    ///
    /// A failure mid-scan is yielded as an `Err` item; consumers stop there.
    fn scan_all(&self, consistency: ConsistencyLevel) -> BoxStream<'_, Result<TicketRecord>>;
}

impl<T: TicketStore> TicketStore for Arc<T> {
    fn get(
        &self,
        id: &TicketId,
        consistency: ConsistencyLevel,
    ) -> impl Future<Output = Result<Option<TicketRecord>>> + Send {
        (**self).get(id, consistency)
    }

    fn put(
        &self,
        record: TicketRecord,
        ttl: RecordTtl,
        consistency: ConsistencyLevel,
    ) -> impl Future<Output = Result<()>> + Send {
        (**self).put(record, ttl, consistency)
    }

    fn delete(
        &self,
        id: &TicketId,
        consistency: ConsistencyLevel,
    ) -> impl Future<Output = Result<()>> + Send {
        (**self).delete(id, consistency)
    }

    fn scan_all(&self, consistency: ConsistencyLevel) -> BoxStream<'_, Result<TicketRecord>> {
        (**self).scan_all(consistency)
    }
}
