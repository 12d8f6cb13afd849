//! In-memory ticket store for fast, deterministic testing.
//!
//! Emulates a TTL-capable keyed store: every record carries an optional expiry
//! computed from the injected [`Clock`] at write time, and expired records are
//! invisible to reads and scans. Advance a [`ManualClock`](crate::ManualClock)
//! to make records lapse without sleeping.
//!
//! Failure injection:
//! - [`set_unavailable`](InMemoryTicketStore::set_unavailable): every call fails
//! - [`fail_scan_after`](InMemoryTicketStore::fail_scan_after): scans fail part way

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a panicking test

use chrono::{DateTime, TimeDelta, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use ticket_registry_core::environment::{Clock, SystemClock};
use ticket_registry_core::{
    ConsistencyLevel, RecordTtl, RegistryError, Result, TicketId, TicketRecord, TicketStore,
};

/// A store request, as observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    /// Point read.
    Get {
        /// Key read
        id: TicketId,
        /// Requested level
        consistency: ConsistencyLevel,
    },
    /// Upsert.
    Put {
        /// Key written
        id: TicketId,
        /// TTL applied
        ttl: RecordTtl,
        /// Requested level
        consistency: ConsistencyLevel,
    },
    /// Delete.
    Delete {
        /// Key deleted
        id: TicketId,
        /// Requested level
        consistency: ConsistencyLevel,
    },
    /// Full scan.
    Scan {
        /// Requested level
        consistency: ConsistencyLevel,
    },
}

#[derive(Debug, Clone)]
struct StoredRecord {
    data: Vec<u8>,
    expires_at: Option<DateTime<Utc>>,
}

impl StoredRecord {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

/// In-memory [`TicketStore`] with clock-driven TTL.
///
/// Clones share the same data.
#[derive(Clone)]
pub struct InMemoryTicketStore {
    records: Arc<RwLock<HashMap<TicketId, StoredRecord>>>,
    operations: Arc<Mutex<Vec<StoreOperation>>>,
    clock: Arc<dyn Clock>,
    unavailable: Arc<AtomicBool>,
    scan_failure_after: Arc<Mutex<Option<usize>>>,
}

impl InMemoryTicketStore {
    /// Store on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Store reading time from `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            clock,
            unavailable: Arc::new(AtomicBool::new(false)),
            scan_failure_after: Arc::new(Mutex::new(None)),
        }
    }

    /// Write a record directly, bypassing the registry (e.g. to plant
    /// unknown kinds or corrupt payloads).
    pub fn insert_raw(&self, record: TicketRecord, ttl: RecordTtl) {
        let stored = self.stored(record.data, ttl);
        self.records.write().unwrap().insert(record.id, stored);
    }

    /// Raw payload currently visible under `id`.
    #[must_use]
    pub fn raw(&self, id: &TicketId) -> Option<Vec<u8>> {
        let now = self.clock.now();
        self.records
            .read()
            .unwrap()
            .get(id)
            .filter(|stored| stored.is_live(now))
            .map(|stored| stored.data.clone())
    }

    /// Absolute expiry of `id`, if stored with a TTL.
    #[must_use]
    pub fn expires_at(&self, id: &TicketId) -> Option<DateTime<Utc>> {
        self.records
            .read()
            .unwrap()
            .get(id)
            .and_then(|stored| stored.expires_at)
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.records
            .read()
            .unwrap()
            .values()
            .filter(|stored| stored.is_live(now))
            .count()
    }

    /// Whether no live records remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every request served so far, oldest first.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.operations.lock().unwrap().clone()
    }

    /// Forget recorded requests.
    pub fn clear_operations(&self) {
        self.operations.lock().unwrap().clear();
    }

    /// Make every subsequent call fail with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make scans fail after yielding `records` records.
    pub fn fail_scan_after(&self, records: Option<usize>) {
        *self.scan_failure_after.lock().unwrap() = records;
    }

    fn stored(&self, data: Vec<u8>, ttl: RecordTtl) -> StoredRecord {
        let expires_at = ttl
            .expires()
            .then(|| self.clock.now() + TimeDelta::seconds(i64::from(ttl.as_secs())));
        StoredRecord { data, expires_at }
    }

    fn record(&self, operation: StoreOperation) {
        self.operations.lock().unwrap().push(operation);
    }

    fn check_available(&self, operation: &str) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RegistryError::StoreUnavailable(format!(
                "{operation}: in-memory store marked unavailable"
            )));
        }
        Ok(())
    }
}

impl Default for InMemoryTicketStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryTicketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTicketStore")
            .field("records", &self.records.read().unwrap().len())
            .field("unavailable", &self.unavailable.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl TicketStore for InMemoryTicketStore {
    async fn get(&self, id: &TicketId, consistency: ConsistencyLevel) -> Result<Option<TicketRecord>> {
        self.record(StoreOperation::Get {
            id: id.clone(),
            consistency,
        });
        self.check_available("get")?;

        Ok(self
            .raw(id)
            .map(|data| TicketRecord::new(id.clone(), data)))
    }

    async fn put(
        &self,
        record: TicketRecord,
        ttl: RecordTtl,
        consistency: ConsistencyLevel,
    ) -> Result<()> {
        self.record(StoreOperation::Put {
            id: record.id.clone(),
            ttl,
            consistency,
        });
        self.check_available("put")?;

        self.insert_raw(record, ttl);
        Ok(())
    }

    async fn delete(&self, id: &TicketId, consistency: ConsistencyLevel) -> Result<()> {
        self.record(StoreOperation::Delete {
            id: id.clone(),
            consistency,
        });
        self.check_available("delete")?;

        self.records.write().unwrap().remove(id);
        Ok(())
    }

    fn scan_all(&self, consistency: ConsistencyLevel) -> BoxStream<'_, Result<TicketRecord>> {
        self.record(StoreOperation::Scan { consistency });
        if let Err(error) = self.check_available("scan") {
            return stream::once(async move { Err(error) }).boxed();
        }

        let now = self.clock.now();
        let mut snapshot: Vec<Result<TicketRecord>> = self
            .records
            .read()
            .unwrap()
            .iter()
            .filter(|(_, stored)| stored.is_live(now))
            .map(|(id, stored)| Ok(TicketRecord::new(id.clone(), stored.data.clone())))
            .collect();

        if let Some(limit) = *self.scan_failure_after.lock().unwrap() {
            snapshot.truncate(limit);
            snapshot.push(Err(RegistryError::StoreUnavailable(
                "scan: replica dropped mid-scan".to_string(),
            )));
        }

        stream::iter(snapshot).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use futures::TryStreamExt;

    fn record(id: &str) -> TicketRecord {
        TicketRecord::new(TicketId::new(id), b"payload".to_vec())
    }

    #[tokio::test]
    async fn records_lapse_when_clock_passes_ttl() {
        let clock = Arc::new(ManualClock::default());
        let store = InMemoryTicketStore::with_clock(clock.clone());
        let ttl = RecordTtl::from_seconds(&TicketId::new("ST-1"), 30).unwrap();

        store.put(record("ST-1"), ttl, ConsistencyLevel::One).await.unwrap();
        clock.advance(TimeDelta::seconds(29));
        assert!(store.get(&TicketId::new("ST-1"), ConsistencyLevel::One).await.unwrap().is_some());

        clock.advance(TimeDelta::seconds(1));
        assert!(store.get(&TicketId::new("ST-1"), ConsistencyLevel::One).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn zero_ttl_never_lapses() {
        let clock = Arc::new(ManualClock::default());
        let store = InMemoryTicketStore::with_clock(clock.clone());

        store.put(record("TGT-1"), RecordTtl::NONE, ConsistencyLevel::One).await.unwrap();
        clock.advance(TimeDelta::days(3650));

        assert_eq!(store.len(), 1);
        assert!(store.expires_at(&TicketId::new("TGT-1")).is_none());
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = InMemoryTicketStore::new();
        store.set_unavailable(true);

        let error = store.delete(&TicketId::new("ST-1"), ConsistencyLevel::All).await.unwrap_err();
        assert!(error.is_retryable());

        let scanned: Result<Vec<_>> = store.scan_all(ConsistencyLevel::One).try_collect().await;
        assert!(scanned.is_err());
    }

    #[tokio::test]
    async fn scan_failure_is_yielded_after_limit() {
        let store = InMemoryTicketStore::new();
        store.insert_raw(record("ST-1"), RecordTtl::NONE);
        store.insert_raw(record("ST-2"), RecordTtl::NONE);
        store.fail_scan_after(Some(1));

        let items: Vec<_> = store.scan_all(ConsistencyLevel::One).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn operations_capture_consistency() {
        let store = InMemoryTicketStore::new();
        store.get(&TicketId::new("ST-1"), ConsistencyLevel::Quorum).await.unwrap();

        assert_eq!(
            store.operations(),
            vec![StoreOperation::Get {
                id: TicketId::new("ST-1"),
                consistency: ConsistencyLevel::Quorum,
            }]
        );
    }
}
