//! Redis-backed ticket store.
//!
//! # Architecture
//!
//! Each ticket is one string key:
//! - **Key**: `{key_prefix}{ticket_id}` → codec payload
//! - **TTL**: `SET ... EX {seconds}`; a zero TTL writes a key with no expiry
//! - **Scan**: `SCAN MATCH {key_prefix}* COUNT {scan_count}` batches, values
//!   fetched with `MGET`; glob characters in the prefix are escaped
//!
//! # Consistency
//!
//! Levels are evaluated against `replicas + 1` nodes. After a write or delete
//! the store issues `WAIT` for the number of replica acknowledgements the
//! level needs beyond the primary; a shortfall within the timeout is reported
//! as `StoreUnavailable` (the write itself is not rolled back). Reads are
//! served by the primary, which holds every acknowledged write, so the read
//! level is only checked for satisfiability.

use crate::config::RedisStoreConfig;
use futures::stream::BoxStream;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use std::collections::HashSet;
use ticket_registry_core::{
    ConsistencyLevel, RecordTtl, RegistryError, Result, TicketId, TicketRecord, TicketStore,
};

/// [`TicketStore`] over a Redis primary and its replicas.
#[derive(Clone)]
pub struct RedisTicketStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
    config: RedisStoreConfig,
}

impl RedisTicketStore {
    /// Connect using `config`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration is rejected, or
    /// `StoreUnavailable` if the connection cannot be established.
    pub async fn new(config: RedisStoreConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::open(config.url.as_str())
            .map_err(|e| unavailable("connect", &e))?;
        let conn_manager = ConnectionManager::new(client)
            .await
            .map_err(|e| unavailable("connect", &e))?;

        tracing::info!(
            key_prefix = %config.key_prefix,
            replicas = config.replicas,
            "Connected Redis ticket store"
        );

        Ok(Self {
            conn_manager,
            config,
        })
    }

    /// Connect to `url` with default settings.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub async fn connect(url: &str) -> Result<Self> {
        Self::new(RedisStoreConfig::new(url)).await
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &RedisStoreConfig {
        &self.config
    }

    fn key(&self, id: &TicketId) -> String {
        record_key(&self.config.key_prefix, id)
    }

    /// Block until enough replicas acknowledge this connection's writes.
    async fn await_replication(
        &self,
        conn: &mut ConnectionManager,
        consistency: ConsistencyLevel,
        operation: &str,
    ) -> Result<()> {
        let required = required_replicas(consistency, self.config.replicas)?;
        if required == 0 {
            return Ok(());
        }

        let acknowledged: usize = redis::cmd("WAIT")
            .arg(required)
            .arg(self.config.wait_timeout_ms)
            .query_async(conn)
            .await
            .map_err(|e| unavailable(operation, &e))?;

        if acknowledged < required {
            tracing::warn!(
                operation,
                consistency = %consistency,
                required,
                acknowledged,
                "Replication shortfall"
            );
            return Err(RegistryError::StoreUnavailable(format!(
                "{operation}: {consistency} needs {required} replica acknowledgements, got {acknowledged}"
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for RedisTicketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisTicketStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TicketStore for RedisTicketStore {
    async fn get(&self, id: &TicketId, consistency: ConsistencyLevel) -> Result<Option<TicketRecord>> {
        required_replicas(consistency, self.config.replicas)?;
        let mut conn = self.conn_manager.clone();

        let data: Option<Vec<u8>> = conn
            .get(self.key(id))
            .await
            .map_err(|e| unavailable("get", &e))?;

        tracing::trace!(ticket_id = %id, consistency = %consistency, found = data.is_some(), "Redis GET");
        Ok(data.map(|data| TicketRecord::new(id.clone(), data)))
    }

    async fn put(
        &self,
        record: TicketRecord,
        ttl: RecordTtl,
        consistency: ConsistencyLevel,
    ) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let key = self.key(&record.id);

        if ttl.expires() {
            let _: () = conn
                .set_ex(&key, record.data, u64::from(ttl.as_secs()))
                .await
                .map_err(|e| unavailable("put", &e))?;
        } else {
            let _: () = conn
                .set(&key, record.data)
                .await
                .map_err(|e| unavailable("put", &e))?;
        }

        self.await_replication(&mut conn, consistency, "put").await?;

        tracing::trace!(
            ticket_id = %record.id,
            ttl_seconds = ttl.as_secs(),
            consistency = %consistency,
            "Redis SET"
        );
        Ok(())
    }

    async fn delete(&self, id: &TicketId, consistency: ConsistencyLevel) -> Result<()> {
        let mut conn = self.conn_manager.clone();

        let removed: usize = conn
            .del(self.key(id))
            .await
            .map_err(|e| unavailable("delete", &e))?;

        self.await_replication(&mut conn, consistency, "delete").await?;

        tracing::trace!(ticket_id = %id, removed, consistency = %consistency, "Redis DEL");
        Ok(())
    }

    fn scan_all(&self, consistency: ConsistencyLevel) -> BoxStream<'_, Result<TicketRecord>> {
        let mut conn = self.conn_manager.clone();
        let prefix = self.config.key_prefix.clone();
        let pattern = scan_pattern(&prefix);
        let count = self.config.scan_count;
        let replicas = self.config.replicas;

        let stream = async_stream::try_stream! {
            required_replicas(consistency, replicas)?;

            // SCAN may return a key more than once across batches.
            let mut seen = HashSet::new();
            let mut cursor: u64 = 0;
            loop {
                let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(count)
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| unavailable("scan", &e))?;

                let keys: Vec<String> = keys.into_iter().filter(|key| seen.insert(key.clone())).collect();
                if !keys.is_empty() {
                    let values: Vec<Option<Vec<u8>>> = redis::cmd("MGET")
                        .arg(&keys)
                        .query_async(&mut conn)
                        .await
                        .map_err(|e| unavailable("scan", &e))?;

                    for (key, value) in keys.into_iter().zip(values) {
                        let Some(id) = id_from_key(&prefix, &key) else {
                            continue;
                        };
                        match value {
                            Some(data) => yield TicketRecord::new(id, data),
                            None => tracing::warn!(ticket_id = %id, "Ticket vanished between SCAN and MGET"),
                        }
                    }
                }

                if next == 0 {
                    break;
                }
                cursor = next;
            }
        };

        Box::pin(stream)
    }
}

fn record_key(prefix: &str, id: &TicketId) -> String {
    format!("{prefix}{id}")
}

/// `SCAN MATCH` pattern for every key under `prefix`, with glob
/// metacharacters in the prefix matched literally.
fn scan_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

fn id_from_key(prefix: &str, key: &str) -> Option<TicketId> {
    key.strip_prefix(prefix).map(TicketId::from)
}

/// Replica acknowledgements `consistency` needs beyond the primary.
fn required_replicas(consistency: ConsistencyLevel, replicas: usize) -> Result<usize> {
    let nodes = replicas.saturating_add(1);
    let acks = consistency.required_acks(nodes);
    if acks > nodes {
        return Err(RegistryError::StoreUnavailable(format!(
            "{consistency} needs {acks} nodes but only {nodes} are configured"
        )));
    }
    Ok(acks.saturating_sub(1))
}

fn unavailable(operation: &str, error: &RedisError) -> RegistryError {
    RegistryError::StoreUnavailable(format!("{operation}: {error}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip() {
        let id = TicketId::new("TGT-1-abc");
        let key = record_key("cas:ticket:", &id);

        assert_eq!(key, "cas:ticket:TGT-1-abc");
        assert_eq!(id_from_key("cas:ticket:", &key), Some(id));
    }

    #[test]
    fn test_scan_pattern_appends_wildcard() {
        assert_eq!(scan_pattern("cas:ticket:"), "cas:ticket:*");
    }

    #[test]
    fn test_scan_pattern_escapes_glob_metacharacters() {
        assert_eq!(scan_pattern("tenant[1]:"), r"tenant\[1\]:*");
        assert_eq!(scan_pattern("a*b?c"), r"a\*b\?c*");
        assert_eq!(scan_pattern(r"x\y:"), r"x\\y:*");
    }

    #[test]
    fn test_foreign_key_is_ignored() {
        assert_eq!(id_from_key("cas:ticket:", "session:42"), None);
    }

    #[test]
    fn test_single_node_satisfies_one_quorum_and_all() {
        for level in [
            ConsistencyLevel::Any,
            ConsistencyLevel::One,
            ConsistencyLevel::LocalOne,
            ConsistencyLevel::Quorum,
            ConsistencyLevel::All,
        ] {
            assert_eq!(required_replicas(level, 0).unwrap(), 0, "{level}");
        }
    }

    #[test]
    fn test_replicas_needed_with_two_replicas() {
        assert_eq!(required_replicas(ConsistencyLevel::One, 2).unwrap(), 0);
        assert_eq!(required_replicas(ConsistencyLevel::Two, 2).unwrap(), 1);
        assert_eq!(required_replicas(ConsistencyLevel::Quorum, 2).unwrap(), 1);
        assert_eq!(required_replicas(ConsistencyLevel::LocalQuorum, 2).unwrap(), 1);
        assert_eq!(required_replicas(ConsistencyLevel::Three, 2).unwrap(), 2);
        assert_eq!(required_replicas(ConsistencyLevel::All, 2).unwrap(), 2);
    }

    #[test]
    fn test_huge_replica_count_does_not_overflow() {
        assert_eq!(required_replicas(ConsistencyLevel::One, usize::MAX).unwrap(), 0);
        assert_eq!(required_replicas(ConsistencyLevel::Two, usize::MAX).unwrap(), 1);
    }

    #[test]
    fn test_unsatisfiable_level_is_unavailable() {
        let error = required_replicas(ConsistencyLevel::Three, 1).unwrap_err();
        assert!(error.is_retryable());
    }
}
