//! # Ticket Registry Redis
//!
//! Redis implementation of [`TicketStore`](ticket_registry_core::TicketStore).
//!
//! Tickets are plain string keys with native `EX` expiry, so Redis evicts a
//! ticket once its policy's time-to-idle elapses. Write consistency maps onto
//! `WAIT` against the configured replica count.
//!
//! # Example
//!
//! ```no_run
//! use ticket_registry_core::{DefaultTicketCatalog, TicketRegistry};
//! use ticket_registry_redis::{RedisStoreConfig, RedisTicketStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisTicketStore::new(RedisStoreConfig::from_env()?).await?;
//! let registry = TicketRegistry::new(store, DefaultTicketCatalog::with_defaults());
//! let sessions = registry.session_count().await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod store;

pub use config::RedisStoreConfig;
pub use store::RedisTicketStore;
