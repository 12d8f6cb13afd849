//! # Ticket Registry Core
//!
//! Type-directed, TTL-aware persistence for heterogeneous authentication
//! tickets.
//!
//! Tickets of different kinds (ticket-granting, service, proxy, ...) have
//! different payload shapes but are stored through one interface keyed by an
//! opaque string id. On every read and write the id's kind tag is resolved
//! through a [`TicketCatalog`], the resolved kind drives the [`TicketCodec`],
//! and the ticket's own [`ExpirationPolicy`] becomes the record's native TTL in
//! the [`TicketStore`].
//!
//! ## Components
//!
//! - [`TicketCatalog`]: kind tag → [`TicketDefinition`]
//! - [`TicketCodec`]: typed ticket ⇄ opaque payload
//! - [`TicketStore`]: keyed store with per-record TTL and tunable consistency
//! - [`TicketRegistry`]: the CRUD surface composing the three
//!
//! ## Example
//!
//! ```ignore
//! use ticket_registry_core::*;
//!
//! let registry = TicketRegistry::new(store, DefaultTicketCatalog::with_defaults())
//!     .with_config(RegistryConfig::new().with_write_consistency(ConsistencyLevel::Quorum));
//!
//! registry.add_ticket(&ticket).await?;
//! let tgt: Option<TicketGrantingTicket> = registry.get_ticket_as(ticket.id()).await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod catalog;
pub mod codec;
pub mod config;
pub mod consistency;
pub mod environment;
pub mod error;
pub mod expiration;
pub mod id;
pub mod record;
pub mod registry;
pub mod store;
pub mod ticket;

pub use catalog::{DefaultTicketCatalog, TicketCatalog, TicketDefinition};
pub use codec::{BincodeTicketCodec, CodecError, JsonTicketCodec, TicketCodec};
pub use config::RegistryConfig;
pub use consistency::ConsistencyLevel;
pub use error::{RegistryError, Result};
pub use expiration::ExpirationPolicy;
pub use id::{TicketId, TicketIdGenerator};
pub use record::{RecordTtl, TicketRecord};
pub use registry::TicketRegistry;
pub use store::TicketStore;
pub use ticket::{
    ProxyGrantingTicket, ProxyTicket, ServiceTicket, Ticket, TicketGrantingTicket, TicketKind,
    TicketState, TransientSessionTicket,
};
