//! Ticket model.
//!
//! Each ticket kind has its own concrete struct with its own payload shape.
//! [`Ticket`] is the closed sum of those structs; the registry deals in
//! `Ticket` while persisted payloads only ever contain the inner struct.

use crate::error::RegistryError;
use crate::expiration::ExpirationPolicy;
use crate::id::TicketId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Finite set of ticket kinds the registry can store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketKind {
    /// Single sign-on session ticket.
    TicketGranting,

    /// One-time ticket issued to a service.
    Service,

    /// Proxy-granting ticket issued to a proxying service.
    ProxyGranting,

    /// Ticket issued through a proxy-granting ticket.
    Proxy,

    /// Short-lived ticket carrying transient session properties.
    TransientSession,
}

impl TicketKind {
    /// Every kind, in catalog registration order.
    pub const ALL: [Self; 5] = [
        Self::TicketGranting,
        Self::Service,
        Self::ProxyGranting,
        Self::Proxy,
        Self::TransientSession,
    ];

    /// Conventional identifier prefix for this kind.
    #[must_use]
    pub const fn default_prefix(self) -> &'static str {
        match self {
            Self::TicketGranting => "TGT",
            Self::Service => "ST",
            Self::ProxyGranting => "PGT",
            Self::Proxy => "PT",
            Self::TransientSession => "TST",
        }
    }

    /// Name of the concrete type payloads of this kind decode into.
    #[must_use]
    pub const fn implementation_type(self) -> &'static str {
        match self {
            Self::TicketGranting => "TicketGrantingTicket",
            Self::Service => "ServiceTicket",
            Self::ProxyGranting => "ProxyGrantingTicket",
            Self::Proxy => "ProxyTicket",
            Self::TransientSession => "TransientSessionTicket",
        }
    }

    /// Metric/log label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TicketGranting => "ticket_granting",
            Self::Service => "service",
            Self::ProxyGranting => "proxy_granting",
            Self::Proxy => "proxy",
            Self::TransientSession => "transient_session",
        }
    }
}

impl fmt::Display for TicketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.implementation_type())
    }
}

/// Usage bookkeeping shared by every ticket kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketState {
    /// When the ticket was issued.
    pub creation_time: DateTime<Utc>,

    /// Most recent use (equals `creation_time` until first use).
    pub last_time_used: DateTime<Utc>,

    /// Use before the most recent one.
    pub previous_time_used: Option<DateTime<Utc>>,

    /// Number of times the ticket has been used.
    pub count_of_uses: u32,
}

impl TicketState {
    /// Fresh, unused state.
    #[must_use]
    pub const fn new(creation_time: DateTime<Utc>) -> Self {
        Self {
            creation_time,
            last_time_used: creation_time,
            previous_time_used: None,
            count_of_uses: 0,
        }
    }

    /// Record a use at `now`.
    pub fn mark_used(&mut self, now: DateTime<Utc>) {
        self.previous_time_used = Some(self.last_time_used);
        self.last_time_used = now;
        self.count_of_uses = self.count_of_uses.saturating_add(1);
    }
}

/// Single sign-on session ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketGrantingTicket {
    /// Ticket identifier.
    pub id: TicketId,

    /// Authenticated principal.
    pub principal: String,

    /// Principal attributes released at authentication time.
    pub attributes: BTreeMap<String, Vec<String>>,

    /// Service tickets granted from this session, by ticket id → service.
    pub services: BTreeMap<TicketId, String>,

    /// Proxy-granting tickets descending from this session.
    pub proxy_granting_tickets: BTreeSet<TicketId>,

    /// Set when this session was itself established through a proxy.
    pub proxied_by: Option<String>,

    /// Usage bookkeeping.
    pub state: TicketState,

    /// Expiration policy.
    pub expiration_policy: ExpirationPolicy,
}

impl TicketGrantingTicket {
    /// New session for `principal`.
    #[must_use]
    pub fn new(
        id: TicketId,
        principal: impl Into<String>,
        expiration_policy: ExpirationPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            principal: principal.into(),
            attributes: BTreeMap::new(),
            services: BTreeMap::new(),
            proxy_granting_tickets: BTreeSet::new(),
            proxied_by: None,
            state: TicketState::new(now),
            expiration_policy,
        }
    }

    /// Record a service ticket granted from this session.
    ///
    /// The session itself counts as used.
    pub fn grant_service(
        &mut self,
        service_ticket_id: TicketId,
        service: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.services.insert(service_ticket_id, service.into());
        self.state.mark_used(now);
    }

    /// Ids of every ticket that must go when this session goes.
    pub fn descendant_ids(&self) -> impl Iterator<Item = &TicketId> {
        self.services.keys().chain(self.proxy_granting_tickets.iter())
    }
}

/// One-time ticket issued to a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTicket {
    /// Ticket identifier.
    pub id: TicketId,

    /// Session this ticket was granted from.
    pub ticket_granting_ticket: TicketId,

    /// Service the ticket was issued for.
    pub service: String,

    /// Whether the ticket was issued straight after a primary login.
    pub from_new_login: bool,

    /// Usage bookkeeping.
    pub state: TicketState,

    /// Expiration policy.
    pub expiration_policy: ExpirationPolicy,
}

/// Proxy-granting ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyGrantingTicket {
    /// Ticket identifier.
    pub id: TicketId,

    /// Session this proxy chain hangs off.
    pub ticket_granting_ticket: TicketId,

    /// Callback of the service acting as proxy.
    pub proxied_by: String,

    /// Principal the proxy acts for.
    pub principal: String,

    /// Proxy tickets issued from this ticket.
    pub proxy_tickets: BTreeSet<TicketId>,

    /// Usage bookkeeping.
    pub state: TicketState,

    /// Expiration policy.
    pub expiration_policy: ExpirationPolicy,
}

/// Ticket issued through a proxy-granting ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyTicket {
    /// Ticket identifier.
    pub id: TicketId,

    /// Issuing proxy-granting ticket.
    pub proxy_granting_ticket: TicketId,

    /// Target service.
    pub service: String,

    /// Usage bookkeeping.
    pub state: TicketState,

    /// Expiration policy.
    pub expiration_policy: ExpirationPolicy,
}

/// Short-lived ticket carrying transient session properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransientSessionTicket {
    /// Ticket identifier.
    pub id: TicketId,

    /// Service the properties belong to, if any.
    pub service: Option<String>,

    /// Opaque properties.
    pub properties: BTreeMap<String, String>,

    /// Usage bookkeeping.
    pub state: TicketState,

    /// Expiration policy.
    pub expiration_policy: ExpirationPolicy,
}

/// A typed ticket of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ticket {
    /// Ticket-granting ticket.
    TicketGranting(TicketGrantingTicket),
    /// Service ticket.
    Service(ServiceTicket),
    /// Proxy-granting ticket.
    ProxyGranting(ProxyGrantingTicket),
    /// Proxy ticket.
    Proxy(ProxyTicket),
    /// Transient session ticket.
    TransientSession(TransientSessionTicket),
}

macro_rules! each_variant {
    ($ticket:expr, $inner:ident => $body:expr) => {
        match $ticket {
            Ticket::TicketGranting($inner) => $body,
            Ticket::Service($inner) => $body,
            Ticket::ProxyGranting($inner) => $body,
            Ticket::Proxy($inner) => $body,
            Ticket::TransientSession($inner) => $body,
        }
    };
}

impl Ticket {
    /// Ticket identifier.
    #[must_use]
    pub fn id(&self) -> &TicketId {
        each_variant!(self, t => &t.id)
    }

    /// Concrete kind of this ticket.
    #[must_use]
    pub const fn kind(&self) -> TicketKind {
        match self {
            Self::TicketGranting(_) => TicketKind::TicketGranting,
            Self::Service(_) => TicketKind::Service,
            Self::ProxyGranting(_) => TicketKind::ProxyGranting,
            Self::Proxy(_) => TicketKind::Proxy,
            Self::TransientSession(_) => TicketKind::TransientSession,
        }
    }

    /// Usage bookkeeping.
    #[must_use]
    pub fn state(&self) -> &TicketState {
        each_variant!(self, t => &t.state)
    }

    /// Mutable usage bookkeeping.
    pub fn state_mut(&mut self) -> &mut TicketState {
        each_variant!(self, t => &mut t.state)
    }

    /// Expiration policy attached to this instance.
    #[must_use]
    pub fn expiration_policy(&self) -> &ExpirationPolicy {
        each_variant!(self, t => &t.expiration_policy)
    }

    /// Whether the ticket is expired at `now` under its own policy.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_policy().is_expired(self.state(), now)
    }
}

macro_rules! ticket_conversions {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Ticket {
                fn from(ticket: $ty) -> Self {
                    Self::$variant(ticket)
                }
            }

            impl TryFrom<Ticket> for $ty {
                type Error = RegistryError;

                fn try_from(ticket: Ticket) -> Result<Self, Self::Error> {
                    match ticket {
                        Ticket::$variant(inner) => Ok(inner),
                        other => Err(RegistryError::KindMismatch {
                            id: other.id().to_string(),
                            expected: TicketKind::$variant,
                            actual: other.kind(),
                        }),
                    }
                }
            }
        )*
    };
}

ticket_conversions! {
    TicketGranting => TicketGrantingTicket,
    Service => ServiceTicket,
    ProxyGranting => ProxyGrantingTicket,
    Proxy => ProxyTicket,
    TransientSession => TransientSessionTicket,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn session() -> TicketGrantingTicket {
        TicketGrantingTicket::new(
            TicketId::new("TGT-1-abc"),
            "casuser",
            ExpirationPolicy::timeout(Duration::from_secs(300)),
            Utc::now(),
        )
    }

    #[test]
    fn default_prefixes_are_distinct() {
        let prefixes: BTreeSet<_> = TicketKind::ALL.iter().map(|k| k.default_prefix()).collect();
        assert_eq!(prefixes.len(), TicketKind::ALL.len());
    }

    #[test]
    fn grant_service_tracks_descendant_and_use() {
        let mut tgt = session();
        tgt.grant_service(TicketId::new("ST-1-x"), "https://app.example.com", Utc::now());
        tgt.proxy_granting_tickets.insert(TicketId::new("PGT-1-y"));

        let descendants: Vec<_> = tgt.descendant_ids().map(TicketId::as_str).collect();
        assert_eq!(descendants, vec!["ST-1-x", "PGT-1-y"]);
        assert_eq!(tgt.state.count_of_uses, 1);
    }

    #[test]
    fn try_from_rejects_other_kinds() {
        let ticket = Ticket::from(session());
        let error = ServiceTicket::try_from(ticket.clone()).unwrap_err();
        assert_eq!(
            error,
            RegistryError::KindMismatch {
                id: "TGT-1-abc".to_string(),
                expected: TicketKind::Service,
                actual: TicketKind::TicketGranting,
            }
        );

        let tgt = TicketGrantingTicket::try_from(ticket).unwrap();
        assert_eq!(tgt.principal, "casuser");
    }

    #[test]
    fn accessors_reach_inner_fields() {
        let mut ticket = Ticket::from(session());
        assert_eq!(ticket.id().as_str(), "TGT-1-abc");
        assert_eq!(ticket.kind(), TicketKind::TicketGranting);
        assert_eq!(ticket.expiration_policy().name(), "timeout");

        ticket.state_mut().mark_used(Utc::now());
        assert_eq!(ticket.state().count_of_uses, 1);
    }
}
