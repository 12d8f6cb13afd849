//! Ticket fixtures.
//!
//! Each builder returns a [`Ticket`] whose expiration policy matches the
//! catalog defaults for its kind, except where the name says otherwise.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use ticket_registry_core::{
    ExpirationPolicy, ProxyGrantingTicket, ProxyTicket, ServiceTicket, Ticket,
    TicketGrantingTicket, TicketId, TicketState, TransientSessionTicket,
};

/// Service URL used by fixtures.
pub const SERVICE: &str = "https://app.example.com/login";

/// Principal used by fixtures.
pub const PRINCIPAL: &str = "casuser";

/// Ticket-granting ticket for [`PRINCIPAL`] with an 8h/2h policy.
#[must_use]
pub fn ticket_granting_ticket(id: &str, now: DateTime<Utc>) -> Ticket {
    let mut tgt = TicketGrantingTicket::new(
        TicketId::new(id),
        PRINCIPAL,
        ExpirationPolicy::ticket_granting(Duration::from_secs(28_800), Duration::from_secs(7_200)),
        now,
    );
    tgt.attributes.insert(
        "memberOf".to_string(),
        vec!["staff".to_string(), "faculty".to_string()],
    );
    Ticket::TicketGranting(tgt)
}

/// Ticket-granting ticket that has issued the given service tickets and
/// proxy-granting tickets.
#[must_use]
pub fn session_with_descendants(
    id: &str,
    service_tickets: &[&str],
    proxy_granting_tickets: &[&str],
    now: DateTime<Utc>,
) -> Ticket {
    let Ticket::TicketGranting(mut tgt) = ticket_granting_ticket(id, now) else {
        unreachable!("ticket_granting_ticket builds a ticket-granting ticket");
    };
    for st in service_tickets {
        tgt.grant_service(TicketId::new(*st), SERVICE, now);
    }
    tgt.proxy_granting_tickets
        .extend(proxy_granting_tickets.iter().map(|pgt| TicketId::new(*pgt)));
    Ticket::TicketGranting(tgt)
}

/// Single-use service ticket granted from `tgt`.
#[must_use]
pub fn service_ticket(id: &str, tgt: &str, now: DateTime<Utc>) -> Ticket {
    Ticket::Service(ServiceTicket {
        id: TicketId::new(id),
        ticket_granting_ticket: TicketId::new(tgt),
        service: SERVICE.to_string(),
        from_new_login: true,
        state: TicketState::new(now),
        expiration_policy: ExpirationPolicy::multi_time_use(1, Duration::from_secs(10)),
    })
}

/// Service ticket with a sliding idle timeout of `idle`.
#[must_use]
pub fn service_ticket_with_idle(id: &str, tgt: &str, idle: Duration, now: DateTime<Utc>) -> Ticket {
    let Ticket::Service(mut st) = service_ticket(id, tgt, now) else {
        unreachable!("service_ticket builds a service ticket");
    };
    st.expiration_policy = ExpirationPolicy::timeout(idle);
    Ticket::Service(st)
}

/// Proxy-granting ticket hanging off `tgt` with the given proxy tickets.
#[must_use]
pub fn proxy_granting_ticket(
    id: &str,
    tgt: &str,
    proxy_tickets: &[&str],
    now: DateTime<Utc>,
) -> Ticket {
    Ticket::ProxyGranting(ProxyGrantingTicket {
        id: TicketId::new(id),
        ticket_granting_ticket: TicketId::new(tgt),
        proxied_by: "https://proxy.example.com/callback".to_string(),
        principal: PRINCIPAL.to_string(),
        proxy_tickets: proxy_tickets.iter().map(|pt| TicketId::new(*pt)).collect(),
        state: TicketState::new(now),
        expiration_policy: ExpirationPolicy::ticket_granting(
            Duration::from_secs(28_800),
            Duration::from_secs(7_200),
        ),
    })
}

/// Single-use proxy ticket issued from `pgt`.
#[must_use]
pub fn proxy_ticket(id: &str, pgt: &str, now: DateTime<Utc>) -> Ticket {
    Ticket::Proxy(ProxyTicket {
        id: TicketId::new(id),
        proxy_granting_ticket: TicketId::new(pgt),
        service: "https://backend.example.com/api".to_string(),
        state: TicketState::new(now),
        expiration_policy: ExpirationPolicy::multi_time_use(1, Duration::from_secs(10)),
    })
}

/// Five-minute transient session ticket carrying `properties`.
#[must_use]
pub fn transient_session_ticket(
    id: &str,
    properties: &[(&str, &str)],
    now: DateTime<Utc>,
) -> Ticket {
    Ticket::TransientSession(TransientSessionTicket {
        id: TicketId::new(id),
        service: Some(SERVICE.to_string()),
        properties: properties
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect::<BTreeMap<_, _>>(),
        state: TicketState::new(now),
        expiration_policy: ExpirationPolicy::hard_timeout(Duration::from_secs(300)),
    })
}

/// Collect ids into a set for order-insensitive assertions.
#[must_use]
pub fn id_set(ids: &[&str]) -> BTreeSet<TicketId> {
    ids.iter().map(|id| TicketId::new(*id)).collect()
}
