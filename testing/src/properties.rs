//! Property-based testing utilities using proptest.
//!
//! Strategies generate tickets of every kind with identifiers whose kind tag
//! matches the default catalog, so generated tickets can go straight through
//! a registry built on [`DefaultTicketCatalog::with_defaults`](ticket_registry_core::DefaultTicketCatalog::with_defaults).

use chrono::{DateTime, Utc};
use proptest::collection::{btree_map, btree_set, vec};
use proptest::prelude::*;
use std::time::Duration;
use ticket_registry_core::{
    ExpirationPolicy, ProxyGrantingTicket, ProxyTicket, ServiceTicket, Ticket,
    TicketGrantingTicket, TicketId, TicketKind, TicketState, TransientSessionTicket,
};

/// Timestamps between 2020 and 2033, whole seconds.
pub fn arb_time() -> impl Strategy<Value = DateTime<Utc>> {
    (1_600_000_000_i64..2_000_000_000).prop_map(|secs| {
        DateTime::from_timestamp(secs, 0).unwrap_or_default()
    })
}

/// Durations up to ~28h with sub-second parts.
pub fn arb_duration() -> impl Strategy<Value = Duration> {
    (0_u64..100_000, 0_u32..1_000_000_000).prop_map(|(secs, nanos)| Duration::new(secs, nanos))
}

/// Any expiration policy.
pub fn arb_policy() -> impl Strategy<Value = ExpirationPolicy> {
    prop_oneof![
        arb_duration().prop_map(ExpirationPolicy::timeout),
        arb_duration().prop_map(ExpirationPolicy::hard_timeout),
        (1_u32..10, arb_duration())
            .prop_map(|(uses, ttk)| ExpirationPolicy::multi_time_use(uses, ttk)),
        (arb_duration(), arb_duration())
            .prop_map(|(ttl, ttk)| ExpirationPolicy::ticket_granting(ttl, ttk)),
        Just(ExpirationPolicy::NeverExpires),
    ]
}

/// Ticket state created at some time and used a few times since.
pub fn arb_state() -> impl Strategy<Value = TicketState> {
    (arb_time(), 0_u32..4, 1_i64..3_600).prop_map(|(created, uses, gap)| {
        let mut state = TicketState::new(created);
        for n in 1..=i64::from(uses) {
            state.mark_used(created + chrono::TimeDelta::seconds(gap * n));
        }
        state
    })
}

/// Identifier for `kind` under its default prefix.
pub fn arb_id(kind: TicketKind) -> impl Strategy<Value = TicketId> {
    (1_u32..10_000, "[A-Za-z0-9]{8,32}").prop_map(move |(n, random)| {
        TicketId::new(format!("{}-{n}-{random}", kind.default_prefix()))
    })
}

fn arb_text() -> impl Strategy<Value = String> {
    "\\PC{0,24}"
}

fn arb_ticket_granting() -> impl Strategy<Value = Ticket> {
    (
        arb_id(TicketKind::TicketGranting),
        arb_text(),
        btree_map(arb_text(), vec(arb_text(), 0..3), 0..4),
        btree_map(arb_id(TicketKind::Service), arb_text(), 0..4),
        btree_set(arb_id(TicketKind::ProxyGranting), 0..3),
        proptest::option::of(arb_text()),
        arb_state(),
        arb_policy(),
    )
        .prop_map(
            |(id, principal, attributes, services, pgts, proxied_by, state, policy)| {
                Ticket::TicketGranting(TicketGrantingTicket {
                    id,
                    principal,
                    attributes,
                    services,
                    proxy_granting_tickets: pgts,
                    proxied_by,
                    state,
                    expiration_policy: policy,
                })
            },
        )
}

fn arb_service() -> impl Strategy<Value = Ticket> {
    (
        arb_id(TicketKind::Service),
        arb_id(TicketKind::TicketGranting),
        arb_text(),
        any::<bool>(),
        arb_state(),
        arb_policy(),
    )
        .prop_map(|(id, tgt, service, from_new_login, state, policy)| {
            Ticket::Service(ServiceTicket {
                id,
                ticket_granting_ticket: tgt,
                service,
                from_new_login,
                state,
                expiration_policy: policy,
            })
        })
}

fn arb_proxy_granting() -> impl Strategy<Value = Ticket> {
    (
        arb_id(TicketKind::ProxyGranting),
        arb_id(TicketKind::TicketGranting),
        arb_text(),
        arb_text(),
        btree_set(arb_id(TicketKind::Proxy), 0..3),
        arb_state(),
        arb_policy(),
    )
        .prop_map(|(id, tgt, proxied_by, principal, proxy_tickets, state, policy)| {
            Ticket::ProxyGranting(ProxyGrantingTicket {
                id,
                ticket_granting_ticket: tgt,
                proxied_by,
                principal,
                proxy_tickets,
                state,
                expiration_policy: policy,
            })
        })
}

fn arb_proxy() -> impl Strategy<Value = Ticket> {
    (
        arb_id(TicketKind::Proxy),
        arb_id(TicketKind::ProxyGranting),
        arb_text(),
        arb_state(),
        arb_policy(),
    )
        .prop_map(|(id, pgt, service, state, policy)| {
            Ticket::Proxy(ProxyTicket {
                id,
                proxy_granting_ticket: pgt,
                service,
                state,
                expiration_policy: policy,
            })
        })
}

fn arb_transient_session() -> impl Strategy<Value = Ticket> {
    (
        arb_id(TicketKind::TransientSession),
        proptest::option::of(arb_text()),
        btree_map(arb_text(), arb_text(), 0..4),
        arb_state(),
        arb_policy(),
    )
        .prop_map(|(id, service, properties, state, policy)| {
            Ticket::TransientSession(TransientSessionTicket {
                id,
                service,
                properties,
                state,
                expiration_policy: policy,
            })
        })
}

/// A ticket of any kind.
pub fn arb_ticket() -> impl Strategy<Value = Ticket> {
    prop_oneof![
        arb_ticket_granting(),
        arb_service(),
        arb_proxy_granting(),
        arb_proxy(),
        arb_transient_session(),
    ]
}
