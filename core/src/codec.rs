//! Ticket payload codecs.
//!
//! A payload holds only the concrete ticket struct. Nothing in it says which
//! kind it is: the reader supplies the kind resolved from the catalog, and the
//! codec decodes into that kind's struct.
//!
//! Two codecs are provided:
//!
//! - [`JsonTicketCodec`]: `serde_json`, self-describing, the default
//! - [`BincodeTicketCodec`]: `bincode`, compact, requires both ends to agree on
//!   field order

use crate::ticket::{
    ProxyGrantingTicket, ProxyTicket, ServiceTicket, Ticket, TicketGrantingTicket, TicketKind,
    TransientSessionTicket,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Codec failure. The registry attaches the ticket id.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{codec}: {message}")]
pub struct CodecError {
    /// Codec that failed.
    pub codec: &'static str,
    /// Underlying serializer message.
    pub message: String,
}

/// Encodes typed tickets into opaque payloads and back.
///
/// Implementations are pure: no I/O, no shared state.
pub trait TicketCodec: Send + Sync {
    /// Codec name for logs.
    fn name(&self) -> &'static str;

    /// Encode a ticket's concrete struct.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the serializer rejects the ticket.
    fn serialize(&self, ticket: &Ticket) -> Result<Vec<u8>, CodecError>;

    /// Decode a payload into the struct for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the payload is malformed or is not a `kind`
    /// payload.
    fn deserialize(&self, data: &[u8], kind: TicketKind) -> Result<Ticket, CodecError>;
}

/// A serde data format the generic codec plumbing can drive.
trait SerdeFormat {
    const NAME: &'static str;

    fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, String>;

    fn from_bytes<T: DeserializeOwned>(data: &[u8]) -> Result<T, String>;
}

fn encode<F: SerdeFormat>(ticket: &Ticket) -> Result<Vec<u8>, CodecError> {
    let bytes = match ticket {
        Ticket::TicketGranting(t) => F::to_bytes(t),
        Ticket::Service(t) => F::to_bytes(t),
        Ticket::ProxyGranting(t) => F::to_bytes(t),
        Ticket::Proxy(t) => F::to_bytes(t),
        Ticket::TransientSession(t) => F::to_bytes(t),
    };
    bytes.map_err(|message| CodecError {
        codec: F::NAME,
        message,
    })
}

fn decode<F: SerdeFormat>(data: &[u8], kind: TicketKind) -> Result<Ticket, CodecError> {
    let ticket = match kind {
        TicketKind::TicketGranting => F::from_bytes::<TicketGrantingTicket>(data).map(Ticket::from),
        TicketKind::Service => F::from_bytes::<ServiceTicket>(data).map(Ticket::from),
        TicketKind::ProxyGranting => F::from_bytes::<ProxyGrantingTicket>(data).map(Ticket::from),
        TicketKind::Proxy => F::from_bytes::<ProxyTicket>(data).map(Ticket::from),
        TicketKind::TransientSession => {
            F::from_bytes::<TransientSessionTicket>(data).map(Ticket::from)
        }
    };
    ticket.map_err(|message| CodecError {
        codec: F::NAME,
        message: format!("not a {kind} payload: {message}"),
    })
}

/// JSON codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTicketCodec;

impl SerdeFormat for JsonTicketCodec {
    const NAME: &'static str = "json";

    fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, String> {
        serde_json::to_vec(value).map_err(|e| e.to_string())
    }

    fn from_bytes<T: DeserializeOwned>(data: &[u8]) -> Result<T, String> {
        serde_json::from_slice(data).map_err(|e| e.to_string())
    }
}

impl TicketCodec for JsonTicketCodec {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn serialize(&self, ticket: &Ticket) -> Result<Vec<u8>, CodecError> {
        encode::<Self>(ticket)
    }

    fn deserialize(&self, data: &[u8], kind: TicketKind) -> Result<Ticket, CodecError> {
        decode::<Self>(data, kind)
    }
}

/// Bincode codec.
///
/// Ticket structs avoid `serde_json::Value` and internally tagged enums, both
/// of which need `deserialize_any`, which bincode does not support.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeTicketCodec;

impl SerdeFormat for BincodeTicketCodec {
    const NAME: &'static str = "bincode";

    fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, String> {
        bincode::serialize(value).map_err(|e| e.to_string())
    }

    fn from_bytes<T: DeserializeOwned>(data: &[u8]) -> Result<T, String> {
        bincode::deserialize(data).map_err(|e| e.to_string())
    }
}

impl TicketCodec for BincodeTicketCodec {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn serialize(&self, ticket: &Ticket) -> Result<Vec<u8>, CodecError> {
        encode::<Self>(ticket)
    }

    fn deserialize(&self, data: &[u8], kind: TicketKind) -> Result<Ticket, CodecError> {
        decode::<Self>(data, kind)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::expiration::ExpirationPolicy;
    use crate::id::TicketId;
    use crate::ticket::TicketState;
    use chrono::Utc;
    use std::time::Duration;

    fn service_ticket() -> Ticket {
        Ticket::Service(ServiceTicket {
            id: TicketId::new("ST-1-abc"),
            ticket_granting_ticket: TicketId::new("TGT-1-xyz"),
            service: "https://app.example.com".to_string(),
            from_new_login: true,
            state: TicketState::new(Utc::now()),
            expiration_policy: ExpirationPolicy::multi_time_use(1, Duration::from_secs(10)),
        })
    }

    #[test]
    fn json_payload_has_no_kind_tag() {
        let bytes = JsonTicketCodec.serialize(&service_ticket()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["id"], "ST-1-abc");
        assert!(value.get("Service").is_none());
    }

    #[test]
    fn decodes_into_requested_kind() {
        for codec in [&JsonTicketCodec as &dyn TicketCodec, &BincodeTicketCodec] {
            let ticket = service_ticket();
            let bytes = codec.serialize(&ticket).unwrap();
            let decoded = codec.deserialize(&bytes, TicketKind::Service).unwrap();
            assert_eq!(decoded, ticket, "codec {}", codec.name());
        }
    }

    #[test]
    fn wrong_kind_is_a_decode_error() {
        let bytes = JsonTicketCodec.serialize(&service_ticket()).unwrap();
        let error = JsonTicketCodec
            .deserialize(&bytes, TicketKind::TicketGranting)
            .unwrap_err();

        assert_eq!(error.codec, "json");
        assert!(error.message.contains("TicketGrantingTicket"));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(BincodeTicketCodec.deserialize(b"\x01", TicketKind::Proxy).is_err());
        assert!(JsonTicketCodec.deserialize(b"not json", TicketKind::Proxy).is_err());
    }
}
