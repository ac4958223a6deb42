//! Link session boundary between the simulation core and the transport
//!
//! The physical transport (pairing, advertising, reconnection) lives outside
//! this crate. The core only needs a role, a fire-and-forget outbound send,
//! and an inbound byte stream in arrival order. Inbound payloads stay encoded
//! until the battle session drains them at the start of a tick, so malformed
//! data is dropped on the simulation task where it can be logged in context.

use tokio::sync::mpsc;

use crate::net::protocol::{encode, Message, Role};

/// Link failures are non-fatal to the simulation: the session logs the
/// error and keeps ticking on stale remote data.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("link closed")]
    Closed,
}

/// Outbound half of an established peer link.
///
/// `send` must not block the simulation tick; best-effort delivery is the
/// transport's responsibility, including any retry.
pub trait LinkSession: Send + 'static {
    /// Role assigned at connection time, fixed for the session lifetime.
    fn role(&self) -> Role;

    /// Fire-and-forget send of one encoded message.
    fn send(&self, msg: &Message) -> Result<(), LinkError>;
}

/// One side of an in-process link: the outbound handle plus the inbound
/// byte stream to hand to the battle session.
pub struct LinkEndpoint {
    pub link: MemoryLink,
    pub inbound: mpsc::UnboundedReceiver<Vec<u8>>,
}

/// In-process loopback link used by the demo binary and the integration
/// tests. Messages cross the "wire" encoded, so the codec is exercised end
/// to end. Dropping either endpoint closes the link.
pub struct MemoryLink {
    role: Role,
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl MemoryLink {
    /// Build a connected pair. Mirroring real link negotiation, the side
    /// that "opened" the connection is the initiator.
    pub fn pair() -> (LinkEndpoint, LinkEndpoint) {
        let (initiator_tx, responder_rx) = mpsc::unbounded_channel();
        let (responder_tx, initiator_rx) = mpsc::unbounded_channel();

        let initiator = LinkEndpoint {
            link: MemoryLink {
                role: Role::Initiator,
                tx: initiator_tx,
            },
            inbound: initiator_rx,
        };
        let responder = LinkEndpoint {
            link: MemoryLink {
                role: Role::Responder,
                tx: responder_tx,
            },
            inbound: responder_rx,
        };
        (initiator, responder)
    }
}

impl LinkSession for MemoryLink {
    fn role(&self) -> Role {
        self.role
    }

    fn send(&self, msg: &Message) -> Result<(), LinkError> {
        self.tx.send(encode(msg)).map_err(|_| LinkError::Closed)
    }
}
