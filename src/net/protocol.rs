//! Wire protocol message definitions
//! These are the types exchanged between the two peers over the link

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::vec2::Vec2;

/// Identifier for a placed hazard, generated by the placing peer.
pub type HazardId = Uuid;

/// Session role, assigned once at link establishment and never reassigned.
/// The initiator (the side that opened the connection) is authoritative for
/// every HP mutation in the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Initiator,
    Responder,
}

impl Role {
    pub fn is_initiator(self) -> bool {
        matches!(self, Role::Initiator)
    }
}

/// Kinematic state of one robot as broadcast on the send cadence.
/// Position, velocity and heading are in the canonical wire frame;
/// hp is the sender's authoritative value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Heading in radians
    pub heading: f32,
    pub hp: i32,
}

/// A placed hazard announcement. Immutable once constructed; only the
/// position is frame-mapped at the send/receive boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardPlacement {
    pub id: HazardId,
    /// Position in the canonical wire frame
    pub position: Vec2,
    pub owner: Role,
}

/// Messages exchanged between the two peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Periodic kinematic broadcast
    Snapshot(ActorSnapshot),

    /// Begin the match on both peers
    StartMatch,

    /// Reinitialize actors, cooldown and hazards on both peers
    ResetMatch,

    /// Sender's robot was destroyed; the receiver is the winner
    MatchOver,

    /// Damage to the receiver's robot, dispatched only by the authoritative peer
    Hit { amount: u32 },

    /// A hazard was placed by the sender
    PlaceHazard(HazardPlacement),

    /// The identified hazard detonated on the sender's side
    HazardDetonated { id: HazardId },
}

/// Wire decode failure. Malformed input is dropped by the caller; it is
/// never fatal and never panics.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Encode a message for transmission. The tagged JSON layout is
/// self-describing; there is no version field.
pub fn encode(msg: &Message) -> Vec<u8> {
    // Serializing our own message types cannot fail; an empty payload
    // simply fails to decode on the far side and is dropped there.
    serde_json::to_vec(msg).unwrap_or_default()
}

/// Decode a received payload. Total: truncated or corrupt input yields
/// `DecodeError::Malformed`.
pub fn decode(bytes: &[u8]) -> Result<Message, DecodeError> {
    Ok(serde_json::from_slice(bytes)?)
}
