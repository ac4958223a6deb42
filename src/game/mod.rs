//! Simulation core modules

pub mod battle;
pub mod combat;
pub mod coords;
pub mod hazard;
pub mod sync;

pub use battle::{BattlePhase, BattleSession, BattleState, BattleView, SessionHandle};

use crate::net::protocol::HazardId;
use crate::util::vec2::Vec2;

/// Maximum (and initial) robot HP.
pub const MAX_HP: i32 = 100;

/// Which of the two robots an event refers to, from this peer's frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorSide {
    Local,
    Remote,
}

/// Kinematic and health state of one robot.
///
/// The local instance is authoritative for this peer; the remote instance is
/// a read cache, mutated only by snapshot application, whose hp mirrors the
/// opponent's authoritative value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorState {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Heading in radians
    pub heading: f32,
    pub hp: i32,
}

impl ActorState {
    /// Fresh actor at a spawn pose with full HP.
    pub fn spawn(position: Vec2, heading: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            heading,
            hp: MAX_HP,
        }
    }
}

/// Commands from the local input layer, drained at the start of each tick.
#[derive(Debug, Clone, Copy)]
pub enum LocalCommand {
    /// Intended movement direction; zero stops without changing heading.
    Steer(Vec2),
    /// Drop a hazard at a local-frame position.
    PlaceHazard { position: Vec2 },
    StartMatch,
    ResetMatch,
}

/// Discrete notifications for presentation layers (effects, haptics, UI).
/// Emitted on both peers regardless of authority, so a hit "feels" immediate
/// even on the frame where damage has not landed yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BattleEvent {
    /// A spike connected; feedback only, damage may follow separately.
    Struck { target: ActorSide, at: Vec2 },
    /// HP actually changed on this peer.
    HitApplied { target: ActorSide, amount: u32, hp: i32 },
    HazardPlaced { id: HazardId, at: Vec2 },
    HazardDetonated { id: HazardId, at: Vec2 },
    MatchOver { winner: ActorSide },
    MatchReset,
}
