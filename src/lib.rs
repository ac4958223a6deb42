//! Robot Duel - peer-to-peer simulation core for two-robot realtime duels
//!
//! Two peers run the same fixed-rate simulation and exchange compact state
//! snapshots over a symmetric link. Each peer lays out the arena in its own
//! frame (own robot near the bottom); the coordinate mapper folds both frames
//! onto one canonical wire frame so the peers stay mirror-consistent. Damage
//! authority is asymmetric: the connection initiator arbitrates every HP
//! change, the responder applies what it is told.

pub mod config;
pub mod game;
pub mod net;
pub mod util;

pub use config::Config;
pub use game::{
    ActorSide, ActorState, BattleEvent, BattlePhase, BattleSession, BattleState, BattleView,
    LocalCommand, SessionHandle,
};
pub use net::link::{LinkEndpoint, LinkSession, MemoryLink};
pub use net::protocol::{Message, Role};
pub use util::vec2::Vec2;
