//! Placed hazard (bomb) lifecycle
//!
//! Placement is a local, quota-bounded action with no authority asymmetry.
//! Both peers keep their own registry, populated by local placement or a
//! received `PlaceHazard`, and each scans both actors against it every tick.
//! Whichever peer detects proximity first detonates unilaterally; removal is
//! idempotent so the cross-detonation race degrades to a duplicate no-op.

use std::collections::HashMap;

use uuid::Uuid;

use crate::net::protocol::{HazardId, HazardPlacement, Role};
use crate::util::vec2::Vec2;

/// Distance below which a hazard detonates against an actor.
pub const TRIGGER_RADIUS: f32 = 35.0;
/// Placements allowed per peer per match.
pub const PLACEMENT_QUOTA: u32 = 3;
/// HP removed by one detonation.
pub const HAZARD_DAMAGE: u32 = 10;

/// A refused placement. Not an error so much as a denied action; it has no
/// network effect.
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error("hazard placement quota exhausted")]
    QuotaExceeded,
}

/// Per-peer mapping of live hazards. The quota counts this peer's own
/// placements only; remotely placed hazards register without limit.
#[derive(Debug, Default)]
pub struct HazardRegistry {
    hazards: HashMap<HazardId, Vec2>,
    placements_used: u32,
}

impl HazardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a hazard at a local-frame position, consuming quota.
    pub fn place_local(
        &mut self,
        position: Vec2,
        owner: Role,
    ) -> Result<HazardPlacement, PlacementError> {
        if self.placements_used >= PLACEMENT_QUOTA {
            return Err(PlacementError::QuotaExceeded);
        }
        self.placements_used += 1;
        let placement = HazardPlacement {
            id: Uuid::new_v4(),
            position,
            owner,
        };
        self.hazards.insert(placement.id, position);
        Ok(placement)
    }

    /// Register a hazard announced by the peer (position already mapped to
    /// the local frame).
    pub fn register_remote(&mut self, id: HazardId, position: Vec2) {
        self.hazards.insert(id, position);
    }

    /// Remove a hazard, returning its position. Removing an absent id is a
    /// silent no-op: detonation messages may race or duplicate.
    pub fn remove(&mut self, id: HazardId) -> Option<Vec2> {
        self.hazards.remove(&id)
    }

    /// Hazards within trigger range of the given point.
    pub fn triggered_by(&self, point: Vec2) -> Vec<(HazardId, Vec2)> {
        self.hazards
            .iter()
            .filter(|(_, pos)| pos.distance(point) < TRIGGER_RADIUS)
            .map(|(id, pos)| (*id, *pos))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HazardId, &Vec2)> {
        self.hazards.iter()
    }

    pub fn len(&self) -> usize {
        self.hazards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hazards.is_empty()
    }

    /// Drop all hazards and restore the placement quota (match reset).
    pub fn clear(&mut self) {
        self.hazards.clear();
        self.placements_used = 0;
    }
}
