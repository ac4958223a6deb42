//! Hit detection, damage cooldown and knockback
//!
//! Each robot exposes two sample points derived from its pose: the strike
//! point at the tip of its spike (offset forward along the heading) and the
//! body point at its centroid. A hit is a strike point inside the opposing
//! body's hit radius. Detection runs symmetrically on both peers against
//! slightly different information, which is why outcomes feed the authority
//! arbitration in the battle module rather than mutating state here.

use crate::game::ActorState;
use crate::util::vec2::Vec2;

/// Distance below which a strike point connects with a body point.
pub const HIT_RADIUS: f32 = 40.0;
/// Forward offset of the spike tip from the robot centroid.
pub const STRIKE_OFFSET: f32 = 25.0;
/// HP removed by one connected strike.
pub const STRIKE_DAMAGE: u32 = 10;
/// Minimum seconds between two applied damage events on one peer.
pub const DAMAGE_COOLDOWN: f32 = 0.5;
/// Total knockback displacement in arena units.
pub const KNOCKBACK_STRENGTH: f32 = 240.0;
/// Seconds over which the knockback displacement is eased out.
pub const KNOCKBACK_DURATION: f32 = 0.2;

/// Result of one symmetric detection pass, from this peer's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionOutcome {
    None,
    LocalHitsRemote,
    RemoteHitsLocal,
    /// Both spikes connect in the same pass.
    MutualStrike,
}

/// Tip of the offensive spike for the given pose.
pub fn strike_point(actor: &ActorState) -> Vec2 {
    actor.position + Vec2::from_heading(actor.heading) * STRIKE_OFFSET
}

/// Centroid sample point used as the vulnerable body.
pub fn body_point(actor: &ActorState) -> Vec2 {
    actor.position
}

/// Symmetric geometric test between the local actor and the cached remote.
pub fn detect(local: &ActorState, remote: &ActorState) -> CollisionOutcome {
    let local_hits = strike_point(local).distance(body_point(remote)) < HIT_RADIUS;
    let remote_hits = strike_point(remote).distance(body_point(local)) < HIT_RADIUS;

    match (local_hits, remote_hits) {
        (true, true) => CollisionOutcome::MutualStrike,
        (true, false) => CollisionOutcome::LocalHitsRemote,
        (false, true) => CollisionOutcome::RemoteHitsLocal,
        (false, false) => CollisionOutcome::None,
    }
}

/// Apply damage to an hp value, clamped to the valid range. Amounts from
/// the network may be arbitrary; the clamp is the invariant, not the input.
pub fn apply_damage(hp: i32, amount: u32) -> i32 {
    hp.saturating_sub(amount.min(i32::MAX as u32) as i32).clamp(0, 100)
}

/// Single per-peer clock suppressing re-triggering on sustained contact.
/// Any applied damage event of any kind re-arms the same clock.
#[derive(Debug, Default)]
pub struct CooldownClock {
    last_applied: Option<f32>,
}

impl CooldownClock {
    /// Returns true and re-arms if the window has elapsed; leaves the clock
    /// untouched otherwise.
    pub fn try_arm(&mut self, now: f32) -> bool {
        if let Some(last) = self.last_applied {
            if now - last < DAMAGE_COOLDOWN {
                return false;
            }
        }
        self.last_applied = Some(now);
        true
    }

    pub fn clear(&mut self) {
        self.last_applied = None;
    }
}

/// Eased positional displacement away from the opposing actor. Cosmetic:
/// applied unconditionally on both peers, never subject to authority, so
/// the two peers' displacement may diverge by up to one send interval of
/// motion.
#[derive(Debug, Clone, Copy)]
pub struct Knockback {
    direction: Vec2,
    elapsed: f32,
}

impl Knockback {
    /// Knockback for an actor at `target`, pushed away from `origin`.
    pub fn away_from(target: Vec2, origin: Vec2) -> Self {
        let direction = (target - origin).normalized_or_zero();
        // Coincident actors get pushed along +x rather than not at all.
        let direction = if direction == Vec2::ZERO {
            Vec2::new(1.0, 0.0)
        } else {
            direction
        };
        Self {
            direction,
            elapsed: 0.0,
        }
    }

    /// Displacement contributed by this tick, or `None` once finished.
    pub fn step(&mut self, dt: f32) -> Option<Vec2> {
        if self.elapsed >= KNOCKBACK_DURATION {
            return None;
        }
        let t0 = self.elapsed / KNOCKBACK_DURATION;
        self.elapsed += dt;
        let t1 = (self.elapsed / KNOCKBACK_DURATION).min(1.0);
        let fraction = ease_out(t1) - ease_out(t0);
        Some(self.direction * (KNOCKBACK_STRENGTH * fraction))
    }
}

/// Quadratic ease-out: fast start, settles at the end.
fn ease_out(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::time::tick_delta;

    fn actor(x: f32, y: f32, heading: f32) -> ActorState {
        ActorState {
            position: Vec2::new(x, y),
            velocity: Vec2::ZERO,
            heading,
            hp: 100,
        }
    }

    #[test]
    fn strike_point_is_forward_of_centroid() {
        let a = actor(100.0, 100.0, 0.0);
        assert_eq!(strike_point(&a), Vec2::new(125.0, 100.0));
        let up = actor(100.0, 100.0, std::f32::consts::FRAC_PI_2);
        assert!(strike_point(&up).distance(Vec2::new(100.0, 125.0)) < 1e-4);
    }

    #[test]
    fn detect_local_hits_remote() {
        // Local at (100,100) heading right; remote body at (120,100).
        let local = actor(100.0, 100.0, 0.0);
        let remote = actor(120.0, 100.0, 0.0);
        assert_eq!(detect(&local, &remote), CollisionOutcome::LocalHitsRemote);
    }

    #[test]
    fn detect_remote_hits_local() {
        let local = actor(100.0, 100.0, 0.0);
        let remote = actor(60.0, 100.0, 0.0); // spike at (85,100), 15 from local body
        assert_eq!(detect(&local, &remote), CollisionOutcome::RemoteHitsLocal);
    }

    #[test]
    fn detect_mutual_strike() {
        let local = actor(100.0, 100.0, 0.0);
        let remote = actor(125.0, 100.0, std::f32::consts::PI);
        assert_eq!(detect(&local, &remote), CollisionOutcome::MutualStrike);
    }

    #[test]
    fn detect_none_when_out_of_range() {
        let local = actor(0.0, 0.0, 0.0);
        let remote = actor(300.0, 300.0, 0.0);
        assert_eq!(detect(&local, &remote), CollisionOutcome::None);
    }

    #[test]
    fn damage_clamps_to_valid_range() {
        assert_eq!(apply_damage(100, 10), 90);
        assert_eq!(apply_damage(5, 10), 0);
        assert_eq!(apply_damage(100, u32::MAX), 0);
        assert_eq!(apply_damage(150, 10), 100); // malformed input clamped
    }

    #[test]
    fn cooldown_suppresses_within_window() {
        let mut clock = CooldownClock::default();
        assert!(clock.try_arm(1.0));
        assert!(!clock.try_arm(1.1));
        assert!(!clock.try_arm(1.49));
        assert!(clock.try_arm(1.6));
        clock.clear();
        assert!(clock.try_arm(1.61));
    }

    #[test]
    fn knockback_totals_fixed_magnitude() {
        let mut kb = Knockback::away_from(Vec2::new(10.0, 0.0), Vec2::ZERO);
        let mut total = Vec2::ZERO;
        let dt = tick_delta();
        while let Some(delta) = kb.step(dt) {
            total += delta;
        }
        assert!((total.length() - KNOCKBACK_STRENGTH).abs() < 1.0);
        assert!(total.x > 0.0); // pushed away from the origin
        assert!(total.y.abs() < 1e-4);
    }

    #[test]
    fn knockback_of_coincident_actors_still_moves() {
        let mut kb = Knockback::away_from(Vec2::ZERO, Vec2::ZERO);
        let delta = kb.step(tick_delta()).expect("displacement");
        assert!(delta.length() > 0.0);
    }
}
