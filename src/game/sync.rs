//! Snapshot cadence and remote motion smoothing
//!
//! Outbound: the local actor's state is broadcast every `SEND_INTERVAL_TICKS`
//! simulation ticks. Inbound: a received snapshot retargets a short
//! interpolation instead of teleporting the cached remote actor, so its
//! on-screen motion stays continuous across discrete updates.

use crate::util::time::SEND_INTERVAL_TICKS;
use crate::util::vec2::Vec2;

/// Tick-counting gate for outbound snapshots.
#[derive(Debug)]
pub struct SendCadence {
    ticks_since_send: u32,
    interval_ticks: u32,
}

impl SendCadence {
    pub fn new() -> Self {
        Self {
            ticks_since_send: 0,
            interval_ticks: SEND_INTERVAL_TICKS,
        }
    }

    /// Advance one tick; true when a snapshot is due.
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_send += 1;
        if self.ticks_since_send >= self.interval_ticks {
            self.ticks_since_send = 0;
            true
        } else {
            false
        }
    }

    /// Force a snapshot on the next tick (used after discrete events).
    pub fn force_next(&mut self) {
        self.ticks_since_send = self.interval_ticks;
    }
}

impl Default for SendCadence {
    fn default() -> Self {
        Self::new()
    }
}

/// Smooths the cached remote actor's pose toward the latest received
/// snapshot over one send interval. Headings blend along the shortest arc.
#[derive(Debug, Default)]
pub struct RemoteMotion {
    from_position: Vec2,
    to_position: Vec2,
    from_heading: f32,
    to_heading: f32,
    elapsed: f32,
    duration: f32,
    active: bool,
}

impl RemoteMotion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new transition from the currently displayed pose. Called for
    /// every applied snapshot; a retarget mid-flight restarts from wherever
    /// the previous transition had reached.
    pub fn retarget(
        &mut self,
        current_position: Vec2,
        current_heading: f32,
        target_position: Vec2,
        target_heading: f32,
        duration: f32,
    ) {
        self.from_position = current_position;
        self.from_heading = current_heading;
        self.to_position = target_position;
        self.to_heading = target_heading;
        self.elapsed = 0.0;
        self.duration = duration.max(f32::EPSILON);
        self.active = true;
    }

    /// Shift an in-flight transition by an external displacement, so a
    /// concurrent effect (knockback) is carried instead of being overwritten
    /// by the next interpolation step.
    pub fn displace(&mut self, delta: Vec2) {
        if self.active {
            self.from_position += delta;
            self.to_position += delta;
        }
    }

    /// Advance the transition by one tick. Returns the pose to display, or
    /// `None` when no transition is in flight.
    pub fn step(&mut self, dt: f32) -> Option<(Vec2, f32)> {
        if !self.active {
            return None;
        }
        self.elapsed += dt;
        let t = (self.elapsed / self.duration).min(1.0);
        if t >= 1.0 {
            self.active = false;
        }
        let position = self.from_position + (self.to_position - self.from_position) * t;
        let heading = lerp_angle(self.from_heading, self.to_heading, t);
        Some((position, heading))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Interpolate between two angles along the shortest arc.
fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let diff = (to - from + PI).rem_euclid(TAU) - PI;
    from + diff * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::time::{tick_delta, SEND_INTERVAL_SECS};

    #[test]
    fn cadence_fires_every_interval() {
        let mut cadence = SendCadence::new();
        let mut sends = 0;
        for _ in 0..SEND_INTERVAL_TICKS * 4 {
            if cadence.should_send() {
                sends += 1;
            }
        }
        assert_eq!(sends, 4);
    }

    #[test]
    fn cadence_force_next() {
        let mut cadence = SendCadence::new();
        cadence.force_next();
        assert!(cadence.should_send());
    }

    #[test]
    fn motion_reaches_target_within_send_interval() {
        let mut motion = RemoteMotion::new();
        let target = Vec2::new(100.0, 50.0);
        motion.retarget(Vec2::ZERO, 0.0, target, 1.0, SEND_INTERVAL_SECS);

        let mut pose = None;
        for _ in 0..SEND_INTERVAL_TICKS {
            pose = motion.step(tick_delta());
        }
        let (position, heading) = pose.expect("transition in flight");
        assert!(position.distance(target) < 1e-3);
        assert!((heading - 1.0).abs() < 1e-5);
        // Transition finished; no further pose updates.
        assert!(motion.step(tick_delta()).is_none());
    }

    #[test]
    fn displacement_carries_through_a_transition() {
        let mut motion = RemoteMotion::new();
        motion.retarget(Vec2::ZERO, 0.0, Vec2::new(90.0, 0.0), 0.0, SEND_INTERVAL_SECS);
        motion.displace(Vec2::new(0.0, 40.0));

        let mut pose = None;
        for _ in 0..SEND_INTERVAL_TICKS {
            pose = motion.step(tick_delta());
        }
        let (position, _) = pose.expect("transition in flight");
        assert!(position.distance(Vec2::new(90.0, 40.0)) < 1e-3);
    }

    #[test]
    fn heading_blends_along_shortest_arc() {
        // 3.0 -> -3.0 should pass through pi, not through zero.
        let mid = lerp_angle(3.0, -3.0, 0.5);
        assert!((mid.abs() - std::f32::consts::PI).abs() < 0.2);
    }
}
