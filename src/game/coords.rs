//! Local-frame <-> wire-frame coordinate mapping
//!
//! Each peer lays out the arena with its own robot entering from the bottom
//! of its own screen and the opponent at the top, so the two local frames
//! are vertical mirror images of each other. The initiator's local frame is
//! the canonical wire frame; the responder reflects the y axis about the
//! arena midline, negates headings and negates a velocity's y component at
//! both the send and the receive boundary. The responder transform is an
//! involution, so the same map serves both directions and round-trips are
//! exact.
//!
//! The transform is applied exactly once per value, at the boundary. Values
//! inside the simulation are always in the local frame.

use crate::net::protocol::Role;
use crate::util::vec2::Vec2;

#[derive(Debug, Clone, Copy)]
pub struct FrameMap {
    role: Role,
    extent_y: f32,
}

impl FrameMap {
    pub fn new(role: Role, extent_y: f32) -> Self {
        Self { role, extent_y }
    }

    pub fn point_to_wire(&self, p: Vec2) -> Vec2 {
        self.mirror_point(p)
    }

    pub fn point_from_wire(&self, p: Vec2) -> Vec2 {
        self.mirror_point(p)
    }

    pub fn vector_to_wire(&self, v: Vec2) -> Vec2 {
        self.mirror_vector(v)
    }

    pub fn vector_from_wire(&self, v: Vec2) -> Vec2 {
        self.mirror_vector(v)
    }

    pub fn heading_to_wire(&self, heading: f32) -> f32 {
        self.mirror_heading(heading)
    }

    pub fn heading_from_wire(&self, heading: f32) -> f32 {
        self.mirror_heading(heading)
    }

    fn mirror_point(&self, p: Vec2) -> Vec2 {
        match self.role {
            Role::Initiator => p,
            Role::Responder => Vec2::new(p.x, self.extent_y - p.y),
        }
    }

    fn mirror_vector(&self, v: Vec2) -> Vec2 {
        match self.role {
            Role::Initiator => v,
            Role::Responder => Vec2::new(v.x, -v.y),
        }
    }

    fn mirror_heading(&self, heading: f32) -> f32 {
        match self.role {
            Role::Initiator => heading,
            Role::Responder => -heading,
        }
    }
}
