//! Minimal kinematic navigation for creatures.
//!
//! Moves on the horizontal plane only; the creature keeps its height. The
//! host is free to replace the resulting positions with navmesh-projected
//! ones.

use bevy::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct NavAgent {
    destination: Option<Vec3>,
    pub speed: f32,
}

impl NavAgent {
    pub fn new(speed: f32) -> Self {
        Self {
            destination: None,
            speed,
        }
    }

    pub fn set_destination(&mut self, destination: Vec3) {
        self.destination = Some(destination);
    }

    pub fn stop(&mut self) {
        self.destination = None;
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    pub fn is_navigating(&self) -> bool {
        self.destination.is_some()
    }

    /// Horizontal distance left to the destination, 0 when idle
    pub fn remaining_distance(&self, from: Vec3) -> f32 {
        self.destination
            .map(|dest| horizontal(dest - from).length())
            .unwrap_or(0.0)
    }

    /// Step `position` toward the destination without overshooting.
    /// Arrival clears the destination.
    pub fn advance(&mut self, position: Vec3, dt: f32) -> Vec3 {
        let Some(dest) = self.destination else {
            return position;
        };
        let offset = horizontal(dest - position);
        let distance = offset.length();
        let step = self.speed * dt;
        if distance <= step {
            self.destination = None;
            return Vec3::new(dest.x, position.y, dest.z);
        }
        position + offset / distance * step
    }
}

fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}
