//! Procedural world growth.
//!
//! The world is a handful of land tiles stamped from templates at
//! pre-configured generation slots as the player approaches them, and
//! reclaimed farthest-first once too many are alive.

pub mod growth;
pub mod stations;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::spatial::{Aabb3, EntityRef};

pub use growth::WorldGrowthManager;
pub use stations::{Placement, ResourceStation, ResourceStationPlacer};

/// Biome of a land tile; decides which species live there
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LandType {
    GrassLand,
    IceLand,
    FireLand,
    Night,
    RockLand,
}

impl LandType {
    pub fn all() -> [LandType; 5] {
        [
            LandType::GrassLand,
            LandType::IceLand,
            LandType::FireLand,
            LandType::Night,
            LandType::RockLand,
        ]
    }

    /// Elemental types that may live on this land
    pub fn native_types(&self) -> &'static [&'static str] {
        match self {
            LandType::GrassLand => &["Grass", "Bug", "Poison"],
            LandType::IceLand => &["Water", "Ice"],
            LandType::FireLand => &["Fire"],
            LandType::Night => &["Ghost", "Dark"],
            LandType::RockLand => &["Rock", "Ground"],
        }
    }

    pub fn admits(&self, types: &[String]) -> bool {
        types.iter().any(|t| {
            self.native_types()
                .iter()
                .any(|native| t.eq_ignore_ascii_case(native))
        })
    }
}

/// Blueprint a tile is stamped from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandTemplate {
    pub name: String,
    pub land_type: LandType,
    /// Footprint half extents; `y` is half the tile's thickness
    pub half_extents: Vec3,
    /// Creature spawn points relative to the tile center, before rotation
    #[serde(default)]
    pub spawn_points: Vec<Vec3>,
}

impl LandTemplate {
    pub fn new(name: impl Into<String>, land_type: LandType, half_extents: Vec3) -> Self {
        Self {
            name: name.into(),
            land_type,
            half_extents,
            spawn_points: Vec::new(),
        }
    }

    pub fn with_spawn_points(mut self, points: Vec<Vec3>) -> Self {
        self.spawn_points = points;
        self
    }
}

/// Candidate location for land growth. Yields at most one tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSlot {
    pub position: Vec3,
    #[serde(default)]
    pub yaw: f32,
}

impl GenerationSlot {
    pub fn at(position: Vec3) -> Self {
        Self { position, yaw: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LandTile {
    pub id: u64,
    pub template: String,
    pub land_type: LandType,
    pub position: Vec3,
    pub yaw: f32,
    pub bounds: Aabb3,
    /// World-space spawn points, in template order
    pub spawn_points: Vec<Vec3>,
    pub station: Option<ResourceStation>,
}

impl LandTile {
    /// Stamp `template` at the slot's position and orientation
    pub fn instantiate(id: u64, template: &LandTemplate, slot: &GenerationSlot) -> Self {
        let rotation = Quat::from_rotation_y(slot.yaw);
        let (sin, cos) = slot.yaw.sin_cos();
        let he = template.half_extents.abs();
        // Axis-aligned box enclosing the rotated footprint
        let half_extents = Vec3::new(
            cos.abs() * he.x + sin.abs() * he.z,
            he.y,
            sin.abs() * he.x + cos.abs() * he.z,
        );
        Self {
            id,
            template: template.name.clone(),
            land_type: template.land_type,
            position: slot.position,
            yaw: slot.yaw,
            bounds: Aabb3::new(slot.position, half_extents),
            spawn_points: template
                .spawn_points
                .iter()
                .map(|local| slot.position + rotation * *local)
                .collect(),
            station: None,
        }
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::land(self.id)
    }
}
