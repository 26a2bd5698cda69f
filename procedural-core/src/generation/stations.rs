//! Resource (oxygen) station placement on freshly generated tiles.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::LandTile;
use crate::engine::config::StationConfig;
use crate::rng::SimRng;
use crate::spatial::{EntityRef, SpatialQuery, Volume};

/// Refill point owned by exactly one tile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceStation {
    pub tile: u64,
    pub position: Vec3,
    pub active: bool,
}

impl ResourceStation {
    /// Stations share their owning tile's id
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::station(self.tile)
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Result of one placement run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// The placement roll decided this tile gets no station
    Skipped,
    /// Every sampled point collided with something
    NoValidPosition { attempts: u32 },
    Placed {
        station: ResourceStation,
        attempts: u32,
    },
}

#[derive(Debug, Clone)]
pub struct ResourceStationPlacer {
    config: StationConfig,
}

impl ResourceStationPlacer {
    pub fn new(config: StationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Roll for a station and, if it wins, look for a clear spot above the
    /// tile's top surface. The tile itself is not modified.
    pub fn place<Q: SpatialQuery + ?Sized>(
        &self,
        tile: &LandTile,
        spatial: &Q,
        rng: &mut dyn SimRng,
    ) -> Placement {
        if !rng.check_probability(self.config.placement_probability) {
            debug!(tile = tile.id, "no station rolled");
            return Placement::Skipped;
        }

        let min = tile.bounds.min();
        let max = tile.bounds.max();
        let height = tile.bounds.top() + self.config.height_offset;

        for attempt in 1..=self.config.max_spawn_attempts {
            let candidate = Vec3::new(
                rng.gen_range_f32(min.x, max.x),
                height,
                rng.gen_range_f32(min.z, max.z),
            );
            let probe = Volume::sphere(candidate, self.config.clearance_radius);
            if spatial.overlap(&probe).is_empty() {
                let active = rng.check_probability(self.config.activation_probability);
                debug!(tile = tile.id, attempt, active, "station position found");
                return Placement::Placed {
                    station: ResourceStation {
                        tile: tile.id,
                        position: candidate,
                        active,
                    },
                    attempts: attempt,
                };
            }
        }

        Placement::NoValidPosition {
            attempts: self.config.max_spawn_attempts,
        }
    }
}
