use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generation::LandType;
use crate::spatial::EntityRef;

// =====================================================
// Inputs
// =====================================================

/// Per-tick player feed
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub position: Vec3,
    pub velocity: Vec3,
}

impl PlayerSnapshot {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
        }
    }
}

// =====================================================
// Outgoing signals
// =====================================================

/// Request for the physics collaborator to push an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpulseRequest {
    pub source: u64,
    pub target: EntityRef,
    pub impulse: Vec3,
}

/// Fire-and-forget audio cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    /// A Strong creature started warning an intruder
    TerritoryWarning { creature: u64 },
}

pub trait ImpulseSink {
    fn apply_impulse(&mut self, request: ImpulseRequest);
}

pub trait CueSink {
    fn play_cue(&mut self, cue: Cue);
}

/// Collects signals raised during a tick until the host drains them
#[derive(Debug, Default, Clone)]
pub struct SignalBuffer {
    impulses: Vec<ImpulseRequest>,
    cues: Vec<Cue>,
}

impl SignalBuffer {
    pub fn impulses(&self) -> &[ImpulseRequest] {
        &self.impulses
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn drain_impulses(&mut self) -> Vec<ImpulseRequest> {
        std::mem::take(&mut self.impulses)
    }

    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }
}

impl ImpulseSink for SignalBuffer {
    fn apply_impulse(&mut self, request: ImpulseRequest) {
        self.impulses.push(request);
    }
}

impl CueSink for SignalBuffer {
    fn play_cue(&mut self, cue: Cue) {
        self.cues.push(cue);
    }
}

// =====================================================
// Observed events
// =====================================================

/// Non-fatal conditions the host may want to surface
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum SimWarning {
    #[error("no land templates configured")]
    NoLandTemplates,
    #[error("no valid resource-station position found on tile {tile}")]
    NoStationPosition { tile: u64 },
    #[error("player reference unavailable")]
    PlayerUnavailable,
    #[error("no species found for land type {land_type:?}")]
    NoSpeciesForLand { land_type: LandType },
    #[error("tile {tile} has {requested} spawn points but only {spawned} species")]
    SpawnPointsExceedSpecies {
        tile: u64,
        spawned: usize,
        requested: usize,
    },
    #[error("{live} live tiles after pruning, cap is {cap}")]
    TileCapExceeded { live: usize, cap: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Warning(SimWarning),
    TileGenerated {
        tile: u64,
        land_type: LandType,
        position: Vec3,
    },
    TilePruned {
        tile: u64,
        distance: f32,
    },
    StationPlaced {
        tile: u64,
        position: Vec3,
        active: bool,
    },
    CreatureSpawned {
        creature: u64,
        species_id: u32,
        tile: u64,
    },
    CreatureDespawned {
        creature: u64,
    },
    Expelled {
        creature: u64,
        target: EntityRef,
    },
    SessionEnded {
        elapsed: f32,
    },
}

impl SimEvent {
    pub fn warning(&self) -> Option<&SimWarning> {
        match self {
            SimEvent::Warning(w) => Some(w),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_buffer_drains() {
        let mut buffer = SignalBuffer::default();
        buffer.play_cue(Cue::TerritoryWarning { creature: 3 });
        buffer.apply_impulse(ImpulseRequest {
            source: 3,
            target: EntityRef::PLAYER,
            impulse: Vec3::X,
        });
        assert_eq!(buffer.drain_cues().len(), 1);
        assert_eq!(buffer.drain_impulses().len(), 1);
        assert!(buffer.cues().is_empty());
        assert!(buffer.impulses().is_empty());
    }

    #[test]
    fn test_warning_messages() {
        assert_eq!(
            SimWarning::NoLandTemplates.to_string(),
            "no land templates configured"
        );
        assert!(SimWarning::NoStationPosition { tile: 4 }
            .to_string()
            .contains("tile 4"));
    }
}
