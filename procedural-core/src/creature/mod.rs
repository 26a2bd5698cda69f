//! Creatures and their behavioral state.
//!
//! A creature's initial [`BehaviorState`] is a pure function of its
//! species' attack stats. After creation only the state machine in [`ai`]
//! changes state, timers, transform or target.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::config::{ClassificationThresholds, WildsConfig};
use crate::spatial::EntityRef;

pub mod ai;
pub mod navigation;
pub mod species;
pub mod territory;

pub use ai::{CreatureStateMachine, TickContext, TickOutcome};
pub use navigation::NavAgent;
pub use species::{BaseStats, Species, SpeciesTable};
pub use territory::TerritoryConflictResolver;

/// Timers at or below this are treated as expired
pub(crate) const TIMER_EPSILON: f32 = 1e-4;

/// Per-tick decision mode of a creature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BehaviorState {
    /// Flees from the player, then observes from a distance
    Weak,
    #[default]
    Normal,
    /// Walks up to the player and stops short
    Curious,
    /// Defends its territory against intruders
    Strong,
}

/// Classify a creature from its species stats.
///
/// Weak when both stats are under the weak threshold, Strong when either
/// exceeds the strong threshold, otherwise Curious when the mean reaches the
/// curious band and Normal below it.
pub fn classify_behavior(
    attack: u32,
    special_attack: u32,
    thresholds: &ClassificationThresholds,
) -> BehaviorState {
    if attack < thresholds.weak_threshold && special_attack < thresholds.weak_threshold {
        BehaviorState::Weak
    } else if attack > thresholds.strong_threshold || special_attack > thresholds.strong_threshold
    {
        BehaviorState::Strong
    } else if (attack as f32 + special_attack as f32) / 2.0 >= thresholds.curious_mean {
        BehaviorState::Curious
    } else {
        BehaviorState::Normal
    }
}

/// Immutable stats fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureStats {
    pub species_id: u32,
    pub attack: u32,
    pub special_attack: u32,
}

/// Countdown / count-up timers owned by the state machine. All values are
/// seconds and never negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CreatureTimers {
    pub flee: f32,
    pub observe: f32,
    pub player_detection: f32,
    pub warning: f32,
}

/// Count `timer` down by `dt`, clamping at zero. Returns true on the call
/// that brings it to zero.
pub(crate) fn countdown(timer: &mut f32, dt: f32) -> bool {
    if *timer <= 0.0 {
        *timer = 0.0;
        return false;
    }
    *timer = (*timer - dt).max(0.0);
    if *timer < TIMER_EPSILON {
        *timer = 0.0;
    }
    *timer == 0.0
}

/// Wrap an angle into (-PI, PI]
pub(crate) fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

#[derive(Debug, Clone)]
pub struct Creature {
    id: u64,
    stats: CreatureStats,
    pub(crate) position: Vec3,
    /// Yaw in radians; 0 faces +Z
    pub(crate) yaw: f32,
    pub(crate) state: BehaviorState,
    pub(crate) timers: CreatureTimers,
    pub(crate) target: Option<EntityRef>,
    pub(crate) nav: NavAgent,
    /// Presentation flag: Curious creature standing next to the player
    pub(crate) idle_curious: bool,
    /// In the Normal window that follows a flee
    pub(crate) observing: bool,
    home_tile: Option<u64>,
}

impl Creature {
    pub fn new(id: u64, stats: CreatureStats, position: Vec3, config: &WildsConfig) -> Self {
        let state = classify_behavior(stats.attack, stats.special_attack, &config.classification);
        Self {
            id,
            stats,
            position,
            yaw: 0.0,
            state,
            timers: CreatureTimers {
                player_detection: config.creatures.player_detection_max,
                ..Default::default()
            },
            target: None,
            nav: NavAgent::new(config.creatures.move_speed),
            idle_curious: false,
            observing: false,
            home_tile: None,
        }
    }

    pub fn from_species(id: u64, species: &Species, position: Vec3, config: &WildsConfig) -> Self {
        Self::new(id, species.creature_stats(), position, config)
    }

    pub fn with_home_tile(mut self, tile: u64) -> Self {
        self.home_tile = Some(tile);
        self
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = wrap_angle(yaw);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::creature(self.id)
    }

    pub fn stats(&self) -> CreatureStats {
        self.stats
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Unit vector the creature is facing, on the horizontal plane
    pub fn facing(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    pub fn behavior_state(&self) -> BehaviorState {
        self.state
    }

    /// Entity currently tracked in Strong state, if any
    pub fn target_reference(&self) -> Option<EntityRef> {
        self.target
    }

    pub fn timers(&self) -> &CreatureTimers {
        &self.timers
    }

    pub fn navigation(&self) -> &NavAgent {
        &self.nav
    }

    pub fn is_idle_curious(&self) -> bool {
        self.idle_curious
    }

    /// Normal only until the post-flee observation window runs out
    pub fn is_observing(&self) -> bool {
        self.observing
    }

    pub fn home_tile(&self) -> Option<u64> {
        self.home_tile
    }

    /// Drop a target that no longer exists
    pub fn forget_target(&mut self, entity: EntityRef) -> bool {
        if self.target == Some(entity) {
            self.target = None;
            self.timers.warning = 0.0;
            true
        } else {
            false
        }
    }

    /// Displaced by a Strong creature; any walk in progress is abandoned
    pub(crate) fn knock_back(&mut self, position: Vec3) {
        self.position = position;
        self.idle_curious = false;
        self.nav.stop();
    }

    /// Safety-valve transition back to Normal. Pending flee and warning
    /// state is discarded; a running observation window survives.
    pub(crate) fn force_normal(&mut self) {
        if self.state == BehaviorState::Normal {
            return;
        }
        tracing::debug!(creature = self.id, from = ?self.state, "player lost, forcing Normal");
        self.state = BehaviorState::Normal;
        self.timers.flee = 0.0;
        self.timers.warning = 0.0;
        self.target = None;
        self.idle_curious = false;
        self.nav.stop();
    }
}
