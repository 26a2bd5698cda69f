//! Creature behavior state machine.
//!
//! One call to [`CreatureStateMachine::tick`] advances a single creature by
//! `dt` seconds. Each tick runs, in order:
//! 1. facing toward the player's horizontal bearing
//! 2. the state-specific step (flee / observe / approach / territory)
//! 3. the proximity fallback that returns abandoned creatures to Normal
//! 4. navigation movement
//!
//! Without a player every range-based decision is skipped; countdowns and
//! territory defence keep running.

use std::collections::BTreeMap;

use bevy::prelude::*;
use tracing::debug;

use super::territory::TerritoryConflictResolver;
use super::{countdown, wrap_angle, BehaviorState, Creature};
use crate::engine::config::CreatureTuning;
use crate::engine::messages::{CueSink, ImpulseSink, PlayerSnapshot};
use crate::spatial::{EntityRef, SpatialQuery};

/// Everything a creature may read or signal during its tick
pub struct TickContext<'a> {
    pub dt: f32,
    pub player: Option<PlayerSnapshot>,
    pub spatial: &'a dyn SpatialQuery,
    /// Current behavior state of every live creature, by id
    pub roster: &'a BTreeMap<u64, BehaviorState>,
    /// Intruders already held, and the creature holding each
    pub claims: &'a BTreeMap<EntityRef, u64>,
    pub impulses: &'a mut dyn ImpulseSink,
    pub cues: &'a mut dyn CueSink,
}

/// What happened to a creature during one tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickOutcome {
    /// Player was inside one of the detection ranges
    pub player_in_range: bool,
    /// Entity thrown out of this creature's territory
    pub expelled: Option<EntityRef>,
}

#[derive(Debug, Clone)]
pub struct CreatureStateMachine {
    tuning: CreatureTuning,
    territory: TerritoryConflictResolver,
}

impl CreatureStateMachine {
    pub fn new(tuning: CreatureTuning) -> Self {
        Self {
            territory: TerritoryConflictResolver::from_tuning(&tuning),
            tuning,
        }
    }

    pub fn tuning(&self) -> &CreatureTuning {
        &self.tuning
    }

    pub fn territory(&self) -> &TerritoryConflictResolver {
        &self.territory
    }

    pub fn tick(&self, creature: &mut Creature, ctx: &mut TickContext<'_>) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        let player = ctx.player;

        if let Some(player) = player {
            self.update_facing(creature, player.position, ctx.dt);
        }

        match creature.state {
            BehaviorState::Weak => self.step_weak(creature, player, ctx.dt),
            BehaviorState::Normal => self.step_normal(creature, ctx.dt),
            BehaviorState::Curious => self.step_curious(creature, player),
            BehaviorState::Strong => {
                outcome.expelled = self.territory.evaluate(creature, ctx);
            }
        }

        if let Some(player) = player {
            outcome.player_in_range = self.proximity_fallback(creature, player.position, ctx.dt);
        }

        creature.position = creature.nav.advance(creature.position, ctx.dt);
        outcome
    }

    /// Turn toward the player at a bounded angular rate. Height is ignored.
    fn update_facing(&self, creature: &mut Creature, target: Vec3, dt: f32) {
        let mut to_target = target - creature.position;
        to_target.y = 0.0;
        if to_target.length_squared() < 1e-6 {
            return;
        }
        let desired = to_target.x.atan2(to_target.z);
        let delta = wrap_angle(desired - creature.yaw);
        let max_step = self.tuning.turn_rate * dt;
        creature.yaw = wrap_angle(creature.yaw + delta.clamp(-max_step, max_step));
    }

    fn step_weak(&self, creature: &mut Creature, player: Option<PlayerSnapshot>, dt: f32) {
        if creature.timers.flee > 0.0 {
            if countdown(&mut creature.timers.flee, dt) {
                self.finish_flee(creature);
            }
            return;
        }

        let Some(player) = player else {
            return;
        };
        if creature.position.distance(player.position) < self.tuning.flee_range {
            let away = (creature.position - player.position)
                .try_normalize()
                .unwrap_or(-creature.facing());
            let destination = creature.position + away * self.tuning.flee_range;
            creature.nav.set_destination(destination);
            creature.timers.flee = self.tuning.flee_duration;
            debug!(creature = creature.id(), ?destination, "fleeing from player");
            if creature.timers.flee <= 0.0 {
                self.finish_flee(creature);
            }
        }
    }

    fn finish_flee(&self, creature: &mut Creature) {
        creature.timers.flee = 0.0;
        creature.state = BehaviorState::Normal;
        creature.timers.observe = self.tuning.observation_window;
        creature.observing = true;
        creature.nav.stop();
        debug!(creature = creature.id(), "flee finished, observing");
    }

    fn step_normal(&self, creature: &mut Creature, dt: f32) {
        if !creature.observing {
            return;
        }
        if creature.timers.observe <= 0.0 || countdown(&mut creature.timers.observe, dt) {
            creature.timers.observe = 0.0;
            creature.observing = false;
            creature.state = BehaviorState::Weak;
            debug!(creature = creature.id(), "observation over, back to Weak");
        }
    }

    fn step_curious(&self, creature: &mut Creature, player: Option<PlayerSnapshot>) {
        let Some(player) = player else {
            return;
        };
        if creature.position.distance(player.position) >= self.tuning.curiosity_range {
            creature.idle_curious = false;
            return;
        }
        creature.nav.set_destination(player.position);
        if creature.nav.remaining_distance(creature.position) <= self.tuning.stopping_distance {
            creature.nav.stop();
            creature.idle_curious = true;
        } else {
            creature.idle_curious = false;
        }
    }

    /// Keep the detection timer full while the player is near; once it runs
    /// out, the creature falls back to Normal. Returns whether the player was
    /// in range.
    fn proximity_fallback(&self, creature: &mut Creature, player: Vec3, dt: f32) -> bool {
        let in_range = creature.position.distance(player) < self.tuning.max_detection_range();
        if in_range {
            creature.timers.player_detection = self.tuning.player_detection_max;
        } else {
            countdown(&mut creature.timers.player_detection, dt);
            if creature.timers.player_detection == 0.0 {
                creature.force_normal();
            }
        }
        in_range
    }
}
