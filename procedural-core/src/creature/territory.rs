//! Territory defence for Strong creatures.
//!
//! A Strong creature locks onto the first intruder in its territory (the
//! player, or any creature that is not itself Strong), warns it once, and
//! throws it out after the intrusion has lasted longer than the attack
//! threshold. Only one intruder is tracked at a time, and an intruder held
//! by one Strong creature cannot be taken by another until it is released.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::ai::TickContext;
use super::{BehaviorState, Creature};
use crate::engine::config::{CreatureTuning, WarningResetPolicy};
use crate::engine::messages::{Cue, ImpulseRequest};
use crate::spatial::{EntityKind, EntityRef, SpatialHit, Volume};

#[derive(Debug, Clone)]
pub struct TerritoryConflictResolver {
    pub territory_range: f32,
    pub attack_threshold: f32,
    pub throw_out_force: f32,
    pub reset_policy: WarningResetPolicy,
}

impl TerritoryConflictResolver {
    pub fn from_tuning(tuning: &CreatureTuning) -> Self {
        Self {
            territory_range: tuning.territory_range,
            attack_threshold: tuning.attack_threshold,
            throw_out_force: tuning.throw_out_force,
            reset_policy: tuning.warning_reset,
        }
    }

    /// Whether `candidate` may be targeted by the creature `defender`
    pub fn is_intruder(
        defender: EntityRef,
        candidate: EntityRef,
        roster: &BTreeMap<u64, BehaviorState>,
    ) -> bool {
        match candidate.kind {
            EntityKind::Player => true,
            EntityKind::Creature => {
                candidate != defender
                    && roster
                        .get(&candidate.id)
                        .is_some_and(|state| *state != BehaviorState::Strong)
            }
            _ => false,
        }
    }

    /// Advance one Strong creature's territory logic. Returns the entity
    /// expelled this tick, if any.
    pub fn evaluate(&self, creature: &mut Creature, ctx: &mut TickContext<'_>) -> Option<EntityRef> {
        let me = creature.entity_ref();
        let hits = ctx
            .spatial
            .overlap(&Volume::sphere(creature.position, self.territory_range));

        if creature.target.is_none() {
            creature.target = hits
                .iter()
                .map(|hit| hit.entity)
                .filter(|entity| ctx.claims.get(entity).is_none_or(|holder| *holder == me.id))
                .find(|entity| Self::is_intruder(me, *entity, ctx.roster));
            if let Some(target) = creature.target {
                debug!(creature = me.id, ?target, "intruder acquired");
            }
        }

        let Some(target) = creature.target else {
            creature.timers.warning = 0.0;
            return None;
        };

        // Left the territory, or no longer exists
        let Some(hit) = hits.iter().find(|hit| hit.entity == target).copied() else {
            debug!(creature = me.id, ?target, "intruder gone");
            creature.target = None;
            creature.timers.warning = 0.0;
            return None;
        };

        let before = creature.timers.warning;
        creature.timers.warning += ctx.dt;
        if before == 0.0 && creature.timers.warning > 0.0 {
            ctx.cues.play_cue(Cue::TerritoryWarning { creature: me.id });
            debug!(creature = me.id, ?target, "warning intruder");
        }

        if creature.timers.warning > self.attack_threshold {
            self.expel(creature, hit, ctx);
            return Some(target);
        }
        None
    }

    fn expel(&self, creature: &mut Creature, hit: SpatialHit, ctx: &mut TickContext<'_>) {
        let direction = (hit.position - creature.position)
            .try_normalize()
            .unwrap_or_else(|| creature.facing());
        let impulse = direction * self.throw_out_force;
        ctx.impulses.apply_impulse(ImpulseRequest {
            source: creature.id(),
            target: hit.entity,
            impulse,
        });
        info!(creature = creature.id(), target = ?hit.entity, ?impulse, "intruder expelled");

        creature.target = None;
        if self.reset_policy == WarningResetPolicy::OnExpulsion {
            creature.timers.warning = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::CreatureStats;
    use crate::engine::config::WildsConfig;
    use crate::engine::messages::{PlayerSnapshot, SignalBuffer};
    use crate::spatial::{EntityRef, SpatialIndex, SpatialWorld};
    use bevy::prelude::*;

    fn strong(id: u64, position: Vec3) -> Creature {
        let stats = CreatureStats {
            species_id: 9,
            attack: 150,
            special_attack: 90,
        };
        Creature::new(id, stats, position, &WildsConfig::default())
    }

    struct Harness {
        spatial: SpatialWorld,
        roster: BTreeMap<u64, BehaviorState>,
        claims: BTreeMap<EntityRef, u64>,
        impulses: SignalBuffer,
        cues: SignalBuffer,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                spatial: SpatialWorld::new(),
                roster: BTreeMap::new(),
                claims: BTreeMap::new(),
                impulses: SignalBuffer::default(),
                cues: SignalBuffer::default(),
            }
        }

        fn eval(
            &mut self,
            resolver: &TerritoryConflictResolver,
            creature: &mut Creature,
            dt: f32,
        ) -> Option<EntityRef> {
            let mut ctx = TickContext {
                dt,
                player: Some(PlayerSnapshot::default()),
                spatial: &self.spatial,
                roster: &self.roster,
                claims: &self.claims,
                impulses: &mut self.impulses,
                cues: &mut self.cues,
            };
            resolver.evaluate(creature, &mut ctx)
        }
    }

    fn resolver(policy: WarningResetPolicy) -> TerritoryConflictResolver {
        let tuning = CreatureTuning {
            warning_reset: policy,
            ..Default::default()
        };
        TerritoryConflictResolver::from_tuning(&tuning)
    }

    #[test]
    fn test_intruder_rules() {
        let me = EntityRef::creature(1);
        let mut roster = BTreeMap::new();
        roster.insert(1, BehaviorState::Strong);
        roster.insert(2, BehaviorState::Strong);
        roster.insert(3, BehaviorState::Weak);

        assert!(TerritoryConflictResolver::is_intruder(me, EntityRef::PLAYER, &roster));
        assert!(!TerritoryConflictResolver::is_intruder(me, me, &roster));
        assert!(!TerritoryConflictResolver::is_intruder(me, EntityRef::creature(2), &roster));
        assert!(TerritoryConflictResolver::is_intruder(me, EntityRef::creature(3), &roster));
        assert!(!TerritoryConflictResolver::is_intruder(me, EntityRef::creature(4), &roster));
        assert!(!TerritoryConflictResolver::is_intruder(me, EntityRef::land(1), &roster));
    }

    #[test]
    fn test_no_intruder_resets_warning() {
        let r = resolver(WarningResetPolicy::OnExpulsion);
        let mut h = Harness::new();
        let mut c = strong(1, Vec3::ZERO);
        c.timers.warning = 1.2;
        assert!(h.eval(&r, &mut c, 0.1).is_none());
        assert_eq!(c.timers().warning, 0.0);
        assert!(c.target_reference().is_none());
    }

    #[test]
    fn test_warning_cue_fires_once_then_expels() {
        let r = resolver(WarningResetPolicy::OnExpulsion);
        let mut h = Harness::new();
        h.spatial
            .insert(EntityRef::PLAYER, Volume::sphere(Vec3::new(3.0, 0.0, 0.0), 0.5));
        let mut c = strong(1, Vec3::ZERO);

        let mut expelled = Vec::new();
        for _ in 0..25 {
            if let Some(e) = h.eval(&r, &mut c, 0.1) {
                expelled.push(e);
                break;
            }
        }
        assert_eq!(expelled, vec![EntityRef::PLAYER]);
        assert_eq!(h.cues.cues().len(), 1);

        let impulses = h.impulses.impulses();
        assert_eq!(impulses.len(), 1);
        assert!((impulses[0].impulse - Vec3::new(r.throw_out_force, 0.0, 0.0)).length() < 1e-4);
        assert!(c.target_reference().is_none());
        assert_eq!(c.timers().warning, 0.0);
    }

    #[test]
    fn test_claimed_intruder_is_skipped() {
        let r = resolver(WarningResetPolicy::OnExpulsion);
        let mut h = Harness::new();
        h.roster.insert(5, BehaviorState::Weak);
        h.spatial
            .insert(EntityRef::PLAYER, Volume::sphere(Vec3::new(2.0, 0.0, 0.0), 0.5));
        h.spatial
            .insert(EntityRef::creature(5), Volume::sphere(Vec3::new(-2.0, 0.0, 0.0), 0.5));
        h.claims.insert(EntityRef::PLAYER, 2);
        let mut c = strong(1, Vec3::ZERO);

        h.eval(&r, &mut c, 0.1);
        assert_eq!(c.target_reference(), Some(EntityRef::creature(5)));

        h.claims.insert(EntityRef::creature(5), 1);
        h.eval(&r, &mut c, 0.1);
        assert_eq!(c.target_reference(), Some(EntityRef::creature(5)));
    }

    #[test]
    fn test_intruder_leaving_clears_target() {
        let r = resolver(WarningResetPolicy::OnExpulsion);
        let mut h = Harness::new();
        h.roster.insert(5, BehaviorState::Weak);
        h.spatial
            .insert(EntityRef::creature(5), Volume::sphere(Vec3::new(2.0, 0.0, 0.0), 0.5));
        let mut c = strong(1, Vec3::ZERO);

        h.eval(&r, &mut c, 0.5);
        assert_eq!(c.target_reference(), Some(EntityRef::creature(5)));
        assert!(c.timers().warning > 0.0);

        h.spatial
            .set_position(EntityRef::creature(5), Vec3::new(50.0, 0.0, 0.0));
        h.eval(&r, &mut c, 0.5);
        assert!(c.target_reference().is_none());
        assert_eq!(c.timers().warning, 0.0);
        assert!(h.impulses.impulses().is_empty());
    }

    #[test]
    fn test_destroyed_target_is_dropped() {
        let r = resolver(WarningResetPolicy::OnExpulsion);
        let mut h = Harness::new();
        h.roster.insert(5, BehaviorState::Curious);
        h.spatial
            .insert(EntityRef::creature(5), Volume::sphere(Vec3::X, 0.5));
        let mut c = strong(1, Vec3::ZERO);
        h.eval(&r, &mut c, 0.5);
        assert!(c.target_reference().is_some());

        h.spatial.remove(EntityRef::creature(5));
        h.roster.remove(&5);
        h.eval(&r, &mut c, 0.5);
        assert!(c.target_reference().is_none());
    }

    #[test]
    fn test_strong_neighbours_are_ignored() {
        let r = resolver(WarningResetPolicy::OnExpulsion);
        let mut h = Harness::new();
        h.roster.insert(1, BehaviorState::Strong);
        h.roster.insert(2, BehaviorState::Strong);
        h.spatial
            .insert(EntityRef::creature(1), Volume::sphere(Vec3::ZERO, 0.5));
        h.spatial
            .insert(EntityRef::creature(2), Volume::sphere(Vec3::X, 0.5));
        let mut c = strong(1, Vec3::ZERO);
        for _ in 0..40 {
            h.eval(&r, &mut c, 0.1);
        }
        assert!(c.target_reference().is_none());
        assert!(h.cues.cues().is_empty());
    }

    #[test]
    fn test_reset_on_expulsion_restarts_episode() {
        let r = resolver(WarningResetPolicy::OnExpulsion);
        let mut h = Harness::new();
        h.spatial
            .insert(EntityRef::PLAYER, Volume::sphere(Vec3::new(1.0, 0.0, 0.0), 0.5));
        let mut c = strong(1, Vec3::ZERO);

        // Intruder never leaves: each expulsion is followed by a new warning
        let mut expulsions = 0;
        for _ in 0..100 {
            if h.eval(&r, &mut c, 0.1).is_some() {
                expulsions += 1;
                if expulsions == 2 {
                    break;
                }
            }
        }
        assert_eq!(expulsions, 2);
        assert_eq!(h.cues.cues().len(), 2);
        assert_eq!(c.timers().warning, 0.0);
    }

    #[test]
    fn test_reset_on_absence_expels_again_immediately() {
        let r = resolver(WarningResetPolicy::OnAbsence);
        let mut h = Harness::new();
        h.spatial
            .insert(EntityRef::PLAYER, Volume::sphere(Vec3::new(1.0, 0.0, 0.0), 0.5));
        let mut c = strong(1, Vec3::ZERO);

        let mut first = None;
        for tick in 0..30 {
            if h.eval(&r, &mut c, 0.1).is_some() {
                first = Some(tick);
                break;
            }
        }
        assert!(first.is_some());
        assert!(c.timers().warning > r.attack_threshold);

        // Still in range: reacquired and thrown again on the next tick, no new cue
        assert_eq!(h.eval(&r, &mut c, 0.1), Some(EntityRef::PLAYER));
        assert_eq!(h.cues.cues().len(), 1);
        assert_eq!(h.impulses.impulses().len(), 2);

        // Gone: timer resets
        h.spatial.remove(EntityRef::PLAYER);
        h.eval(&r, &mut c, 0.1);
        assert_eq!(c.timers().warning, 0.0);
    }
}
