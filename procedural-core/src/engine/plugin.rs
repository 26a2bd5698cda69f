use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use tracing::debug;

use crate::constants::CREATURE_COLLIDER_RADIUS;
use crate::creature::BehaviorState;
use crate::engine::config::WildsConfig;
use crate::engine::messages::{Cue, PlayerSnapshot, SimEvent};
use crate::engine::simulation::{WildsEngine, WorldDefinition};

/// Runs a [`WildsEngine`] inside a bevy `App`, one engine tick per `Update`.
#[derive(Default)]
pub struct WildsPlugin {
    pub config: WildsConfig,
    pub world: WorldDefinition,
}

impl Plugin for WildsPlugin {
    fn build(&self, app: &mut App) {
        let engine = WildsEngine::new(self.config.clone(), self.world.clone());

        app.insert_resource(WildsEngineResource(Arc::new(RwLock::new(engine))))
            .add_event::<WildsSimEvent>()
            .add_event::<WarningCueEvent>()
            .add_systems(
                Update,
                (
                    engine_tick_system,
                    deliver_signals_system,
                    mirror_creatures_system,
                )
                    .chain(),
            );
    }
}

#[derive(Resource, Clone)]
pub struct WildsEngineResource(pub Arc<RwLock<WildsEngine>>);

/// Marks the entity whose `Transform` feeds the simulation's player
#[derive(Component, Debug, Default)]
pub struct WildsPlayer;

/// Bevy-side copy of a simulated creature
#[derive(Component, Debug, Clone)]
pub struct CreatureMirror {
    pub id: u64,
    pub state: BehaviorState,
}

/// Every event the engine raised this frame
#[derive(Event, Debug, Clone)]
pub struct WildsSimEvent(pub SimEvent);

/// A Strong creature started warning an intruder; hosts play the sound
#[derive(Event, Debug, Clone, Copy)]
pub struct WarningCueEvent {
    pub creature: u64,
}

/// Kinematic body for creature mirrors; the engine owns their position.
pub fn creature_physics_bundle() -> (RigidBody, Collider) {
    (
        RigidBody::KinematicPositionBased,
        Collider::ball(CREATURE_COLLIDER_RADIUS),
    )
}

fn engine_tick_system(
    time: Res<Time>,
    engine_res: Res<WildsEngineResource>,
    players: Query<(&Transform, Option<&Velocity>), With<WildsPlayer>>,
    mut sim_events: EventWriter<WildsSimEvent>,
) {
    let player = players
        .get_single()
        .ok()
        .map(|(transform, velocity)| PlayerSnapshot {
            position: transform.translation,
            velocity: velocity.map(|v| v.linvel).unwrap_or(Vec3::ZERO),
        });

    if let Ok(mut engine) = engine_res.0.write() {
        for event in engine.tick(time.delta_secs(), player) {
            sim_events.send(WildsSimEvent(event));
        }
    }
}

/// Hand player impulses to rapier and cues to bevy events. Creature
/// expulsions are already resolved inside the engine.
fn deliver_signals_system(
    mut commands: Commands,
    engine_res: Res<WildsEngineResource>,
    players: Query<Entity, With<WildsPlayer>>,
    mut cue_events: EventWriter<WarningCueEvent>,
) {
    let (impulses, cues) = match engine_res.0.write() {
        Ok(mut engine) => (engine.drain_impulses(), engine.drain_cues()),
        Err(_) => return,
    };

    for request in impulses.iter().filter(|r| r.target.is_player()) {
        match players.get_single() {
            Ok(entity) => {
                commands.entity(entity).insert(ExternalImpulse {
                    impulse: request.impulse,
                    torque_impulse: Vec3::ZERO,
                });
            }
            Err(_) => debug!(source = request.source, "player impulse dropped, no player entity"),
        }
    }

    for cue in cues {
        match cue {
            Cue::TerritoryWarning { creature } => {
                cue_events.send(WarningCueEvent { creature });
            }
        }
    }
}

/// Keep one entity per live creature, positioned where the engine says
fn mirror_creatures_system(
    mut commands: Commands,
    engine_res: Res<WildsEngineResource>,
    mut mirrors: Query<(Entity, &mut CreatureMirror, &mut Transform)>,
) {
    let Ok(engine) = engine_res.0.read() else {
        return;
    };

    let mut mirrored = HashSet::new();
    for (entity, mut mirror, mut transform) in &mut mirrors {
        match engine.creature(mirror.id) {
            Some(creature) => {
                transform.translation = creature.position();
                transform.rotation = creature.rotation();
                mirror.state = creature.behavior_state();
                mirrored.insert(mirror.id);
            }
            None => commands.entity(entity).despawn_recursive(),
        }
    }

    for creature in engine.creatures() {
        if mirrored.contains(&creature.id()) {
            continue;
        }
        commands.spawn((
            CreatureMirror {
                id: creature.id(),
                state: creature.behavior_state(),
            },
            Transform::from_translation(creature.position()).with_rotation(creature.rotation()),
            creature_physics_bundle(),
        ));
    }
}
