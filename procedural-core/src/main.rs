//! Headless demo: a scripted player walks a loop through the growing world
//! until the session clock runs out, then prints the results screen.
//!
//! Usage: `wilds-sim [--verbose] [config.json] [world.json]`

use std::time::Duration;

use anyhow::{Context, Result};
use bevy::app::{AppExit, ScheduleRunnerPlugin};
use bevy::prelude::*;
use tracing::{debug, info, warn};

use wilds_core::creature::{BaseStats, Species, SpeciesTable};
use wilds_core::engine::{
    SimEvent, WarningCueEvent, WildsConfig, WildsEngineResource, WildsPlayer, WildsPlugin,
    WildsSimEvent, WorldDefinition,
};
use wilds_core::generation::{GenerationSlot, LandTemplate, LandType};
use wilds_core::logging::LoggingPlugin;

/// Simulated seconds per real second
const DEMO_TIME_SCALE: f32 = 20.0;

/// Radius and angular speed of the player's walk
const WALK_RADIUS: f32 = 45.0;
const WALK_ANGULAR_SPEED: f32 = 0.08;

fn main() -> Result<()> {
    let (flags, paths): (Vec<String>, Vec<String>) =
        std::env::args().skip(1).partition(|a| a.starts_with("--"));
    let logging = if flags.iter().any(|f| f == "--verbose") {
        LoggingPlugin::verbose()
    } else {
        LoggingPlugin::default()
    };

    let mut args = paths.into_iter();
    let config = match args.next() {
        Some(path) => WildsConfig::load(&path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => WildsConfig::default(),
    };
    let world = match args.next() {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read world from {path}"))?;
            WorldDefinition::from_json(&raw)
                .with_context(|| format!("failed to parse world from {path}"))?
        }
        None => demo_world(),
    };

    let exit = App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(
            Duration::from_secs_f64(1.0 / 60.0),
        )))
        .add_plugins(logging)
        .add_plugins(WildsPlugin { config, world })
        .add_systems(Startup, setup)
        .add_systems(Update, (walk_player, report_events).chain())
        .run();

    match exit {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => anyhow::bail!("simulation exited with code {code}"),
    }
}

fn setup(mut commands: Commands, mut time: ResMut<Time<Virtual>>) {
    time.set_relative_speed(DEMO_TIME_SCALE);
    commands.spawn((WildsPlayer, Transform::from_xyz(WALK_RADIUS, 0.0, 0.0)));
    info!("demo started");
}

fn walk_player(time: Res<Time>, mut players: Query<&mut Transform, With<WildsPlayer>>) {
    let angle = time.elapsed_secs() * WALK_ANGULAR_SPEED;
    for mut transform in &mut players {
        transform.translation = Vec3::new(WALK_RADIUS * angle.cos(), 0.0, WALK_RADIUS * angle.sin());
    }
}

fn report_events(
    engine_res: Res<WildsEngineResource>,
    mut sim_events: EventReader<WildsSimEvent>,
    mut cues: EventReader<WarningCueEvent>,
    mut exit: EventWriter<AppExit>,
) {
    for cue in cues.read() {
        debug!(creature = cue.creature, "territory warning cue");
    }

    for WildsSimEvent(event) in sim_events.read() {
        match event {
            SimEvent::Warning(warning) => warn!(%warning, "simulation warning"),
            SimEvent::TileGenerated { tile, land_type, .. } => {
                info!(tile, ?land_type, "new land")
            }
            SimEvent::Expelled { creature, target } => {
                info!(creature, ?target, "thrown out of territory")
            }
            SimEvent::SessionEnded { elapsed } => {
                let Ok(engine) = engine_res.0.read() else {
                    continue;
                };
                let stats = engine.stats();
                info!(
                    elapsed,
                    species_encountered = stats.unique_species_encountered(),
                    land_types = stats.land_types_encountered(),
                    strong_attacks = stats.strong_attacks(),
                    station_time = stats.station_time(),
                    score = stats.score(),
                    "session over"
                );
                exit.send(AppExit::Success);
            }
            _ => {}
        }
    }
}

fn demo_world() -> WorldDefinition {
    let spawn_points = vec![
        Vec3::new(3.0, 1.0, 0.0),
        Vec3::new(-3.0, 1.0, 2.0),
        Vec3::new(0.0, 1.0, -3.0),
    ];
    let templates = LandType::all()
        .into_iter()
        .map(|land_type| {
            LandTemplate::new(
                format!("{land_type:?}").to_lowercase(),
                land_type,
                Vec3::new(8.0, 0.5, 8.0),
            )
            .with_spawn_points(spawn_points.clone())
        })
        .collect();

    let slots = (0..16)
        .map(|i| {
            let angle = i as f32 / 16.0 * std::f32::consts::TAU;
            GenerationSlot {
                position: Vec3::new(angle.cos(), 0.0, angle.sin()) * WALK_RADIUS,
                yaw: angle,
            }
        })
        .collect();

    WorldDefinition {
        templates,
        slots,
        species: demo_species(),
        ..Default::default()
    }
}

fn demo_species() -> SpeciesTable {
    let entries: [(u32, &str, &[&str], [u32; 6]); 10] = [
        (1, "Bulbasaur", &["Grass", "Poison"], [45, 49, 49, 65, 65, 45]),
        (10, "Caterpie", &["Bug"], [45, 30, 35, 20, 20, 45]),
        (4, "Charmander", &["Fire"], [39, 52, 43, 60, 50, 65]),
        (126, "Magmar", &["Fire"], [65, 95, 57, 100, 85, 93]),
        (7, "Squirtle", &["Water"], [44, 48, 65, 50, 64, 43]),
        (131, "Lapras", &["Water", "Ice"], [130, 85, 80, 85, 95, 60]),
        (92, "Gastly", &["Ghost", "Poison"], [30, 35, 30, 100, 35, 80]),
        (197, "Umbreon", &["Dark"], [95, 65, 110, 60, 130, 65]),
        (74, "Geodude", &["Rock", "Ground"], [40, 80, 100, 30, 30, 20]),
        (248, "Tyranitar", &["Rock", "Dark"], [100, 134, 110, 95, 100, 61]),
    ];
    SpeciesTable::new(
        entries
            .into_iter()
            .map(|(id, name, types, [hp, attack, defense, sp_attack, sp_defense, speed])| Species {
                id,
                name: name.to_string(),
                types: types.iter().map(|t| t.to_string()).collect(),
                base: BaseStats {
                    hp,
                    attack,
                    defense,
                    sp_attack,
                    sp_defense,
                    speed,
                },
            })
            .collect(),
    )
}
