use std::collections::BTreeMap;

use bevy::prelude::*;
use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::{
    CREATURE_COLLIDER_RADIUS, PLAYER_COLLIDER_RADIUS, STATIC_LAND_ID_BASE, THROW_OUT_CLEARANCE,
};
use crate::creature::{
    BehaviorState, Creature, CreatureStateMachine, CreatureStats, SpeciesTable, TickContext,
};
use crate::engine::config::WildsConfig;
use crate::engine::messages::{Cue, ImpulseRequest, PlayerSnapshot, SignalBuffer, SimEvent, SimWarning};
use crate::generation::{GenerationSlot, LandTemplate, ResourceStationPlacer, WorldGrowthManager};
use crate::logging::tick_span;
use crate::rng::{seeded, SimRng};
use crate::session::{SessionClock, SessionStats};
use crate::spatial::{Aabb3, EntityKind, EntityRef, SpatialIndex, SpatialWorld, Volume};

/// Static content a world is built from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldDefinition {
    pub templates: Vec<LandTemplate>,
    pub slots: Vec<GenerationSlot>,
    pub species: SpeciesTable,
    /// Land that exists before the session starts; never pruned
    pub static_land: Vec<Aabb3>,
    pub obstacles: Vec<Volume>,
}

impl WorldDefinition {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Owns every simulated system and advances them in a fixed order.
pub struct WildsEngine {
    config: WildsConfig,
    spatial: SpatialWorld,
    growth: WorldGrowthManager,
    placer: ResourceStationPlacer,
    machine: CreatureStateMachine,
    species: SpeciesTable,
    creatures: BTreeMap<u64, Creature>,
    rng: Xoshiro256StarStar,
    impulses: SignalBuffer,
    cues: SignalBuffer,
    clock: SessionClock,
    stats: SessionStats,
    player: Option<PlayerSnapshot>,
    player_missing: bool,
    prune_timer: f32,
    next_creature_id: u64,
    ticks: u64,
}

impl WildsEngine {
    pub fn new(config: WildsConfig, world: WorldDefinition) -> Self {
        let mut spatial = SpatialWorld::new();
        for (i, bounds) in world.static_land.iter().enumerate() {
            spatial.insert(
                EntityRef::land(STATIC_LAND_ID_BASE + i as u64),
                Volume::Box(*bounds),
            );
        }
        for (i, volume) in world.obstacles.iter().enumerate() {
            spatial.insert(EntityRef::obstacle(i as u64), *volume);
        }

        let growth =
            WorldGrowthManager::new(config.growth.clone(), world.templates, world.slots, &spatial);
        info!(
            seed = config.seed,
            species = world.species.len(),
            "wilds engine created"
        );

        Self {
            placer: ResourceStationPlacer::new(config.stations.clone()),
            machine: CreatureStateMachine::new(config.creatures.clone()),
            clock: SessionClock::new(&config.session),
            rng: seeded(config.seed),
            species: world.species,
            spatial,
            growth,
            creatures: BTreeMap::new(),
            impulses: SignalBuffer::default(),
            cues: SignalBuffer::default(),
            stats: SessionStats::default(),
            player: None,
            player_missing: false,
            prune_timer: 0.0,
            next_creature_id: 1,
            ticks: 0,
            config,
        }
    }

    /// Advance the whole world by `dt` seconds. Returns the events raised
    /// during this tick.
    pub fn tick(&mut self, dt: f32, player: Option<PlayerSnapshot>) -> Vec<SimEvent> {
        let mut events = Vec::new();
        if self.clock.is_ended() {
            return events;
        }
        self.ticks += 1;
        let _span = tick_span(self.ticks, dt);
        if self.clock.tick(dt) {
            events.push(SimEvent::SessionEnded {
                elapsed: self.clock.elapsed(),
            });
            return events;
        }

        self.sync_player(player, &mut events);

        let generated = self.growth.tick(
            player.map(|p| p.position),
            &mut self.spatial,
            &mut self.rng,
            &self.placer,
            &mut events,
        );
        for tile in generated {
            if let Some(land_type) = self.growth.tile(tile).map(|t| t.land_type) {
                self.stats.record_land_type(land_type);
            }
            self.populate_tile(tile, &mut events);
        }

        if let Some(player) = player {
            self.run_prune_cadence(dt, player.position, &mut events);
        }

        self.tick_creatures(dt, player, &mut events);

        if let Some(player) = player {
            self.refill_at_stations(dt, player.position);
        }

        events
    }

    fn sync_player(&mut self, player: Option<PlayerSnapshot>, events: &mut Vec<SimEvent>) {
        self.player = player;
        match player {
            Some(p) => {
                self.spatial.insert(
                    EntityRef::PLAYER,
                    Volume::sphere(p.position, PLAYER_COLLIDER_RADIUS),
                );
                self.player_missing = false;
            }
            None => {
                self.spatial.remove(EntityRef::PLAYER);
                if !self.player_missing {
                    warn!("player reference unavailable, running degraded");
                    events.push(SimEvent::Warning(SimWarning::PlayerUnavailable));
                    self.player_missing = true;
                }
            }
        }
    }

    /// One creature per spawn point, species drawn from those the land admits
    fn populate_tile(&mut self, tile_id: u64, events: &mut Vec<SimEvent>) {
        let Some(tile) = self.growth.tile(tile_id) else {
            return;
        };
        if tile.spawn_points.is_empty() {
            return;
        }
        let (land_type, yaw, points) = (tile.land_type, tile.yaw, tile.spawn_points.clone());

        let admitted = self.species.for_land(land_type);
        if admitted.is_empty() {
            warn!(tile = tile_id, ?land_type, "no species for land type");
            events.push(SimEvent::Warning(SimWarning::NoSpeciesForLand { land_type }));
            return;
        }

        let count = points.len().min(admitted.len());
        if points.len() > admitted.len() {
            warn!(
                tile = tile_id,
                spawn_points = points.len(),
                species = admitted.len(),
                "more spawn points than species"
            );
            events.push(SimEvent::Warning(SimWarning::SpawnPointsExceedSpecies {
                tile: tile_id,
                spawned: count,
                requested: points.len(),
            }));
        }

        for point in points.into_iter().take(count) {
            let species = admitted[self.rng.gen_index(admitted.len())];
            let id = self.next_creature_id;
            self.next_creature_id += 1;

            let creature = Creature::from_species(id, species, point, &self.config)
                .with_home_tile(tile_id)
                .with_yaw(yaw);
            debug!(
                creature = id,
                species = %species.name,
                state = ?creature.behavior_state(),
                "creature spawned"
            );
            self.spatial.insert(
                creature.entity_ref(),
                Volume::sphere(point, CREATURE_COLLIDER_RADIUS),
            );
            events.push(SimEvent::CreatureSpawned {
                creature: id,
                species_id: species.id,
                tile: tile_id,
            });
            self.creatures.insert(id, creature);
        }
    }

    fn run_prune_cadence(&mut self, dt: f32, player: Vec3, events: &mut Vec<SimEvent>) {
        let interval = self.config.growth.prune_interval;
        self.prune_timer += dt;
        if interval <= 0.0 {
            self.prune_timer = 0.0;
            self.prune_once(player, events);
            return;
        }
        while self.prune_timer >= interval {
            self.prune_timer -= interval;
            self.prune_once(player, events);
        }
    }

    fn prune_once(&mut self, player: Vec3, events: &mut Vec<SimEvent>) {
        if let Some(tile) = self.growth.prune(player, &mut self.spatial, events) {
            self.despawn_tile_creatures(tile.id, events);
        }
    }

    fn despawn_tile_creatures(&mut self, tile: u64, events: &mut Vec<SimEvent>) {
        let doomed: Vec<u64> = self
            .creatures
            .values()
            .filter(|c| c.home_tile() == Some(tile))
            .map(Creature::id)
            .collect();

        for id in doomed {
            let entity = EntityRef::creature(id);
            self.creatures.remove(&id);
            self.spatial.remove(entity);
            for other in self.creatures.values_mut() {
                other.forget_target(entity);
            }
            debug!(creature = id, tile, "creature despawned with its land");
            events.push(SimEvent::CreatureDespawned { creature: id });
        }
    }

    fn tick_creatures(
        &mut self,
        dt: f32,
        player: Option<PlayerSnapshot>,
        events: &mut Vec<SimEvent>,
    ) {
        let mut roster: BTreeMap<u64, BehaviorState> = self
            .creatures
            .iter()
            .map(|(id, c)| (*id, c.behavior_state()))
            .collect();
        let mut claims: BTreeMap<EntityRef, u64> = BTreeMap::new();
        for creature in self.creatures.values() {
            if let Some(target) = creature.target_reference() {
                claims.entry(target).or_insert(creature.id());
            }
        }

        // Ascending id: the first Strong creature in order wins a contested
        // intruder.
        let ids: Vec<u64> = self.creatures.keys().copied().collect();
        for id in ids {
            let Some(creature) = self.creatures.get_mut(&id) else {
                continue;
            };
            let outcome = {
                let mut ctx = TickContext {
                    dt,
                    player,
                    spatial: &self.spatial,
                    roster: &roster,
                    claims: &claims,
                    impulses: &mut self.impulses,
                    cues: &mut self.cues,
                };
                self.machine.tick(creature, &mut ctx)
            };

            roster.insert(id, creature.behavior_state());
            claims.retain(|_, holder| *holder != id);
            if let Some(target) = creature.target_reference() {
                claims.entry(target).or_insert(id);
            }
            self.spatial
                .set_position(creature.entity_ref(), creature.position());
            let defender = creature.position();

            if outcome.player_in_range {
                self.stats.record_encounter(creature.stats().species_id);
            }
            if let Some(target) = outcome.expelled {
                match target.kind {
                    EntityKind::Player => self.stats.record_strong_attack(),
                    EntityKind::Creature => self.throw_creature_out(defender, target.id),
                    _ => {}
                }
                events.push(SimEvent::Expelled {
                    creature: id,
                    target,
                });
            }
        }
    }

    /// Creature positions are owned by the engine: an expelled creature
    /// lands straight away from the defender, just past its territory edge.
    fn throw_creature_out(&mut self, defender: Vec3, target: u64) {
        let Some(creature) = self.creatures.get_mut(&target) else {
            return;
        };
        let landing = self.config.creatures.territory_range
            + CREATURE_COLLIDER_RADIUS
            + THROW_OUT_CLEARANCE;
        let mut away = creature.position() - defender;
        away.y = 0.0;
        if away.length() >= landing {
            return;
        }
        let direction = away.try_normalize().unwrap_or(-creature.facing());
        let mut position = defender + direction * landing;
        position.y = creature.position().y;

        creature.knock_back(position);
        self.spatial.set_position(creature.entity_ref(), position);
        debug!(creature = target, ?position, "thrown out of territory");
    }

    fn refill_at_stations(&mut self, dt: f32, player: Vec3) {
        let radius = self.config.stations.interaction_radius;
        let at_station = self
            .growth
            .tiles()
            .iter()
            .filter_map(|tile| tile.station.as_ref())
            .any(|station| station.active && station.position.distance(player) <= radius);
        if at_station {
            self.clock.refill(self.config.stations.refill_rate * dt);
            self.stats.add_station_time(dt);
        }
    }

    /// Place a creature directly, outside any tile. Returns its id.
    pub fn spawn_creature(&mut self, stats: CreatureStats, position: Vec3) -> u64 {
        let id = self.next_creature_id;
        self.next_creature_id += 1;
        let creature = Creature::new(id, stats, position, &self.config);
        self.spatial.insert(
            creature.entity_ref(),
            Volume::sphere(position, CREATURE_COLLIDER_RADIUS),
        );
        self.creatures.insert(id, creature);
        id
    }

    /// Toggle the station on `tile`. Returns false if the tile has none.
    pub fn set_station_active(&mut self, tile: u64, active: bool) -> bool {
        match self
            .growth
            .tile_mut(tile)
            .and_then(|t| t.station.as_mut())
        {
            Some(station) => {
                station.set_active(active);
                true
            }
            None => false,
        }
    }

    /// Species count reported by the host's dex
    pub fn set_discovered_count(&mut self, count: u32) {
        self.stats.set_discovered(count);
    }

    pub fn creature(&self, id: u64) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    /// Live creatures in ascending id order
    pub fn creatures(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.values()
    }

    pub fn growth(&self) -> &WorldGrowthManager {
        &self.growth
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn spatial(&self) -> &SpatialWorld {
        &self.spatial
    }

    pub fn config(&self) -> &WildsConfig {
        &self.config
    }

    /// Player snapshot seen on the last tick
    pub fn player(&self) -> Option<PlayerSnapshot> {
        self.player
    }

    pub fn pending_impulses(&self) -> &[ImpulseRequest] {
        self.impulses.impulses()
    }

    pub fn drain_impulses(&mut self) -> Vec<ImpulseRequest> {
        self.impulses.drain_impulses()
    }

    pub fn drain_cues(&mut self) -> Vec<Cue> {
        self.cues.drain_cues()
    }
}
