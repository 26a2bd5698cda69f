//! Land streaming around the player.
//!
//! Growth is proximity-triggered: a generation slot near enough to the
//! player is consumed and stamps one tile. Pruning runs on its own cadence
//! and reclaims the tile farthest from the player whenever the live count
//! is over the cap, one tile per pass.

use bevy::prelude::*;
use tracing::{debug, info, warn};

use super::stations::{Placement, ResourceStationPlacer};
use super::{GenerationSlot, LandTemplate, LandTile};
use crate::engine::config::GrowthConfig;
use crate::engine::messages::{SimEvent, SimWarning};
use crate::rng::SimRng;
use crate::spatial::{EntityKind, SpatialIndex, SpatialQuery, Volume};

#[derive(Debug, Clone)]
pub struct WorldGrowthManager {
    config: GrowthConfig,
    templates: Vec<LandTemplate>,
    slots: Vec<GenerationSlot>,
    tiles: Vec<LandTile>,
    next_tile_id: u64,
}

impl WorldGrowthManager {
    /// Build the slot pool, discarding every slot that already has land
    /// nearby.
    pub fn new(
        config: GrowthConfig,
        templates: Vec<LandTemplate>,
        slots: Vec<GenerationSlot>,
        spatial: &dyn SpatialQuery,
    ) -> Self {
        let configured = slots.len();
        let slots: Vec<GenerationSlot> = slots
            .into_iter()
            .filter(|slot| !has_land_near(spatial, slot.position, config.land_check_radius))
            .collect();
        info!(
            configured,
            kept = slots.len(),
            templates = templates.len(),
            "world growth initialized"
        );
        Self {
            config,
            templates,
            slots,
            tiles: Vec::new(),
            next_tile_id: 1,
        }
    }

    pub fn config(&self) -> &GrowthConfig {
        &self.config
    }

    /// Slots still able to grow land
    pub fn slots(&self) -> &[GenerationSlot] {
        &self.slots
    }

    pub fn tiles(&self) -> &[LandTile] {
        &self.tiles
    }

    pub fn tile(&self, id: u64) -> Option<&LandTile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn tile_mut(&mut self, id: u64) -> Option<&mut LandTile> {
        self.tiles.iter_mut().find(|t| t.id == id)
    }

    pub fn live_tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Consume slots that are covered by land or close to the player.
    /// Returns the ids of tiles generated this tick.
    pub fn tick<S: SpatialIndex + ?Sized>(
        &mut self,
        player: Option<Vec3>,
        spatial: &mut S,
        rng: &mut dyn SimRng,
        placer: &ResourceStationPlacer,
        events: &mut Vec<SimEvent>,
    ) -> Vec<u64> {
        let mut generated = Vec::new();

        // Reverse so removal keeps the remaining indices valid
        for index in (0..self.slots.len()).rev() {
            let slot = self.slots[index];
            if has_land_near(&*spatial, slot.position, self.config.land_check_radius) {
                debug!(?slot.position, "slot covered by land, discarded");
                self.slots.remove(index);
                continue;
            }

            let Some(player) = player else {
                continue;
            };
            if player.distance(slot.position) <= self.config.generation_distance {
                self.slots.remove(index);
                if let Some(id) = self.generate_land(&slot, &mut *spatial, rng, placer, events) {
                    generated.push(id);
                }
            }
        }

        generated
    }

    /// Stamp a random template at `slot`, register it as land and try to
    /// give it a station. Returns `None` when no templates are configured.
    pub fn generate_land<S: SpatialIndex + ?Sized>(
        &mut self,
        slot: &GenerationSlot,
        spatial: &mut S,
        rng: &mut dyn SimRng,
        placer: &ResourceStationPlacer,
        events: &mut Vec<SimEvent>,
    ) -> Option<u64> {
        if self.templates.is_empty() {
            warn!("cannot generate land: no land templates configured");
            events.push(SimEvent::Warning(SimWarning::NoLandTemplates));
            return None;
        }

        let template = &self.templates[rng.gen_index(self.templates.len())];
        let id = self.next_tile_id;
        self.next_tile_id += 1;

        let mut tile = LandTile::instantiate(id, template, slot);
        spatial.insert(tile.entity_ref(), Volume::Box(tile.bounds));
        info!(tile = id, template = %tile.template, position = ?tile.position, "land generated");
        events.push(SimEvent::TileGenerated {
            tile: id,
            land_type: tile.land_type,
            position: tile.position,
        });

        match placer.place(&tile, &*spatial, rng) {
            Placement::Placed { station, .. } => {
                spatial.insert(
                    station.entity_ref(),
                    Volume::sphere(station.position, placer.config().clearance_radius),
                );
                events.push(SimEvent::StationPlaced {
                    tile: id,
                    position: station.position,
                    active: station.active,
                });
                tile.station = Some(station);
            }
            Placement::NoValidPosition { attempts } => {
                debug!(tile = id, attempts, "no valid resource-station position found");
                events.push(SimEvent::Warning(SimWarning::NoStationPosition { tile: id }));
            }
            Placement::Skipped => {}
        }

        self.tiles.push(tile);
        Some(id)
    }

    /// Remove the tile farthest from `player` if the world is over its cap.
    /// Ties go to the oldest tile. At most one tile is removed per call.
    pub fn prune<S: SpatialIndex + ?Sized>(
        &mut self,
        player: Vec3,
        spatial: &mut S,
        events: &mut Vec<SimEvent>,
    ) -> Option<LandTile> {
        let cap = self.config.max_live_tiles;
        if self.tiles.len() <= cap {
            return None;
        }

        let (index, distance) = self
            .tiles
            .iter()
            .enumerate()
            .map(|(i, tile)| (i, tile.position.distance(player)))
            .fold(None, |best: Option<(usize, f32)>, (i, d)| match best {
                Some((_, best_d)) if best_d >= d => best,
                _ => Some((i, d)),
            })?;

        let tile = self.tiles.remove(index);
        spatial.remove(tile.entity_ref());
        if let Some(station) = &tile.station {
            spatial.remove(station.entity_ref());
        }
        info!(tile = tile.id, distance, "removed farthest land");
        events.push(SimEvent::TilePruned {
            tile: tile.id,
            distance,
        });

        if self.tiles.len() > cap {
            warn!(live = self.tiles.len(), cap, "still over tile cap after pruning");
            events.push(SimEvent::Warning(SimWarning::TileCapExceeded {
                live: self.tiles.len(),
                cap,
            }));
        }
        Some(tile)
    }
}

fn has_land_near<Q: SpatialQuery + ?Sized>(spatial: &Q, position: Vec3, radius: f32) -> bool {
    spatial.any_of_kind(&Volume::sphere(position, radius), EntityKind::Land)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::StationConfig;
    use crate::generation::LandType;
    use crate::rng::seeded;
    use crate::spatial::{Aabb3, EntityRef, SpatialWorld};

    fn templates() -> Vec<LandTemplate> {
        vec![
            LandTemplate::new("meadow", LandType::GrassLand, Vec3::new(4.0, 0.5, 4.0)),
            LandTemplate::new("glacier", LandType::IceLand, Vec3::new(4.0, 0.5, 4.0)),
        ]
    }

    fn no_stations() -> ResourceStationPlacer {
        ResourceStationPlacer::new(StationConfig {
            placement_probability: 0.0,
            ..Default::default()
        })
    }

    fn config() -> GrowthConfig {
        GrowthConfig {
            land_check_radius: 5.0,
            generation_distance: 20.0,
            max_live_tiles: 3,
            prune_interval: 1.0,
        }
    }

    #[test]
    fn test_init_discards_slots_with_land() {
        let mut spatial = SpatialWorld::new();
        spatial.insert(
            EntityRef::land(99),
            Volume::Box(Aabb3::new(Vec3::ZERO, Vec3::new(4.0, 0.5, 4.0))),
        );
        let slots = vec![
            GenerationSlot::at(Vec3::new(6.0, 0.0, 0.0)),
            GenerationSlot::at(Vec3::new(40.0, 0.0, 0.0)),
        ];
        let manager = WorldGrowthManager::new(config(), templates(), slots, &spatial);
        assert_eq!(manager.slots().len(), 1);
        assert_eq!(manager.slots()[0].position.x, 40.0);
    }

    #[test]
    fn test_generates_only_near_player() {
        let mut spatial = SpatialWorld::new();
        let slots = vec![
            GenerationSlot::at(Vec3::new(10.0, 0.0, 0.0)),
            GenerationSlot::at(Vec3::new(100.0, 0.0, 0.0)),
        ];
        let mut manager = WorldGrowthManager::new(config(), templates(), slots, &spatial);
        let mut rng = seeded(1);
        let mut events = Vec::new();

        let generated = manager.tick(
            Some(Vec3::ZERO),
            &mut spatial,
            &mut rng,
            &no_stations(),
            &mut events,
        );
        assert_eq!(generated.len(), 1);
        assert_eq!(manager.live_tile_count(), 1);
        assert_eq!(manager.slots().len(), 1);
        assert!(spatial.contains(EntityRef::land(generated[0])));
        assert!(matches!(events[0], SimEvent::TileGenerated { .. }));
    }

    #[test]
    fn test_no_player_no_growth() {
        let mut spatial = SpatialWorld::new();
        let slots = vec![GenerationSlot::at(Vec3::ZERO)];
        let mut manager = WorldGrowthManager::new(config(), templates(), slots, &spatial);
        let mut rng = seeded(1);
        let mut events = Vec::new();
        manager.tick(None, &mut spatial, &mut rng, &no_stations(), &mut events);
        assert_eq!(manager.live_tile_count(), 0);
        assert_eq!(manager.slots().len(), 1);
    }

    #[test]
    fn test_adjacent_slot_dropped_after_neighbour_grows() {
        let mut spatial = SpatialWorld::new();
        // Processed in reverse: the slot at x=3 grows first, then the slot
        // at the origin finds land next to it.
        let slots = vec![
            GenerationSlot::at(Vec3::ZERO),
            GenerationSlot::at(Vec3::new(3.0, 0.0, 0.0)),
        ];
        let mut manager = WorldGrowthManager::new(config(), templates(), slots, &spatial);
        let mut rng = seeded(5);
        let mut events = Vec::new();
        let generated = manager.tick(
            Some(Vec3::ZERO),
            &mut spatial,
            &mut rng,
            &no_stations(),
            &mut events,
        );
        assert_eq!(generated.len(), 1);
        assert_eq!(manager.tiles()[0].position.x, 3.0);
        assert!(manager.slots().is_empty());
    }

    #[test]
    fn test_empty_templates_warn_and_consume_slot() {
        let mut spatial = SpatialWorld::new();
        let slots = vec![GenerationSlot::at(Vec3::ZERO)];
        let mut manager = WorldGrowthManager::new(config(), Vec::new(), slots, &spatial);
        let mut rng = seeded(1);
        let mut events = Vec::new();
        let generated = manager.tick(
            Some(Vec3::ZERO),
            &mut spatial,
            &mut rng,
            &no_stations(),
            &mut events,
        );
        assert!(generated.is_empty());
        assert!(manager.slots().is_empty());
        assert_eq!(
            events,
            vec![SimEvent::Warning(SimWarning::NoLandTemplates)]
        );
    }

    #[test]
    fn test_prune_removes_farthest_with_station() {
        let mut spatial = SpatialWorld::new();
        let mut manager = WorldGrowthManager::new(config(), templates(), Vec::new(), &spatial);
        let mut rng = seeded(2);
        let mut events = Vec::new();
        let always = ResourceStationPlacer::new(StationConfig {
            placement_probability: 1.0,
            ..Default::default()
        });
        for x in [1.0, 5.0, 9.0, 12.0] {
            manager.generate_land(
                &GenerationSlot::at(Vec3::new(x * 10.0, 0.0, 0.0)),
                &mut spatial,
                &mut rng,
                &always,
                &mut events,
            );
        }
        let farthest = manager.tiles()[3].clone();
        assert!(farthest.station.is_some());

        let removed = manager
            .prune(Vec3::ZERO, &mut spatial, &mut events)
            .unwrap();
        assert_eq!(removed.id, farthest.id);
        assert_eq!(manager.live_tile_count(), 3);
        assert!(!spatial.contains(EntityRef::land(farthest.id)));
        assert!(!spatial.contains(EntityRef::station(farthest.id)));

        // At the cap: nothing more to do
        assert!(manager.prune(Vec3::ZERO, &mut spatial, &mut events).is_none());
    }

    #[test]
    fn test_prune_one_tile_per_pass() {
        let mut spatial = SpatialWorld::new();
        let mut manager = WorldGrowthManager::new(config(), templates(), Vec::new(), &spatial);
        let mut rng = seeded(2);
        let mut events = Vec::new();
        for x in 0..5 {
            manager.generate_land(
                &GenerationSlot::at(Vec3::new(x as f32 * 20.0, 0.0, 0.0)),
                &mut spatial,
                &mut rng,
                &no_stations(),
                &mut events,
            );
        }
        events.clear();
        manager.prune(Vec3::ZERO, &mut spatial, &mut events);
        assert_eq!(manager.live_tile_count(), 4);
        assert!(events
            .iter()
            .any(|e| matches!(e, SimEvent::Warning(SimWarning::TileCapExceeded { live: 4, cap: 3 }))));
        manager.prune(Vec3::ZERO, &mut spatial, &mut events);
        assert_eq!(manager.live_tile_count(), 3);
    }

    #[test]
    fn test_prune_tie_removes_oldest() {
        let mut spatial = SpatialWorld::new();
        let cfg = GrowthConfig {
            max_live_tiles: 1,
            ..config()
        };
        let mut manager = WorldGrowthManager::new(cfg, templates(), Vec::new(), &spatial);
        let mut rng = seeded(2);
        let mut events = Vec::new();
        for x in [-30.0, 30.0] {
            manager.generate_land(
                &GenerationSlot::at(Vec3::new(x, 0.0, 0.0)),
                &mut spatial,
                &mut rng,
                &no_stations(),
                &mut events,
            );
        }
        let removed = manager.prune(Vec3::ZERO, &mut spatial, &mut events).unwrap();
        assert_eq!(removed.position.x, -30.0);
    }
}
