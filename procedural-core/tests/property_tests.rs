//! Property-based tests using proptest
//!
//! Invariants that must hold for all inputs:
//! - Classification: stats under the weak threshold → Weak, any stat over
//!   the strong threshold (and not both weak) → Strong
//! - Pruning: one tile per pass, the removed tile is the farthest
//! - Slots: each yields at most one tile no matter how the player moves
//! - Stations: placement never exceeds the attempt budget

use bevy::prelude::*;
use proptest::prelude::*;

use wilds_core::creature::{classify_behavior, BehaviorState};
use wilds_core::engine::config::{ClassificationThresholds, GrowthConfig, StationConfig};
use wilds_core::engine::{PlayerSnapshot, SimEvent, WildsConfig, WildsEngine, WorldDefinition};
use wilds_core::generation::{
    GenerationSlot, LandTemplate, LandTile, LandType, Placement, ResourceStationPlacer,
    WorldGrowthManager,
};
use wilds_core::rng::seeded;
use wilds_core::spatial::SpatialWorld;

fn coord() -> impl Strategy<Value = f32> {
    -200.0f32..200.0
}

fn point() -> impl Strategy<Value = Vec3> {
    (coord(), coord()).prop_map(|(x, z)| Vec3::new(x, 0.0, z))
}

// ============================================================
// Classification
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_low_stats_are_weak(attack in 0u32..50, special in 0u32..50) {
        let t = ClassificationThresholds::default();
        prop_assert_eq!(classify_behavior(attack, special, &t), BehaviorState::Weak);
    }

    #[test]
    fn prop_high_stat_is_strong(high in 111u32..300, other in 50u32..300, swap in any::<bool>()) {
        let t = ClassificationThresholds::default();
        let (attack, special) = if swap { (other, high) } else { (high, other) };
        prop_assert_eq!(classify_behavior(attack, special, &t), BehaviorState::Strong);
    }

    #[test]
    fn prop_classification_is_pure(attack in 0u32..300, special in 0u32..300) {
        let t = ClassificationThresholds::default();
        prop_assert_eq!(
            classify_behavior(attack, special, &t),
            classify_behavior(attack, special, &t)
        );
    }
}

// ============================================================
// Pruning
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_prune_removes_farthest_one_at_a_time(
        positions in prop::collection::vec(point(), 0..10),
        player in point(),
        cap in 1usize..5,
    ) {
        let mut spatial = SpatialWorld::new();
        let mut manager = WorldGrowthManager::new(
            GrowthConfig { max_live_tiles: cap, ..Default::default() },
            vec![LandTemplate::new("plain", LandType::GrassLand, Vec3::new(1.0, 0.5, 1.0))],
            Vec::new(),
            &spatial,
        );
        let placer = ResourceStationPlacer::new(StationConfig {
            placement_probability: 0.0,
            ..Default::default()
        });
        let mut rng = seeded(3);
        let mut events = Vec::new();
        for p in &positions {
            manager.generate_land(&GenerationSlot::at(*p), &mut spatial, &mut rng, &placer, &mut events);
        }

        let mut live = manager.live_tile_count();
        while live > cap {
            let farthest = manager
                .tiles()
                .iter()
                .map(|t| t.position.distance(player))
                .fold(f32::MIN, f32::max);
            let removed = manager.prune(player, &mut spatial, &mut events);
            let removed = removed.expect("over cap must prune");
            prop_assert_eq!(removed.position.distance(player), farthest);
            prop_assert_eq!(manager.live_tile_count(), live - 1);
            live -= 1;
        }
        prop_assert!(manager.prune(player, &mut spatial, &mut events).is_none());
        prop_assert_eq!(live, positions.len().min(cap));
    }
}

// ============================================================
// Slots
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_each_slot_yields_at_most_one_tile(
        slots in prop::collection::vec(point(), 1..8),
        path in prop::collection::vec(point(), 1..30),
        seed in any::<u64>(),
    ) {
        let config = WildsConfig { seed, ..Default::default() };
        let slot_count = slots.len();
        let world = WorldDefinition {
            templates: vec![LandTemplate::new("plain", LandType::FireLand, Vec3::new(2.0, 0.5, 2.0))],
            slots: slots.into_iter().map(GenerationSlot::at).collect(),
            ..Default::default()
        };
        let mut engine = WildsEngine::new(config, world);

        let mut generated = 0;
        for p in path {
            for event in engine.tick(0.5, Some(PlayerSnapshot::at(p))) {
                if matches!(event, SimEvent::TileGenerated { .. }) {
                    generated += 1;
                }
            }
        }
        prop_assert!(generated + engine.growth().slots().len() <= slot_count);
    }
}

// ============================================================
// Stations
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_station_attempts_bounded(seed in any::<u64>(), attempts in 1u32..20) {
        let tile = LandTile::instantiate(
            1,
            &LandTemplate::new("plain", LandType::Night, Vec3::new(3.0, 0.5, 3.0)),
            &GenerationSlot::at(Vec3::ZERO),
        );
        let spatial = SpatialWorld::new();
        let placer = ResourceStationPlacer::new(StationConfig {
            placement_probability: 1.0,
            max_spawn_attempts: attempts,
            ..Default::default()
        });
        match placer.place(&tile, &spatial, &mut seeded(seed)) {
            Placement::Placed { station, attempts: used } => {
                prop_assert!(used >= 1 && used <= attempts);
                prop_assert!(tile.bounds.min().x <= station.position.x);
                prop_assert!(station.position.x <= tile.bounds.max().x);
                prop_assert!(tile.bounds.min().z <= station.position.z);
                prop_assert!(station.position.z <= tile.bounds.max().z);
            }
            other => prop_assert!(false, "empty world must accept a station, got {:?}", other),
        }
    }
}
