//! Spatial queries over the simulated world.
//!
//! The core only ever asks "what overlaps this volume". Every entity record
//! carries an explicit [`EntityKind`], resolved once at registration, so no
//! caller has to guess whether a hit is land, the player or a creature.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Classification of a registered entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Creature,
    Land,
    Station,
    Obstacle,
}

/// Non-owning handle to any entity the core can see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: u64,
}

impl EntityRef {
    pub const PLAYER: EntityRef = EntityRef {
        kind: EntityKind::Player,
        id: 0,
    };

    pub fn creature(id: u64) -> Self {
        Self {
            kind: EntityKind::Creature,
            id,
        }
    }

    pub fn land(id: u64) -> Self {
        Self {
            kind: EntityKind::Land,
            id,
        }
    }

    pub fn station(id: u64) -> Self {
        Self {
            kind: EntityKind::Station,
            id,
        }
    }

    pub fn obstacle(id: u64) -> Self {
        Self {
            kind: EntityKind::Obstacle,
            id,
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }
}

/// Axis-aligned box given by center and half extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb3 {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Aabb3 {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }

    pub fn top(&self) -> f32 {
        self.center.y + self.half_extents.y
    }

    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min(), self.max())
    }
}

/// Shape of a query or of a registered collider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Volume {
    Sphere { center: Vec3, radius: f32 },
    Box(Aabb3),
}

impl Volume {
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Volume::Sphere { center, radius }
    }

    pub fn center(&self) -> Vec3 {
        match self {
            Volume::Sphere { center, .. } => *center,
            Volume::Box(aabb) => aabb.center,
        }
    }

    /// Inclusive overlap test: touching volumes count as overlapping
    pub fn intersects(&self, other: &Volume) -> bool {
        match (self, other) {
            (
                Volume::Sphere {
                    center: a,
                    radius: ra,
                },
                Volume::Sphere {
                    center: b,
                    radius: rb,
                },
            ) => a.distance_squared(*b) <= (ra + rb) * (ra + rb),
            (Volume::Sphere { center, radius }, Volume::Box(aabb))
            | (Volume::Box(aabb), Volume::Sphere { center, radius }) => {
                aabb.closest_point(*center).distance_squared(*center) <= radius * radius
            }
            (Volume::Box(a), Volume::Box(b)) => {
                let (amin, amax, bmin, bmax) = (a.min(), a.max(), b.min(), b.max());
                amin.cmple(bmax).all() && bmin.cmple(amax).all()
            }
        }
    }

    /// Same shape moved to a new center
    pub fn with_center(&self, center: Vec3) -> Self {
        match self {
            Volume::Sphere { radius, .. } => Volume::Sphere {
                center,
                radius: *radius,
            },
            Volume::Box(aabb) => Volume::Box(Aabb3::new(center, aabb.half_extents)),
        }
    }
}

/// One result of an overlap query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialHit {
    pub entity: EntityRef,
    pub position: Vec3,
}

/// Read side of the spatial index
pub trait SpatialQuery {
    /// Every registered entity whose collider overlaps `volume`, in a stable
    /// order (ascending kind, then id).
    fn overlap(&self, volume: &Volume) -> Vec<SpatialHit>;

    /// Current position of a registered entity
    fn position_of(&self, entity: EntityRef) -> Option<Vec3>;

    fn any_of_kind(&self, volume: &Volume, kind: EntityKind) -> bool {
        self.overlap(volume)
            .iter()
            .any(|hit| hit.entity.kind == kind)
    }
}

/// Write side: used by the owners of land, stations and creatures to keep
/// their records discoverable.
pub trait SpatialIndex: SpatialQuery {
    fn insert(&mut self, entity: EntityRef, collider: Volume);
    fn remove(&mut self, entity: EntityRef) -> bool;
    fn set_position(&mut self, entity: EntityRef, position: Vec3) -> bool;
}

/// Brute-force in-memory index. Keyed by [`EntityRef`] so iteration order is
/// deterministic.
#[derive(Debug, Default, Clone)]
pub struct SpatialWorld {
    colliders: std::collections::BTreeMap<EntityRef, Volume>,
}

impl SpatialWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        self.colliders.contains_key(&entity)
    }

    pub fn count_kind(&self, kind: EntityKind) -> usize {
        self.colliders.keys().filter(|e| e.kind == kind).count()
    }
}

impl SpatialQuery for SpatialWorld {
    fn overlap(&self, volume: &Volume) -> Vec<SpatialHit> {
        self.colliders
            .iter()
            .filter(|(_, collider)| collider.intersects(volume))
            .map(|(entity, collider)| SpatialHit {
                entity: *entity,
                position: collider.center(),
            })
            .collect()
    }

    fn position_of(&self, entity: EntityRef) -> Option<Vec3> {
        self.colliders.get(&entity).map(Volume::center)
    }
}

impl SpatialIndex for SpatialWorld {
    fn insert(&mut self, entity: EntityRef, collider: Volume) {
        self.colliders.insert(entity, collider);
    }

    fn remove(&mut self, entity: EntityRef) -> bool {
        self.colliders.remove(&entity).is_some()
    }

    fn set_position(&mut self, entity: EntityRef, position: Vec3) -> bool {
        match self.colliders.get_mut(&entity) {
            Some(collider) => {
                *collider = collider.with_center(position);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_sphere_overlap() {
        let a = Volume::sphere(Vec3::ZERO, 1.0);
        assert!(a.intersects(&Volume::sphere(Vec3::new(1.5, 0.0, 0.0), 0.5)));
        assert!(!a.intersects(&Volume::sphere(Vec3::new(3.0, 0.0, 0.0), 0.5)));
    }

    #[test]
    fn test_sphere_box_overlap() {
        let tile = Volume::Box(Aabb3::new(Vec3::ZERO, Vec3::new(5.0, 0.5, 5.0)));
        assert!(tile.intersects(&Volume::sphere(Vec3::new(4.0, 1.0, 4.0), 0.6)));
        // Above the top surface by more than the radius
        assert!(!tile.intersects(&Volume::sphere(Vec3::new(0.0, 2.0, 0.0), 1.0)));
    }

    #[test]
    fn test_box_box_overlap() {
        let a = Volume::Box(Aabb3::new(Vec3::ZERO, Vec3::ONE));
        let b = Volume::Box(Aabb3::new(Vec3::new(1.5, 0.0, 0.0), Vec3::ONE));
        let c = Volume::Box(Aabb3::new(Vec3::new(5.0, 0.0, 0.0), Vec3::ONE));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_overlap_order_is_stable() {
        let mut world = SpatialWorld::new();
        world.insert(EntityRef::creature(9), Volume::sphere(Vec3::ZERO, 0.5));
        world.insert(EntityRef::creature(2), Volume::sphere(Vec3::X, 0.5));
        world.insert(EntityRef::PLAYER, Volume::sphere(Vec3::Z, 0.5));

        let hits = world.overlap(&Volume::sphere(Vec3::ZERO, 5.0));
        let ids: Vec<_> = hits.iter().map(|h| h.entity).collect();
        assert_eq!(
            ids,
            vec![
                EntityRef::PLAYER,
                EntityRef::creature(2),
                EntityRef::creature(9)
            ]
        );
    }

    #[test]
    fn test_set_position_moves_collider() {
        let mut world = SpatialWorld::new();
        let e = EntityRef::creature(1);
        world.insert(e, Volume::sphere(Vec3::ZERO, 0.5));
        assert!(world.set_position(e, Vec3::new(10.0, 0.0, 0.0)));
        assert!(world.overlap(&Volume::sphere(Vec3::ZERO, 1.0)).is_empty());
        assert_eq!(world.position_of(e), Some(Vec3::new(10.0, 0.0, 0.0)));
        assert!(!world.set_position(EntityRef::creature(2), Vec3::ZERO));
    }

    #[test]
    fn test_remove() {
        let mut world = SpatialWorld::new();
        world.insert(EntityRef::land(1), Volume::sphere(Vec3::ZERO, 1.0));
        assert!(world.any_of_kind(&Volume::sphere(Vec3::ZERO, 1.0), EntityKind::Land));
        assert!(world.remove(EntityRef::land(1)));
        assert!(!world.remove(EntityRef::land(1)));
        assert!(world.is_empty());
    }
}
