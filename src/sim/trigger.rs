//! Trigger zones with enter/exit edges
//!
//! Overlap is evaluated in the game's unrotated local frame, so boxes stay
//! axis-aligned no matter how the instance is rotated in the world.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::pivot::{Origin, PivotEntity};
use super::state::EntityId;

/// Bounding volume of a zone or actor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Volume {
    /// Axis-aligned box, full extents
    Box { size: Vec3 },
    Sphere { radius: f32 },
}

impl Volume {
    pub fn cube(x: f32, y: f32, z: f32) -> Self {
        Volume::Box {
            size: Vec3::new(x, y, z),
        }
    }

    /// Whether this volume at `a` touches `other` at `b`
    pub fn overlaps(&self, a: Vec3, other: &Volume, b: Vec3) -> bool {
        match (*self, *other) {
            (Volume::Box { size: sa }, Volume::Box { size: sb }) => {
                let reach = (sa + sb) * 0.5;
                let d = (a - b).abs();
                d.x <= reach.x && d.y <= reach.y && d.z <= reach.z
            }
            (Volume::Box { size }, Volume::Sphere { radius }) => box_sphere(a, size, b, radius),
            (Volume::Sphere { radius }, Volume::Box { size }) => box_sphere(b, size, a, radius),
            (Volume::Sphere { radius: ra }, Volume::Sphere { radius: rb }) => {
                a.distance_squared(b) <= (ra + rb) * (ra + rb)
            }
        }
    }
}

fn box_sphere(box_center: Vec3, size: Vec3, sphere_center: Vec3, radius: f32) -> bool {
    let half = size * 0.5;
    let closest = sphere_center.clamp(box_center - half, box_center + half);
    closest.distance_squared(sphere_center) <= radius * radius
}

/// What a zone means to its game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneRole {
    WallBounce,
    Goal { goal_id: u8 },
    HitZone,
    InputGate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerEdge {
    Enter,
    Exit,
}

/// One enter/exit transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub zone: EntityId,
    pub role: ZoneRole,
    pub actor: EntityId,
    pub edge: TriggerEdge,
}

/// Something that can set off zones
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Actor {
    pub id: EntityId,
    /// Center in the game's local frame
    pub center: Vec3,
    pub volume: Volume,
    /// Collision layer bit
    pub layer: u32,
}

impl Actor {
    /// Actor centered on an entity's current position
    pub fn of(entity: &PivotEntity, origin: &Origin, volume: Volume, layer: u32) -> Self {
        Self {
            id: entity.id,
            center: entity.local_position(origin),
            volume,
            layer,
        }
    }
}

/// Overlap volume attached to a pivot entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerZone {
    pub role: ZoneRole,
    pub volume: Volume,
    /// Layer mask of actors that count
    pub triggered_by: u32,
    pub enabled: bool,
    overlapping: Vec<EntityId>,
}

impl TriggerZone {
    pub fn new(role: ZoneRole, volume: Volume, triggered_by: u32) -> Self {
        Self {
            role,
            volume,
            triggered_by,
            enabled: true,
            overlapping: Vec::new(),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Whether `actor` counts as inside a zone centered at `center`
    pub fn contains(&self, center: Vec3, actor: &Actor) -> bool {
        self.enabled
            && self.triggered_by & actor.layer != 0
            && self.volume.overlaps(center, &actor.volume, actor.center)
    }

    pub fn is_overlapping(&self, actor: EntityId) -> bool {
        self.overlapping.contains(&actor)
    }

    /// Feed one overlap sample; returns the edge on a transition
    pub fn observe(&mut self, actor: EntityId, overlapping: bool) -> Option<TriggerEdge> {
        let was = self.is_overlapping(actor);
        match (was, overlapping) {
            (false, true) => {
                self.overlapping.push(actor);
                Some(TriggerEdge::Enter)
            }
            (true, false) => {
                self.overlapping.retain(|a| *a != actor);
                Some(TriggerEdge::Exit)
            }
            _ => None,
        }
    }

    /// Forget all overlaps without raising edges
    pub fn clear(&mut self) {
        self.overlapping.clear();
    }
}

/// Sample every zone against every actor. Exits come before enters.
pub fn update_zones<'a>(
    origin: &Origin,
    entities: impl IntoIterator<Item = &'a mut PivotEntity>,
    actors: &[Actor],
) -> Vec<TriggerEvent> {
    let mut exits = Vec::new();
    let mut enters = Vec::new();

    for entity in entities {
        let center = entity.local_position(origin);
        let zone_id = entity.id;
        let Some(zone) = entity.zone.as_mut() else {
            continue;
        };

        for actor in actors.iter().filter(|a| a.id != zone_id) {
            let inside = zone.contains(center, actor);
            if let Some(edge) = zone.observe(actor.id, inside) {
                let event = TriggerEvent {
                    zone: zone_id,
                    role: zone.role,
                    actor: actor.id,
                    edge,
                };
                log::debug!("Trigger {:?} {:?} by {:?}", event.role, edge, actor.id);
                match edge {
                    TriggerEdge::Exit => exits.push(event),
                    TriggerEdge::Enter => enters.push(event),
                }
            }
        }
    }

    exits.extend(enters);
    exits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{LAYER_DEFAULT, LAYER_DISK};
    use crate::sim::state::InstanceId;

    fn eid(part: u32) -> EntityId {
        EntityId::new(InstanceId(7_777), part)
    }

    #[test]
    fn test_samples_fire_one_enter_and_one_exit() {
        let mut zone = TriggerZone::new(ZoneRole::HitZone, Volume::cube(1.0, 1.0, 1.0), LAYER_DEFAULT);
        let edges: Vec<_> = [false, true, true, false]
            .into_iter()
            .map(|s| zone.observe(eid(1), s))
            .collect();
        assert_eq!(edges, vec![None, Some(TriggerEdge::Enter), None, Some(TriggerEdge::Exit)]);
    }

    #[test]
    fn test_actors_tracked_independently() {
        let mut zone = TriggerZone::new(ZoneRole::WallBounce, Volume::cube(1.0, 1.0, 1.0), LAYER_DISK);
        assert_eq!(zone.observe(eid(1), true), Some(TriggerEdge::Enter));
        assert_eq!(zone.observe(eid(2), true), Some(TriggerEdge::Enter));
        assert_eq!(zone.observe(eid(1), false), Some(TriggerEdge::Exit));
        assert!(zone.is_overlapping(eid(2)));
    }

    #[test]
    fn test_box_sphere_overlap() {
        let wall = Volume::cube(0.05, 0.1, 5.0);
        let disk = Volume::Sphere { radius: 0.2 };
        let wall_at = Vec3::new(1.5, -0.2, 0.0);
        assert!(wall.overlaps(wall_at, &disk, Vec3::new(1.3, -0.25, 1.0)));
        assert!(!wall.overlaps(wall_at, &disk, Vec3::new(1.2, -0.25, 1.0)));
        assert!(disk.overlaps(Vec3::new(1.3, -0.25, 1.0), &wall, wall_at));
    }

    #[test]
    fn test_layer_mask_and_disable() {
        let zone = TriggerZone::new(ZoneRole::Goal { goal_id: 0 }, Volume::cube(3.0, 0.1, 0.05), LAYER_DISK);
        let actor = Actor {
            id: eid(3),
            center: Vec3::ZERO,
            volume: Volume::Sphere { radius: 0.2 },
            layer: LAYER_DEFAULT,
        };
        assert!(!zone.contains(Vec3::ZERO, &actor));

        let disk = Actor { layer: LAYER_DISK, ..actor };
        assert!(zone.contains(Vec3::ZERO, &disk));
        assert!(!zone.clone().disabled().contains(Vec3::ZERO, &disk));
    }

    #[test]
    fn test_update_orders_exits_before_enters() {
        let origin = Origin::new(Vec3::new(10.0, 0.0, 10.0), 90.0);
        let mut left = PivotEntity::new(eid(1), &origin, Vec3::new(-1.0, 0.0, 0.0))
            .with_zone(TriggerZone::new(ZoneRole::HitZone, Volume::cube(1.0, 1.0, 1.0), LAYER_DEFAULT));
        let mut right = PivotEntity::new(eid(2), &origin, Vec3::new(1.0, 0.0, 0.0))
            .with_zone(TriggerZone::new(ZoneRole::HitZone, Volume::cube(1.0, 1.0, 1.0), LAYER_DEFAULT));

        let actor_at = |x: f32| Actor {
            id: eid(9),
            center: Vec3::new(x, 0.0, 0.0),
            volume: Volume::cube(0.2, 0.2, 0.2),
            layer: LAYER_DEFAULT,
        };

        let events = update_zones(&origin, [&mut left, &mut right], &[actor_at(-1.0)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].zone, eid(1));

        // Jumping from left to right: exit on the first zone is reported first
        let events = update_zones(&origin, [&mut right, &mut left], &[actor_at(1.0)]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].edge, TriggerEdge::Exit);
        assert_eq!(events[0].zone, eid(1));
        assert_eq!(events[1].edge, TriggerEdge::Enter);
        assert_eq!(events[1].zone, eid(2));
    }
}
