//! Moving scene platforms
//!
//! Not games: they have no session and take no input. The elevator runs a
//! looping two-leg chain between floors; the disk tour visits its waypoints
//! in order and sometimes takes a leg a little higher.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::motion::{MotionChain, MotionLeg, TimedMotion};
use super::pivot::{Origin, PivotEntity};
use super::state::{EntityId, InstanceId};
use crate::assets::AssetCache;

/// Elevator between the ground floor and the second floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevatorPath {
    /// Start position (ground stop)
    pub base: Vec3,
    /// Height of the upper stop
    pub top_y: f32,
    /// Seconds per leg
    pub leg_secs: f32,
}

impl Default for ElevatorPath {
    fn default() -> Self {
        Self {
            base: Vec3::new(24.0, -2.0, 6.0),
            top_y: 4.0,
            leg_secs: 3.0,
        }
    }
}

/// Disk platform touring the hall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourPath {
    pub start: Vec3,
    /// Visited in order, wrapping around
    pub waypoints: Vec<Vec3>,
    /// Seconds per leg
    pub leg_secs: f32,
    /// Chance that a leg ends `bump` higher than its waypoint
    pub bump_chance: f32,
    pub bump: f32,
}

impl Default for TourPath {
    fn default() -> Self {
        Self {
            start: Vec3::new(43.5, 6.0, 12.0),
            waypoints: vec![
                Vec3::new(43.5, 6.0, 43.0),
                Vec3::new(4.5, 6.0, 43.0),
                Vec3::new(4.5, 6.0, 12.0),
                Vec3::new(43.5, 6.0, 12.0),
            ],
            leg_secs: 5.0,
            bump_chance: 0.4,
            bump: 2.0,
        }
    }
}

fn ride_entity(position: Vec3, scale: Vec3) -> PivotEntity {
    let origin = Origin::new(position, 0.0);
    PivotEntity::new(EntityId::new(InstanceId::next(), 0), &origin, Vec3::ZERO).with_scale(scale)
}

/// Looping up/down platform
pub struct Elevator {
    entity: PivotEntity,
    chain: MotionChain<()>,
}

impl Elevator {
    pub fn new(path: &ElevatorPath, assets: &mut AssetCache) -> Self {
        let entity =
            ride_entity(path.base, Vec3::new(0.3, 0.2, 0.3)).with_asset(assets.model("Models/Platform.glb"));
        let top = Vec3::new(path.base.x, path.top_y, path.base.z);

        let mut chain = MotionChain::new();
        chain.start_looping(vec![
            MotionLeg::new(path.base, top, path.leg_secs, ()),
            MotionLeg::new(top, path.base, path.leg_secs, ()),
        ]);
        Self { entity, chain }
    }

    pub fn entity(&self) -> &PivotEntity {
        &self.entity
    }

    pub fn tick(&mut self, dt: f32) {
        self.chain.tick(&mut self.entity.position, dt);
    }
}

/// Waypoint tour with random height bumps
pub struct DiskTour {
    entity: PivotEntity,
    path: TourPath,
    motion: TimedMotion<()>,
    next: usize,
    rng: Pcg32,
}

impl DiskTour {
    pub fn new(path: &TourPath, assets: &mut AssetCache, seed: u64) -> Self {
        let entity = ride_entity(path.start, Vec3::ONE).with_asset(assets.model("Models/DiskWithCollider.glb"));
        let mut tour = Self {
            entity,
            path: path.clone(),
            motion: TimedMotion::new(),
            next: 0,
            rng: Pcg32::seed_from_u64(seed),
        };
        tour.head_to_next();
        tour
    }

    pub fn entity(&self) -> &PivotEntity {
        &self.entity
    }

    /// Index of the waypoint being approached
    pub fn next_waypoint(&self) -> usize {
        self.next
    }

    fn head_to_next(&mut self) {
        let Some(&waypoint) = self.path.waypoints.get(self.next) else {
            return;
        };
        let mut destination = waypoint;
        if self.rng.random::<f32>() < self.path.bump_chance {
            destination.y += self.path.bump;
        }
        self.motion
            .schedule(MotionLeg::new(self.entity.position, destination, self.path.leg_secs, ()));
    }

    pub fn tick(&mut self, dt: f32) {
        if self.motion.tick(&mut self.entity.position, dt).is_some() {
            self.next = (self.next + 1) % self.path.waypoints.len().max(1);
            self.head_to_next();
        }
    }
}

/// Any moving platform in the scene
pub enum Ride {
    Elevator(Elevator),
    DiskTour(DiskTour),
}

impl Ride {
    pub fn entity(&self) -> &PivotEntity {
        match self {
            Ride::Elevator(e) => e.entity(),
            Ride::DiskTour(t) => t.entity(),
        }
    }

    pub fn tick(&mut self, dt: f32) {
        match self {
            Ride::Elevator(e) => e.tick(dt),
            Ride::DiskTour(t) => t.tick(dt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn run(ride: &mut impl FnMut(), ticks: usize) {
        for _ in 0..ticks {
            ride();
        }
    }

    #[test]
    fn test_elevator_loops_between_floors() {
        let mut assets = AssetCache::new();
        let path = ElevatorPath::default();
        let mut elevator = Elevator::new(&path, &mut assets);
        let top = Vec3::new(24.0, 4.0, 6.0);

        run(&mut || elevator.tick(SIM_DT), 45);
        assert!((elevator.entity().position.y - 1.0).abs() < 1e-3);

        run(&mut || elevator.tick(SIM_DT), 45);
        assert_eq!(elevator.entity().position, top);
        run(&mut || elevator.tick(SIM_DT), 90);
        assert_eq!(elevator.entity().position, path.base);
        // Second lap
        run(&mut || elevator.tick(SIM_DT), 90);
        assert_eq!(elevator.entity().position, top);
    }

    #[test]
    fn test_disk_tour_visits_waypoints_in_order() {
        let mut assets = AssetCache::new();
        let path = TourPath::default();
        let mut tour = DiskTour::new(&path, &mut assets, 4);

        let mut heights = Vec::new();
        for leg in 0..40 {
            assert_eq!(tour.next_waypoint(), leg % 4);
            run(&mut || tour.tick(SIM_DT), 150);

            let at = tour.entity().position;
            let waypoint = path.waypoints[leg % 4];
            assert_eq!((at.x, at.z), (waypoint.x, waypoint.z));
            assert!(at.y == 6.0 || at.y == 8.0, "{at:?}");
            heights.push(at.y);
        }
        // Both plain and bumped legs show up over ten laps
        assert!(heights.contains(&6.0));
        assert!(heights.contains(&8.0));
    }

    #[test]
    fn test_empty_tour_stays_put() {
        let mut assets = AssetCache::new();
        let path = TourPath {
            waypoints: Vec::new(),
            ..TourPath::default()
        };
        let mut tour = DiskTour::new(&path, &mut assets, 1);
        run(&mut || tour.tick(SIM_DT), 30);
        assert_eq!(tour.entity().position, path.start);
    }
}
