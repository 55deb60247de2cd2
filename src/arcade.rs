//! Scene composition
//!
//! The arcade places game instances at fixed origins, shares one asset cache
//! between them, and drives them from the host's tick and pointer callbacks.
//! Moving platforms ride along on the same ticks. Finished rounds are kept
//! per instance.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::assets::AssetCache;
use crate::platform::Host;
use crate::sim::ride::{DiskTour, Elevator, ElevatorPath, Ride, TourPath};
use crate::sim::{
    GameEvent, GameKind, HoverDisk, InstanceId, MadmanRacing, Origin, PlatypusPlatoon, PointerEvent,
};
use crate::tuning::Tuning;

pub use crate::sim::game::MiniGame;

/// Ticks between two rounds of bot input
pub const AUTOPLAY_EVERY: u64 = 5;

/// Height of the upper floor above the ground floor
pub const UPPER_FLOOR_RISE: f32 = 5.7;
/// The upper floor's tables sit this much further back
pub const UPPER_FLOOR_SHIFT: f32 = 8.0;

/// One cabinet in the layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub kind: GameKind,
    pub origin: Origin,
}

/// Where every cabinet stands
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layout {
    pub placements: Vec<Placement>,
    /// (leader, follower) placement indices of HoverDisk tables whose
    /// launches are mirrored
    pub mirrors: Vec<(usize, usize)>,
    #[serde(default)]
    pub elevators: Vec<ElevatorPath>,
    #[serde(default)]
    pub tours: Vec<TourPath>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: GameKind, position: Vec3, yaw: f32) -> Self {
        self.placements.push(Placement {
            kind,
            origin: Origin::new(position, yaw),
        });
        self
    }

    pub fn with_mirror(mut self, leader: usize, follower: usize) -> Self {
        self.mirrors.push((leader, follower));
        self
    }

    pub fn with_elevator(mut self, path: ElevatorPath) -> Self {
        self.elevators.push(path);
        self
    }

    pub fn with_tour(mut self, path: TourPath) -> Self {
        self.tours.push(path);
        self
    }

    /// The NeoArcadia hall: two floors of HoverDisk tables, a PlatypusPlatoon
    /// cabinet on each side wall, two MadmanRacing cabinets at the front, an
    /// elevator to the second floor and a disk platform touring above it
    pub fn neo_arcadia() -> Self {
        const TABLES: [Vec3; 6] = [
            Vec3::new(38.0, 1.5, 12.0),
            Vec3::new(38.0, 1.5, 24.0),
            Vec3::new(10.0, 1.5, 12.0),
            Vec3::new(10.0, 1.5, 24.0),
            Vec3::new(24.0, 1.5, 16.0),
            Vec3::new(24.0, 1.5, 28.0),
        ];

        let mut layout = Self::new();
        for table in TABLES {
            layout = layout.with(GameKind::HoverDisk, table, 0.0);
        }
        for table in TABLES {
            let upper = table + Vec3::new(0.0, UPPER_FLOOR_RISE, UPPER_FLOOR_SHIFT);
            layout = layout.with(GameKind::HoverDisk, upper, 0.0);
        }
        layout
            .with(GameKind::PlatypusPlatoon, Vec3::new(4.0, 1.5, 34.0), 90.0)
            .with(GameKind::PlatypusPlatoon, Vec3::new(44.0, 1.5, 34.0), -90.0)
            .with(GameKind::MadmanRacing, Vec3::new(32.0, 1.5, 4.0), 0.0)
            .with(GameKind::MadmanRacing, Vec3::new(16.0, 1.5, 4.0), 0.0)
            .with_elevator(ElevatorPath::default())
            .with_tour(TourPath::default())
    }

    pub fn count(&self, kind: GameKind) -> usize {
        self.placements.iter().filter(|p| p.kind == kind).count()
    }
}

/// Per-instance seed so each cabinet gets its own random stream
fn instance_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Outcome of one finished round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub instance: InstanceId,
    pub kind: GameKind,
    pub winner: Option<u8>,
    pub score: u32,
    /// Scene tick the round ended on
    pub tick: u64,
}

/// All game instances of one scene
pub struct Arcade {
    games: Vec<Box<dyn MiniGame>>,
    rides: Vec<Ride>,
    pub assets: AssetCache,
    rounds: Vec<RoundResult>,
    /// Whether the built-in bot plays every cabinet
    pub autoplay: bool,
    ticks: u64,
}

impl Arcade {
    pub fn new(layout: &Layout, tuning: &Tuning, seed: u64) -> Self {
        let mut assets = AssetCache::new();

        let mut disks: Vec<Option<HoverDisk>> = layout
            .placements
            .iter()
            .enumerate()
            .map(|(i, p)| {
                (p.kind == GameKind::HoverDisk)
                    .then(|| HoverDisk::new(p.origin, &tuning.hover_disk, &mut assets, instance_seed(seed, i)))
            })
            .collect();

        for &(leader, follower) in &layout.mirrors {
            if leader == follower {
                log::warn!("Ignoring mirror of table {} onto itself", leader);
                continue;
            }
            let Some(feed) = disks.get_mut(leader).and_then(Option::as_mut).map(HoverDisk::subscribe_launches) else {
                log::warn!("Mirror leader {} is not a HoverDisk table", leader);
                continue;
            };
            match disks.get_mut(follower).and_then(Option::as_mut) {
                Some(disk) => disk.follow(feed),
                None => log::warn!("Mirror follower {} is not a HoverDisk table", follower),
            }
        }

        let mut games: Vec<Box<dyn MiniGame>> = Vec::with_capacity(layout.placements.len());
        for (i, (placement, disk)) in layout.placements.iter().zip(disks).enumerate() {
            let game: Box<dyn MiniGame> = match (placement.kind, disk) {
                (GameKind::HoverDisk, Some(disk)) => Box::new(disk),
                (GameKind::MadmanRacing, _) => Box::new(MadmanRacing::new(
                    placement.origin,
                    &tuning.madman,
                    &mut assets,
                    instance_seed(seed, i),
                )),
                (GameKind::PlatypusPlatoon, _) => Box::new(PlatypusPlatoon::new(
                    placement.origin,
                    &tuning.platypus,
                    &mut assets,
                    instance_seed(seed, i),
                )),
                (GameKind::HoverDisk, None) => continue,
            };
            games.push(game);
        }

        let mut rides = Vec::with_capacity(layout.elevators.len() + layout.tours.len());
        for path in &layout.elevators {
            rides.push(Ride::Elevator(Elevator::new(path, &mut assets)));
        }
        for (i, path) in layout.tours.iter().enumerate() {
            let tour_seed = instance_seed(seed, layout.placements.len() + i);
            rides.push(Ride::DiskTour(DiskTour::new(path, &mut assets, tour_seed)));
        }

        log::info!(
            "Arcade ready: {} games, {} rides, {} shared assets, seed {}",
            games.len(),
            rides.len(),
            assets.len(),
            seed
        );

        Self {
            games,
            rides,
            assets,
            rounds: Vec::new(),
            autoplay: false,
            ticks: 0,
        }
    }

    /// The NeoArcadia hall with the given tuning
    pub fn neo_arcadia(tuning: &Tuning, seed: u64) -> Self {
        Self::new(&Layout::neo_arcadia(), tuning, seed)
    }

    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    pub fn games(&self) -> &[Box<dyn MiniGame>] {
        &self.games
    }

    pub fn rides(&self) -> &[Ride] {
        &self.rides
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Every round finished so far, oldest first
    pub fn rounds(&self) -> &[RoundResult] {
        &self.rounds
    }

    /// Push every entity's current state to a freshly attached host
    pub fn sync_all(&self, host: &mut dyn Host) {
        for game in &self.games {
            for entity in game.entities() {
                host.sync(entity);
            }
        }
        for ride in &self.rides {
            host.sync(ride.entity());
        }
    }

    /// Route a pointer event to the instance owning its target
    pub fn pointer(&mut self, event: &PointerEvent) -> bool {
        match self.games.iter_mut().find(|g| g.instance() == event.target.instance) {
            Some(game) => {
                game.pointer(event);
                true
            }
            None => {
                log::debug!("Pointer event for unknown instance {:?}", event.target.instance);
                false
            }
        }
    }

    /// Advance every game by one host tick, forwarding effects and transforms
    /// to the host. Returns the gameplay events of this tick in game order.
    pub fn tick(&mut self, dt: f32, host: &mut dyn Host) -> Vec<GameEvent> {
        self.ticks += 1;
        let bot_turn = self.autoplay && self.ticks % AUTOPLAY_EVERY == 0;

        let mut events = Vec::new();
        for game in self.games.iter_mut() {
            if bot_turn {
                if let Some(input) = game.autoplay() {
                    game.pointer(&input);
                }
            }

            game.tick(dt);

            for effect in game.drain_effects() {
                host.apply(&effect);
            }
            for entity in game.entities() {
                host.sync(entity);
            }
            events.extend(game.drain_events());
        }

        for ride in self.rides.iter_mut() {
            ride.tick(dt);
            host.sync(ride.entity());
        }

        for event in &events {
            if let GameEvent::GameOver {
                instance,
                kind,
                winner,
                score,
            } = *event
            {
                self.rounds.push(RoundResult {
                    instance,
                    kind,
                    winner,
                    score,
                    tick: self.ticks,
                });
            }
        }
        events
    }
}
