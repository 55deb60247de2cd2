//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay engine-agnostic:
//! - Host tick time only (no wall clock)
//! - Seeded RNG only
//! - Positions written by motions, never read back from the host
//! - No rendering or audio dependencies; side effects leave as `Effect`s

pub mod game;
pub mod hover_disk;
pub mod madman;
pub mod mirror;
pub mod motion;
pub mod pivot;
pub mod platypus;
pub mod ride;
pub mod state;
pub mod trigger;

pub use game::MiniGame;
pub use hover_disk::HoverDisk;
pub use madman::{Lane, MadmanRacing};
pub use mirror::{DiskLaunch, MirrorFeed, MirrorLink};
pub use motion::{MotionChain, MotionLeg, TimedMotion};
pub use pivot::{Origin, PivotEntity};
pub use platypus::{PlatypusPlatoon, TargetKind, TargetPath};
pub use ride::{DiskTour, Elevator, ElevatorPath, Ride, TourPath};
pub use state::{
    DifficultyRamp, Effect, EntityId, GameEvent, GameKind, GameSession, InstanceId, Outbox,
    PointerEvent, PointerKind, RampConfig, Screen,
};
pub use trigger::{Actor, TriggerEdge, TriggerEvent, TriggerZone, Volume, ZoneRole, update_zones};
