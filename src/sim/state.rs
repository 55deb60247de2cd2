//! Session state and core simulation types
//!
//! Everything a game instance mutates between ticks that is not geometry:
//! screens, scores, lives, difficulty, and the events/effects it reports.

use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::pivot::PivotEntity;
use crate::assets::AssetHandle;

static NEXT_INSTANCE: AtomicU32 = AtomicU32::new(0);

/// Unique id of one game instance (process-wide counter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u32);

impl InstanceId {
    /// Allocate the next id. Only used to make identifiers unique.
    pub fn next() -> Self {
        Self(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle of one host entity owned by a game instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub instance: InstanceId,
    pub part: u32,
}

impl EntityId {
    pub fn new(instance: InstanceId, part: u32) -> Self {
        Self { instance, part }
    }
}

/// Which mini-game an instance runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    HoverDisk,
    MadmanRacing,
    PlatypusPlatoon,
}

impl GameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::HoverDisk => "HoverDisk",
            GameKind::MadmanRacing => "MadmanRacing",
            GameKind::PlatypusPlatoon => "PlatypusPlatoon",
        }
    }
}

/// Current screen of a game instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Screen {
    /// Waiting for start input
    #[default]
    StartScreen,
    /// Active gameplay
    InGame,
}

/// Pointer event phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    Down,
    Up,
}

/// Pointer input delivered by the host, aimed at one entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub target: EntityId,
    /// World-space ray direction of the pointer
    pub direction: Vec3,
}

impl PointerEvent {
    pub fn down(target: EntityId, direction: Vec3) -> Self {
        Self {
            kind: PointerKind::Down,
            target,
            direction,
        }
    }

    pub fn up(target: EntityId) -> Self {
        Self {
            kind: PointerKind::Up,
            target,
            direction: Vec3::Z,
        }
    }
}

/// Difficulty ramp parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampConfig {
    /// Level at session start
    pub base_level: f32,
    /// Level increase per ramp step
    pub step: f32,
    /// Level cap
    pub max_level: f32,
    /// Successes needed for the first step
    pub first_every: u32,
    /// Successes needed for every later step
    pub every: u32,
}

impl RampConfig {
    pub fn new(step: f32, max_level: f32, every: u32) -> Self {
        Self {
            base_level: 1.0,
            step,
            max_level,
            first_every: every,
            every,
        }
    }

    /// Ramp that never changes the level
    pub fn flat() -> Self {
        Self::new(0.0, 1.0, 1)
    }
}

/// Counts successes and raises the difficulty level every K of them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyRamp {
    pub config: RampConfig,
    level: f32,
    countdown: u32,
}

impl DifficultyRamp {
    pub fn new(config: RampConfig) -> Self {
        Self {
            config,
            level: config.base_level,
            countdown: config.first_every.max(1),
        }
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn reset(&mut self) {
        self.level = self.config.base_level;
        self.countdown = self.config.first_every.max(1);
    }

    /// Record one success. Returns the new level when it changed.
    pub fn record_success(&mut self) -> Option<f32> {
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            return None;
        }

        self.countdown = self.config.every.max(1);
        if self.level < self.config.max_level {
            self.level = (self.level + self.config.step).min(self.config.max_level);
            return Some(self.level);
        }
        None
    }

    /// Motion duration for the current level (inversely proportional)
    pub fn duration(&self, base_secs: f32) -> f32 {
        base_secs / self.level.max(f32::EPSILON)
    }
}

/// Per-instance score/lives/difficulty state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    pub screen: Screen,
    /// Per-player scores (single-player games use index 0)
    pub scores: [u32; 2],
    pub misses: u32,
    /// Misses allowed before game over (0 = unlimited)
    pub max_misses: u32,
    pub ramp: DifficultyRamp,
}

impl GameSession {
    pub fn new(max_misses: u32, ramp: RampConfig) -> Self {
        Self {
            screen: Screen::StartScreen,
            scores: [0, 0],
            misses: 0,
            max_misses,
            ramp: DifficultyRamp::new(ramp),
        }
    }

    pub fn is_in_game(&self) -> bool {
        self.screen == Screen::InGame
    }

    /// Clear per-round counters without changing screen
    pub fn reset(&mut self) {
        self.scores = [0, 0];
        self.misses = 0;
        self.ramp.reset();
    }

    /// StartScreen -> InGame
    pub fn start(&mut self) {
        self.reset();
        self.screen = Screen::InGame;
    }

    /// InGame -> StartScreen
    pub fn finish(&mut self) {
        self.reset();
        self.screen = Screen::StartScreen;
    }

    pub fn score(&self) -> u32 {
        self.scores[0]
    }

    pub fn lives(&self) -> u32 {
        self.max_misses.saturating_sub(self.misses)
    }

    /// Add a point for a player, returning the new score
    pub fn add_score(&mut self, player: usize) -> u32 {
        let slot = &mut self.scores[player.min(1)];
        *slot += 1;
        *slot
    }

    /// Count a miss. Returns true when the lives are exhausted.
    pub fn record_miss(&mut self) -> bool {
        self.misses += 1;
        self.max_misses > 0 && self.misses >= self.max_misses
    }
}

/// Gameplay events reported to the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// StartScreen -> InGame
    Started { instance: InstanceId },
    /// A player scored
    Scored {
        instance: InstanceId,
        player: u8,
        score: u32,
    },
    /// A target or car got through
    LifeLost { instance: InstanceId, lives: u32 },
    /// Difficulty ramp stepped up
    DifficultyUp { instance: InstanceId, level: f32 },
    /// HoverDisk bounced off a side wall
    WallBounce { instance: InstanceId },
    /// Terminal event: result of the finished round
    GameOver {
        instance: InstanceId,
        kind: GameKind,
        winner: Option<u8>,
        score: u32,
    },
}

/// Observable side effects on the instance's own host entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    Show(EntityId),
    Hide(EntityId),
    SetText(EntityId, String),
    SetTexture(EntityId, AssetHandle),
    PlaySound { emitter: EntityId, clip: AssetHandle },
    LoopSound { emitter: EntityId, clip: AssetHandle },
    StopSound { emitter: EntityId, clip: AssetHandle },
}

/// Pending events and effects of one instance, drained by the scene each tick
#[derive(Debug, Default)]
pub struct Outbox {
    events: Vec<GameEvent>,
    effects: Vec<Effect>,
}

impl Outbox {
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn show(&mut self, entity: &mut PivotEntity) {
        entity.visible = true;
        self.effects.push(Effect::Show(entity.id));
    }

    pub fn hide(&mut self, entity: &mut PivotEntity) {
        entity.visible = false;
        self.effects.push(Effect::Hide(entity.id));
    }

    pub fn set_text(&mut self, entity: &PivotEntity, text: impl Into<String>) {
        self.effects.push(Effect::SetText(entity.id, text.into()));
    }

    pub fn set_texture(&mut self, entity: &mut PivotEntity, texture: AssetHandle) {
        entity.asset = Some(texture);
        self.effects.push(Effect::SetTexture(entity.id, texture));
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_ids_are_unique() {
        let a = InstanceId::next();
        let b = InstanceId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_ramp_steps_after_k_successes() {
        let mut ramp = DifficultyRamp::new(RampConfig::new(0.5, 5.0, 10));
        let before = ramp.duration(2.0);

        for _ in 0..9 {
            assert_eq!(ramp.record_success(), None);
        }
        assert_eq!(ramp.duration(2.0), before);

        assert_eq!(ramp.record_success(), Some(1.5));
        assert!(ramp.duration(2.0) < before);
    }

    #[test]
    fn test_ramp_saturates_at_max_level() {
        let mut ramp = DifficultyRamp::new(RampConfig::new(1.0, 3.0, 1));
        assert_eq!(ramp.record_success(), Some(2.0));
        assert_eq!(ramp.record_success(), Some(3.0));

        let capped = ramp.duration(5.0);
        for _ in 0..20 {
            assert_eq!(ramp.record_success(), None);
        }
        assert_eq!(ramp.level(), 3.0);
        assert_eq!(ramp.duration(5.0), capped);
    }

    #[test]
    fn test_ramp_first_step_can_differ() {
        let mut ramp = DifficultyRamp::new(RampConfig {
            first_every: 1,
            ..RampConfig::new(1.0, 5.0, 10)
        });
        assert_eq!(ramp.record_success(), Some(2.0));
        for _ in 0..9 {
            assert_eq!(ramp.record_success(), None);
        }
        assert_eq!(ramp.record_success(), Some(3.0));

        ramp.reset();
        assert_eq!(ramp.level(), 1.0);
        assert_eq!(ramp.record_success(), Some(2.0));
    }

    #[test]
    fn test_session_lifecycle() {
        let mut session = GameSession::new(5, RampConfig::new(1.0, 5.0, 10));
        assert_eq!(session.screen, Screen::StartScreen);

        session.start();
        assert!(session.is_in_game());
        assert_eq!(session.lives(), 5);

        session.add_score(0);
        for _ in 0..4 {
            assert!(!session.record_miss());
        }
        assert!(session.record_miss());
        assert_eq!(session.lives(), 0);

        session.finish();
        assert_eq!(session.screen, Screen::StartScreen);
        assert_eq!(session.score(), 0);
        assert_eq!(session.lives(), 5);
    }

    #[test]
    fn test_outbox_drains() {
        let mut outbox = Outbox::default();
        let instance = InstanceId::next();
        outbox.emit(GameEvent::Started { instance });
        assert_eq!(outbox.drain_events(), vec![GameEvent::Started { instance }]);
        assert!(outbox.drain_events().is_empty());
    }
}
