//! PlatypusPlatoon: whack-a-mole on a layered stage
//!
//! One target at a time pops out from behind the scenery and hides again.
//! Clicking it while it is out scores; letting it get back costs a life.
//! Tree-trunk targets peek over, flip round and come back down the other
//! side, swapping textures on the way.

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::game::MiniGame;
use super::motion::{MotionChain, MotionLeg};
use super::pivot::{Origin, PivotEntity};
use super::state::{
    Effect, EntityId, GameEvent, GameKind, GameSession, InstanceId, Outbox, PointerEvent,
    PointerKind,
};
use crate::assets::{AssetCache, AssetHandle};
use crate::mul_vec3;
use crate::tuning::PlatypusTuning;

/// Depth of the stage backdrop; layers stack in front of it
const STAGE_DEPTH: f32 = 0.73;
const LAYER_SPACING: f32 = 0.03;
pub const LAYER_COUNT: usize = 5;

/// Extra depth while a tree-trunk target is flipped over
const FLIP_DEPTH: f32 = 0.04;
/// Sideways shift of a flipped tree-trunk target
const FLIP_SHIFT: f32 = 0.1;

/// Per-bot-call chance of clicking a surfaced target
const AUTOPLAY_CLICK_CHANCE: f32 = 0.15;

/// Depth of a stage layer
pub fn layer_depth(layer: usize) -> f32 {
    assert!(layer < LAYER_COUNT, "stage layer {layer} out of range (0..{LAYER_COUNT})");
    STAGE_DEPTH + LAYER_SPACING * (layer + 1) as f32
}

/// How a target moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Front,
    TreeTrunk,
    Side,
}

/// Where one target hides and where it pops out to, in the stage plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPath {
    pub home: Vec2,
    pub destination: Vec2,
    pub scale: f32,
    pub layer: usize,
    pub kind: TargetKind,
}

impl TargetPath {
    const fn new(home: (f32, f32), destination: (f32, f32), scale: f32, layer: usize, kind: TargetKind) -> Self {
        Self {
            home: Vec2::new(home.0, home.1),
            destination: Vec2::new(destination.0, destination.1),
            scale,
            layer,
            kind,
        }
    }
}

pub const TARGETS: [TargetPath; 6] = [
    TargetPath::new((-0.5, 0.35), (-0.5, 0.65), 0.3, 2, TargetKind::Front),
    TargetPath::new((0.5, 1.2), (0.5, 1.5), 0.3, 2, TargetKind::Front),
    TargetPath::new((-0.7, 1.1), (-0.7, 1.4), 0.2, 0, TargetKind::Front),
    TargetPath::new((-0.25, 1.0), (-0.25, 1.2), 0.15, 0, TargetKind::Front),
    TargetPath::new((0.4, 0.3), (0.3, 0.3), 0.7, 2, TargetKind::TreeTrunk),
    TargetPath::new((-0.4, 0.15), (-0.1, 0.15), 0.7, 2, TargetKind::Side),
];

/// Arrival tags of target legs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStep {
    /// Fully out
    Surfaced,
    /// Tree-trunk target flipped to its far side
    Turned,
    /// Back in cover
    Hidden,
}

struct Target {
    path: TargetPath,
    entity: PivotEntity,
    chain: MotionChain<TargetStep>,
    clickable: bool,
    clicked: bool,
}

impl Target {
    fn new(path: TargetPath, id: EntityId, origin: &Origin, texture: AssetHandle) -> Self {
        let depth = layer_depth(path.layer);
        let entity = PivotEntity::new(id, origin, Vec3::new(path.home.x, path.home.y, depth))
            .with_scale(Vec3::splat(path.scale))
            .with_asset(texture)
            .hidden();
        Self {
            path,
            entity,
            chain: MotionChain::new(),
            clickable: false,
            clicked: false,
        }
    }

    /// Legs of one pop-out, `secs` each
    fn legs(&self, origin: &Origin, secs: f32) -> Vec<MotionLeg<TargetStep>> {
        let depth = layer_depth(self.path.layer);
        let home = self.entity.home(origin);
        let dest = self.path.destination;
        let at = |x: f32, z: f32| origin.to_world(Vec3::new(x, dest.y, z));

        match self.path.kind {
            TargetKind::Front | TargetKind::Side => {
                let out = at(dest.x, depth);
                vec![
                    MotionLeg::new(home, out, secs, TargetStep::Surfaced),
                    MotionLeg::new(out, home, secs, TargetStep::Hidden),
                ]
            }
            TargetKind::TreeTrunk => {
                let flipped_x = self.path.home.x + FLIP_SHIFT;
                vec![
                    MotionLeg::new(home, at(dest.x, depth), secs, TargetStep::Surfaced),
                    MotionLeg::new(
                        at(dest.x, depth + FLIP_DEPTH),
                        at(flipped_x, depth + FLIP_DEPTH),
                        secs,
                        TargetStep::Turned,
                    ),
                    MotionLeg::new(at(flipped_x, depth), home, secs, TargetStep::Hidden),
                ]
            }
        }
    }

    fn animate(&mut self, origin: &Origin, secs: f32) {
        self.clicked = false;
        self.clickable = true;
        let legs = self.legs(origin, secs);
        self.chain.start(legs);
    }

    fn reset(&mut self, origin: &Origin) {
        self.chain.stop();
        self.clickable = false;
        self.entity.reset(origin);
    }
}

/// One PlatypusPlatoon cabinet
pub struct PlatypusPlatoon {
    instance: InstanceId,
    origin: Origin,
    tuning: PlatypusTuning,
    rng: Pcg32,
    session: GameSession,
    outbox: Outbox,

    cabinet: PivotEntity,
    backdrop: PivotEntity,
    start_text: PivotEntity,
    start_input: PivotEntity,
    /// Stage, scenery and labels shown only in game
    scenery: Vec<PivotEntity>,
    lives_value: PivotEntity,
    score_value: PivotEntity,
    speaker: PivotEntity,
    targets: Vec<Target>,
    active: Option<usize>,

    soundtrack: AssetHandle,
    gun: AssetHandle,
    trunk_top: AssetHandle,
    trunk_bottom: AssetHandle,
}

impl PlatypusPlatoon {
    pub fn new(origin: Origin, tuning: &PlatypusTuning, assets: &mut AssetCache, seed: u64) -> Self {
        let instance = InstanceId::next();
        let id = |part| EntityId::new(instance, part);
        let place = |part, offset: Vec3, scale: Vec3| PivotEntity::new(id(part), &origin, offset).with_scale(scale);

        let cabinet = place(0, Vec3::new(0.0, -1.35, 0.0), mul_vec3(origin.scale, Vec3::new(0.6, 0.6, 0.7)))
            .with_asset(assets.model("Models/PlatypusArcade.glb"));
        let backdrop = place(1, Vec3::new(0.0, 0.9, 0.66), Vec3::new(2.0, 2.0, 0.1));
        let start_text = place(2, Vec3::new(0.0, 0.8, 0.8), Vec3::ONE)
            .with_asset(assets.texture("Materials/PlatypusPlatoon/StartPlatypus.png"));
        let start_input = place(3, Vec3::new(0.0, 0.9, 0.66), Vec3::new(2.0, 2.0, 0.1))
            .with_asset(assets.texture("Materials/TransparentTexture.png"));

        let bush = assets.texture("Materials/PlatypusPlatoon/Bush.png");
        let tree = assets.texture("Materials/PlatypusPlatoon/Tree.png");
        let scenery = vec![
            place(4, Vec3::new(0.0, 0.9, STAGE_DEPTH), Vec3::new(2.0, 2.0, 0.1))
                .with_asset(assets.texture("Materials/PlatypusPlatoon/PlatypusStage.png")),
            place(5, Vec3::new(-0.5, 0.3, layer_depth(3)), Vec3::ONE).with_asset(bush),
            place(6, Vec3::new(-0.2, 1.0, layer_depth(1)), Vec3::splat(0.4)).with_asset(bush),
            place(7, Vec3::new(0.4, 0.7, layer_depth(3)), Vec3::splat(1.5)).with_asset(tree),
            place(8, Vec3::new(-0.67, 0.9, layer_depth(1)), Vec3::ONE).with_asset(tree),
            place(9, Vec3::new(0.7, 1.7, 0.8), Vec3::splat(0.5))
                .with_asset(assets.texture("Materials/PlatypusPlatoon/Lives.png")),
            place(10, Vec3::new(-0.5, 1.7, 0.8), Vec3::splat(0.5))
                .with_asset(assets.texture("Materials/PlatypusPlatoon/Score.png")),
        ]
        .into_iter()
        .map(PivotEntity::hidden)
        .collect();
        let lives_value = place(11, Vec3::new(0.45, 1.7, 0.8), Vec3::splat(0.1)).hidden();
        let score_value = place(12, Vec3::new(-0.8, 1.7, 0.8), Vec3::splat(0.1)).hidden();
        let speaker = place(13, Vec3::ZERO, Vec3::ONE).with_local_yaw(90.0, &origin);

        let front = assets.texture("Materials/PlatypusPlatoon/PlatypusFront.png");
        let side = assets.texture("Materials/PlatypusPlatoon/PlatypusSide.png");
        let trunk_top = assets.texture("Materials/PlatypusPlatoon/PlatypusTop.png");
        let trunk_bottom = assets.texture("Materials/PlatypusPlatoon/PlatypusBottom.png");
        let targets = TARGETS
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let texture = match path.kind {
                    TargetKind::Front => front,
                    TargetKind::Side => side,
                    TargetKind::TreeTrunk => trunk_bottom,
                };
                Target::new(*path, id(14 + i as u32), &origin, texture)
            })
            .collect();

        log::debug!("PlatypusPlatoon {:?} placed at {:?} yaw {}", instance, origin.position, origin.yaw);

        Self {
            instance,
            origin,
            tuning: tuning.clone(),
            rng: Pcg32::seed_from_u64(seed),
            session: GameSession::new(tuning.lives, tuning.ramp),
            outbox: Outbox::default(),
            cabinet,
            backdrop,
            start_text,
            start_input,
            scenery,
            lives_value,
            score_value,
            speaker,
            targets,
            active: None,
            soundtrack: assets.clip("Sounds/PlatypusPlatoon.mp3"),
            gun: assets.clip("Sounds/Shot.wav"),
            trunk_top,
            trunk_bottom,
        }
    }

    pub fn start_input(&self) -> EntityId {
        self.start_input.id
    }

    /// Entity of the target currently out, if any
    pub fn active_target(&self) -> Option<EntityId> {
        self.active.map(|i| self.targets[i].entity.id)
    }

    fn start(&mut self) {
        self.session.start();

        self.outbox.hide(&mut self.start_text);
        self.outbox.hide(&mut self.start_input);
        for entity in self.scenery.iter_mut() {
            self.outbox.show(entity);
        }
        self.outbox.show(&mut self.lives_value);
        self.outbox.show(&mut self.score_value);
        for target in self.targets.iter_mut() {
            self.outbox.show(&mut target.entity);
        }
        self.outbox.set_text(&self.lives_value, self.session.lives().to_string());
        self.outbox.set_text(&self.score_value, "0");
        self.outbox.effect(Effect::LoopSound {
            emitter: self.speaker.id,
            clip: self.soundtrack,
        });

        log::info!("PlatypusPlatoon {:?}: started", self.instance);
        self.outbox.emit(GameEvent::Started {
            instance: self.instance,
        });
        self.animate_random();
    }

    fn animate_random(&mut self) {
        let index = self.rng.random_range(0..self.targets.len());
        self.animate(index);
    }

    fn animate(&mut self, index: usize) {
        let secs = self.session.ramp.duration(self.tuning.base_time);
        self.targets[index].animate(&self.origin, secs);
        self.active = Some(index);
    }

    fn reset_target(&mut self, index: usize) {
        let target = &mut self.targets[index];
        target.reset(&self.origin);
        if target.path.kind == TargetKind::TreeTrunk {
            self.outbox.set_texture(&mut target.entity, self.trunk_bottom);
        }
    }

    fn hit(&mut self, index: usize) {
        let target = &mut self.targets[index];
        if !target.clickable || target.clicked {
            return;
        }
        target.clicked = true;
        self.reset_target(index);
        self.active = None;

        let score = self.session.add_score(0);
        self.outbox.set_text(&self.score_value, score.to_string());
        self.outbox.emit(GameEvent::Scored {
            instance: self.instance,
            player: 0,
            score,
        });
        if let Some(level) = self.session.ramp.record_success() {
            log::info!("PlatypusPlatoon {:?}: difficulty {}", self.instance, level);
            self.outbox.emit(GameEvent::DifficultyUp {
                instance: self.instance,
                level,
            });
        }

        self.outbox.effect(Effect::PlaySound {
            emitter: self.speaker.id,
            clip: self.gun,
        });
        self.animate_random();
    }

    fn miss(&mut self) {
        self.active = None;
        if self.session.record_miss() {
            self.game_over();
            return;
        }

        let lives = self.session.lives();
        self.outbox.set_text(&self.lives_value, lives.to_string());
        self.outbox.emit(GameEvent::LifeLost {
            instance: self.instance,
            lives,
        });
        self.animate_random();
    }

    fn game_over(&mut self) {
        let score = self.session.score();
        log::info!("PlatypusPlatoon {:?}: game over with {}", self.instance, score);
        self.outbox.emit(GameEvent::GameOver {
            instance: self.instance,
            kind: GameKind::PlatypusPlatoon,
            winner: None,
            score,
        });
        self.session.finish();
        self.active = None;

        for index in 0..self.targets.len() {
            self.reset_target(index);
        }
        for entity in self.scenery.iter_mut() {
            self.outbox.hide(entity);
        }
        self.outbox.hide(&mut self.lives_value);
        self.outbox.hide(&mut self.score_value);
        for target in self.targets.iter_mut() {
            self.outbox.hide(&mut target.entity);
        }
        self.outbox.effect(Effect::StopSound {
            emitter: self.speaker.id,
            clip: self.soundtrack,
        });
        self.outbox.show(&mut self.start_text);
        self.outbox.show(&mut self.start_input);
    }
}

impl MiniGame for PlatypusPlatoon {
    fn kind(&self) -> GameKind {
        GameKind::PlatypusPlatoon
    }

    fn instance(&self) -> InstanceId {
        self.instance
    }

    fn origin(&self) -> &Origin {
        &self.origin
    }

    fn session(&self) -> &GameSession {
        &self.session
    }

    fn entities(&self) -> Vec<&PivotEntity> {
        let mut out = vec![&self.cabinet, &self.backdrop, &self.start_text, &self.start_input];
        out.extend(self.scenery.iter());
        out.extend([&self.lives_value, &self.score_value, &self.speaker]);
        out.extend(self.targets.iter().map(|t| &t.entity));
        out
    }

    fn tick(&mut self, dt: f32) {
        if !self.session.is_in_game() {
            return;
        }

        let mut missed = false;
        for target in self.targets.iter_mut() {
            let Some(step) = target.chain.tick(&mut target.entity.position, dt) else {
                continue;
            };
            match (step, target.path.kind) {
                (TargetStep::Surfaced, TargetKind::TreeTrunk) => {
                    self.outbox.set_texture(&mut target.entity, self.trunk_top);
                }
                (TargetStep::Turned, _) => {
                    self.outbox.set_texture(&mut target.entity, self.trunk_bottom);
                }
                (TargetStep::Hidden, _) if !target.clicked => {
                    target.clickable = false;
                    missed = true;
                }
                _ => {}
            }
        }

        if missed {
            self.miss();
        }
    }

    fn pointer(&mut self, event: &PointerEvent) {
        match event.kind {
            PointerKind::Up if event.target == self.start_input.id => {
                if self.start_input.visible && !self.session.is_in_game() {
                    self.start();
                }
            }
            PointerKind::Down if self.session.is_in_game() => {
                if let Some(index) = self.targets.iter().position(|t| t.entity.id == event.target) {
                    self.hit(index);
                }
            }
            _ => {}
        }
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        self.outbox.drain_events()
    }

    fn drain_effects(&mut self) -> Vec<Effect> {
        self.outbox.drain_effects()
    }

    fn autoplay(&mut self) -> Option<PointerEvent> {
        if !self.session.is_in_game() {
            return Some(PointerEvent::up(self.start_input.id));
        }
        let target = &self.targets[self.active?];
        if !target.clickable || target.chain.cursor() == 0 {
            return None;
        }
        let id = target.entity.id;
        let toward = target.entity.position - self.origin.position;
        (self.rng.random::<f32>() < AUTOPLAY_CLICK_CHANCE).then(|| PointerEvent::down(id, toward.normalize_or_zero()))
    }
}
