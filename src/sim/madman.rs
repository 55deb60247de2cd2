//! MadmanRacing: two-lane dodging
//!
//! Enemy cars drop down the screen in a random lane; the player flips lanes
//! with each click. Every dodged car counts, the drops speed up, and the
//! first hit ends the run.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::game::MiniGame;
use super::motion::{MotionChain, MotionLeg, TimedMotion};
use super::pivot::{Origin, PivotEntity};
use super::state::{
    Effect, EntityId, GameEvent, GameKind, GameSession, InstanceId, Outbox, PointerEvent,
    PointerKind,
};
use super::trigger::{Actor, TriggerEdge, TriggerZone, Volume, ZoneRole, update_zones};
use crate::assets::{AssetCache, AssetHandle};
use crate::consts::LAYER_DEFAULT;
use crate::mul_vec3;
use crate::tuning::MadmanTuning;

const CABINET_OFFSET: Vec3 = Vec3::new(0.0, -1.25, 0.0);
const BACKGROUND_OFFSET: Vec3 = Vec3::new(0.0, 1.0, 0.6);
const START_TEXT_OFFSET: Vec3 = Vec3::new(0.0, 1.0, 0.8);
const INPUT_OFFSET: Vec3 = Vec3::new(0.0, 1.0, -0.3);
const PLAYER_OFFSET: Vec3 = Vec3::new(0.0, 0.4, 0.8);
const MID_LINE_OFFSET: Vec3 = Vec3::new(0.0, 2.25, 0.72);
const ENEMY_OFFSET: Vec3 = Vec3::new(0.0, 2.5, 0.72);
const SPEAKER_OFFSET: Vec3 = Vec3::new(0.0, 2.0, -1.5);

const PLAYER_SIZE: Vec3 = Vec3::new(0.5, 0.5, 1.0);
const ENEMY_SIZE: Vec3 = Vec3::new(0.5, 0.5, 0.2);

/// Bot flips lanes once an enemy in its lane is this close above
const AUTOPLAY_REACTION: f32 = 1.5;

/// Which side of the road a car is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Left,
    Right,
}

impl Lane {
    fn offset(self, distance: f32) -> f32 {
        match self {
            Lane::Left => -distance,
            Lane::Right => distance,
        }
    }

    fn toggled(self) -> Self {
        match self {
            Lane::Left => Lane::Right,
            Lane::Right => Lane::Left,
        }
    }
}

/// One MadmanRacing cabinet
pub struct MadmanRacing {
    instance: InstanceId,
    origin: Origin,
    tuning: MadmanTuning,
    rng: Pcg32,
    session: GameSession,
    outbox: Outbox,

    cabinet: PivotEntity,
    background: PivotEntity,
    start_text: PivotEntity,
    input_plane: PivotEntity,
    player: PivotEntity,
    field_limit: PivotEntity,
    mid_line: PivotEntity,
    enemy: PivotEntity,
    speaker: PivotEntity,

    lane: Lane,
    enemy_lane: Lane,
    enemy_motion: TimedMotion<()>,
    mid_line_motion: MotionChain<()>,

    soundtrack: AssetHandle,
    explosion: AssetHandle,
}

impl MadmanRacing {
    pub fn new(origin: Origin, tuning: &MadmanTuning, assets: &mut AssetCache, seed: u64) -> Self {
        let instance = InstanceId::next();
        let id = |part| EntityId::new(instance, part);

        let cabinet = PivotEntity::new(id(0), &origin, CABINET_OFFSET)
            .with_scale(mul_vec3(origin.scale, Vec3::new(0.6, 0.6, 0.7)))
            .with_asset(assets.model("Models/Arcade.glb"));
        let background = PivotEntity::new(id(1), &origin, BACKGROUND_OFFSET).with_scale(Vec3::new(2.0, 2.0, 0.1));
        let start_text = PivotEntity::new(id(2), &origin, START_TEXT_OFFSET)
            .with_asset(assets.texture("Materials/MadmanRacing/Start.png"));
        let input_plane = PivotEntity::new(id(3), &origin, INPUT_OFFSET)
            .with_scale(Vec3::new(2.0, 2.0, 0.1))
            .with_asset(assets.texture("Materials/TransparentTexture.png"));
        let mut player = PivotEntity::new(id(4), &origin, PLAYER_OFFSET)
            .with_scale(PLAYER_SIZE)
            .with_asset(assets.texture("Materials/MadmanRacing/OrangeCar.png"))
            .with_zone(
                TriggerZone::new(ZoneRole::HitZone, Volume::Box { size: PLAYER_SIZE }, LAYER_DEFAULT).disabled(),
            )
            .hidden();
        player.move_along_tangent(&origin, Lane::Left.offset(tuning.lane_offset));
        let field_limit = PivotEntity::new(id(5), &origin, Vec3::ZERO)
            .with_scale(Vec3::new(2.0, 0.1, 0.1))
            .hidden();
        let mid_line = PivotEntity::new(id(6), &origin, MID_LINE_OFFSET)
            .with_scale(Vec3::new(0.1, 0.5, 0.01))
            .hidden();
        let enemy = PivotEntity::new(id(7), &origin, ENEMY_OFFSET)
            .with_scale(ENEMY_SIZE)
            .with_asset(assets.texture("Materials/MadmanRacing/BlueCar.png"))
            .hidden();
        let speaker = PivotEntity::new(id(8), &origin, SPEAKER_OFFSET).with_local_yaw(90.0, &origin);

        log::debug!("MadmanRacing {:?} placed at {:?} yaw {}", instance, origin.position, origin.yaw);

        Self {
            instance,
            origin,
            tuning: tuning.clone(),
            rng: Pcg32::seed_from_u64(seed),
            session: GameSession::new(0, tuning.ramp),
            outbox: Outbox::default(),
            cabinet,
            background,
            start_text,
            input_plane,
            player,
            field_limit,
            mid_line,
            enemy,
            speaker,
            lane: Lane::Left,
            enemy_lane: Lane::Left,
            enemy_motion: TimedMotion::new(),
            mid_line_motion: MotionChain::new(),
            soundtrack: assets.clip("Sounds/MadmanRacing.mp3"),
            explosion: assets.clip("Sounds/Explosion.wav"),
        }
    }

    pub fn lane(&self) -> Lane {
        self.lane
    }

    pub fn input_plane(&self) -> EntityId {
        self.input_plane.id
    }

    /// Cars dodged this run
    pub fn dodged(&self) -> u32 {
        self.session.score()
    }

    fn set_lane(&mut self, lane: Lane) {
        self.lane = lane;
        self.player
            .move_along_tangent(&self.origin, lane.offset(self.tuning.lane_offset));
    }

    fn start(&mut self) {
        self.session.start();
        self.outbox.effect(Effect::LoopSound {
            emitter: self.speaker.id,
            clip: self.soundtrack,
        });

        self.outbox.hide(&mut self.start_text);
        self.outbox.show(&mut self.player);
        self.outbox.show(&mut self.field_limit);
        self.outbox.show(&mut self.mid_line);
        self.outbox.show(&mut self.enemy);

        self.set_lane(Lane::Left);
        if let Some(zone) = self.player.zone.as_mut() {
            zone.clear();
            zone.enabled = true;
        }

        let home = self.mid_line.home(&self.origin);
        self.mid_line_motion.start_looping(vec![MotionLeg::new(
            home,
            home - Vec3::Y * self.tuning.drop_distance,
            self.tuning.mid_line_period,
            (),
        )]);
        self.drop_enemy();

        log::info!("MadmanRacing {:?}: started", self.instance);
        self.outbox.emit(GameEvent::Started {
            instance: self.instance,
        });
    }

    fn drop_enemy(&mut self) {
        self.enemy_lane = if self.rng.random::<f32>() <= self.tuning.left_lane_chance {
            Lane::Left
        } else {
            Lane::Right
        };
        self.enemy
            .move_along_tangent(&self.origin, self.enemy_lane.offset(self.tuning.lane_offset));

        let from = self.enemy.position;
        self.enemy_motion.schedule(MotionLeg::new(
            from,
            from - Vec3::Y * self.tuning.drop_distance,
            self.session.ramp.duration(self.tuning.base_time),
            (),
        ));
    }

    fn enemy_passed(&mut self) {
        self.enemy.reset(&self.origin);
        let score = self.session.add_score(0);
        self.outbox.emit(GameEvent::Scored {
            instance: self.instance,
            player: 0,
            score,
        });

        if let Some(level) = self.session.ramp.record_success() {
            log::info!("MadmanRacing {:?}: difficulty {}", self.instance, level);
            self.outbox.emit(GameEvent::DifficultyUp {
                instance: self.instance,
                level,
            });
        }

        if self.session.is_in_game() {
            self.drop_enemy();
        }
    }

    fn crash(&mut self) {
        self.outbox.effect(Effect::StopSound {
            emitter: self.speaker.id,
            clip: self.soundtrack,
        });
        self.outbox.effect(Effect::PlaySound {
            emitter: self.speaker.id,
            clip: self.explosion,
        });

        self.enemy_motion.stop();
        self.mid_line_motion.stop();
        self.enemy.reset(&self.origin);
        self.mid_line.reset(&self.origin);
        if let Some(zone) = self.player.zone.as_mut() {
            zone.enabled = false;
            zone.clear();
        }

        self.outbox.hide(&mut self.player);
        self.outbox.hide(&mut self.field_limit);
        self.outbox.hide(&mut self.mid_line);
        self.outbox.hide(&mut self.enemy);
        self.outbox.show(&mut self.start_text);

        let score = self.session.score();
        self.session.finish();
        log::info!("MadmanRacing {:?}: crashed after {} cars", self.instance, score);
        self.outbox.emit(GameEvent::GameOver {
            instance: self.instance,
            kind: GameKind::MadmanRacing,
            winner: None,
            score,
        });
    }
}

impl MiniGame for MadmanRacing {
    fn kind(&self) -> GameKind {
        GameKind::MadmanRacing
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
        vec![
            &self.cabinet,
            &self.background,
            &self.start_text,
            &self.input_plane,
            &self.player,
            &self.field_limit,
            &self.mid_line,
            &self.enemy,
            &self.speaker,
        ]
    }

    fn tick(&mut self, dt: f32) {
        if !self.session.is_in_game() {
            return;
        }

        if self.mid_line_motion.tick(&mut self.mid_line.position, dt).is_some() {
            self.mid_line.reset(&self.origin);
        }
        if self.enemy_motion.tick(&mut self.enemy.position, dt).is_some() {
            self.enemy_passed();
        }

        let actor = Actor::of(&self.enemy, &self.origin, Volume::Box { size: ENEMY_SIZE }, LAYER_DEFAULT);
        let events = update_zones(&self.origin, std::iter::once(&mut self.player), &[actor]);
        if events
            .iter()
            .any(|e| e.role == ZoneRole::HitZone && e.edge == TriggerEdge::Enter)
        {
            self.crash();
        }
    }

    fn pointer(&mut self, event: &PointerEvent) {
        if event.kind != PointerKind::Up || event.target != self.input_plane.id {
            return;
        }
        if self.session.is_in_game() {
            self.set_lane(self.lane.toggled());
        } else {
            self.start();
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
            return Some(PointerEvent::up(self.input_plane.id));
        }
        let gap = self.enemy.position.y - self.player.position.y;
        (self.enemy_lane == self.lane && gap < AUTOPLAY_REACTION).then(|| PointerEvent::up(self.input_plane.id))
    }
}
