//! HoverDisk: two-player air hockey rally
//!
//! The disk slides on a straight line towards a point far past the table and
//! is redirected by the side walls. A player can only hit it while it is in
//! their input zone, and only back the way it came. Goals reset the disk in
//! front of the player who conceded.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::game::MiniGame;
use super::mirror::{DiskLaunch, MirrorFeed, MirrorLink};
use super::motion::{MotionLeg, TimedMotion};
use super::pivot::{Origin, PivotEntity};
use super::state::{
    Effect, EntityId, GameEvent, GameKind, GameSession, InstanceId, Outbox, PointerEvent,
    PointerKind, RampConfig,
};
use super::trigger::{Actor, TriggerEdge, TriggerZone, Volume, ZoneRole, update_zones};
use crate::assets::{AssetCache, AssetHandle};
use crate::consts::LAYER_DISK;
use crate::mul_vec3;
use crate::tuning::HoverDiskTuning;

/// Field size (width along x, length along z)
pub const FIELD_WIDTH: f32 = 3.0;
pub const FIELD_LENGTH: f32 = 5.0;
const WALL_THICKNESS: f32 = 0.05;
const FIELD_Y: f32 = -0.2;
const INPUT_ZONE_Y: f32 = -0.275;
const INPUT_ZONE_Z: f32 = 1.7;

pub const DISK_OFFSET: Vec3 = Vec3::new(0.0, -0.25, -2.0);
pub const DISK_RADIUS: f32 = 0.2;

const TABLE_OFFSET: Vec3 = Vec3::new(0.0, -0.7, 0.0);
const SCOREBOARD_OFFSET: Vec3 = Vec3::new(0.0, 2.0, 0.0);
const FRONT_SCORE: Vec3 = Vec3::new(-0.25, 1.9, -1.45);
const SIDE_SCORE: Vec3 = Vec3::new(1.3, 1.9, -0.25);

// Entity part ids
const PART_TABLE: u32 = 0;
const PART_SCOREBOARD: u32 = 1;
const PART_WALLS: u32 = 2;
const PART_GOALS: u32 = 4;
const PART_INPUT_ZONES: u32 = 6;
const PART_DISK: u32 = 8;
const PART_SCORE_TEXTS: u32 = 9;

/// Score texts around the scoreboard for one player: offset and facing
fn score_text_layout(player: usize) -> [(Vec3, f32); 4] {
    let f = FRONT_SCORE;
    let s = SIDE_SCORE;
    if player == 0 {
        [
            (f, 0.0),
            (s, -90.0),
            (Vec3::new(f.x, f.y, -f.z), 180.0),
            (Vec3::new(-s.x, s.y, s.z), 90.0),
        ]
    } else {
        [
            (Vec3::new(-f.x, f.y, f.z), 0.0),
            (Vec3::new(s.x, s.y, -s.z), -90.0),
            (Vec3::new(-f.x, f.y, -f.z), 180.0),
            (Vec3::new(-s.x, s.y, -s.z), 90.0),
        ]
    }
}

/// One HoverDisk table
pub struct HoverDisk {
    instance: InstanceId,
    origin: Origin,
    tuning: HoverDiskTuning,
    rng: Pcg32,
    session: GameSession,
    outbox: Outbox,

    table: PivotEntity,
    scoreboard: PivotEntity,
    /// Left (-x), right (+x)
    walls: [PivotEntity; 2],
    /// Indexed by goal id: 0 at -z, 1 at +z
    goals: [PivotEntity; 2],
    input_zones: [PivotEntity; 2],
    score_texts: [Vec<PivotEntity>; 2],
    disk: PivotEntity,

    motion: TimedMotion<()>,
    /// Last travel direction in the local frame (y always 0)
    direction: Vec3,
    travel_secs: f32,

    high_clip: AssetHandle,
    low_clip: AssetHandle,

    link: MirrorLink,
    feed: Option<MirrorFeed>,
}

impl HoverDisk {
    pub fn new(origin: Origin, tuning: &HoverDiskTuning, assets: &mut AssetCache, seed: u64) -> Self {
        let instance = InstanceId::next();
        let id = |part| EntityId::new(instance, part);

        let table = PivotEntity::new(id(PART_TABLE), &origin, TABLE_OFFSET)
            .with_scale(mul_vec3(origin.scale, Vec3::splat(0.6)))
            .with_asset(assets.model("Models/DiskTable.glb"));
        let scoreboard = PivotEntity::new(id(PART_SCOREBOARD), &origin, SCOREBOARD_OFFSET)
            .with_scale(mul_vec3(origin.scale, Vec3::splat(0.6)))
            .with_asset(assets.model("Models/Scoreboard.glb"));

        let half_w = FIELD_WIDTH / 2.0;
        let half_l = FIELD_LENGTH / 2.0;
        let wall = |i: u32, x: f32| {
            PivotEntity::new(id(PART_WALLS + i), &origin, Vec3::new(x, FIELD_Y, 0.0)).with_zone(
                TriggerZone::new(
                    ZoneRole::WallBounce,
                    Volume::cube(WALL_THICKNESS, 0.1, FIELD_LENGTH),
                    LAYER_DISK,
                ),
            )
        };
        let goal = |goal_id: u8, z: f32| {
            PivotEntity::new(id(PART_GOALS + goal_id as u32), &origin, Vec3::new(0.0, FIELD_Y, z))
                .with_zone(TriggerZone::new(
                    ZoneRole::Goal { goal_id },
                    Volume::cube(FIELD_WIDTH, 0.1, WALL_THICKNESS),
                    LAYER_DISK,
                ))
        };
        let input_zone = |i: u32, z: f32| {
            PivotEntity::new(id(PART_INPUT_ZONES + i), &origin, Vec3::new(0.0, INPUT_ZONE_Y, z))
                .with_zone(TriggerZone::new(
                    ZoneRole::InputGate,
                    Volume::cube(FIELD_WIDTH, 0.1, 1.0),
                    LAYER_DISK,
                ))
        };

        let mut part = PART_SCORE_TEXTS;
        let mut texts_for = |player: usize| {
            score_text_layout(player)
                .into_iter()
                .map(|(offset, yaw)| {
                    let text = PivotEntity::new(id(part), &origin, offset)
                        .with_scale(Vec3::splat(0.3))
                        .with_local_yaw(yaw, &origin);
                    part += 1;
                    text
                })
                .collect::<Vec<_>>()
        };
        let score_texts = [texts_for(0), texts_for(1)];

        let disk = PivotEntity::new(id(PART_DISK), &origin, DISK_OFFSET)
            .with_scale(mul_vec3(origin.scale, Vec3::splat(0.1)))
            .with_asset(assets.model("Models/Disk.glb"));

        let mut session = GameSession::new(0, RampConfig::flat());
        // The rally is always live
        session.start();

        log::debug!("HoverDisk {:?} placed at {:?} yaw {}", instance, origin.position, origin.yaw);

        Self {
            instance,
            origin,
            tuning: tuning.clone(),
            rng: Pcg32::seed_from_u64(seed),
            session,
            outbox: Outbox::default(),
            table,
            scoreboard,
            walls: [wall(0, -half_w), wall(1, half_w)],
            goals: [goal(0, -half_l), goal(1, half_l)],
            input_zones: [input_zone(0, -INPUT_ZONE_Z), input_zone(1, INPUT_ZONE_Z)],
            score_texts,
            disk,
            motion: TimedMotion::new(),
            direction: Vec3::NEG_Z,
            travel_secs: tuning.max_travel_secs as f32,
            high_clip: assets.clip("Sounds/DiskHigh.mp3"),
            low_clip: assets.clip("Sounds/DiskLow.mp3"),
            link: MirrorLink::new(),
            feed: None,
        }
    }

    pub fn disk(&self) -> &PivotEntity {
        &self.disk
    }

    /// Last travel direction of the disk in the table's frame
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn is_disk_moving(&self) -> bool {
        self.motion.is_active()
    }

    /// Receive every launch this table accepts from now on
    pub fn subscribe_launches(&mut self) -> MirrorFeed {
        self.link.subscribe()
    }

    /// Replay launches accepted by another table
    pub fn follow(&mut self, feed: MirrorFeed) {
        self.feed = Some(feed);
    }

    pub fn in_input_zone(&self) -> bool {
        self.input_zones.iter().any(|e| self.overlaps_disk(e))
    }

    /// Side (-1 left, 1 right) of the wall the disk is touching
    fn touching_wall(&self) -> Option<f32> {
        self.walls
            .iter()
            .find(|e| self.overlaps_disk(e))
            .map(|e| e.offset.x.signum())
    }

    fn overlaps_disk(&self, entity: &PivotEntity) -> bool {
        entity
            .zone
            .as_ref()
            .is_some_and(|zone| zone.is_overlapping(self.disk.id))
    }

    /// Hit the disk along a world-space pointer direction. Returns whether
    /// the launch was accepted.
    pub fn launch(&mut self, world_direction: Vec3) -> bool {
        if !self.in_input_zone() {
            log::debug!("HoverDisk {:?}: disk outside input zones", self.instance);
            return false;
        }

        let mut dir = self.origin.to_local_dir(world_direction);
        dir.y = 0.0;
        let last = self.direction.z;
        if (last > 0.0 && dir.z > 0.0) || (last < 0.0 && dir.z < 0.0) {
            return false;
        }

        let from = self.disk.local_position(&self.origin);
        if let Some(side) = self.touching_wall() {
            let wall_x = side * FIELD_WIDTH / 2.0;
            let dest_x = from.x + self.tuning.launch_distance * dir.x;
            if (side > 0.0 && dest_x > wall_x) || (side < 0.0 && dest_x < wall_x) {
                dir.x = -dir.x;
            }
        }

        let min = self.tuning.min_travel_secs.max(1);
        let max = self.tuning.max_travel_secs.max(min);
        let launch = DiskLaunch {
            from,
            to: from + self.tuning.launch_distance * dir,
            duration: self.rng.random_range(min..=max) as f32,
            direction: dir,
        };

        self.apply_launch(&launch);
        let mirrored = self.link.publish(launch);
        log::debug!(
            "HoverDisk {:?}: launch {:?} over {}s (mirrored to {})",
            self.instance,
            dir,
            launch.duration,
            mirrored
        );
        true
    }

    fn apply_launch(&mut self, launch: &DiskLaunch) {
        self.direction = launch.direction;
        self.travel_secs = launch.duration;
        self.motion.schedule(MotionLeg::new(
            self.origin.to_world(launch.from),
            self.origin.to_world(launch.to),
            launch.duration,
            (),
        ));
    }

    fn bounce(&mut self, wall: usize) {
        if !self.motion.is_active() {
            return;
        }
        self.direction.x = -self.direction.x;

        let from = self.disk.local_position(&self.origin);
        let to = from + self.tuning.launch_distance * self.direction;
        self.motion.schedule(MotionLeg::new(
            self.disk.position,
            self.origin.to_world(to),
            self.travel_secs,
            (),
        ));

        self.play_hit_sound(self.walls[wall].id);
        self.outbox.emit(GameEvent::WallBounce {
            instance: self.instance,
        });
    }

    fn play_hit_sound(&mut self, emitter: EntityId) {
        let clip = if self.rng.random::<f32>() < self.tuning.high_sound_chance {
            self.high_clip
        } else {
            self.low_clip
        };
        self.outbox.effect(Effect::PlaySound { emitter, clip });
    }

    /// Put the disk back in front of the goal that was hit
    pub fn reset_disk(&mut self, goal_id: u8) {
        self.motion.stop();
        let side = if goal_id == 1 { -1.0 } else { 1.0 };
        let offset = Vec3::new(DISK_OFFSET.x, DISK_OFFSET.y, DISK_OFFSET.z * side);
        self.disk.position = self.origin.to_world(offset);
        self.direction = Vec3::new(0.0, 0.0, -side);
    }

    fn score_goal(&mut self, goal_id: u8) {
        self.play_hit_sound(self.goals[goal_id as usize].id);
        self.reset_disk(goal_id);

        let player = 1 - goal_id.min(1);
        let score = self.session.add_score(player as usize);
        self.outbox.emit(GameEvent::Scored {
            instance: self.instance,
            player,
            score,
        });

        if score >= self.tuning.max_score {
            log::info!("HoverDisk {:?}: player {} wins {}", self.instance, player, score);
            self.outbox.emit(GameEvent::GameOver {
                instance: self.instance,
                kind: GameKind::HoverDisk,
                winner: Some(player),
                score,
            });
            self.session.reset();
            for texts in &self.score_texts {
                for text in texts {
                    self.outbox.set_text(text, "0");
                }
            }
            return;
        }

        for text in &self.score_texts[player as usize] {
            self.outbox.set_text(text, score.to_string());
        }
    }
}

impl MiniGame for HoverDisk {
    fn kind(&self) -> GameKind {
        GameKind::HoverDisk
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
        let mut out = vec![&self.table, &self.scoreboard];
        out.extend(self.walls.iter());
        out.extend(self.goals.iter());
        out.extend(self.input_zones.iter());
        out.push(&self.disk);
        out.extend(self.score_texts.iter().flatten());
        out
    }

    fn tick(&mut self, dt: f32) {
        let launches = self.feed.as_ref().map(MirrorFeed::drain).unwrap_or_default();
        for launch in &launches {
            self.apply_launch(launch);
        }

        if self.motion.tick(&mut self.disk.position, dt).is_some() {
            // Ran out of travel without reaching a goal
            self.reset_disk(1);
        }

        let actor = Actor::of(&self.disk, &self.origin, Volume::Sphere { radius: DISK_RADIUS }, LAYER_DISK);
        let zones = self
            .walls
            .iter_mut()
            .chain(self.goals.iter_mut())
            .chain(self.input_zones.iter_mut());
        let events = update_zones(&self.origin, zones, &[actor]);

        let mut scored = false;
        for event in events {
            match (event.role, event.edge) {
                (ZoneRole::WallBounce, TriggerEdge::Enter) if !scored => {
                    if let Some(wall) = self.walls.iter().position(|w| w.id == event.zone) {
                        self.bounce(wall);
                    }
                }
                (ZoneRole::Goal { goal_id }, TriggerEdge::Enter) if !scored => {
                    self.score_goal(goal_id);
                    scored = true;
                }
                _ => {}
            }
        }
    }

    fn pointer(&mut self, event: &PointerEvent) {
        if event.kind == PointerKind::Down && event.target == self.disk.id {
            self.launch(event.direction);
        }
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        self.outbox.drain_events()
    }

    fn drain_effects(&mut self) -> Vec<Effect> {
        self.outbox.drain_effects()
    }

    fn autoplay(&mut self) -> Option<PointerEvent> {
        if !self.in_input_zone() {
            return None;
        }
        // Wait until the disk is heading out of the zone it is in
        let local = self.disk.local_position(&self.origin);
        if self.motion.is_active() && local.z * self.direction.z < 0.0 {
            return None;
        }

        let z = if self.direction.z > 0.0 { -1.0 } else { 1.0 };
        let x = self.rng.random_range(-0.4..=0.4);
        let dir = Vec3::new(x, 0.0, z).normalize();
        Some(PointerEvent::down(self.disk.id, self.origin.to_world_dir(dir)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn table(yaw: f32) -> (HoverDisk, AssetCache) {
        let mut assets = AssetCache::new();
        let origin = Origin::new(Vec3::new(38.0, 1.5, 12.0), yaw);
        let game = HoverDisk::new(origin, &HoverDiskTuning::default(), &mut assets, 42);
        (game, assets)
    }

    fn run_until<F: Fn(&GameEvent) -> bool>(game: &mut HoverDisk, ticks: usize, pred: F) -> Vec<GameEvent> {
        let mut seen = Vec::new();
        for _ in 0..ticks {
            game.tick(SIM_DT);
            let events = game.drain_events();
            let hit = events.iter().any(&pred);
            seen.extend(events);
            if hit {
                break;
            }
        }
        seen
    }

    #[test]
    fn test_starts_in_game_with_disk_in_input_zone() {
        let (mut game, _) = table(0.0);
        assert!(game.session().is_in_game());
        assert!(!game.in_input_zone());
        game.tick(SIM_DT);
        assert!(game.in_input_zone());
        assert_eq!(game.direction(), Vec3::NEG_Z);
    }

    #[test]
    fn test_goal_one_scores_player_zero_and_mirrors_disk() {
        let (mut game, _) = table(90.0);
        game.tick(SIM_DT);

        let forward = game.origin().to_world_dir(Vec3::Z);
        assert!(game.launch(forward));
        assert!(game.is_disk_moving());

        let events = run_until(&mut game, 200, |e| matches!(e, GameEvent::Scored { .. }));
        assert!(events.contains(&GameEvent::Scored {
            instance: game.instance(),
            player: 0,
            score: 1,
        }));
        assert_eq!(game.session().scores, [1, 0]);

        let local = game.disk().local_position(game.origin());
        assert!((local - Vec3::new(0.0, -0.25, 2.0)).length() < 2e-3, "{local:?}");
        assert_eq!(game.direction(), Vec3::Z);
        assert!(!game.is_disk_moving());

        let effects = game.drain_effects();
        assert!(effects.contains(&Effect::SetText(game.score_texts[0][0].id, "1".into())));
        assert!(effects.iter().any(|e| matches!(e, Effect::PlaySound { .. })));
    }

    #[test]
    fn test_launch_rejected_outside_zone_or_same_direction() {
        let (mut game, _) = table(0.0);
        // Not registered in a zone before the first tick
        assert!(!game.launch(Vec3::Z));

        game.tick(SIM_DT);
        // Last direction is -z, so another -z hit is refused
        assert!(!game.launch(Vec3::NEG_Z));
        assert!(!game.is_disk_moving());
        assert!(game.launch(Vec3::Z));
    }

    #[test]
    fn test_side_wall_mirrors_direction() {
        let (mut game, _) = table(0.0);
        game.tick(SIM_DT);
        assert!(game.launch(Vec3::new(0.5, 0.0, 0.866)));

        let events = run_until(&mut game, 300, |e| matches!(e, GameEvent::WallBounce { .. }));
        assert!(events.iter().any(|e| matches!(e, GameEvent::WallBounce { .. })));
        assert!(game.direction().x < 0.0);
        assert!(game.direction().z > 0.0);
        assert!(game.is_disk_moving());

        // Keeps travelling away from the wall
        let before = game.disk().local_position(game.origin()).x;
        for _ in 0..10 {
            game.tick(SIM_DT);
        }
        assert!(game.disk().local_position(game.origin()).x < before);
    }

    /// Launch along a direction given in the table's frame
    fn hit_local(game: &mut HoverDisk, local: Vec3) -> bool {
        let world = game.origin().to_world_dir(local.normalize());
        game.launch(world)
    }

    /// Slide the disk into the right wall while it stays in the near input zone
    fn pin_to_right_wall(game: &mut HoverDisk) {
        game.tick(SIM_DT);
        assert!(hit_local(game, Vec3::new(0.99, 0.0, 0.14)));
        let events = run_until(game, 300, |e| matches!(e, GameEvent::WallBounce { .. }));
        assert!(events.iter().any(|e| matches!(e, GameEvent::WallBounce { .. })));
        assert_eq!(game.touching_wall(), Some(1.0));
        assert!(game.in_input_zone());
    }

    #[test]
    fn test_launch_into_touched_wall_is_mirrored() {
        let (mut game, _) = table(30.0);
        pin_to_right_wall(&mut game);

        // Aimed back into the right wall: x flips, z is kept
        assert!(hit_local(&mut game, Vec3::new(0.7, 0.0, -0.7)));
        let dir = game.direction();
        assert!(dir.x < 0.0 && dir.z < 0.0, "{dir:?}");
        assert!((dir.x - dir.z).abs() < 1e-2, "{dir:?}");
    }

    #[test]
    fn test_launch_after_leaving_wall_is_not_mirrored() {
        let (mut game, _) = table(30.0);
        pin_to_right_wall(&mut game);

        for _ in 0..300 {
            if game.touching_wall().is_none() {
                break;
            }
            game.tick(SIM_DT);
        }
        assert_eq!(game.touching_wall(), None);
        assert!(game.in_input_zone());

        assert!(hit_local(&mut game, Vec3::new(0.7, 0.0, -0.7)));
        let dir = game.direction();
        assert!(dir.x > 0.0 && dir.z < 0.0, "{dir:?}");
    }

    #[test]
    fn test_match_ends_at_max_score() {
        let (mut game, _) = table(0.0);
        for _ in 0..9 {
            game.score_goal(0);
        }
        assert_eq!(game.session().scores, [0, 9]);
        game.drain_events();
        game.drain_effects();

        game.score_goal(0);
        let events = game.drain_events();
        assert!(events.contains(&GameEvent::GameOver {
            instance: game.instance(),
            kind: GameKind::HoverDisk,
            winner: Some(1),
            score: 10,
        }));
        assert_eq!(game.session().scores, [0, 0]);

        let resets = game
            .drain_effects()
            .into_iter()
            .filter(|e| matches!(e, Effect::SetText(_, text) if text == "0"))
            .count();
        assert_eq!(resets, 8);
    }

    #[test]
    fn test_goal_zero_resets_to_home_side() {
        let (mut game, _) = table(0.0);
        game.reset_disk(0);
        let local = game.disk().local_position(game.origin());
        assert!((local - DISK_OFFSET).length() < 2e-3);
        assert_eq!(game.direction(), Vec3::NEG_Z);
    }

    #[test]
    fn test_follower_replays_launches() {
        let mut assets = AssetCache::new();
        let tuning = HoverDiskTuning::default();
        let mut leader = HoverDisk::new(Origin::new(Vec3::new(10.0, 1.5, 12.0), 0.0), &tuning, &mut assets, 1);
        let mut follower = HoverDisk::new(Origin::new(Vec3::new(10.0, 7.2, 20.0), 0.0), &tuning, &mut assets, 2);
        follower.follow(leader.subscribe_launches());

        leader.tick(SIM_DT);
        follower.tick(SIM_DT);
        assert!(leader.launch(Vec3::new(0.2, 0.0, 0.98)));
        assert!(!follower.is_disk_moving());

        follower.tick(SIM_DT);
        assert!(follower.is_disk_moving());
        assert_eq!(follower.direction(), leader.direction());
    }

    #[test]
    fn test_autoplay_keeps_a_rally_going() {
        let (mut game, _) = table(-90.0);
        let mut launches = 0;
        for tick in 0..3_000 {
            game.tick(SIM_DT);
            if tick % 5 != 0 {
                continue;
            }
            if let Some(event) = game.autoplay() {
                let before = game.direction();
                game.pointer(&event);
                if game.direction() != before {
                    launches += 1;
                }
            }
        }
        // Served, then returned from the far end at least once
        assert!(launches >= 2, "only {launches} launches");
    }

    #[test]
    fn test_shared_assets() {
        let mut assets = AssetCache::new();
        let tuning = HoverDiskTuning::default();
        let a = HoverDisk::new(Origin::new(Vec3::ZERO, 0.0), &tuning, &mut assets, 1);
        let b = HoverDisk::new(Origin::new(Vec3::X * 10.0, 0.0), &tuning, &mut assets, 2);
        assert_eq!(a.disk().asset, b.disk().asset);
        assert_ne!(a.instance(), b.instance());
        assert_eq!(assets.len(), 5);
    }
}
