//! Timed point-to-point motions
//!
//! A leg interpolates linearly from `from` to `to` over `duration` seconds of
//! accumulated tick time and hands back its arrival tag exactly once. Chains
//! run legs in order; the next leg is installed on the tick the previous one
//! arrives and starts moving on the following tick.

use glam::Vec3;

/// Durations are clamped to at least this many seconds
pub const MIN_LEG_DURATION: f32 = 1e-3;

/// Relative slack for accumulated tick time when checking arrival
const ARRIVAL_TOLERANCE: f64 = 1e-6;

/// One timed linear interpolation
#[derive(Debug, Clone, PartialEq)]
pub struct MotionLeg<A> {
    pub from: Vec3,
    pub to: Vec3,
    /// Seconds, always > 0
    pub duration: f32,
    /// Returned by the tick that reaches `to`
    pub on_arrival: A,
}

impl<A> MotionLeg<A> {
    pub fn new(from: Vec3, to: Vec3, duration: f32, on_arrival: A) -> Self {
        debug_assert!(duration > 0.0, "motion leg duration must be positive");
        Self {
            from,
            to,
            duration: duration.max(MIN_LEG_DURATION),
            on_arrival,
        }
    }

    /// Interpolated position after `elapsed` seconds
    pub fn position_at(&self, elapsed: f32) -> Vec3 {
        let t = (elapsed / self.duration).clamp(0.0, 1.0);
        self.from.lerp(self.to, t)
    }
}

#[derive(Debug, Clone)]
struct ActiveLeg<A> {
    leg: MotionLeg<A>,
    elapsed: f64,
    current: Vec3,
}

/// At most one in-flight leg for one entity
#[derive(Debug, Clone)]
pub struct TimedMotion<A> {
    active: Option<ActiveLeg<A>>,
}

impl<A> Default for TimedMotion<A> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<A> TimedMotion<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Start a leg. An in-flight leg is replaced: its arrival tag is dropped
    /// and the new leg starts from the instantaneous position.
    pub fn schedule(&mut self, mut leg: MotionLeg<A>) {
        if let Some(previous) = self.active.take() {
            leg.from = previous.current;
        }
        self.active = Some(ActiveLeg {
            current: leg.from,
            leg,
            elapsed: 0.0,
        });
    }

    /// Cancel the in-flight leg. The entity keeps its last computed position.
    pub fn stop(&mut self) -> bool {
        self.active.take().is_some()
    }

    /// Advance by `dt`, writing the entity position. Returns the arrival tag
    /// on the tick the leg reaches its end.
    pub fn tick(&mut self, position: &mut Vec3, dt: f32) -> Option<A> {
        let active = self.active.as_mut()?;
        active.elapsed += f64::from(dt);

        let duration = f64::from(active.leg.duration);
        if active.elapsed >= duration * (1.0 - ARRIVAL_TOLERANCE) {
            let finished = self.active.take()?;
            *position = finished.leg.to;
            return Some(finished.leg.on_arrival);
        }

        active.current = active.leg.position_at(active.elapsed as f32);
        *position = active.current;
        None
    }
}

/// Ordered legs plus a cursor
#[derive(Debug, Clone)]
pub struct MotionChain<A> {
    legs: Vec<MotionLeg<A>>,
    cursor: usize,
    looping: bool,
    motion: TimedMotion<A>,
}

impl<A> Default for MotionChain<A> {
    fn default() -> Self {
        Self {
            legs: Vec::new(),
            cursor: 0,
            looping: false,
            motion: TimedMotion::default(),
        }
    }
}

impl<A: Clone> MotionChain<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `legs` once, replacing whatever is in flight
    pub fn start(&mut self, legs: Vec<MotionLeg<A>>) {
        self.install(legs, false);
    }

    /// Run `legs` over and over until stopped
    pub fn start_looping(&mut self, legs: Vec<MotionLeg<A>>) {
        self.install(legs, true);
    }

    /// Run a single leg, replacing whatever is in flight
    pub fn single(&mut self, leg: MotionLeg<A>) {
        self.start(vec![leg]);
    }

    fn install(&mut self, legs: Vec<MotionLeg<A>>, looping: bool) {
        self.legs = legs;
        self.cursor = 0;
        self.looping = looping;
        match self.legs.first() {
            Some(first) => self.motion.schedule(first.clone()),
            None => {
                self.motion.stop();
            }
        }
    }

    /// Cancel the chain, leaving the entity where it is
    pub fn stop(&mut self) {
        self.motion.stop();
        self.legs.clear();
        self.cursor = 0;
        self.looping = false;
    }

    pub fn is_active(&self) -> bool {
        self.motion.is_active()
    }

    /// Index of the leg in flight (or about to start)
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Advance the active leg. Returns the arrival tag of a finished leg;
    /// the next leg is already installed when this returns.
    pub fn tick(&mut self, position: &mut Vec3, dt: f32) -> Option<A> {
        let arrived = self.motion.tick(position, dt)?;

        self.cursor += 1;
        if self.cursor >= self.legs.len() && self.looping {
            self.cursor = 0;
        }
        if let Some(next) = self.legs.get(self.cursor) {
            self.motion.schedule(next.clone());
        }

        Some(arrived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.25;

    #[test]
    fn test_arrives_on_ceil_ticks_and_fires_once() {
        let mut motion = TimedMotion::new();
        let mut pos = Vec3::ZERO;
        motion.schedule(MotionLeg::new(Vec3::ZERO, Vec3::new(0.0, -3.0, 0.0), 1.1, "done"));

        // ceil(1.1 / 0.25) = 5
        let mut arrivals = Vec::new();
        for tick in 1..=10 {
            if let Some(tag) = motion.tick(&mut pos, DT) {
                arrivals.push((tick, tag));
            }
        }
        assert_eq!(arrivals, vec![(5, "done")]);
        assert_eq!(pos, Vec3::new(0.0, -3.0, 0.0));
        assert!(!motion.is_active());
    }

    #[test]
    fn test_exact_multiple_duration() {
        let mut motion = TimedMotion::new();
        let mut pos = Vec3::ZERO;
        motion.schedule(MotionLeg::new(Vec3::ZERO, Vec3::X, 1.0, ()));
        for _ in 0..3 {
            assert!(motion.tick(&mut pos, DT).is_none());
        }
        assert_eq!(motion.tick(&mut pos, DT), Some(()));
    }

    #[test]
    fn test_duration_just_past_a_tick_waits_for_the_next() {
        let mut motion = TimedMotion::new();
        let mut pos = Vec3::ZERO;
        motion.schedule(MotionLeg::new(Vec3::ZERO, Vec3::X, 1.00005, ()));

        // ceil(1.00005 / 0.25) = 5
        let arrivals: Vec<_> = (1..=8).filter(|_| motion.tick(&mut pos, DT).is_some()).collect();
        assert_eq!(arrivals, vec![5]);
    }

    #[test]
    fn test_thirty_hertz_ticks_arrive_on_time() {
        let mut motion = TimedMotion::new();
        let mut pos = Vec3::ZERO;
        motion.schedule(MotionLeg::new(Vec3::ZERO, Vec3::X, 5.0, ()));

        let arrivals: Vec<_> = (1..=200)
            .filter(|_| motion.tick(&mut pos, crate::consts::SIM_DT).is_some())
            .collect();
        assert_eq!(arrivals, vec![150]);
    }

    #[test]
    fn test_interpolates_linearly() {
        let mut motion = TimedMotion::new();
        let mut pos = Vec3::ZERO;
        motion.schedule(MotionLeg::new(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), 1.0, ()));
        motion.tick(&mut pos, DT);
        assert!((pos.x - 1.0).abs() < 1e-5);
        motion.tick(&mut pos, DT);
        assert!((pos.x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_replacement_drops_old_arrival_and_starts_from_current() {
        let mut motion = TimedMotion::new();
        let mut pos = Vec3::ZERO;
        motion.schedule(MotionLeg::new(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), 1.0, "old"));
        motion.tick(&mut pos, DT);
        motion.tick(&mut pos, DT);
        assert!((pos.x - 2.0).abs() < 1e-5);

        // The stale `from` is ignored in favour of the in-flight position
        motion.schedule(MotionLeg::new(Vec3::new(100.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 4.0), 1.0, "new"));
        let mut arrivals = Vec::new();
        for _ in 0..10 {
            if let Some(tag) = motion.tick(&mut pos, DT) {
                arrivals.push(tag);
            }
            if pos.x > 2.0 + 1e-4 {
                panic!("interpolation started from the stale origin: {pos:?}");
            }
        }
        assert_eq!(arrivals, vec!["new"]);
        assert_eq!(pos, Vec3::new(2.0, 0.0, 4.0));
    }

    #[test]
    fn test_stop_keeps_last_position() {
        let mut motion = TimedMotion::new();
        let mut pos = Vec3::ZERO;
        motion.schedule(MotionLeg::new(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), 1.0, ()));
        motion.tick(&mut pos, DT);
        assert!(motion.stop());
        for _ in 0..10 {
            assert!(motion.tick(&mut pos, DT).is_none());
        }
        assert!((pos.x - 1.0).abs() < 1e-5);
        assert!(!motion.stop());
    }

    #[test]
    fn test_chain_runs_legs_in_order() {
        let mut chain = MotionChain::new();
        let mut pos = Vec3::ZERO;
        let up = Vec3::new(0.0, 1.0, 0.0);
        chain.start(vec![
            MotionLeg::new(Vec3::ZERO, up, 0.5, 1),
            MotionLeg::new(up, Vec3::ZERO, 0.5, 2),
        ]);

        let mut arrivals = Vec::new();
        for _ in 0..10 {
            if let Some(tag) = chain.tick(&mut pos, DT) {
                arrivals.push((tag, pos));
            }
        }
        assert_eq!(arrivals, vec![(1, up), (2, Vec3::ZERO)]);
        assert!(!chain.is_active());
    }

    #[test]
    fn test_chain_leg_can_jump_to_its_own_start() {
        let mut chain = MotionChain::new();
        let mut pos = Vec3::ZERO;
        chain.start(vec![
            MotionLeg::new(Vec3::ZERO, Vec3::X, 0.25, 'a'),
            MotionLeg::new(Vec3::new(1.0, 0.0, 0.04), Vec3::new(2.0, 0.0, 0.04), 0.5, 'b'),
        ]);
        assert_eq!(chain.tick(&mut pos, DT), Some('a'));
        assert_eq!(chain.cursor(), 1);
        chain.tick(&mut pos, DT);
        assert!((pos - Vec3::new(1.5, 0.0, 0.04)).length() < 1e-5);
    }

    #[test]
    fn test_looping_chain_repeats() {
        let mut chain = MotionChain::new();
        let mut pos = Vec3::ZERO;
        chain.start_looping(vec![MotionLeg::new(Vec3::ZERO, Vec3::NEG_Y, 0.5, ())]);

        let arrivals = (0..20).filter(|_| chain.tick(&mut pos, DT).is_some()).count();
        assert_eq!(arrivals, 10);
        assert!(chain.is_active());

        chain.stop();
        assert!(!chain.is_active());
        assert_eq!(chain.cursor(), 0);
        assert_eq!(chain.tick(&mut pos, DT), None);
    }

    #[test]
    fn test_restart_replaces_running_chain() {
        let mut chain = MotionChain::new();
        let mut pos = Vec3::ZERO;
        chain.start(vec![MotionLeg::new(Vec3::ZERO, Vec3::X, 1.0, "first")]);
        chain.tick(&mut pos, DT);
        chain.start(vec![MotionLeg::new(pos, Vec3::Z, 0.5, "second")]);

        let tags: Vec<_> = (0..10).filter_map(|_| chain.tick(&mut pos, DT)).collect();
        assert_eq!(tags, vec!["second"]);
    }
}
