//! Drops balls into the world on a fixed interval.
//!
//! The stop check runs before the tick's ball is created and does not skip
//! it, so a scheduler started for `n` balls drops `n + 1`.

use std::cell::Cell;
use std::rc::Rc;

use macroquad::color::Color;
use macroquad::math::vec2;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::modules::settle::SettleTracker;
use crate::modules::world::{BodyHandle, BodySpec, Material, PhysicsWorld};

/// Seconds between drops.
pub const DROP_INTERVAL: f32 = 0.010;

pub const DROP_X: f32 = 150.0;
pub const DROP_Y: f32 = 15.0;
/// Half-width of the uniform jitter applied to the drop x.
pub const DROP_JITTER: f32 = 1.0;
/// Bound on initial horizontal and angular speed, per step.
pub const DROP_SPIN: f32 = 0.05;

pub const BALL_FRICTION: f32 = 0.00001;
pub const BALL_AIR_FRICTION: f32 = 0.042;
pub const BALL_SLEEP_THRESHOLD: u32 = 25;

/// Everything a dropped ball shares with its siblings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallTemplate {
    pub radius: f32,
    pub restitution: f32,
    pub fill: Color,
}

impl BallTemplate {
    pub fn spec_at(&self, x: f32, y: f32) -> BodySpec {
        BodySpec::circle(vec2(x, y), self.radius)
            .material(Material {
                restitution: Some(self.restitution),
                friction: Some(BALL_FRICTION),
                air_friction: Some(BALL_AIR_FRICTION),
                sleep_threshold: Some(BALL_SLEEP_THRESHOLD),
            })
            .fill(self.fill)
    }
}

/// Shared stop flag for a [`DropScheduler`]. Clones refer to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug)]
pub struct DropScheduler {
    ball_count: usize,
    template: BallTemplate,
    dropped: usize,
    interval: f32,
    elapsed: f32,
    max_ticks_per_advance: u32,
    cancel: CancelToken,
}

impl DropScheduler {
    /// Arm a scheduler for `ball_count` balls. No ball is dropped until the first tick.
    pub fn start(ball_count: usize, template: BallTemplate) -> Self {
        Self {
            ball_count,
            template,
            dropped: 0,
            interval: DROP_INTERVAL,
            elapsed: 0.0,
            max_ticks_per_advance: 8,
            cancel: CancelToken::new(),
        }
    }

    /// Set the drop interval in seconds. Non-positive or non-finite values
    /// are refused and the current interval is kept.
    pub fn with_interval(mut self, interval: f32) -> Self {
        if interval.is_finite() && interval > 0.0 {
            self.interval = interval;
        } else {
            warn!(interval, "ignoring invalid drop interval");
        }
        self
    }

    /// Cap on ticks fired by one [`DropScheduler::advance`] after a long stall.
    pub fn with_max_ticks_per_advance(mut self, max: u32) -> Self {
        self.max_ticks_per_advance = max.max(1);
        self
    }

    pub fn cancel_handle(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Run one interval tick.
    pub fn tick<W, R>(&mut self, world: &mut W, settle: &mut SettleTracker, rng: &mut R) -> Option<BodyHandle>
    where
        W: PhysicsWorld + ?Sized,
        R: Rng + ?Sized,
    {
        if self.cancel.is_cancelled() {
            return None;
        }
        if self.dropped == self.ball_count {
            self.cancel.cancel();
            info!(dropped = self.dropped + 1, "drop scheduler finished");
        }

        let ball = self.drop_ball(world, settle, rng);
        self.dropped += 1;
        Some(ball)
    }

    /// Feed elapsed wall time and fire every interval tick that came due.
    /// Returns how many balls were dropped.
    pub fn advance<W, R>(&mut self, dt: f32, world: &mut W, settle: &mut SettleTracker, rng: &mut R) -> usize
    where
        W: PhysicsWorld + ?Sized,
        R: Rng + ?Sized,
    {
        if self.cancel.is_cancelled() {
            return 0;
        }
        // NaN and negative frame times count as no time passing
        self.elapsed += dt.max(0.0);

        let mut ticks = 0;
        let mut dropped = 0;
        while self.elapsed >= self.interval && ticks < self.max_ticks_per_advance {
            self.elapsed -= self.interval;
            ticks += 1;
            if self.tick(world, settle, rng).is_some() {
                dropped += 1;
            } else {
                break;
            }
        }
        if ticks == self.max_ticks_per_advance && self.elapsed >= self.interval {
            debug!(behind = self.elapsed, "drop scheduler fell behind, skipping ticks");
            self.elapsed %= self.interval;
        }
        dropped
    }

    fn drop_ball<W, R>(&self, world: &mut W, settle: &mut SettleTracker, rng: &mut R) -> BodyHandle
    where
        W: PhysicsWorld + ?Sized,
        R: Rng + ?Sized,
    {
        let x = DROP_X + rng.gen_range(-DROP_JITTER..=DROP_JITTER);
        let ball = world.add_body(self.template.spec_at(x, DROP_Y));
        world.set_velocity(ball, vec2(rng.gen_range(-DROP_SPIN..=DROP_SPIN), 0.0));
        world.set_angular_velocity(ball, rng.gen_range(-DROP_SPIN..=DROP_SPIN));
        settle.track(ball);
        ball
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::world::MemoryWorld;
    use macroquad::color::RED;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn template() -> BallTemplate {
        BallTemplate {
            radius: 2.0,
            restitution: 0.3,
            fill: RED,
        }
    }

    fn run_to_completion(n: usize) -> (DropScheduler, MemoryWorld, SettleTracker) {
        let mut world = MemoryWorld::new();
        let mut settle = SettleTracker::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut scheduler = DropScheduler::start(n, template());
        for _ in 0..n + 10 {
            scheduler.tick(&mut world, &mut settle, &mut rng);
        }
        (scheduler, world, settle)
    }

    #[test]
    fn drops_one_more_than_requested() {
        let (scheduler, world, settle) = run_to_completion(5);
        assert_eq!(scheduler.dropped(), 6);
        assert_eq!(world.body_count(), 6);
        assert_eq!(settle.moving(), 6);
        assert!(scheduler.is_finished());
    }

    #[test]
    fn zero_balls_still_drops_one() {
        let (scheduler, world, _) = run_to_completion(0);
        assert_eq!(scheduler.dropped(), 1);
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn balls_start_near_the_funnel() {
        let (_, world, _) = run_to_completion(200);
        for ball in world.handles() {
            let spec = world.spec(ball);
            assert!((149.0..=151.0).contains(&spec.position.x));
            assert_eq!(spec.position.y, 15.0);
            assert!(!spec.is_static);

            let v = world.velocity(ball);
            assert!((-0.05..=0.05).contains(&v.x));
            assert_eq!(v.y, 0.0);
            assert!((-0.05..=0.05).contains(&world.angular_velocity(ball)));
        }
    }

    #[test]
    fn ball_material_matches_template() {
        let (_, world, _) = run_to_completion(0);
        let spec = world.specs().next().expect("ball");
        assert_eq!(spec.material.restitution, Some(0.3));
        assert_eq!(spec.material.friction, Some(BALL_FRICTION));
        assert_eq!(spec.material.air_friction, Some(BALL_AIR_FRICTION));
        assert_eq!(spec.material.sleep_threshold, Some(25));
        assert_eq!(spec.fill, RED);
    }

    #[test]
    fn cancel_stops_further_drops() {
        let mut world = MemoryWorld::new();
        let mut settle = SettleTracker::new();
        let mut rng = StdRng::seed_from_u64(2);
        let mut scheduler = DropScheduler::start(100, template());
        let handle = scheduler.cancel_handle();

        for _ in 0..3 {
            scheduler.tick(&mut world, &mut settle, &mut rng);
        }
        handle.cancel();
        assert!(scheduler.tick(&mut world, &mut settle, &mut rng).is_none());
        assert_eq!(scheduler.advance(1.0, &mut world, &mut settle, &mut rng), 0);
        assert_eq!(world.body_count(), 3);
        assert_eq!(settle.moving(), 3);
    }

    #[test]
    fn advance_fires_one_tick_per_interval() {
        let mut world = MemoryWorld::new();
        let mut settle = SettleTracker::new();
        let mut rng = StdRng::seed_from_u64(3);
        let mut scheduler = DropScheduler::start(100, template()).with_interval(0.25);

        assert_eq!(scheduler.advance(0.1, &mut world, &mut settle, &mut rng), 0);
        assert_eq!(scheduler.advance(0.2, &mut world, &mut settle, &mut rng), 1);
        assert_eq!(scheduler.advance(0.5, &mut world, &mut settle, &mut rng), 2);
        assert_eq!(world.body_count(), 3);
    }

    #[test]
    fn advance_caps_catch_up_after_a_stall() {
        let mut world = MemoryWorld::new();
        let mut settle = SettleTracker::new();
        let mut rng = StdRng::seed_from_u64(4);
        let mut scheduler = DropScheduler::start(100, template())
            .with_interval(0.5)
            .with_max_ticks_per_advance(2);

        assert_eq!(scheduler.advance(10.0, &mut world, &mut settle, &mut rng), 2);
        assert_eq!(scheduler.advance(0.0, &mut world, &mut settle, &mut rng), 0);
    }

    #[test]
    fn zero_or_negative_interval_is_refused() {
        let mut world = MemoryWorld::new();
        let mut settle = SettleTracker::new();
        let mut rng = StdRng::seed_from_u64(5);

        for bad in [0.0, -0.01, f32::NAN] {
            let mut scheduler = DropScheduler::start(100, template()).with_interval(bad);
            // still the stock 10 ms cadence
            assert_eq!(scheduler.advance(0.016, &mut world, &mut settle, &mut rng), 1);
            assert_eq!(scheduler.advance(0.02, &mut world, &mut settle, &mut rng), 2);
            assert_eq!(scheduler.advance(0.0, &mut world, &mut settle, &mut rng), 0);
            assert!(!scheduler.is_finished());
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let (_, a, _) = run_to_completion(20);
        let (_, b, _) = run_to_completion(20);
        let xa: Vec<f32> = a.specs().map(|s| s.position.x).collect();
        let xb: Vec<f32> = b.specs().map(|s| s.position.x).collect();
        assert_eq!(xa, xb);
    }
}
