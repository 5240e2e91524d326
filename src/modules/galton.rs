//! The board component: builds the scene, drives the drop scheduler and
//! physics, and owns teardown.

use rand::Rng;
use tracing::{debug, info};

use crate::modules::board::{self, BoardSummary};
use crate::modules::config::BoardConfig;
use crate::modules::error::Result;
use crate::modules::palette;
use crate::modules::render;
use crate::modules::scheduler::{BallTemplate, CancelToken, DropScheduler};
use crate::modules::settle::SettleTracker;
use crate::modules::world::PhysicsWorld;

/// Fixed physics step in seconds.
pub const PHYSICS_STEP: f32 = 1.0 / 60.0;
/// Steps run per `update` at most, so a long stall does not freeze the frame.
pub const MAX_STEPS_PER_UPDATE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Running,
    Stopped,
}

pub struct GaltonBoard<W, R> {
    config: BoardConfig,
    world: W,
    rng: R,
    state: Lifecycle,
    board: Option<BoardSummary>,
    scheduler: Option<DropScheduler>,
    cancel: Option<CancelToken>,
    settle: SettleTracker,
    accumulator: f32,
}

impl<W: PhysicsWorld, R: Rng> GaltonBoard<W, R> {
    /// Fails with [`crate::Error::InvalidConfig`] if `config` does not validate.
    pub fn new(config: BoardConfig, world: W, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            world,
            rng,
            state: Lifecycle::Idle,
            board: None,
            scheduler: None,
            cancel: None,
            settle: SettleTracker::new(),
            accumulator: 0.0,
        })
    }

    /// Build the board and start dropping balls. Only the first call does anything.
    pub fn start(&mut self) {
        if self.state != Lifecycle::Idle {
            debug!(state = ?self.state, "start ignored");
            return;
        }

        self.board = Some(board::build_board(&mut self.world, self.config.peg_size));

        let template = BallTemplate {
            radius: self.config.ball_size,
            restitution: self.config.particle_bounciness,
            fill: palette::sample(&palette::BALL_COLORS, &mut self.rng),
        };
        let scheduler = DropScheduler::start(self.config.ball_count, template)
            .with_interval(self.config.drop_interval())
            .with_max_ticks_per_advance(self.config.max_ticks_per_frame);
        self.cancel = Some(scheduler.cancel_handle());
        self.scheduler = Some(scheduler);
        self.state = Lifecycle::Running;
        info!(ball_count = self.config.ball_count, "galton board started");
    }

    /// Advance by `dt` seconds of wall time: drop due balls, step physics,
    /// then freeze balls that came to rest.
    pub fn update(&mut self, dt: f32) {
        if self.state != Lifecycle::Running {
            return;
        }
        let dt = dt.max(0.0);

        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.advance(dt, &mut self.world, &mut self.settle, &mut self.rng);
        }

        self.accumulator += dt;
        let mut steps = 0;
        while self.accumulator >= PHYSICS_STEP && steps < MAX_STEPS_PER_UPDATE {
            self.world.step(PHYSICS_STEP);
            self.accumulator -= PHYSICS_STEP;
            steps += 1;
        }
        if steps == MAX_STEPS_PER_UPDATE {
            self.accumulator = self.accumulator.min(PHYSICS_STEP);
        }

        self.settle.poll(&mut self.world);
    }

    /// Stop dropping and detach from rendering. Safe to call more than once.
    pub fn stop(&mut self) {
        if self.state != Lifecycle::Running {
            self.state = Lifecycle::Stopped;
            return;
        }
        if let Some(cancel) = &self.cancel {
            cancel.cancel();
        }
        self.state = Lifecycle::Stopped;
        info!(
            dropped = self.balls_dropped(),
            settled = self.settle.settled(),
            "galton board stopped"
        );
    }

    /// Draw the board if it is running. Must be called inside a macroquad frame.
    pub fn draw(&self) {
        if self.state == Lifecycle::Running {
            render::draw_world(&self.world);
        }
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == Lifecycle::Running
    }

    /// Whether the scheduler has dropped its last ball or was cancelled.
    pub fn is_done_dropping(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Token that stops the drop scheduler without tearing the board down.
    pub fn cancel_handle(&self) -> Option<CancelToken> {
        self.cancel.clone()
    }

    pub fn balls_dropped(&self) -> usize {
        self.scheduler.as_ref().map_or(0, DropScheduler::dropped)
    }

    pub fn board(&self) -> Option<BoardSummary> {
        self.board
    }

    pub fn settle(&self) -> &SettleTracker {
        &self.settle
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }
}

impl<W, R> Drop for GaltonBoard<W, R> {
    fn drop(&mut self) {
        if let Some(cancel) = &self.cancel {
            cancel.cancel();
        }
        self.state = Lifecycle::Stopped;
    }
}
