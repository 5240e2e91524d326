//! Freezes balls in place once the engine reports them at rest.
//!
//! Each tracked ball moves through `Moving -> Settled` exactly once. A
//! settled ball is made static so it keeps acting as an obstacle for the
//! balls that pile up on top of it.

use std::collections::HashMap;

use tracing::debug;

use crate::modules::world::{BodyHandle, PhysicsWorld};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallState {
    Moving,
    Settled,
}

#[derive(Debug, Default)]
pub struct SettleTracker {
    states: HashMap<BodyHandle, BallState>,
    // Moving balls in drop order, so polling is proportional to live balls only.
    moving: Vec<BodyHandle>,
}

impl SettleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start watching `ball`. Returns `false` if it was already tracked.
    pub fn track(&mut self, ball: BodyHandle) -> bool {
        if self.states.contains_key(&ball) {
            return false;
        }
        self.states.insert(ball, BallState::Moving);
        self.moving.push(ball);
        true
    }

    pub fn state(&self, ball: BodyHandle) -> Option<BallState> {
        self.states.get(&ball).copied()
    }

    /// Deliver a "began sleeping" notification for `ball`.
    ///
    /// Returns `true` when this call settled the ball. Untracked and already
    /// settled balls are left alone.
    pub fn notify_sleep<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, ball: BodyHandle) -> bool {
        match self.states.get_mut(&ball) {
            Some(state @ BallState::Moving) => {
                *state = BallState::Settled;
                world.set_static(ball, true);
                self.moving.retain(|&b| b != ball);
                true
            }
            _ => false,
        }
    }

    /// Settle every moving ball the world reports as sleeping. Returns how many settled.
    pub fn poll<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> usize {
        let states = &mut self.states;
        let mut settled = 0;
        self.moving.retain(|&ball| {
            if !world.is_sleeping(ball) {
                return true;
            }
            states.insert(ball, BallState::Settled);
            world.set_static(ball, true);
            settled += 1;
            false
        });
        if settled > 0 {
            debug!(settled, moving = self.moving.len(), "balls settled");
        }
        settled
    }

    pub fn moving(&self) -> usize {
        self.moving.len()
    }

    pub fn settled(&self) -> usize {
        self.states.len() - self.moving.len()
    }
}
