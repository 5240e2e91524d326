//! Galton board: a peg-and-bin board that balls drop through and settle in.
//!
//! The geometry builder, drop scheduler and settle tracker are engine
//! agnostic and talk to the physics engine through [`modules::world::PhysicsWorld`].
//! [`modules::rapier_world::RapierWorld`] backs that trait with rapier2d and
//! [`modules::render`] draws the result with macroquad.

pub mod modules;

pub use modules::config::BoardConfig;
pub use modules::error::{Error, Result};
pub use modules::galton::GaltonBoard;
