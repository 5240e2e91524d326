pub mod board;
pub mod config;
pub mod error;
pub mod galton;
pub mod palette;
pub mod rapier_world;
pub mod render;
pub mod scheduler;
pub mod settle;
pub mod world;
