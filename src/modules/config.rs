//! Board configuration.
//!
//! Defaults reproduce the stock board. A TOML file can override any field;
//! missing keys keep their default.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::modules::error::{Error, Result};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BoardConfig {
    /// Ball restitution.
    #[serde(alias = "particleBouncyness", alias = "particle_bouncyness")]
    pub particle_bounciness: f32,
    /// Requested drop count. One extra ball is always dropped.
    #[serde(alias = "ballCount")]
    pub ball_count: usize,
    /// Ball radius.
    #[serde(alias = "ballSize")]
    pub ball_size: f32,
    /// Peg radius.
    #[serde(alias = "pegSize")]
    pub peg_size: f32,
    /// Fixed RNG seed; seeded from the clock when absent.
    pub seed: Option<u64>,
    pub drop_interval_ms: f32,
    /// Downward acceleration in board units per second squared.
    pub gravity: f32,
    pub max_ticks_per_frame: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            particle_bounciness: 0.3,
            ball_count: 1500,
            ball_size: 2.0,
            peg_size: 1.0,
            seed: None,
            drop_interval_ms: 10.0,
            gravity: 1000.0,
            max_ticks_per_frame: 8,
        }
    }
}

impl BoardConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        info!(path = %path.display(), "loaded board config");
        Ok(config)
    }

    /// Drop interval in seconds.
    pub fn drop_interval(&self) -> f32 {
        self.drop_interval_ms / 1000.0
    }

    /// Every out-of-range field with the reason, in declaration order.
    fn problems(&self) -> Vec<(&'static str, String)> {
        let mut problems = Vec::new();
        for (name, value) in [
            ("ball_size", self.ball_size),
            ("peg_size", self.peg_size),
            ("drop_interval_ms", self.drop_interval_ms),
        ] {
            if !(value.is_finite() && value > 0.0) {
                problems.push((name, format!("{name} must be a positive number, got {value}")));
            }
        }
        if !self.particle_bounciness.is_finite() || self.particle_bounciness < 0.0 {
            problems.push((
                "particle_bounciness",
                format!(
                    "particle_bounciness must be a non-negative number, got {}",
                    self.particle_bounciness
                ),
            ));
        }
        if !self.gravity.is_finite() {
            problems.push(("gravity", "gravity must be finite".into()));
        }
        if self.max_ticks_per_frame == 0 {
            problems.push((
                "max_ticks_per_frame",
                "max_ticks_per_frame must be at least 1".into(),
            ));
        }
        problems
    }

    pub fn validate(&self) -> Result<()> {
        match self.problems().into_iter().next() {
            Some((_, reason)) => Err(Error::InvalidConfig(reason)),
            None => Ok(()),
        }
    }

    /// Put every out-of-range field back to its default, leaving valid ones alone.
    /// Returns the reasons for each field that was reset.
    pub fn repair(&mut self) -> Vec<String> {
        let defaults = Self::default();
        let problems = self.problems();
        for (name, _) in &problems {
            match *name {
                "ball_size" => self.ball_size = defaults.ball_size,
                "peg_size" => self.peg_size = defaults.peg_size,
                "drop_interval_ms" => self.drop_interval_ms = defaults.drop_interval_ms,
                "particle_bounciness" => self.particle_bounciness = defaults.particle_bounciness,
                "gravity" => self.gravity = defaults.gravity,
                "max_ticks_per_frame" => self.max_ticks_per_frame = defaults.max_ticks_per_frame,
                _ => {}
            }
        }
        problems.into_iter().map(|(_, reason)| reason).collect()
    }
}
