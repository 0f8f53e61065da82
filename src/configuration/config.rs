//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – frame rate and force neighborhood
//! - [`ParametersConfig`] – physical constants and initial explosion settings
//! - [`ViewConfig`]       – initial window size and zoom
//! - [`BodyConfig`]       – optional explicit particles replacing the explosion
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! Every field has a default, so `{}` is a complete scenario: 1000 particles
//! of 1e20 kg thrown outward at 3e8 m/s from within 1e10 m of the origin.
//!
//! # YAML format
//!
//! ```yaml
//! engine:
//!   frame_rate: 60.0         # steps per wall-clock second
//!   neighbors: ~             # ~ -> all pairs, or k nearest
//!
//! parameters:
//!   G: 6.67430e-11           # gravitational constant
//!   particle_mass: 1.0e20    # shared particle mass (kg)
//!   explosion_velocity: 3.0e8
//!   particle_count: 1000
//!   initial_radius: 1.0e10   # particles start within this radius (m)
//!   universe_age: 4.35197e17 # simulated duration used to derive the step
//!   h0: ~                    # ~ -> universe_age / 60 / 60
//!   seed: 42
//!
//! view:
//!   width: 800
//!   height: 600
//!   zoom: 1.0
//!
//! bodies:                    # optional, replaces the random explosion
//!   - x: [ 0.0, 0.0 ]
//!     v: [ 0.0, 0.0 ]
//! ```

use std::io::Read;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use crate::simulation::params::{derive_step, UNIVERSE_AGE};
use crate::visualization::view::MAX_DIMENSION;

/// Engine-level configuration
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub frame_rate: f64, // target steps per second of wall time
    pub neighbors: Option<usize>, // `None` - all pairs, `Some(k)` - k nearest neighbors only
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            neighbors: None,
        }
    }
}

/// Global physical parameters for a scenario
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ParametersConfig {
    pub G: f64,                  // gravitational constant
    pub particle_mass: f64,      // mass of every generated particle
    pub explosion_velocity: f64, // radial speed at t = 0
    pub particle_count: usize,   // population of the explosion
    pub initial_radius: f64,     // upper bound of the initial distance from the origin
    pub universe_age: f64,       // simulated duration used to derive the step size
    pub h0: Option<f64>,         // explicit step size, overrides `universe_age`
    pub seed: u64,               // deterministic seed to make runs reproducible
}

impl Default for ParametersConfig {
    fn default() -> Self {
        Self {
            G: 6.67430e-11,
            particle_mass: 1e20,
            explosion_velocity: 3e8,
            particle_count: 1000,
            initial_radius: 1e10,
            universe_age: UNIVERSE_AGE,
            h0: None,
            seed: 42,
        }
    }
}

/// Initial window and projection settings
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ViewConfig {
    pub width: u32,  // pixels
    pub height: u32, // pixels
    pub zoom: f64,   // projection zoom factor
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            zoom: 1.0,
        }
    }
}

/// Configuration for a single particle's initial state
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub x: Vec<f64>,             // initial position [x, y] (m)
    #[serde(default)]
    pub v: Vec<f64>,             // initial velocity [vx, vy] (m/s), empty -> at rest
    pub m: Option<f64>,          // mass, defaults to `particle_mass`
    pub color: Option<[u8; 3]>,  // display color, defaults to white
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub parameters: ParametersConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub bodies: Vec<BodyConfig>, // empty -> random explosion
}

impl ScenarioConfig {
    /// Parse and validate a scenario from YAML text
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let cfg: ScenarioConfig = serde_yaml::from_str(text).context("invalid scenario YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse and validate a scenario from a reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let cfg: ScenarioConfig = serde_yaml::from_reader(reader).context("invalid scenario YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Fixed step size: explicit `h0`, or derived from `universe_age`
    pub fn step_size(&self) -> f64 {
        self.parameters
            .h0
            .unwrap_or_else(|| derive_step(self.parameters.universe_age))
    }

    /// Reject values the physics or the viewer cannot run with
    pub fn validate(&self) -> Result<()> {
        let p = &self.parameters;
        ensure!(p.G.is_finite() && p.G >= 0.0, "G must be finite and non-negative, got {}", p.G);
        ensure!(p.particle_mass.is_finite() && p.particle_mass > 0.0, "particle_mass must be positive, got {}", p.particle_mass);
        ensure!(p.explosion_velocity.is_finite(), "explosion_velocity must be finite");
        ensure!(p.initial_radius.is_finite() && p.initial_radius >= 0.0, "initial_radius must be non-negative, got {}", p.initial_radius);

        let dt = self.step_size();
        ensure!(dt.is_finite() && dt > 0.0, "step size must be positive, got {}", dt);

        let e = &self.engine;
        ensure!(e.frame_rate.is_finite() && e.frame_rate > 0.0, "frame_rate must be positive, got {}", e.frame_rate);

        let v = &self.view;
        ensure!(
            (1..=MAX_DIMENSION).contains(&v.width) && (1..=MAX_DIMENSION).contains(&v.height),
            "view must be between 1x1 and {MAX_DIMENSION}x{MAX_DIMENSION}, got {}x{}",
            v.width,
            v.height
        );
        ensure!(v.zoom.is_finite() && v.zoom > 0.0, "zoom must be positive, got {}", v.zoom);

        for (i, b) in self.bodies.iter().enumerate() {
            ensure!(b.x.len() == 2, "body {i}: x must have 2 components, got {}", b.x.len());
            ensure!(b.v.is_empty() || b.v.len() == 2, "body {i}: v must have 2 components, got {}", b.v.len());
            if let Some(m) = b.m {
                ensure!(m.is_finite() && m > 0.0, "body {i}: mass must be positive, got {m}");
            }
        }

        Ok(())
    }
}
