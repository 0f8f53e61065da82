//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle
//! `Scenario` containing:
//! - engine settings (`Engine`)
//! - numerical parameters (`Parameters`)
//! - particle state (`ParticleSystem` at t = 0)
//! - active force set (`ForceSet`)
//!
//! The scenario is inserted into Bevy as a `Resource` and stepped once per
//! frame by the visualization systems

use std::f64::consts::TAU;

use bevy::log::info;
use bevy::prelude::Resource;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::configuration::config::{BodyConfig, ScenarioConfig};
use crate::simulation::engine::Engine;
use crate::simulation::forces::{ForceSet, NeighborGravity};
use crate::simulation::integrator::symplectic_euler;
use crate::simulation::params::Parameters;
use crate::simulation::spatial_index::KdTree2;
use crate::simulation::states::{NVec2, Particle, ParticleSystem};
use crate::visualization::view::{RenderSink, ViewState};

/// Color of configured bodies that do not name one
const DEFAULT_BODY_COLOR: [u8; 3] = [255, 255, 255];

/// Bevy resource representing a fully-initialized simulation
///
/// This is the main "runtime bundle" constructed from a [`ScenarioConfig`]:
/// it contains the engine settings, parameters, current particle state,
/// and the set of active force models
#[derive(Resource)]
pub struct Scenario {
    pub engine: Engine,
    pub parameters: Parameters,
    pub system: ParticleSystem,
    pub forces: ForceSet,
}

impl Scenario {
    /// Bundle a particle system with Newtonian gravity over the index neighbors
    pub fn new(engine: Engine, parameters: Parameters, system: ParticleSystem) -> Self {
        let forces = ForceSet::new().with(NeighborGravity {
            G: parameters.G,
            neighbors: engine.neighbors,
        });

        Self {
            engine,
            parameters,
            system,
            forces,
        }
    }

    pub fn build_scenario(cfg: &ScenarioConfig) -> Self {
        // Parameters (runtime) from ParametersConfig
        let p_cfg = &cfg.parameters;
        let mut parameters = Parameters {
            G: p_cfg.G,
            particle_mass: p_cfg.particle_mass,
            h0: cfg.step_size(),
            explosion_velocity: p_cfg.explosion_velocity,
            initial_radius: p_cfg.initial_radius,
            particle_count: p_cfg.particle_count,
            seed: p_cfg.seed,
        };

        // Engine (runtime) from EngineConfig
        let engine = Engine {
            frame_rate: cfg.engine.frame_rate,
            neighbors: cfg.engine.neighbors,
        };

        // Particles: explicit bodies win over the random explosion
        let particles = if cfg.bodies.is_empty() {
            let mut rng = ChaCha8Rng::seed_from_u64(parameters.seed);
            big_bang(&parameters, &mut rng)
        } else {
            cfg.bodies
                .iter()
                .map(|bc| body_from_config(bc, parameters.particle_mass))
                .collect()
        };
        parameters.particle_count = particles.len();

        info!(
            "scenario: {} particles, dt = {:.4e} s, G = {:e}, neighbors = {}",
            particles.len(),
            parameters.h0,
            parameters.G,
            engine.neighbors.map_or("all".to_string(), |k| k.to_string()),
        );

        Self::new(engine, parameters, ParticleSystem::new(particles))
    }

    /// Advance the simulation by exactly one fixed step `h0`
    ///
    /// rebuild index -> compute forces -> integrate.
    /// The index only lives inside this call, so it can never be queried
    /// after the positions it was built from have moved.
    pub fn step(&mut self) {
        {
            let index = KdTree2::build(&self.system.positions());
            self.forces.compute_all(&index, &mut self.system);
        }

        symplectic_euler(&mut self.system, self.parameters.h0);
    }

    /// Hand every visible particle to `sink`; returns how many were drawn
    pub fn render<S: RenderSink>(&self, view: &ViewState, sink: &mut S) -> usize {
        let radius = view.point_radius();
        let mut drawn = 0;

        for p in &self.system.particles {
            if let Some((x, y)) = view.project(&p.x) {
                sink.draw_point(x, y, p.color, radius);
                drawn += 1;
            }
        }

        drawn
    }
}

/// Generate the initial explosion: every particle starts at a uniform random
/// radius in [0, initial_radius] and angle in [0, 2pi), moving radially
/// outward at `explosion_velocity`
pub fn big_bang(params: &Parameters, rng: &mut impl Rng) -> Vec<Particle> {
    (0..params.particle_count)
        .map(|_| {
            let angle = rng.gen_range(0.0..TAU);
            let distance = rng.gen_range(0.0..=params.initial_radius);
            let dir = NVec2::new(angle.cos(), angle.sin());

            let color = [
                rng.gen_range(100..=255),
                rng.gen_range(100..=255),
                rng.gen_range(100..=255),
            ];

            Particle::new(
                dir * distance,
                dir * params.explosion_velocity,
                params.particle_mass,
                color,
            )
        })
        .collect()
}

// Map `BodyConfig` -> runtime `Particle` using nalgebra vectors
fn body_from_config(bc: &BodyConfig, default_mass: f64) -> Particle {
    Particle::new(
        vec2(&bc.x),
        vec2(&bc.v),
        bc.m.unwrap_or(default_mass),
        bc.color.unwrap_or(DEFAULT_BODY_COLOR),
    )
}

// Missing components read as zero; `ScenarioConfig::validate` reports them
fn vec2(c: &[f64]) -> NVec2 {
    match c {
        [x, y, ..] => NVec2::new(*x, *y),
        _ => NVec2::zeros(),
    }
}
