//! Core state types for the explosion simulation.
//!
//! - `Particle`: one point mass (position, velocity, force, mass, color)
//! - `ParticleSystem`: the owned particle collection and elapsed time `t`

use nalgebra::Vector2;
pub type NVec2 = Vector2<f64>;

#[derive(Debug, Clone)]
pub struct Particle {
    pub x: NVec2, // position (m)
    pub v: NVec2, // velocity (m/s)
    pub f: NVec2, // net force of the current step (N), overwritten every step
    pub m: f64, // mass (kg)
    pub color: [u8; 3], // display only
}

impl Particle {
    /// New particle at rest with respect to forces
    pub fn new(x: NVec2, v: NVec2, m: f64, color: [u8; 3]) -> Self {
        Self {
            x,
            v,
            f: NVec2::zeros(),
            m,
            color,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParticleSystem {
    pub particles: Vec<Particle>, // fixed population, order stable within a frame
    pub t: f64, // elapsed simulated time (s)
}

impl ParticleSystem {
    pub fn new(particles: Vec<Particle>) -> Self {
        Self { particles, t: 0.0 }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Snapshot of the current positions, in particle order
    pub fn positions(&self) -> Vec<NVec2> {
        self.particles.iter().map(|p| p.x).collect()
    }
}
