//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds the startup constants:
//! - gravitational constant and per-particle mass,
//! - fixed integration step `h0`,
//! - explosion speed, initial radius, population and random seed

/// Seconds in the age of the universe (13.8 Gyr)
pub const UNIVERSE_AGE: f64 = 13.8e9 * 365.0 * 24.0 * 3600.0;

/// Fixed step derived from a simulated duration: one sixtieth of it per
/// second of wall time, split over 60 frames.
pub fn derive_step(universe_age: f64) -> f64 {
    universe_age / 60.0 / 60.0
}

#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct Parameters {
    pub G: f64, // gravitational constant
    pub particle_mass: f64, // shared particle mass
    pub h0: f64, // fixed step size (s)
    pub explosion_velocity: f64, // initial radial speed (m/s)
    pub initial_radius: f64, // upper bound of the initial radius (m)
    pub particle_count: usize, // population
    pub seed: u64, // deterministic seed
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            G: 6.67430e-11,
            particle_mass: 1e20,
            h0: derive_step(UNIVERSE_AGE),
            explosion_velocity: 3e8,
            initial_radius: 1e10,
            particle_count: 1000,
            seed: 42,
        }
    }
}
