//! Force contributors for the explosion simulation
//!
//! Defines the force model trait, the set that combines models into one
//! net force per particle, and neighbor-query Newtonian gravity

use crate::simulation::spatial_index::KdTree2;
use crate::simulation::states::{NVec2, ParticleSystem};

/// Collection of force models (gravity, drag, etc.)
/// Each model implements [`ForceModel`] and their contributions are summed
/// into a single force vector per particle
pub struct ForceSet {
    terms: Vec<Box<dyn ForceModel + Send + Sync>>,
}

impl Default for ForceSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ForceSet {
    /// Create an empty force set
    pub fn new() -> Self {
        Self {
            terms: Vec::new()
        }
    }

    /// Add a force model
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: ForceModel + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
        self
    }

    /// Compute the net force on every particle of `sys`
    /// - `index` must be built from the current positions of `sys`
    /// - each `Particle::f` is overwritten, never added to
    pub fn compute_all(&self, index: &KdTree2, sys: &mut ParticleSystem) {
        // Zero buffer
        let mut out = vec![NVec2::zeros(); sys.particles.len()];

        // Iterate over all force contributors
        for term in &self.terms {
            term.accumulate(index, sys, &mut out);
        }

        for (p, f) in sys.particles.iter_mut().zip(out) {
            p.f = f;
        }
    }
}

/// Trait for force sources operating on a [`ParticleSystem`]
/// Implementations add their contribution into `out[i]` for each particle
pub trait ForceModel {
    fn accumulate(&self, index: &KdTree2, sys: &ParticleSystem, out: &mut [NVec2]);
}

/// Newtonian gravity summed over spatial-index neighbors
///
/// With `neighbors: None` every particle queries the whole population, so
/// the interaction is all pairs and unculled (O(N^2) per step).
/// `Some(k)` keeps only the `k` nearest other particles.
#[allow(non_snake_case)]
pub struct NeighborGravity {
    pub G: f64, // gravitational constant
    pub neighbors: Option<usize>,
}

impl ForceModel for NeighborGravity {
    fn accumulate(&self, index: &KdTree2, sys: &ParticleSystem, out: &mut [NVec2]) {
        let n = sys.particles.len();
        if n == 0 { // No particles, return
            return;
        }
        debug_assert_eq!(index.len(), n, "spatial index is stale");

        // The query point itself comes back at distance 0, so ask for one extra
        let k = match self.neighbors {
            Some(k) => k.saturating_add(1),
            None => n,
        };

        for (i, pi) in sys.particles.iter().enumerate() {
            for (j, d) in index.query_nearest(pi.x, k) {
                // Self, and coincident particles: no defined direction
                if j == i || !(d > 0.0) {
                    continue;
                }
                let pj = &sys.particles[j];
                out[i] += gravity_contribution(pi.x, pi.m, pj.x, pj.m, d, self.G);
            }
        }
    }
}

/// Force on a particle at `xi` (mass `mi`) from one at `xj` (mass `mj`)
/// F = G * mi * mj / d^2, directed from i toward j.
/// Zero when the two positions coincide.
#[allow(non_snake_case)]
pub fn pair_force(xi: NVec2, mi: f64, xj: NVec2, mj: f64, G: f64) -> NVec2 {
    let d = (xj - xi).norm();
    if !(d > 0.0) {
        return NVec2::zeros();
    }
    gravity_contribution(xi, mi, xj, mj, d, G)
}

#[allow(non_snake_case)]
fn gravity_contribution(xi: NVec2, mi: f64, xj: NVec2, mj: f64, d: f64, G: f64) -> NVec2 {
    let magnitude = G * mi * mj / (d * d);
    // unit vector i -> j is (xj - xi) / d
    (xj - xi) * (magnitude / d)
}
