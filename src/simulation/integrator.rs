//! Fixed-step time integration for the particle system
//!
//! Symplectic (semi-implicit) Euler: the velocity is kicked with the force
//! computed at the start of the step, then the position drifts with the
//! *updated* velocity. Swapping the two updates gives explicit Euler, which
//! behaves differently and is not used here.

use super::states::{Particle, ParticleSystem};

/// Advance one particle by `dt` using its current force
/// v_n+1 = v_n + (f_n / m) * dt
/// x_n+1 = x_n + v_n+1 * dt
pub fn euler_advance(p: &mut Particle, dt: f64) {
    p.v += p.f / p.m * dt;
    p.x += p.v * dt;
}

/// Advance every particle of `sys` by `dt` and move the clock forward
pub fn symplectic_euler(sys: &mut ParticleSystem, dt: f64) {
    for p in sys.particles.iter_mut() {
        euler_advance(p, dt);
    }

    sys.t += dt;
}
