//! Field functions shared between the orb shader and the tests.
//!
//! CPU mirrors of `particle_density` and `surface_noise` in `orb.wgsl`,
//! kept in step constant for constant so the renderer's determinism can be
//! checked without a GPU device. The shader is a pure function of
//! (particles, uniforms, coordinate); these mirrors carry that contract's
//! test coverage.

use glam::Vec2;

use crate::particles::Particle;

/// Every Nth particle feeds the density field (matches `orb.wgsl`)
pub const DENSITY_STRIDE: usize = 5;

/// Upper bound on density samples per pixel (matches `orb.wgsl`)
pub const DENSITY_CAP: usize = 200;

/// Octaves of summed sinusoids in the surface noise (matches `orb.wgsl`)
pub const NOISE_OCTAVES: u32 = 4;

/// Blurred point-cloud field: exponential falloff over every 5th particle,
/// capped at 200 samples.
pub fn particle_density(coord: Vec2, particles: &[Particle]) -> f32 {
    let mut density = 0.0;
    let mut taken = 0;
    let mut i = 0;
    while i < particles.len() && taken < DENSITY_CAP {
        let d = (coord - Vec2::from_array(particles[i].position)).length();
        density += (-d * 12.0).exp() * 0.005;
        taken += 1;
        i += DENSITY_STRIDE;
    }
    density
}

/// Multi-octave summed sinusoids: frequency doubles and amplitude halves
/// per octave.
pub fn surface_noise(coord: Vec2, t: f32) -> f32 {
    let mut noise = 0.0;
    let mut p = coord * 3.0;
    for _ in 0..NOISE_OCTAVES {
        noise += (p.x + t * 0.5).sin() * (p.y + t * 0.3).cos() * 0.5;
        p *= 2.0;
        noise *= 0.5;
    }
    noise
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::OrbPhysics;
    use crate::particles::ParticleField;

    #[test]
    fn field_functions_are_bit_stable_across_evaluations() {
        let field = ParticleField::new(OrbPhysics::default());

        // Sweep a coordinate/time grid; identical inputs must produce
        // byte-identical outputs on every evaluation.
        for xi in -4i32..=4 {
            for yi in -4i32..=4 {
                let coord = Vec2::new(xi as f32 * 0.25, yi as f32 * 0.25);
                for ti in 0..8 {
                    let t = ti as f32 * 1.37;
                    let d0 = particle_density(coord, &field.particles);
                    let d1 = particle_density(coord, &field.particles);
                    assert_eq!(d0.to_bits(), d1.to_bits());

                    let n0 = surface_noise(coord, t);
                    let n1 = surface_noise(coord, t);
                    assert_eq!(n0.to_bits(), n1.to_bits());
                }
            }
        }
    }

    #[test]
    fn density_falls_off_away_from_the_cloud() {
        let particles = vec![Particle { position: [0.0, 0.0] }; 1000];
        let near = particle_density(Vec2::new(0.1, 0.0), &particles);
        let far = particle_density(Vec2::new(0.5, 0.0), &particles);
        assert!(near > far);
        assert!(far > 0.0);
    }

    #[test]
    fn density_samples_are_capped() {
        // With the 5-stride, the cap binds after the first 1000 indices;
        // extra particles beyond that must not contribute.
        let particles = vec![Particle { position: [0.0, 0.0] }; 2000];
        let coord = Vec2::new(0.3, 0.0);
        let density = particle_density(coord, &particles);

        let expected = DENSITY_CAP as f32 * (-coord.length() * 12.0).exp() * 0.005;
        assert!((density - expected).abs() < 1.0e-6);
    }

    #[test]
    fn surface_noise_stays_bounded() {
        // Geometric octave sum: |noise| < 0.5 for any input.
        for i in 0..500 {
            let coord = Vec2::new((i as f32 * 0.173).sin() * 2.0, (i as f32 * 0.311).cos() * 2.0);
            let n = surface_noise(coord, i as f32 * 0.7);
            assert!(n.abs() < 0.5, "noise out of range: {}", n);
        }
    }
}
