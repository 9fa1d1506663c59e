//! Particle field generation.
//!
//! Maps a [`GalaxyParameters`] snapshot to four index-aligned attribute arrays.
//! Every particle sits on one of `branches` straight rays through the origin at
//! a uniformly sampled radius; the visible spiral comes from the shader's
//! radius-dependent spin, and the disk thickness from `random_offsets`, which
//! the shader adds after spinning.
//!
//! # Attribute contract
//!
//! Shared with the vertex stage in [`crate::shader`]:
//!
//! - world units, vertical axis `+Y`
//! - `positions[i]` lies in the XZ plane (`y == 0`) at angle `atan2(z, x)`
//! - `random_offsets[i]` is added after spin and is never rotated
//! - `colors[i]` is linear RGB
//! - `scales[i]` in `[0, 1)` multiplies sprite size only
//!
//! The whole set is rebuilt on every parameter change; there is no
//! incremental update path.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::distributions::Open01;
use rand::Rng;

use crate::error::GenerationError;
use crate::params::GalaxyParameters;

const VEC3_BYTES: u64 = std::mem::size_of::<Vec3>() as u64;
const F32_BYTES: u64 = std::mem::size_of::<f32>() as u64;

/// Upper bounds a generated set must fit into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationLimits {
    /// Largest single attribute buffer, in bytes.
    pub max_buffer_size: u64,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            max_buffer_size: wgpu::Limits::default().max_buffer_size,
        }
    }
}

impl From<&wgpu::Limits> for GenerationLimits {
    fn from(limits: &wgpu::Limits) -> Self {
        Self {
            max_buffer_size: limits.max_buffer_size,
        }
    }
}

impl GenerationLimits {
    /// Fail if `count` particles would not fit.
    pub fn check(&self, count: usize) -> Result<(), GenerationError> {
        let requested = count as u64 * VEC3_BYTES;
        if requested > self.max_buffer_size {
            return Err(GenerationError::ResourceExhausted {
                requested,
                limit: self.max_buffer_size,
            });
        }
        Ok(())
    }
}

/// Per-particle attribute arrays, index-aligned.
///
/// Built only by [`generate`] or [`ParticleAttributeSet::from_parts`], so the
/// four arrays always have the same length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParticleAttributeSet {
    positions: Vec<Vec3>,
    colors: Vec<Vec3>,
    scales: Vec<f32>,
    random_offsets: Vec<Vec3>,
}

impl ParticleAttributeSet {
    /// Assemble a set from existing arrays.
    pub fn from_parts(
        positions: Vec<Vec3>,
        colors: Vec<Vec3>,
        scales: Vec<f32>,
        random_offsets: Vec<Vec3>,
    ) -> Result<Self, GenerationError> {
        let n = positions.len();
        if colors.len() != n || scales.len() != n || random_offsets.len() != n {
            return Err(GenerationError::Misaligned {
                positions: n,
                colors: colors.len(),
                scales: scales.len(),
                offsets: random_offsets.len(),
            });
        }
        Ok(Self {
            positions,
            colors,
            scales,
            random_offsets,
        })
    }

    /// Base positions on the spiral arms, `y == 0`.
    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Linear RGB colours.
    #[inline]
    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    /// Sprite size multipliers in `[0, 1)`.
    #[inline]
    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    /// Jitter added at render time.
    #[inline]
    pub fn random_offsets(&self) -> &[Vec3] {
        &self.random_offsets
    }

    /// Number of particles.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Total bytes across all four arrays.
    pub fn byte_size(&self) -> u64 {
        self.len() as u64 * (3 * VEC3_BYTES + F32_BYTES)
    }

    /// Consume the set, returning `(positions, colors, scales, random_offsets)`.
    pub fn into_parts(self) -> (Vec<Vec3>, Vec<Vec3>, Vec<f32>, Vec<Vec3>) {
        (self.positions, self.colors, self.scales, self.random_offsets)
    }
}

/// Generate a galaxy with [`GenerationLimits::default`].
pub fn generate<R: Rng + ?Sized>(
    params: &GalaxyParameters,
    rng: &mut R,
) -> Result<ParticleAttributeSet, GenerationError> {
    generate_with_limits(params, &GenerationLimits::default(), rng)
}

/// Generate a galaxy, failing cleanly if the set would not fit `limits`.
pub fn generate_with_limits<R: Rng + ?Sized>(
    params: &GalaxyParameters,
    limits: &GenerationLimits,
    rng: &mut R,
) -> Result<ParticleAttributeSet, GenerationError> {
    params.validate()?;

    let count = params.count as usize;
    limits.check(count)?;

    let mut positions = Vec::new();
    let mut colors = Vec::new();
    let mut scales = Vec::new();
    let mut random_offsets = Vec::new();
    reserve(&mut positions, count, limits)?;
    reserve(&mut colors, count, limits)?;
    reserve(&mut scales, count, limits)?;
    reserve(&mut random_offsets, count, limits)?;

    let inside = params.inside_color.to_linear();
    let outside = params.outside_color.to_linear();
    let branches = params.branches;

    for i in 0..params.count {
        // Uniform in radius, not area: particles bunch toward the core.
        let radius = sample_radius(rng, params.radius);

        let branch_angle = (i % branches) as f32 / branches as f32 * TAU;

        positions.push(Vec3::new(
            branch_angle.cos() * radius,
            0.0,
            branch_angle.sin() * radius,
        ));

        random_offsets.push(Vec3::new(
            jitter(rng, params, radius),
            jitter(rng, params, radius),
            jitter(rng, params, radius),
        ));

        let t = (radius / params.radius).clamp(0.0, 1.0);
        colors.push(inside.lerp(outside, t));

        scales.push(rng.gen::<f32>());
    }

    Ok(ParticleAttributeSet {
        positions,
        colors,
        scales,
        random_offsets,
    })
}

/// Uniform radius in the open interval `(0, max)`.
///
/// Falls back to `max / 2` when rounding lands on an endpoint.
fn sample_radius<R: Rng + ?Sized>(rng: &mut R, max: f32) -> f32 {
    let radius = rng.sample::<f32, _>(Open01) * max;
    if radius > 0.0 && radius < max {
        radius
    } else {
        max * 0.5
    }
}

/// One axis of jitter: `u^power * ±1 * randomness * radius`.
fn jitter<R: Rng + ?Sized>(rng: &mut R, params: &GalaxyParameters, radius: f32) -> f32 {
    let magnitude = rng.gen::<f32>().powf(params.randomness_power);
    let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    magnitude * sign * params.randomness * radius
}

/// Host allocation failure is reported the same way as a GPU limit overflow.
fn reserve<T>(
    buf: &mut Vec<T>,
    count: usize,
    limits: &GenerationLimits,
) -> Result<(), GenerationError> {
    buf.try_reserve_exact(count)
        .map_err(|_| GenerationError::ResourceExhausted {
            requested: (count as u64).saturating_mul(std::mem::size_of::<T>() as u64),
            limit: limits.max_buffer_size,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    #[test]
    fn test_generate_lengths() {
        let params = GalaxyParameters {
            count: 2_500,
            ..GalaxyParameters::default()
        };
        let set = generate(&params, &mut rng()).unwrap();
        assert_eq!(set.len(), 2_500);
        assert_eq!(set.colors().len(), 2_500);
        assert_eq!(set.scales().len(), 2_500);
        assert_eq!(set.random_offsets().len(), 2_500);
        assert_eq!(set.byte_size(), 2_500 * 40);
    }

    #[test]
    fn test_single_particle_on_first_branch() {
        let params = GalaxyParameters {
            count: 1,
            ..GalaxyParameters::default()
        };
        let set = generate(&params, &mut rng()).unwrap();
        let p = set.positions()[0];
        assert_eq!(p.y, 0.0);
        assert_eq!(p.z, 0.0);
        assert!(p.x > 0.0 && p.x < params.radius);
    }

    #[test]
    fn test_radius_excludes_both_ends() {
        use rand::rngs::mock::StepRng;

        for max in [0.01, 3.3, 5.0, 7.77, 20.0] {
            // All-zero bits give the smallest sample, all-one bits the largest
            let low = sample_radius(&mut StepRng::new(0, 0), max);
            let high = sample_radius(&mut StepRng::new(u64::MAX, 0), max);
            assert!(low > 0.0, "radius {} at max {}", low, max);
            assert!(high < max, "radius {} at max {}", high, max);
        }
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = GalaxyParameters {
            branches: 1,
            ..GalaxyParameters::default()
        };
        assert_eq!(
            generate(&params, &mut rng()),
            Err(GenerationError::Validation(ValidationError::Branches {
                branches: 1
            }))
        );
    }

    #[test]
    fn test_limits_reject_oversized_sets() {
        let params = GalaxyParameters {
            count: 1_000,
            ..GalaxyParameters::default()
        };
        let limits = GenerationLimits {
            max_buffer_size: 1_200,
        };
        assert_eq!(
            generate_with_limits(&params, &limits, &mut rng()),
            Err(GenerationError::ResourceExhausted {
                requested: 12_000,
                limit: 1_200,
            })
        );

        let exact = GenerationLimits {
            max_buffer_size: 12_000,
        };
        assert!(generate_with_limits(&params, &exact, &mut rng()).is_ok());
    }

    #[test]
    fn test_scale_in_unit_interval() {
        let params = GalaxyParameters {
            count: 5_000,
            ..GalaxyParameters::default()
        };
        let set = generate(&params, &mut rng()).unwrap();
        assert!(set.scales().iter().all(|s| (0.0..1.0).contains(s)));
    }

    #[test]
    fn test_jitter_bounded_by_local_radius() {
        let params = GalaxyParameters {
            count: 5_000,
            randomness: 0.7,
            ..GalaxyParameters::default()
        };
        let set = generate(&params, &mut rng()).unwrap();
        for (p, offset) in set.positions().iter().zip(set.random_offsets()) {
            let r = p.length();
            let bound = params.randomness * r + 1e-5;
            assert!(offset.abs().max_element() <= bound);
        }
    }

    #[test]
    fn test_from_parts_rejects_misaligned() {
        let err = ParticleAttributeSet::from_parts(
            vec![Vec3::ZERO; 3],
            vec![Vec3::ONE; 3],
            vec![0.5; 2],
            vec![Vec3::ZERO; 3],
        )
        .unwrap_err();
        assert_eq!(
            err,
            GenerationError::Misaligned {
                positions: 3,
                colors: 3,
                scales: 2,
                offsets: 3,
            }
        );
    }
}
