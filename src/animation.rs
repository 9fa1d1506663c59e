//! CPU mirror of the per-frame shader math.
//!
//! The vertex and fragment stages in [`crate::shader`] evaluate exactly these
//! functions on the GPU. Keeping a CPU copy lets tests pin the animation
//! contract down without a device, and lets callers find where a particle is
//! drawn at a given time.
//!
//! ```ignore
//! let rendered = animated_position(base, offset, uniforms.elapsed_time(), visuals.spin_rate);
//! ```

use glam::Vec3;

/// Radius below which a particle is treated as sitting on the spin axis.
pub const MIN_SPIN_RADIUS: f32 = 1e-6;

/// Smallest view depth used for size attenuation.
pub const MIN_VIEW_DEPTH: f32 = 1e-4;

/// Uniforms shared by every particle in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    /// Display pixel density. Fixed for the session.
    pub point_size_scale: f32,
    elapsed_time: f32,
}

impl FrameUniforms {
    pub fn new(point_size_scale: f32) -> Self {
        Self {
            point_size_scale,
            elapsed_time: 0.0,
        }
    }

    /// Seconds since rendering started.
    #[inline]
    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    /// Move the clock forward.
    ///
    /// Returns `false` and leaves the clock untouched if `elapsed` is not
    /// strictly later than the current time.
    pub fn advance(&mut self, elapsed: f32) -> bool {
        if elapsed.is_finite() && elapsed > self.elapsed_time {
            self.elapsed_time = elapsed;
            true
        } else {
            false
        }
    }
}

/// Planar distance from the spin axis.
#[inline]
pub fn planar_radius(position: Vec3) -> f32 {
    (position.x * position.x + position.z * position.z).sqrt()
}

/// Spin angle for a particle at `radius` after `elapsed` seconds.
///
/// Inner particles revolve faster (`1 / r`). Particles on the axis do not spin.
pub fn spin_angle(elapsed: f32, spin_rate: f32, radius: f32) -> f32 {
    if radius > MIN_SPIN_RADIUS {
        elapsed * spin_rate / radius
    } else {
        0.0
    }
}

/// Rotate about `+Y` so that `atan2(z, x)` increases by `angle`.
pub fn rotate_about_y(position: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(
        position.x * c - position.z * s,
        position.y,
        position.x * s + position.z * c,
    )
}

/// World position of a particle: spun base position plus untouched jitter.
pub fn animated_position(base: Vec3, random_offset: Vec3, elapsed: f32, spin_rate: f32) -> Vec3 {
    let angle = spin_angle(elapsed, spin_rate, planar_radius(base));
    rotate_about_y(base, angle) + random_offset
}

/// Rendered sprite diameter in pixels.
///
/// `view_depth` is the distance along the camera's forward axis; sprites
/// shrink as `1 / depth`.
pub fn point_size(base_size: f32, point_size_scale: f32, scale: f32, view_depth: f32) -> f32 {
    base_size * point_size_scale * scale / view_depth.max(MIN_VIEW_DEPTH)
}

/// Hermite smoothstep with the WGSL semantics.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Soft circular sprite coverage at `dist` from the sprite centre.
///
/// `dist` is in sprite UV units, `0` at the centre and `1` at the edge midpoints.
pub fn coverage(edge_inner: f32, edge_outer: f32, dist: f32) -> f32 {
    1.0 - smoothstep(edge_inner, edge_outer, dist)
}

/// Fragments whose coverage would round to zero in an 8-bit target are dropped.
pub const COVERAGE_CUTOFF: f32 = 0.5 / 255.0;

/// Whether the fragment at `dist` survives the discard test.
pub fn is_covered(edge_inner: f32, edge_outer: f32, dist: f32) -> bool {
    coverage(edge_inner, edge_outer, dist) >= COVERAGE_CUTOFF
}
