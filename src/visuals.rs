//! Visual configuration for galaxy rendering.
//!
//! These options control how particles are drawn, separate from the
//! [`GalaxyParameters`](crate::GalaxyParameters) that control where they are.
//!
//! # Usage
//!
//! ```ignore
//! Galaxy::new()
//!     .with_visuals(|v| {
//!         v.spin_rate(0.4);
//!         v.blend_mode(BlendMode::Additive);
//!         v.background(Vec3::ZERO);
//!     })
//!     .run()?;
//! ```

use glam::Vec3;

use crate::error::ValidationError;

/// Default angular spin factor: a particle at radius 1 turns 0.2 rad/s.
pub const DEFAULT_SPIN_RATE: f32 = 0.2;

/// Blend mode for particle rendering.
///
/// Controls how particle colors combine with the background and each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Additive blending (default).
    ///
    /// Particle colors are added together, so overlapping particles become
    /// brighter and draw order does not matter.
    #[default]
    Additive,

    /// Standard alpha blending.
    ///
    /// Overlaps depend on draw order; mostly useful for inspecting the point
    /// cloud without glow.
    Alpha,
}

impl BlendMode {
    /// The wgpu blend state for this mode.
    pub fn to_blend_state(self) -> wgpu::BlendState {
        match self {
            BlendMode::Additive => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
            BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
        }
    }
}

/// Configuration for galaxy visuals.
///
/// Built using the closure passed to [`Galaxy::with_visuals`](crate::Galaxy::with_visuals).
#[derive(Debug, Clone, PartialEq)]
pub struct VisualConfig {
    /// Angular speed factor; spin angle is `time * spin_rate / radius`.
    pub spin_rate: f32,
    /// Sprite UV distance where coverage starts to fall off.
    pub edge_inner: f32,
    /// Sprite UV distance where coverage reaches zero.
    pub edge_outer: f32,
    /// Blend mode for particle rendering.
    pub blend_mode: BlendMode,
    /// Background clear color (RGB, 0.0-1.0).
    pub background_color: Vec3,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            spin_rate: DEFAULT_SPIN_RATE,
            edge_inner: 0.0,
            edge_outer: 1.0,
            blend_mode: BlendMode::Additive,
            background_color: Vec3::ZERO,
        }
    }
}

impl VisualConfig {
    /// Create a new visual config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the spin rate. Non-finite rates are ignored.
    pub fn spin_rate(&mut self, rate: f32) -> &mut Self {
        if rate.is_finite() {
            self.spin_rate = rate;
        } else {
            log::warn!("ignoring non-finite spin rate {}", rate);
        }
        self
    }

    /// Set the coverage falloff edges, in sprite UV units.
    ///
    /// `inner` is clamped below `outer` so the falloff never inverts.
    /// Non-finite edges are ignored.
    pub fn coverage_edges(&mut self, inner: f32, outer: f32) -> &mut Self {
        if !(inner.is_finite() && outer.is_finite()) {
            log::warn!("ignoring non-finite coverage edges ({}, {})", inner, outer);
            return self;
        }
        self.edge_outer = outer.max(f32::EPSILON);
        self.edge_inner = inner.clamp(0.0, self.edge_outer - f32::EPSILON);
        self
    }

    /// Check the values that get baked into the shaders.
    ///
    /// The setters keep these valid; this catches direct field writes.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.spin_rate.is_finite() {
            return Err(ValidationError::SpinRate {
                rate: self.spin_rate,
            });
        }
        let ordered = self.edge_inner.is_finite()
            && self.edge_outer.is_finite()
            && self.edge_inner >= 0.0
            && self.edge_inner < self.edge_outer;
        if !ordered {
            return Err(ValidationError::CoverageEdges {
                inner: self.edge_inner,
                outer: self.edge_outer,
            });
        }
        Ok(())
    }

    /// Set the blend mode.
    ///
    /// # Example
    ///
    /// ```ignore
    /// .with_visuals(|v| {
    ///     v.blend_mode(BlendMode::Alpha); // No glow
    /// })
    /// ```
    pub fn blend_mode(&mut self, mode: BlendMode) -> &mut Self {
        self.blend_mode = mode;
        self
    }

    /// Set the background clear color.
    pub fn background(&mut self, color: Vec3) -> &mut Self {
        self.background_color = color;
        self
    }
}
