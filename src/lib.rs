//! # Galaxy - procedural spiral galaxy viewer
//!
//! Generates a particle field shaped like a spiral galaxy and animates it on
//! the GPU with a radius-dependent spin.
//!
//! The generator places every particle on one of a few straight rays through
//! the origin. The spiral arms appear at render time: the vertex stage spins
//! each particle about the vertical axis at a rate proportional to `1 / r`, so
//! inner particles lead and the rays wind up into arms.
//!
//! ## Quick Start
//!
//! ```ignore
//! use galaxy::prelude::*;
//!
//! fn main() -> Result<(), AppError> {
//!     Galaxy::new()
//!         .with_parameters(GalaxyParameters {
//!             count: 100_000,
//!             branches: 5,
//!             ..Default::default()
//!         })
//!         .with_visuals(|v| {
//!             v.spin_rate(0.3);
//!         })
//!         .run()
//! }
//! ```
//!
//! ## Generating without a window
//!
//! The generator is a pure function of the parameters and an injected RNG:
//!
//! ```
//! use galaxy::{generate, GalaxyParameters};
//! use rand::{rngs::SmallRng, SeedableRng};
//!
//! let params = GalaxyParameters { count: 1_000, ..Default::default() };
//! let set = generate(&params, &mut SmallRng::seed_from_u64(1)).unwrap();
//! assert_eq!(set.len(), 1_000);
//! ```
//!
//! ## Parameters
//!
//! | Field | Default | Panel range |
//! |---|---|---|
//! | `count` | 200 000 | 1 000 - 1 000 000 |
//! | `radius` | 5 | 0.01 - 20 |
//! | `branches` | 3 | 2 - 20 |
//! | `randomness` | 0.2 | 0 - 2 |
//! | `randomness_power` | 3 | 1 - 10 |
//! | `inside_color` | `#ff6030` | |
//! | `outside_color` | `#1b3984` | |
//!
//! Every edit in the panel regenerates the whole set on a worker thread
//! ([`regen::Regenerator`]); the previous set keeps rendering until the new
//! one is ready.
//!
//! ## Features
//!
//! - `egui` (default): parameter panel and performance overlay.

pub mod animation;
mod app;
pub mod cli;
pub mod error;
pub mod generator;
pub mod gpu;
pub mod params;
pub mod regen;
pub mod shader;
pub mod time;
#[cfg(feature = "egui")]
pub mod ui;
pub mod visuals;

pub use app::Galaxy;
pub use error::{AppError, GenerationError, GpuError, ValidationError};
pub use generator::{generate, generate_with_limits, GenerationLimits, ParticleAttributeSet};
pub use glam::Vec3;
pub use params::{Color, GalaxyParameters};
pub use visuals::{BlendMode, VisualConfig};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use galaxy::prelude::*;
/// ```
pub mod prelude {
    pub use crate::animation::FrameUniforms;
    pub use crate::app::Galaxy;
    pub use crate::error::AppError;
    pub use crate::generator::{generate, GenerationLimits, ParticleAttributeSet};
    pub use crate::params::{Color, GalaxyParameters};
    pub use crate::time::FrameClock;
    pub use crate::visuals::{BlendMode, VisualConfig};
    pub use crate::Vec3;
}
