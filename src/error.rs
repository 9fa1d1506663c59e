//! Error types for galaxy generation and rendering.
//!
//! Generation errors are local to a single regeneration request: the render
//! loop logs them and keeps drawing the last good attribute set. GPU and
//! application errors only occur while bootstrapping the window.

use thiserror::Error;

/// A parameter outside of its accepted domain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Particle count is zero or above the supported maximum.
    #[error("particle count {count} is outside 1..={max}")]
    Count { count: u32, max: u32 },
    /// Radius is not a finite value in `(0, max]`.
    #[error("radius {radius} is outside (0, {max}]")]
    Radius { radius: f32, max: f32 },
    /// Fewer than two spiral arms.
    #[error("branch count {branches} must be at least 2")]
    Branches { branches: u32 },
    /// Jitter scale is negative or not finite.
    #[error("randomness {randomness} must be a finite value >= 0")]
    Randomness { randomness: f32 },
    /// Jitter exponent is below one or not finite.
    #[error("randomness power {power} must be a finite value >= 1")]
    RandomnessPower { power: f32 },
    /// Base point size is not a finite positive value.
    #[error("point size {size} must be a finite value > 0")]
    PointSize { size: f32 },
    /// Spin rate is not finite.
    #[error("spin rate {rate} must be finite")]
    SpinRate { rate: f32 },
    /// Coverage edges are not finite or not ordered `0 <= inner < outer`.
    #[error("coverage edges ({inner}, {outer}) must be finite with 0 <= inner < outer")]
    CoverageEdges { inner: f32, outer: f32 },
    /// A colour string that is not `#rrggbb`.
    #[error("invalid colour '{0}', expected #rrggbb")]
    InvalidColor(String),
}

/// Errors that can occur while producing a [`ParticleAttributeSet`](crate::ParticleAttributeSet).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    /// The parameter snapshot was rejected before any work was done.
    #[error("invalid galaxy parameters: {0}")]
    Validation(#[from] ValidationError),
    /// The requested particle count does not fit the host or GPU limits.
    #[error("attribute buffer of {requested} bytes exceeds the limit of {limit} bytes")]
    ResourceExhausted { requested: u64, limit: u64 },
    /// Attribute arrays of different lengths were supplied.
    #[error(
        "attribute arrays are not index-aligned (positions {positions}, colors {colors}, scales {scales}, offsets {offsets})"
    )]
    Misaligned {
        positions: usize,
        colors: usize,
        scales: usize,
        offsets: usize,
    },
}

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
}

/// Errors that can occur when running the galaxy viewer.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// A preset file could not be read or written.
    #[error("preset file error: {0}")]
    PresetIo(#[from] std::io::Error),
    /// A preset file is not valid JSON for [`GalaxyParameters`](crate::GalaxyParameters).
    #[error("preset parse error: {0}")]
    PresetParse(#[from] serde_json::Error),
    /// The starting parameters were rejected.
    #[error("invalid galaxy parameters: {0}")]
    Parameters(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_converts_into_generation_error() {
        let err: GenerationError = ValidationError::Branches { branches: 1 }.into();
        assert_eq!(
            err,
            GenerationError::Validation(ValidationError::Branches { branches: 1 })
        );
        assert!(err.to_string().contains("at least 2"));
    }

    #[test]
    fn test_resource_error_message() {
        let err = GenerationError::ResourceExhausted {
            requested: 2048,
            limit: 1024,
        };
        assert_eq!(
            err.to_string(),
            "attribute buffer of 2048 bytes exceeds the limit of 1024 bytes"
        );
    }
}
