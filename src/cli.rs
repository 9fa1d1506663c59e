//! Command-line interface for the `galaxy` binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::app::Galaxy;
use crate::error::AppError;
use crate::params::{Color, GalaxyParameters};
use crate::visuals::BlendMode;

#[derive(Parser, Debug, Default)]
#[command(
    name = "galaxy",
    author,
    version,
    about = "Procedural spiral galaxy viewer"
)]
pub struct Cli {
    /// Number of particles.
    #[arg(long, value_name = "N")]
    pub count: Option<u32>,

    /// Disk radius in world units.
    #[arg(long)]
    pub radius: Option<f32>,

    /// Number of spiral arms.
    #[arg(long)]
    pub branches: Option<u32>,

    /// Jitter scale relative to each particle's radius.
    #[arg(long)]
    pub randomness: Option<f32>,

    /// Jitter exponent; higher values keep particles closer to their arm.
    #[arg(long, value_name = "POWER")]
    pub randomness_power: Option<f32>,

    /// Core colour as `#rrggbb`.
    #[arg(long, value_name = "HEX")]
    pub inside_color: Option<Color>,

    /// Rim colour as `#rrggbb`.
    #[arg(long, value_name = "HEX")]
    pub outside_color: Option<Color>,

    /// Sprite size in pixels at unit view depth.
    #[arg(long, value_name = "PIXELS")]
    pub point_size: Option<f32>,

    /// Angular spin factor (radians per second at radius 1).
    #[arg(long, value_name = "RATE", value_parser = parse_finite)]
    pub spin_rate: Option<f32>,

    /// Particle blending.
    #[arg(long, value_enum)]
    pub blend: Option<BlendArg>,

    /// Load parameters from a JSON preset; other flags override it.
    #[arg(long, value_name = "PATH")]
    pub preset: Option<PathBuf>,

    /// Write the resolved parameters to a JSON preset and exit.
    #[arg(long, value_name = "PATH")]
    pub save_preset: Option<PathBuf>,

    /// Seed for reproducible galaxies; can also be set via `GALAXY_SEED`.
    #[arg(long, env = "GALAXY_SEED")]
    pub seed: Option<u64>,

    /// Show frame timing.
    #[arg(long)]
    pub perf: bool,

    /// Hide the parameter panel.
    #[arg(long)]
    pub no_ui: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendArg {
    Additive,
    Alpha,
}

impl From<BlendArg> for BlendMode {
    fn from(arg: BlendArg) -> Self {
        match arg {
            BlendArg::Additive => BlendMode::Additive,
            BlendArg::Alpha => BlendMode::Alpha,
        }
    }
}

impl Cli {
    /// Resolve the starting parameters: preset (or defaults), then flag
    /// overrides, clamped into panel ranges and validated.
    pub fn parameters(&self) -> Result<GalaxyParameters, AppError> {
        let mut params = match &self.preset {
            Some(path) => {
                log::info!("loading preset {}", path.display());
                GalaxyParameters::load(path)?
            }
            None => GalaxyParameters::default(),
        };

        if let Some(count) = self.count {
            params.count = count;
        }
        if let Some(radius) = self.radius {
            params.radius = radius;
        }
        if let Some(branches) = self.branches {
            params.branches = branches;
        }
        if let Some(randomness) = self.randomness {
            params.randomness = randomness;
        }
        if let Some(power) = self.randomness_power {
            params.randomness_power = power;
        }
        if let Some(color) = self.inside_color {
            params.inside_color = color;
        }
        if let Some(color) = self.outside_color {
            params.outside_color = color;
        }
        if let Some(size) = self.point_size {
            params.point_size = size;
        }

        let clamped = params.clamped();
        if clamped != params {
            log::warn!("parameters clamped into range: {:?}", clamped);
        }
        clamped.validate()?;
        Ok(clamped)
    }

    /// Build the viewer for `params`.
    pub fn galaxy(&self, params: GalaxyParameters) -> Galaxy {
        let spin_rate = self.spin_rate;
        let blend = self.blend;

        let mut galaxy = Galaxy::new()
            .with_parameters(params)
            .with_visuals(|v| {
                if let Some(rate) = spin_rate {
                    v.spin_rate(rate);
                }
                if let Some(blend) = blend {
                    v.blend_mode(blend.into());
                }
            })
            .with_ui(!self.no_ui)
            .with_perf(self.perf);

        if let Some(seed) = self.seed {
            galaxy = galaxy.with_seed(seed);
        }
        galaxy
    }
}

/// Parse an `f32` that can be written into shader source.
fn parse_finite(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("{}", e))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("{} is not a finite number", s))
    }
}
