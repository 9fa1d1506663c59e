//! Galaxy parameter snapshots.
//!
//! A [`GalaxyParameters`] value is an immutable snapshot: the panel, the CLI
//! and preset files all produce a new one per edit, and the generator consumes
//! it whole.
//!
//! # Example
//!
//! ```ignore
//! let params = GalaxyParameters {
//!     count: 50_000,
//!     branches: 5,
//!     ..GalaxyParameters::default()
//! };
//! params.validate()?;
//! ```

use std::fmt;
use std::ops::RangeInclusive;
use std::path::Path;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ValidationError};

/// Largest particle count the generator accepts.
pub const MAX_COUNT: u32 = 1_000_000;
/// Largest orbital radius the generator accepts.
pub const MAX_RADIUS: f32 = 20.0;

/// Slider range for `count`.
pub const COUNT_RANGE: RangeInclusive<u32> = 1_000..=MAX_COUNT;
/// Slider range for `radius`.
pub const RADIUS_RANGE: RangeInclusive<f32> = 0.01..=MAX_RADIUS;
/// Slider range for `branches`.
pub const BRANCHES_RANGE: RangeInclusive<u32> = 2..=20;
/// Slider range for `randomness`.
pub const RANDOMNESS_RANGE: RangeInclusive<f32> = 0.0..=2.0;
/// Slider range for `randomness_power`.
pub const RANDOMNESS_POWER_RANGE: RangeInclusive<f32> = 1.0..=10.0;

/// An 8-bit sRGB colour, written as `#rrggbb` in presets and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// The colour as `[r, g, b]`, the layout egui's sRGB picker edits.
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn from_array([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }

    /// Convert to linear RGB in `[0, 1]`.
    ///
    /// Gradients are interpolated in linear space; the sRGB surface re-encodes
    /// the result on output.
    pub fn to_linear(self) -> Vec3 {
        Vec3::new(
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        )
    }
}

fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

impl FromStr for Color {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// One parameter snapshot for a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyParameters {
    /// Number of particles.
    pub count: u32,
    /// Maximum orbital radius in world units.
    pub radius: f32,
    /// Number of spiral arms.
    pub branches: u32,
    /// Scale of per-particle jitter relative to the particle's radius.
    pub randomness: f32,
    /// Exponent applied to jitter samples; higher values pull jitter toward zero.
    pub randomness_power: f32,
    /// Colour at the centre of the disk.
    pub inside_color: Color,
    /// Colour at the rim of the disk.
    pub outside_color: Color,
    /// Base sprite size in pixels at unit view depth, before pixel-density scaling.
    pub point_size: f32,
}

impl Default for GalaxyParameters {
    fn default() -> Self {
        Self {
            count: 200_000,
            radius: 5.0,
            branches: 3,
            randomness: 0.2,
            randomness_power: 3.0,
            inside_color: Color::new(0xff, 0x60, 0x30),
            outside_color: Color::new(0x1b, 0x39, 0x84),
            point_size: 30.0,
        }
    }
}

impl GalaxyParameters {
    /// Check every numeric field against its domain.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 || self.count > MAX_COUNT {
            return Err(ValidationError::Count {
                count: self.count,
                max: MAX_COUNT,
            });
        }
        if !(self.radius.is_finite() && self.radius > 0.0 && self.radius <= MAX_RADIUS) {
            return Err(ValidationError::Radius {
                radius: self.radius,
                max: MAX_RADIUS,
            });
        }
        if self.branches < 2 {
            return Err(ValidationError::Branches {
                branches: self.branches,
            });
        }
        if !(self.randomness.is_finite() && self.randomness >= 0.0) {
            return Err(ValidationError::Randomness {
                randomness: self.randomness,
            });
        }
        if !(self.randomness_power.is_finite() && self.randomness_power >= 1.0) {
            return Err(ValidationError::RandomnessPower {
                power: self.randomness_power,
            });
        }
        if !(self.point_size.is_finite() && self.point_size > 0.0) {
            return Err(ValidationError::PointSize {
                size: self.point_size,
            });
        }
        Ok(())
    }

    /// Clamp every numeric field into its panel range.
    ///
    /// Non-finite values fall back to the default for that field.
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        Self {
            count: self.count.clamp(*COUNT_RANGE.start(), *COUNT_RANGE.end()),
            radius: clamp_finite(self.radius, &RADIUS_RANGE, defaults.radius),
            branches: self
                .branches
                .clamp(*BRANCHES_RANGE.start(), *BRANCHES_RANGE.end()),
            randomness: clamp_finite(self.randomness, &RANDOMNESS_RANGE, defaults.randomness),
            randomness_power: clamp_finite(
                self.randomness_power,
                &RANDOMNESS_POWER_RANGE,
                defaults.randomness_power,
            ),
            inside_color: self.inside_color,
            outside_color: self.outside_color,
            point_size: if self.point_size.is_finite() && self.point_size > 0.0 {
                self.point_size
            } else {
                defaults.point_size
            },
        }
    }

    /// Parse a JSON preset. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load a JSON preset from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&text)?)
    }

    /// Write this snapshot as a JSON preset.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AppError> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

fn clamp_finite(value: f32, range: &RangeInclusive<f32>, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(*range.start(), *range.end())
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(GalaxyParameters::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_out_of_domain_values() {
        let base = GalaxyParameters::default();

        let zero_count = GalaxyParameters { count: 0, ..base.clone() };
        assert!(matches!(
            zero_count.validate(),
            Err(ValidationError::Count { count: 0, .. })
        ));

        let one_branch = GalaxyParameters { branches: 1, ..base.clone() };
        assert_eq!(
            one_branch.validate(),
            Err(ValidationError::Branches { branches: 1 })
        );

        let flat = GalaxyParameters { radius: 0.0, ..base.clone() };
        assert!(matches!(flat.validate(), Err(ValidationError::Radius { .. })));

        let nan_radius = GalaxyParameters { radius: f32::NAN, ..base.clone() };
        assert!(matches!(nan_radius.validate(), Err(ValidationError::Radius { .. })));

        let weak_power = GalaxyParameters { randomness_power: 0.5, ..base.clone() };
        assert!(matches!(
            weak_power.validate(),
            Err(ValidationError::RandomnessPower { .. })
        ));

        let negative_jitter = GalaxyParameters { randomness: -0.1, ..base };
        assert!(matches!(
            negative_jitter.validate(),
            Err(ValidationError::Randomness { .. })
        ));
    }

    #[test]
    fn test_single_particle_is_valid() {
        let params = GalaxyParameters { count: 1, ..GalaxyParameters::default() };
        assert_eq!(params.validate(), Ok(()));
    }

    #[test]
    fn test_clamped_lands_in_domain() {
        let wild = GalaxyParameters {
            count: 0,
            radius: f32::INFINITY,
            branches: 0,
            randomness: -3.0,
            randomness_power: 0.0,
            point_size: f32::NAN,
            ..GalaxyParameters::default()
        };
        let clamped = wild.clamped();
        assert_eq!(clamped.validate(), Ok(()));
        assert_eq!(clamped.count, 1_000);
        assert_eq!(clamped.radius, 5.0);
        assert_eq!(clamped.branches, 2);
        assert_eq!(clamped.randomness, 0.0);
        assert_eq!(clamped.randomness_power, 1.0);
        assert_eq!(clamped.point_size, 30.0);
    }

    #[test]
    fn test_color_hex_round_trip() {
        let color: Color = "#ff6030".parse().unwrap();
        assert_eq!(color, Color::new(0xff, 0x60, 0x30));
        assert_eq!(color.to_string(), "#ff6030");

        assert!("ff6030".parse::<Color>().is_err());
        assert!("#ff60".parse::<Color>().is_err());
        assert!("#gg6030".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_to_linear() {
        let white = Color::new(255, 255, 255).to_linear();
        assert!((white - Vec3::ONE).abs().max_element() < 1e-6);

        let black = Color::new(0, 0, 0).to_linear();
        assert_eq!(black, Vec3::ZERO);

        // sRGB mid-grey is darker in linear space
        let grey = Color::new(128, 128, 128).to_linear();
        assert!((grey.x - 0.2158).abs() < 1e-3);
    }

    #[test]
    fn test_preset_defaults_missing_fields() {
        let params = GalaxyParameters::from_json_str(
            r##"{ "branches": 7, "inside_color": "#ffffff" }"##,
        )
        .unwrap();
        assert_eq!(params.branches, 7);
        assert_eq!(params.inside_color, Color::new(255, 255, 255));
        assert_eq!(params.count, GalaxyParameters::default().count);

        assert!(GalaxyParameters::from_json_str(r#"{ "inside_color": "red" }"#).is_err());
    }

    #[test]
    fn test_preset_json_round_trip() {
        let params = GalaxyParameters {
            count: 4_321,
            outside_color: Color::new(1, 2, 3),
            ..GalaxyParameters::default()
        };
        let json = params.to_json_string().unwrap();
        assert!(json.contains("\"#010203\""));
        assert_eq!(GalaxyParameters::from_json_str(&json).unwrap(), params);
    }
}
