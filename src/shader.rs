//! WGSL programs for the galaxy render pipeline.
//!
//! The pipeline uses two shader modules. The vertex stage spins each base
//! position about `+Y`, adds its jitter and expands a camera-facing quad.
//! The fragment stage turns the quad into a soft disc. Both follow the
//! functions in [`crate::animation`]; spin rate and coverage edges are baked
//! in from [`VisualConfig`].
//!
//! Vertex inputs are four instance-rate buffers:
//!
//! | location | attribute | format |
//! |---|---|---|
//! | 0 | position | `Float32x3` |
//! | 1 | color | `Float32x3` |
//! | 2 | scale | `Float32` |
//! | 3 | random offset | `Float32x3` |

use crate::animation::{COVERAGE_CUTOFF, MIN_SPIN_RADIUS, MIN_VIEW_DEPTH};
use crate::visuals::VisualConfig;

/// Vertex stage entry point.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment stage entry point.
pub const FRAGMENT_ENTRY: &str = "fs_main";
/// Vertices per particle quad.
pub const QUAD_VERTICES: u32 = 6;

/// Interface between the two stages.
const VARYINGS: &str = r#"struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
};"#;

/// WGSL counterpart of [`crate::animation::rotate_about_y`].
const ROTATE_ABOUT_Y: &str = r#"fn rotate_about_y(p: vec3<f32>, angle: f32) -> vec3<f32> {
    let s = sin(angle);
    let c = cos(angle);
    return vec3<f32>(
        p.x * c - p.z * s,
        p.y,
        p.x * s + p.z * c,
    );
}"#;

/// Format a float as a WGSL literal (always with a decimal point or exponent).
fn wgsl_f32(value: f32) -> String {
    format!("{:?}", value)
}

/// Generate the vertex stage program.
pub fn vertex_stage(visuals: &VisualConfig) -> String {
    let spin_rate = wgsl_f32(visuals.spin_rate);
    let min_radius = wgsl_f32(MIN_SPIN_RADIUS);
    let min_depth = wgsl_f32(MIN_VIEW_DEPTH);

    format!(
        r#"struct Uniforms {{
    view_proj: mat4x4<f32>,
    viewport: vec2<f32>,
    time: f32,
    size: f32,
}};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

{VARYINGS}

const SPIN_RATE: f32 = {spin_rate};
const MIN_SPIN_RADIUS: f32 = {min_radius};
const MIN_VIEW_DEPTH: f32 = {min_depth};

{ROTATE_ABOUT_Y}

@vertex
fn {VERTEX_ENTRY}(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) scale: f32,
    @location(3) random_offset: vec3<f32>,
) -> VertexOutput {{
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let quad_pos = quad_vertices[vertex_index];

    // Differential spin: inner particles revolve faster
    let radius = length(position.xz);
    var spin = 0.0;
    if radius > MIN_SPIN_RADIUS {{
        spin = uniforms.time * SPIN_RATE / radius;
    }}
    let spun = rotate_about_y(position, spin);

    // Jitter is applied after the spin and is never rotated
    let world_pos = vec4<f32>(spun + random_offset, 1.0);
    var clip_pos = uniforms.view_proj * world_pos;

    // Sprite diameter in pixels, attenuated by view depth
    let diameter = uniforms.size * scale / max(clip_pos.w, MIN_VIEW_DEPTH);
    clip_pos.x += quad_pos.x * diameter / uniforms.viewport.x * clip_pos.w;
    clip_pos.y += quad_pos.y * diameter / uniforms.viewport.y * clip_pos.w;

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.color = color;
    out.uv = quad_pos;

    return out;
}}
"#
    )
}

/// Generate the fragment stage program.
pub fn fragment_stage(visuals: &VisualConfig) -> String {
    let edge_inner = wgsl_f32(visuals.edge_inner);
    let edge_outer = wgsl_f32(visuals.edge_outer);
    let cutoff = wgsl_f32(COVERAGE_CUTOFF);

    format!(
        r#"{VARYINGS}

const EDGE_INNER: f32 = {edge_inner};
const EDGE_OUTER: f32 = {edge_outer};
const COVERAGE_CUTOFF: f32 = {cutoff};

@fragment
fn {FRAGMENT_ENTRY}(in: VertexOutput) -> @location(0) vec4<f32> {{
    let dist = length(in.uv);
    let coverage = 1.0 - smoothstep(EDGE_INNER, EDGE_OUTER, dist);
    if coverage < COVERAGE_CUTOFF {{
        discard;
    }}
    return vec4<f32>(in.color, coverage);
}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates WGSL code using naga.
    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn test_wgsl_float_literals() {
        assert_eq!(wgsl_f32(1.0), "1.0");
        assert_eq!(wgsl_f32(0.2), "0.2");
        assert_eq!(wgsl_f32(1e-6), "1e-6");
    }

    #[test]
    fn test_vertex_stage_valid() {
        let wgsl = vertex_stage(&VisualConfig::default());
        assert!(wgsl.contains("const SPIN_RATE: f32 = 0.2;"));
        assert!(wgsl.contains("fn vs_main("));
        validate_wgsl(&wgsl).expect("vertex stage should be valid");
    }

    #[test]
    fn test_fragment_stage_valid() {
        let wgsl = fragment_stage(&VisualConfig::default());
        assert!(wgsl.contains("smoothstep(EDGE_INNER, EDGE_OUTER, dist)"));
        assert!(wgsl.contains("discard;"));
        validate_wgsl(&wgsl).expect("fragment stage should be valid");
    }

    #[test]
    fn test_vertex_rotation_matches_cpu() {
        use crate::animation::rotate_about_y;
        use glam::Vec3;

        let wgsl = vertex_stage(&VisualConfig::default());
        assert!(wgsl.contains(ROTATE_ABOUT_Y));
        assert!(wgsl.contains("let spun = rotate_about_y(position, spin);"));

        // Same component rows as the CPU rotation, in the same order
        let rows = ["p.x * c - p.z * s,", "p.y,", "p.x * s + p.z * c,"];
        let found: Vec<&str> = ROTATE_ABOUT_Y.lines().map(str::trim).collect();
        let start = found
            .iter()
            .position(|line| *line == rows[0])
            .expect("x row present");
        assert_eq!(&found[start..start + 3], &rows);

        // Evaluate the rows by hand against the CPU function
        let p = Vec3::new(1.5, 0.25, -0.5);
        let angle = 0.7f32;
        let (s, c) = angle.sin_cos();
        let by_rows = Vec3::new(p.x * c - p.z * s, p.y, p.x * s + p.z * c);
        assert!((rotate_about_y(p, angle) - by_rows).length() < 1e-6);
    }

    #[test]
    fn test_accepted_visuals_generate_valid_wgsl() {
        let rates = [0.0, -0.5, 1e-6, 1000.0, 1e30, -1e30, f32::INFINITY, f32::NAN];
        let edges = [
            (0.0, 1.0),
            (0.9, 0.5),
            (-3.0, 1e-7),
            (0.25, 1e30),
            (f32::NAN, 1.0),
            (0.0, f32::INFINITY),
        ];

        for rate in rates {
            for (inner, outer) in edges {
                let mut visuals = VisualConfig::new();
                visuals.spin_rate(rate).coverage_edges(inner, outer);
                assert_eq!(visuals.validate(), Ok(()));

                let vertex = vertex_stage(&visuals);
                let fragment = fragment_stage(&visuals);
                validate_wgsl(&vertex)
                    .unwrap_or_else(|e| panic!("spin rate {}: {}", rate, e));
                validate_wgsl(&fragment)
                    .unwrap_or_else(|e| panic!("edges ({}, {}): {}", inner, outer, e));
            }
        }
    }

    #[test]
    fn test_visual_config_is_baked_in() {
        let mut visuals = VisualConfig::new();
        visuals.spin_rate(0.75).coverage_edges(0.25, 0.5);

        let vertex = vertex_stage(&visuals);
        let fragment = fragment_stage(&visuals);
        assert!(vertex.contains("const SPIN_RATE: f32 = 0.75;"));
        assert!(fragment.contains("const EDGE_INNER: f32 = 0.25;"));
        assert!(fragment.contains("const EDGE_OUTER: f32 = 0.5;"));
        validate_wgsl(&vertex).expect("vertex stage should be valid");
        validate_wgsl(&fragment).expect("fragment stage should be valid");
    }
}
