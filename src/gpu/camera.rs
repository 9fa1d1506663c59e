//! Orbit camera for viewing the galaxy.

use glam::{Mat4, Vec3};

/// Radians of orbit per pixel of mouse drag.
const ROTATE_SPEED: f32 = 0.005;
/// World units per wheel line.
const ZOOM_SPEED: f32 = 0.3;
const PITCH_LIMIT: f32 = 1.5;

/// Closest and furthest orbit distance.
pub const DISTANCE_RANGE: (f32, f32) = (0.5, 50.0);

/// Orbit camera looking at `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Camera at `(3, 3, 3)` looking at the origin.
    pub fn new() -> Self {
        Self::looking_from(Vec3::splat(3.0), Vec3::ZERO)
    }

    /// Place the camera at `eye`, orbiting `target`.
    pub fn looking_from(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(DISTANCE_RANGE.0);
        Self {
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            distance,
            target,
            fov_y: 75.0_f32.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(f32::EPSILON), self.near, self.far)
    }

    /// Combined projection * view.
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Orbit by a mouse drag of `(dx, dy)` pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * ROTATE_SPEED;
        self.pitch = (self.pitch + dy * ROTATE_SPEED).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Dolly toward the target by `scroll` wheel lines.
    pub fn zoom(&mut self, scroll: f32) {
        self.distance = (self.distance - scroll * ZOOM_SPEED).clamp(DISTANCE_RANGE.0, DISTANCE_RANGE.1);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_default_position() {
        let camera = Camera::new();
        assert!((camera.position() - Vec3::splat(3.0)).length() < 1e-4);
        assert!((camera.fov_y.to_degrees() - 75.0).abs() < 1e-4);
    }

    #[test]
    fn test_target_projects_to_centre() {
        let camera = Camera::new();
        let clip = camera.view_proj(16.0 / 9.0) * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        // w is the view depth, which is the orbit distance for the target
        assert!((clip.w - 27.0_f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut camera = Camera::new();
        camera.zoom(1_000.0);
        assert_eq!(camera.distance, DISTANCE_RANGE.0);
        camera.zoom(-1_000.0);
        assert_eq!(camera.distance, DISTANCE_RANGE.1);
    }

    #[test]
    fn test_rotate_clamps_pitch() {
        let mut camera = Camera::new();
        camera.rotate(0.0, 10_000.0);
        assert_eq!(camera.pitch, PITCH_LIMIT);
        let yaw = camera.yaw;
        camera.rotate(100.0, 0.0);
        assert!((camera.yaw - (yaw - 0.5)).abs() < 1e-6);
    }
}
