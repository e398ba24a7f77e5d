//! Camera for the scene passes

use glam::{Mat4, Vec3, Vec4};

/// Perspective camera with an infinite reverse-Z projection
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// Direction the camera is looking at
    pub direction: Vec3,
    /// Up vector
    pub up: Vec3,
    /// Field of view in radians
    pub fov: f32,
    /// Near clipping plane
    pub near: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            direction: Vec3::NEG_Z,
            up: Vec3::Y,
            fov: 70.0_f32.to_radians(),
            near: 1.0,
            aspect: 16.0 / 9.0,
        }
    }

    /// Create a camera at a specific position looking at a target
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        Self {
            position,
            direction: (target - position).normalize_or(Vec3::NEG_Z),
            up,
            ..Self::new()
        }
    }

    /// Place the camera `distance` away from `target` and face it.
    ///
    /// `yaw` turns around the world Y axis, `pitch` lifts above the XZ plane.
    pub fn orbit(&mut self, target: Vec3, yaw: f32, pitch: f32, distance: f32) {
        let max_pitch = 89.0_f32.to_radians();
        let pitch = pitch.clamp(-max_pitch, max_pitch);
        let offset = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());
        self.position = target + offset * distance;
        self.direction = -offset;
        self.up = Vec3::Y;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.direction, self.up)
    }

    /// Depth is 1 at the near plane and tends to 0 at infinity
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_infinite_reverse_rh(self.fov, self.aspect, self.near)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update aspect ratio
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Mirror of this camera through `plane` (`normal.xyz`, `distance`)
    pub fn reflect(&self, plane: Vec4) -> Self {
        let normal = plane.truncate().normalize_or(Vec3::Y);
        let distance = plane.w;
        let mirror_point = |p: Vec3| p - 2.0 * (p.dot(normal) - distance) * normal;
        let mirror_vector = |v: Vec3| v - 2.0 * v.dot(normal) * normal;

        Self {
            position: mirror_point(self.position),
            direction: mirror_vector(self.direction),
            up: mirror_vector(self.up),
            ..self.clone()
        }
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

    #[test]
    fn test_reverse_z_depth() {
        let camera = Camera::look_at(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let clip = camera.view_projection_matrix();
        let near = clip.project_point3(Vec3::new(0.0, 0.0, -camera.near));
        let far = clip.project_point3(Vec3::new(0.0, 0.0, -10_000.0));
        assert!((near.z - 1.0).abs() < 0.0001);
        assert!(far.z > 0.0 && far.z < near.z);
    }

    #[test]
    fn test_reflect_through_water_plane() {
        let camera = Camera::look_at(Vec3::new(0.0, 10.0, 0.0), Vec3::new(10.0, 0.0, 0.0), Vec3::Y);
        let mirrored = camera.reflect(Vec4::new(0.0, 1.0, 0.0, 0.0));
        assert!((mirrored.position - Vec3::new(0.0, -10.0, 0.0)).length() < 0.0001);
        assert!((mirrored.direction.y + camera.direction.y).abs() < 0.0001);
        assert!((mirrored.up - Vec3::NEG_Y).length() < 0.0001);
    }

    #[test]
    fn test_orbit_faces_target() {
        let mut camera = Camera::new();
        let target = Vec3::new(100.0, 0.0, 50.0);
        camera.orbit(target, 0.0, 0.0, 20.0);
        assert!((camera.position - Vec3::new(120.0, 0.0, 50.0)).length() < 0.0001);
        assert!((camera.direction - Vec3::NEG_X).length() < 0.0001);

        camera.orbit(target, 0.0, 10.0, 20.0);
        assert!(camera.direction.y < -0.99);
        assert!(((camera.position - target).length() - 20.0).abs() < 0.001);
    }
}
