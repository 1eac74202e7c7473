use ballpit_common::CameraConfig;
use ballpit_kernel::Ray;
use glam::{Mat4, Vec2, Vec3};

/// Fixed perspective camera on the +Z axis looking at the origin.
///
/// Its distance tracks the viewport aspect so the whole grid stays in frame
/// on tall viewports.
#[derive(Debug, Clone, PartialEq)]
pub struct PitCamera {
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    reference_distance: f32,
    distance: f32,
}

impl Default for PitCamera {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

impl PitCamera {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            fov: config.fov_degrees.to_radians(),
            aspect: 1.0,
            near: config.near,
            far: config.far,
            reference_distance: config.reference_distance,
            distance: config.reference_distance,
        }
    }

    /// Update aspect and distance for a viewport of `width` x `height` pixels.
    ///
    /// Zero-sized viewports are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.distance = self
            .reference_distance
            .max(self.reference_distance / self.aspect);
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.distance)
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::NEG_Z
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World-space ray from the camera through `ndc`.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inv = self.view_projection().inverse();
        let near = inv.project_point3(ndc.extend(0.0));
        let far = inv.project_point3(ndc.extend(1.0));
        Ray::new(self.position(), far - near)
    }

    /// Height of the view frustum at the origin.
    pub fn visible_height(&self) -> f32 {
        2.0 * (self.fov * 0.5).tan() * self.distance
    }

    /// Drag force normalization: visible height relative to `reference_height`.
    pub fn unit_force_scale(&self, reference_height: f32) -> f32 {
        self.visible_height() / reference_height.max(f32::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_viewport_keeps_reference_distance() {
        let mut cam = PitCamera::default();
        cam.set_viewport(1920, 1080);
        assert_eq!(cam.distance(), 15.0);
    }

    #[test]
    fn tall_viewport_backs_off() {
        let mut cam = PitCamera::default();
        cam.set_viewport(500, 1000);
        assert!((cam.distance() - 30.0).abs() < 1e-4);
        cam.set_viewport(1000, 1000);
        assert!((cam.distance() - 15.0).abs() < 1e-4);
    }

    #[test]
    fn zero_viewport_is_ignored() {
        let mut cam = PitCamera::default();
        cam.set_viewport(800, 400);
        cam.set_viewport(0, 400);
        assert_eq!(cam.aspect, 2.0);
    }

    #[test]
    fn center_ray_points_at_origin() {
        let mut cam = PitCamera::default();
        cam.set_viewport(800, 600);
        let ray = cam.ray_from_ndc(Vec2::ZERO);
        assert_eq!(ray.origin, cam.position());
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn top_edge_ray_meets_frustum_height() {
        let mut cam = PitCamera::default();
        cam.set_viewport(800, 800);
        let ray = cam.ray_from_ndc(Vec2::new(0.0, 1.0));
        let t = cam.distance() / -ray.direction.z;
        let hit = ray.at(t);
        assert!((hit.y - cam.visible_height() * 0.5).abs() < 1e-3);
    }

    #[test]
    fn unit_force_tracks_distance() {
        let mut cam = PitCamera::default();
        cam.set_viewport(1000, 1000);
        let wide = cam.unit_force_scale(12.0);
        cam.set_viewport(500, 1000);
        assert!((cam.unit_force_scale(12.0) / wide - 2.0).abs() < 1e-4);
    }
}
