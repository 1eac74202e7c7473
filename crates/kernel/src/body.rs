use ballpit_common::ContactMaterial;
use glam::{Quat, Vec3};

/// A dynamic sphere body.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub radius: f32,
    mass: f32,
    inv_mass: f32,
    inv_inertia: f32,
    /// Per-body surface material. `None` defers to the world's default contact material.
    pub material: Option<ContactMaterial>,
}

impl RigidBody {
    /// Solid sphere of the given radius and mass at rest.
    pub fn sphere(position: Vec3, radius: f32, mass: f32) -> Self {
        let (inv_mass, inv_inertia) = if mass > 0.0 {
            let inertia = 0.4 * mass * radius * radius;
            (1.0 / mass, if inertia > 0.0 { 1.0 / inertia } else { 0.0 })
        } else {
            (0.0, 0.0)
        };
        Self {
            position,
            rotation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            radius,
            mass,
            inv_mass,
            inv_inertia,
            material: None,
        }
    }

    pub fn with_material(mut self, material: ContactMaterial) -> Self {
        self.material = Some(material);
        self
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    pub(crate) fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    pub fn is_dynamic(&self) -> bool {
        self.inv_mass > 0.0
    }

    /// Instantaneous velocity change from an impulse through the center of mass.
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.linear_velocity += impulse * self.inv_mass;
    }

    /// Impulse at a world-space point; off-center impulses also spin the body.
    pub fn apply_impulse_at(&mut self, impulse: Vec3, point: Vec3) {
        self.linear_velocity += impulse * self.inv_mass;
        let r = point - self.position;
        self.angular_velocity += r.cross(impulse) * self.inv_inertia;
    }

    pub(crate) fn velocity_at(&self, point: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(point - self.position)
    }
}

/// Static, infinite-mass half-space boundary.
///
/// Points with `normal.dot(p) >= offset` are on the open side; spheres are
/// pushed back toward it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub offset: f32,
}

impl Plane {
    pub fn new(normal: Vec3, offset: f32) -> Self {
        Self {
            normal: normal.normalize_or(Vec3::Y),
            offset,
        }
    }

    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize_or(Vec3::Y);
        Self {
            normal,
            offset: normal.dot(point),
        }
    }

    /// Signed distance from the plane; positive on the open side.
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_mass_properties() {
        let b = RigidBody::sphere(Vec3::ZERO, 0.5, 2.0);
        assert_eq!(b.mass(), 2.0);
        assert_eq!(b.inv_mass(), 0.5);
        assert!(b.is_dynamic());
        assert!((b.inv_inertia() - 1.0 / (0.4 * 2.0 * 0.25)).abs() < 1e-5);
    }

    #[test]
    fn zero_mass_is_not_dynamic() {
        let mut b = RigidBody::sphere(Vec3::ZERO, 1.0, 0.0);
        assert!(!b.is_dynamic());
        b.apply_impulse(Vec3::X * 10.0);
        assert_eq!(b.linear_velocity, Vec3::ZERO);
    }

    #[test]
    fn impulse_changes_velocity_by_inverse_mass() {
        let mut b = RigidBody::sphere(Vec3::ZERO, 1.0, 4.0);
        b.apply_impulse(Vec3::new(8.0, 0.0, 0.0));
        assert_eq!(b.linear_velocity, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(b.angular_velocity, Vec3::ZERO);
    }

    #[test]
    fn off_center_impulse_spins() {
        let mut b = RigidBody::sphere(Vec3::ZERO, 1.0, 1.0);
        b.apply_impulse_at(Vec3::X, Vec3::Y);
        assert!(b.angular_velocity.length() > 0.0);
    }

    #[test]
    fn plane_signed_distance() {
        let floor = Plane::from_point_normal(Vec3::new(0.0, -2.0, 0.0), Vec3::Y);
        assert!((floor.distance_to_point(Vec3::ZERO) - 2.0).abs() < 1e-6);
        assert!(floor.distance_to_point(Vec3::new(0.0, -3.0, 0.0)) < 0.0);
    }
}
