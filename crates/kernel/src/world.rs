use ballpit_common::{ContactMaterial, PhysicsConfig};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::arena::{Arena, Handle};
use crate::body::{Plane, RigidBody};
use crate::contact;

/// Handle to a dynamic body in a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub Handle);

/// Handle to a static plane in a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaneHandle(pub Handle);

/// The rigid-body world.
///
/// Owns every body and boundary plane. Advances with a fixed-size internal
/// step; wall-clock time is fed through an accumulator so the simulation rate
/// is independent of the display rate.
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    bodies: Arena<RigidBody>,
    planes: Arena<Plane>,
    gravity: Vec3,
    solver_iterations: u32,
    default_contact: ContactMaterial,
    linear_damping: f32,
    angular_damping: f32,
    accumulator: f32,
    /// Simulated seconds.
    time: f64,
    /// Internal steps taken.
    tick: u64,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(&PhysicsConfig::default())
    }
}

impl PhysicsWorld {
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            bodies: Arena::new(),
            planes: Arena::new(),
            gravity: config.gravity,
            solver_iterations: config.solver_iterations,
            default_contact: config.default_contact,
            linear_damping: config.linear_damping.clamp(0.0, 1.0),
            angular_damping: config.angular_damping.clamp(0.0, 1.0),
            accumulator: 0.0,
            time: 0.0,
            tick: 0,
        }
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        BodyHandle(self.bodies.insert(body))
    }

    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        self.bodies.remove(handle.0)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle.0)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle.0)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.bodies.iter().map(|(h, b)| (BodyHandle(h), b))
    }

    pub fn add_plane(&mut self, plane: Plane) -> PlaneHandle {
        PlaneHandle(self.planes.insert(plane))
    }

    pub fn remove_plane(&mut self, handle: PlaneHandle) -> Option<Plane> {
        self.planes.remove(handle.0)
    }

    pub fn plane(&self, handle: PlaneHandle) -> Option<&Plane> {
        self.planes.get(handle.0)
    }

    /// Apply an impulse through a body's center. Returns false for stale handles.
    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3) -> bool {
        match self.bodies.get_mut(handle.0) {
            Some(body) => {
                body.apply_impulse(impulse);
                true
            }
            None => false,
        }
    }

    /// Advance by `elapsed` wall-clock seconds using steps of `fixed_dt`.
    ///
    /// At most `max_substeps` internal steps run; leftover time beyond that is
    /// discarded so a long stall does not trigger a catch-up spiral. Returns the
    /// number of internal steps taken.
    pub fn step(&mut self, fixed_dt: f32, elapsed: f32, max_substeps: u32) -> u32 {
        if fixed_dt <= 0.0 || !elapsed.is_finite() {
            return 0;
        }
        self.accumulator += elapsed.max(0.0);

        let mut substeps = 0;
        while self.accumulator >= fixed_dt && substeps < max_substeps {
            self.internal_step(fixed_dt);
            self.accumulator -= fixed_dt;
            substeps += 1;
        }
        self.accumulator %= fixed_dt;

        tracing::trace!(substeps, tick = self.tick, "physics step");
        substeps
    }

    /// One fixed step: forces, contacts, integration, penetration correction.
    pub fn internal_step(&mut self, dt: f32) {
        let linear_keep = (1.0 - self.linear_damping).powf(dt);
        let angular_keep = (1.0 - self.angular_damping).powf(dt);
        for body in self.bodies.values_mut().filter(|b| b.is_dynamic()) {
            body.linear_velocity += self.gravity * dt;
            body.linear_velocity *= linear_keep;
            body.angular_velocity *= angular_keep;
        }

        let mut contacts = contact::detect(&self.bodies, &self.planes, self.default_contact);
        contact::prepare(&mut contacts, &self.bodies);
        contact::solve(&mut contacts, &mut self.bodies, self.solver_iterations);

        for (_, body) in self.bodies.slots_mut() {
            if !body.is_dynamic() {
                continue;
            }
            body.position += body.linear_velocity * dt;
            let spin = body.angular_velocity * dt;
            if spin.length_squared() > 0.0 {
                body.rotation =
                    (glam::Quat::from_scaled_axis(spin) * body.rotation).normalize();
            }
        }

        let overlaps = contact::detect(&self.bodies, &self.planes, self.default_contact);
        contact::correct_positions(&overlaps, &mut self.bodies);

        self.time += dt as f64;
        self.tick += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn floor_world() -> PhysicsWorld {
        let mut w = PhysicsWorld::default();
        w.add_plane(Plane::new(Vec3::Y, 0.0));
        w
    }

    #[test]
    fn world_starts_empty() {
        let w = PhysicsWorld::default();
        assert_eq!(w.tick(), 0);
        assert_eq!(w.body_count(), 0);
        assert_eq!(w.plane_count(), 0);
    }

    #[test]
    fn add_and_remove_body() {
        let mut w = PhysicsWorld::default();
        let h = w.add_body(RigidBody::sphere(Vec3::ZERO, 1.0, 1.0));
        assert_eq!(w.body_count(), 1);
        assert!(w.body(h).is_some());
        assert!(w.remove_body(h).is_some());
        assert_eq!(w.body_count(), 0);
        assert!(w.remove_body(h).is_none());
        assert!(!w.apply_impulse(h, Vec3::X));
    }

    #[test]
    fn gravity_accelerates_free_body() {
        let mut w = PhysicsWorld::default();
        let h = w.add_body(RigidBody::sphere(Vec3::new(0.0, 10.0, 0.0), 0.5, 1.0));
        w.step(DT, DT, 3);
        let b = w.body(h).unwrap();
        assert!(b.linear_velocity.y < 0.0);
        assert!(b.position.y < 10.0);
    }

    #[test]
    fn accumulator_runs_whole_steps_only() {
        let mut w = PhysicsWorld::default();
        assert_eq!(w.step(DT, DT * 0.5, 3), 0);
        assert_eq!(w.step(DT, DT * 0.6, 3), 1);
        assert_eq!(w.tick(), 1);
    }

    #[test]
    fn substeps_are_bounded() {
        let mut w = PhysicsWorld::default();
        assert_eq!(w.step(DT, 1.0, 3), 3);
        // The stall beyond max_substeps is dropped, not carried forward.
        assert!(w.step(DT, 0.0, 3) <= 1);
    }

    #[test]
    fn negative_or_nan_elapsed_does_nothing() {
        let mut w = PhysicsWorld::default();
        assert_eq!(w.step(DT, -1.0, 3), 0);
        assert_eq!(w.step(DT, f32::NAN, 3), 0);
        assert_eq!(w.tick(), 0);
    }

    #[test]
    fn sphere_settles_on_floor() {
        let mut w = floor_world();
        let h = w.add_body(RigidBody::sphere(Vec3::new(0.0, 3.0, 0.0), 0.5, 1.0));
        for _ in 0..600 {
            w.step(DT, DT, 3);
        }
        let b = w.body(h).unwrap();
        assert!((b.position.y - 0.5).abs() < 0.05, "rest height {}", b.position.y);
        assert!(b.linear_velocity.length() < 0.2);
    }

    #[test]
    fn stacked_spheres_do_not_interpenetrate() {
        let mut w = floor_world();
        let low = w.add_body(RigidBody::sphere(Vec3::new(0.0, 0.5, 0.0), 0.5, 1.0));
        let high = w.add_body(RigidBody::sphere(Vec3::new(0.0, 2.0, 0.0), 0.5, 1.0));
        for _ in 0..300 {
            w.step(DT, DT, 3);
        }
        let a = w.body(low).unwrap().position;
        let b = w.body(high).unwrap().position;
        assert!((a - b).length() > 0.9);
    }

    #[test]
    fn container_keeps_bodies_inside() {
        let mut w = PhysicsWorld::default();
        for (n, o) in [
            (Vec3::Y, -5.0),
            (Vec3::NEG_Y, -5.0),
            (Vec3::X, -5.0),
            (Vec3::NEG_X, -5.0),
            (Vec3::Z, -5.0),
            (Vec3::NEG_Z, -5.0),
        ] {
            w.add_plane(Plane::new(n, o));
        }
        let h = w.add_body(RigidBody::sphere(Vec3::ZERO, 0.5, 1.0));
        w.apply_impulse(h, Vec3::new(30.0, 5.0, -20.0));
        for _ in 0..240 {
            w.step(DT, DT, 3);
        }
        let p = w.body(h).unwrap().position;
        assert!(p.abs().max_element() < 5.0, "escaped to {p:?}");
    }

    #[test]
    fn impulse_is_immediate() {
        let mut w = PhysicsWorld::default();
        let h = w.add_body(RigidBody::sphere(Vec3::ZERO, 1.0, 2.0));
        assert!(w.apply_impulse(h, Vec3::new(0.0, 0.0, -4.0)));
        assert_eq!(w.body(h).unwrap().linear_velocity, Vec3::new(0.0, 0.0, -2.0));
    }
}
