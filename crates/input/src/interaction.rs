use std::time::Duration;

use ballpit_common::DragConfig;
use ballpit_ecs::EntityRegistry;
use ballpit_kernel::{PhysicsWorld, Ray};
use glam::{Vec2, Vec3};

/// Per-pointer-session state, owned by the frame driver.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionState {
    /// Last pointer position in NDC, `None` once the pointer leaves.
    pub pointer: Option<Vec2>,
    /// Registry index of the hovered entity.
    pub hovered: Option<usize>,
    pub dragging: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Idle,
    Hovering(usize),
    Dragging,
}

impl SessionState {
    pub fn phase(&self) -> PointerPhase {
        match (self.dragging, self.hovered) {
            (true, _) => PointerPhase::Dragging,
            (false, Some(i)) => PointerPhase::Hovering(i),
            (false, None) => PointerPhase::Idle,
        }
    }
}

/// Camera quantities the drag impulse depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragFrame {
    pub origin: Vec3,
    /// Unit view direction.
    pub forward: Vec3,
    /// Viewport-dependent force normalization.
    pub unit_force: f32,
}

/// Drives hover and drag transitions from camera rays.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    drag: DragConfig,
}

impl InteractionController {
    pub fn new(drag: DragConfig) -> Self {
        Self { drag }
    }

    pub fn drag_config(&self) -> &DragConfig {
        &self.drag
    }

    /// Update the hovered entity from `ray`. Suspended while dragging.
    ///
    /// A change of target fades the previous entity out and starts the glow
    /// on the new one within this call.
    pub fn hit_test(
        &self,
        session: &mut SessionState,
        registry: &mut EntityRegistry,
        ray: Option<&Ray>,
        now: Duration,
    ) -> PointerPhase {
        if session.dragging {
            return session.phase();
        }
        let target = ray.and_then(|r| registry.raycast(r)).map(|(i, _)| i);
        if target != session.hovered {
            if let Some(entity) = session.hovered.and_then(|i| registry.get_mut(i)) {
                entity.hover_exit(now);
            }
            if let Some(entity) = target.and_then(|i| registry.get_mut(i)) {
                entity.hover_enter(now);
            }
            tracing::trace!(from = ?session.hovered, to = ?target, "hover changed");
            session.hovered = target;
        }
        session.phase()
    }

    /// Press: hit-test, then start dragging if something is hovered.
    pub fn press(
        &self,
        session: &mut SessionState,
        registry: &mut EntityRegistry,
        ray: Option<&Ray>,
        now: Duration,
    ) -> PointerPhase {
        self.hit_test(session, registry, ray, now);
        if session.hovered.is_some() {
            session.dragging = true;
            tracing::debug!(entity = ?session.hovered, "drag started");
        }
        session.phase()
    }

    /// Release: end any drag and fade the held entity, whatever the ray hits.
    pub fn release(
        &self,
        session: &mut SessionState,
        registry: &mut EntityRegistry,
        now: Duration,
    ) -> PointerPhase {
        if !session.dragging {
            return session.phase();
        }
        session.dragging = false;
        if let Some(entity) = session.hovered.take().and_then(|i| registry.get_mut(i)) {
            entity.hover_exit(now);
        }
        tracing::debug!("drag ended");
        session.phase()
    }

    /// Forward-biased push direction: z doubled, y floored, renormalized.
    pub fn drag_direction(&self, ray_direction: Vec3) -> Vec3 {
        let mut dir = ray_direction;
        dir.z *= 2.0;
        dir.y = dir.y.max(self.drag.min_upward_bias);
        dir.normalize_or(Vec3::Y)
    }

    /// Inverse-square impulse for a body `distance` away from the camera.
    pub fn drag_impulse(&self, direction: Vec3, distance: f32, unit_force: f32) -> Vec3 {
        let d = distance.max(self.drag.min_distance);
        direction * (self.drag.strength * unit_force / (d * d))
    }

    /// Push every body near and in front of the camera along the drag direction.
    ///
    /// Does nothing unless the session is dragging. Returns the number of
    /// bodies that received an impulse.
    pub fn apply_drag(
        &self,
        session: &SessionState,
        registry: &EntityRegistry,
        world: &mut PhysicsWorld,
        ray: &Ray,
        frame: &DragFrame,
    ) -> usize {
        if !session.dragging {
            return 0;
        }
        let direction = self.drag_direction(ray.direction);
        let mut pushed = 0;
        for entity in registry.iter() {
            let Some(body) = world.body(entity.body) else {
                continue;
            };
            let offset = body.position - frame.origin;
            let distance = offset.length();
            if distance > self.drag.max_distance || offset.dot(frame.forward) <= 0.0 {
                continue;
            }
            let impulse = self.drag_impulse(direction, distance, frame.unit_force);
            if world.apply_impulse(entity.body, impulse) {
                pushed += 1;
            }
        }
        pushed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballpit_assets::MaterialPalette;
    use ballpit_common::{GridDims, SpawnConfig};
    use ballpit_ecs::spawn_grid;
    use ballpit_kernel::RigidBody;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn setup() -> (PhysicsWorld, EntityRegistry) {
        let mut world = PhysicsWorld::default();
        let config = SpawnConfig {
            jitter: 0.0,
            scale_min: 0.5,
            scale_max: 0.5,
            ..SpawnConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let registry = spawn_grid(
            &mut world,
            GridDims::new(3, 1, 1),
            &config,
            &MaterialPalette::default(),
            &mut rng,
        );
        (world, registry)
    }

    fn ray_at(x: f32) -> Ray {
        Ray::new(Vec3::new(x, 0.0, 15.0), Vec3::NEG_Z)
    }

    fn frame() -> DragFrame {
        DragFrame {
            origin: Vec3::new(0.0, 0.0, 15.0),
            forward: Vec3::NEG_Z,
            unit_force: 1.0,
        }
    }

    #[test]
    fn idle_to_hovering_applies_glow() {
        let (_, mut registry) = setup();
        let controller = InteractionController::default();
        let mut session = SessionState::default();
        let phase = controller.hit_test(&mut session, &mut registry, Some(&ray_at(2.0)), ms(0));
        assert_eq!(phase, PointerPhase::Hovering(2));
        assert!(registry.get(2).unwrap().mesh.variant.is_glowing());
        assert_eq!(registry.glowing_count(), 1);
    }

    #[test]
    fn hover_moves_between_entities() {
        let (_, mut registry) = setup();
        let controller = InteractionController::default();
        let mut session = SessionState::default();
        controller.hit_test(&mut session, &mut registry, Some(&ray_at(2.0)), ms(0));
        let phase = controller.hit_test(&mut session, &mut registry, Some(&ray_at(0.0)), ms(10));
        assert_eq!(phase, PointerPhase::Hovering(1));
        let previous = registry.get(2).unwrap();
        assert!(!previous.highlight.is_hovered);
        assert_eq!(previous.highlight.animation_start(), Some(ms(10)));
        assert!(registry.get(1).unwrap().highlight.is_hovered);
    }

    #[test]
    fn miss_returns_to_idle() {
        let (_, mut registry) = setup();
        let controller = InteractionController::default();
        let mut session = SessionState::default();
        controller.hit_test(&mut session, &mut registry, Some(&ray_at(0.0)), ms(0));
        let phase = controller.hit_test(&mut session, &mut registry, Some(&ray_at(50.0)), ms(5));
        assert_eq!(phase, PointerPhase::Idle);
        let phase = controller.hit_test(&mut session, &mut registry, None, ms(6));
        assert_eq!(phase, PointerPhase::Idle);
    }

    #[test]
    fn press_on_empty_space_does_not_drag() {
        let (_, mut registry) = setup();
        let controller = InteractionController::default();
        let mut session = SessionState::default();
        let phase = controller.press(&mut session, &mut registry, Some(&ray_at(50.0)), ms(0));
        assert_eq!(phase, PointerPhase::Idle);
        assert!(!session.dragging);
    }

    #[test]
    fn drag_suspends_hover_and_release_returns_idle() {
        let (_, mut registry) = setup();
        let controller = InteractionController::default();
        let mut session = SessionState::default();
        controller.hit_test(&mut session, &mut registry, Some(&ray_at(2.0)), ms(0));
        let phase = controller.press(&mut session, &mut registry, Some(&ray_at(2.0)), ms(1));
        assert_eq!(phase, PointerPhase::Dragging);

        let phase = controller.hit_test(&mut session, &mut registry, Some(&ray_at(0.0)), ms(2));
        assert_eq!(phase, PointerPhase::Dragging);
        assert_eq!(session.hovered, Some(2));
        assert!(!registry.get(1).unwrap().highlight.is_hovered);

        let phase = controller.release(&mut session, &mut registry, ms(3));
        assert_eq!(phase, PointerPhase::Idle);
        assert_eq!(session.hovered, None);
        assert!(!registry.get(2).unwrap().highlight.is_hovered);
    }

    #[test]
    fn release_without_drag_keeps_hover() {
        let (_, mut registry) = setup();
        let controller = InteractionController::default();
        let mut session = SessionState::default();
        controller.hit_test(&mut session, &mut registry, Some(&ray_at(0.0)), ms(0));
        let phase = controller.release(&mut session, &mut registry, ms(1));
        assert_eq!(phase, PointerPhase::Hovering(1));
    }

    #[test]
    fn direction_is_forward_biased() {
        let controller = InteractionController::default();
        let dir = controller.drag_direction(Vec3::new(0.0, -1.0, -1.0).normalize());
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!(dir.y > 0.0);
        assert!(dir.z < 0.0);
        assert!(dir.z.abs() > dir.y);
    }

    #[test]
    fn impulse_falls_off_with_distance_and_clamps() {
        let controller = InteractionController::default();
        let near = controller.drag_impulse(Vec3::X, 2.0, 1.0).length();
        let far = controller.drag_impulse(Vec3::X, 4.0, 1.0).length();
        assert!((near / far - 4.0).abs() < 1e-4);
        let zero = controller.drag_impulse(Vec3::X, 0.0, 1.0);
        assert!(zero.is_finite());
        assert_eq!(zero, controller.drag_impulse(Vec3::X, 0.5, 1.0));
    }

    #[test]
    fn drag_pushes_only_bodies_in_front_and_in_range() {
        let mut world = PhysicsWorld::default();
        let mut registry = EntityRegistry::new();
        let (_, template) = setup();
        let proto = template.get(0).unwrap().clone();
        for z in [0.0, 20.0, -40.0] {
            let mut entity = proto.clone();
            entity.body = world.add_body(RigidBody::sphere(Vec3::new(0.0, 0.0, z), 0.5, 1.0));
            registry.push(entity);
        }

        let controller = InteractionController::default();
        let session = SessionState {
            dragging: true,
            ..SessionState::default()
        };
        let pushed = controller.apply_drag(&session, &registry, &mut world, &ray_at(0.0), &frame());
        assert_eq!(pushed, 1);
        let handles: Vec<_> = registry.iter().map(|e| e.body).collect();
        assert!(world.body(handles[0]).unwrap().linear_velocity.length() > 0.0);
        assert_eq!(world.body(handles[1]).unwrap().linear_velocity, Vec3::ZERO);
        assert_eq!(world.body(handles[2]).unwrap().linear_velocity, Vec3::ZERO);
    }

    #[test]
    fn no_drag_no_push() {
        let (mut world, registry) = setup();
        let controller = InteractionController::default();
        let session = SessionState::default();
        let pushed = controller.apply_drag(&session, &registry, &mut world, &ray_at(0.0), &frame());
        assert_eq!(pushed, 0);
    }
}
