//! Grid spawning and the static container around it.

use ballpit_assets::{MaterialHandle, MaterialPalette};
use ballpit_common::{ContactMaterial, GridDims, SpawnConfig, Transform};
use ballpit_kernel::{PhysicsWorld, Plane, PlaneHandle, RigidBody};
use glam::Vec3;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::{Entity, EntityRegistry, HighlightState, HighlightVariant, Mesh};

/// Center of cell `(x, y, z)` before jitter. The grid is centered on the origin.
pub fn cell_center(dims: GridDims, cell: (u32, u32, u32), spacing: f32) -> Vec3 {
    let axis = |i: u32, n: u32| (i as f32 - (n as f32 - 1.0) * 0.5) * spacing;
    Vec3::new(
        axis(cell.0, dims.width),
        axis(cell.1, dims.height),
        axis(cell.2, dims.depth),
    )
}

/// Create one sphere entity per grid cell, in `GridDims::cells` order.
///
/// Each sphere gets a random scale, a small positional jitter, and a random
/// palette material. Body and mesh start at the same position.
pub fn spawn_grid<R: Rng + ?Sized>(
    world: &mut PhysicsWorld,
    dims: GridDims,
    config: &SpawnConfig,
    palette: &MaterialPalette,
    rng: &mut R,
) -> EntityRegistry {
    let handles: Vec<MaterialHandle> = palette.handles().collect();
    let jitter = config.jitter.abs();
    let (scale_lo, scale_hi) = if config.scale_min <= config.scale_max {
        (config.scale_min, config.scale_max)
    } else {
        (config.scale_max, config.scale_min)
    };
    let contact = ContactMaterial {
        friction: config.friction,
        restitution: config.restitution,
    };

    let mut registry = EntityRegistry::new();
    for cell in dims.cells() {
        let offset = Vec3::new(
            rng.gen_range(-jitter..=jitter),
            rng.gen_range(-jitter..=jitter),
            rng.gen_range(-jitter..=jitter),
        );
        let position = cell_center(dims, cell, config.spacing) + offset;
        let scale = rng.gen_range(scale_lo..=scale_hi);
        let material = handles.choose(rng).copied().unwrap_or(MaterialHandle(0));

        let body = RigidBody::sphere(
            position,
            config.base_radius * scale,
            config.mass_per_scale * scale,
        )
        .with_material(contact);
        let body = world.add_body(body);

        registry.push(Entity {
            body,
            mesh: Mesh {
                transform: Transform {
                    position,
                    scale: Vec3::splat(scale),
                    ..Transform::default()
                },
                radius: config.base_radius,
                variant: HighlightVariant::Original,
            },
            material,
            highlight: HighlightState::default(),
        });
    }

    tracing::info!(
        entities = registry.len(),
        width = dims.width,
        height = dims.height,
        depth = dims.depth,
        "spawned grid"
    );
    registry
}

/// Six inward-facing walls enclosing the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerBounds {
    pub half_extents: Vec3,
    planes: Vec<PlaneHandle>,
}

impl ContainerBounds {
    pub fn new(dims: GridDims, config: &SpawnConfig) -> Self {
        let half = |n: u32| n as f32 * config.spacing * 0.5 + config.bounds_padding;
        Self {
            half_extents: Vec3::new(half(dims.width), half(dims.height), half(dims.depth)),
            planes: Vec::new(),
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.abs().cmple(self.half_extents).all()
    }

    /// Wall planes, floor first.
    pub fn planes(&self) -> [Plane; 6] {
        let h = self.half_extents;
        [
            Plane::new(Vec3::Y, -h.y),
            Plane::new(Vec3::NEG_Y, -h.y),
            Plane::new(Vec3::X, -h.x),
            Plane::new(Vec3::NEG_X, -h.x),
            Plane::new(Vec3::Z, -h.z),
            Plane::new(Vec3::NEG_Z, -h.z),
        ]
    }

    pub fn is_installed(&self) -> bool {
        !self.planes.is_empty()
    }

    /// Add the walls to `world`. Does nothing if already installed.
    pub fn install(&mut self, world: &mut PhysicsWorld) {
        if self.is_installed() {
            return;
        }
        self.planes = self.planes().into_iter().map(|p| world.add_plane(p)).collect();
    }

    /// Remove the walls from `world`. Returns how many were removed.
    pub fn remove(&mut self, world: &mut PhysicsWorld) -> usize {
        self.planes
            .drain(..)
            .filter(|&h| world.remove_plane(h).is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn spawn(dims: GridDims, seed: u64) -> (PhysicsWorld, EntityRegistry) {
        let mut world = PhysicsWorld::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let registry = spawn_grid(
            &mut world,
            dims,
            &SpawnConfig::default(),
            &MaterialPalette::default(),
            &mut rng,
        );
        (world, registry)
    }

    #[test]
    fn one_entity_per_cell_with_unique_bodies() {
        let dims = GridDims::new(5, 5, 5);
        let (world, registry) = spawn(dims, 7);
        assert_eq!(registry.len(), 125);
        assert_eq!(world.body_count(), 125);
        let mut handles: Vec<_> = registry.iter().map(|e| e.body).collect();
        handles.sort();
        handles.dedup();
        assert_eq!(handles.len(), 125);
    }

    #[test]
    fn single_cell_grid() {
        let (_, registry) = spawn(GridDims::new(1, 1, 1), 1);
        assert_eq!(registry.len(), 1);
        let p = registry.get(0).unwrap().mesh.transform.position;
        assert!(p.abs().max_element() <= SpawnConfig::default().jitter + 1e-6);
    }

    #[test]
    fn positions_stay_within_jitter_of_cell() {
        let dims = GridDims::new(3, 4, 2);
        let config = SpawnConfig::default();
        let (world, registry) = spawn(dims, 42);
        for (entity, cell) in registry.iter().zip(dims.cells()) {
            let center = cell_center(dims, cell, config.spacing);
            let p = entity.mesh.transform.position;
            assert!((p - center).abs().max_element() <= config.jitter + 1e-6);
            assert_eq!(world.body(entity.body).unwrap().position, p);
        }
    }

    #[test]
    fn scale_and_mass_follow_config() {
        let config = SpawnConfig::default();
        let (world, registry) = spawn(GridDims::new(4, 4, 4), 3);
        for e in registry.iter() {
            let s = e.mesh.transform.scale.x;
            assert!(s >= config.scale_min && s <= config.scale_max);
            assert_eq!(e.mesh.transform.scale, Vec3::splat(s));
            let body = world.body(e.body).unwrap();
            assert!((body.radius - config.base_radius * s).abs() < 1e-6);
            assert!((body.mass() - config.mass_per_scale * s).abs() < 1e-6);
            assert!((e.mesh.world_radius() - body.radius).abs() < 1e-6);
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let dims = GridDims::new(3, 3, 3);
        let (_, a) = spawn(dims, 99);
        let (_, b) = spawn(dims, 99);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.mesh.transform, y.mesh.transform);
            assert_eq!(x.material, y.material);
        }
    }

    #[test]
    fn materials_come_from_palette() {
        let palette = MaterialPalette::default();
        let (_, registry) = spawn(GridDims::new(5, 5, 5), 11);
        assert!(registry.iter().all(|e| palette.get(e.material).is_some()));
    }

    #[test]
    fn container_encloses_spawned_spheres() {
        let dims = GridDims::new(5, 5, 5);
        let bounds = ContainerBounds::new(dims, &SpawnConfig::default());
        let (_, registry) = spawn(dims, 5);
        for e in registry.iter() {
            let p = e.mesh.transform.position;
            assert!(bounds.contains(p));
            for plane in bounds.planes() {
                assert!(plane.distance_to_point(p) > e.mesh.world_radius());
            }
        }
    }

    #[test]
    fn install_and_remove_walls() {
        let mut world = PhysicsWorld::default();
        let mut bounds = ContainerBounds::new(GridDims::default(), &SpawnConfig::default());
        bounds.install(&mut world);
        bounds.install(&mut world);
        assert_eq!(world.plane_count(), 6);
        assert_eq!(bounds.remove(&mut world), 6);
        assert_eq!(world.plane_count(), 0);
        assert_eq!(bounds.remove(&mut world), 0);
    }
}
