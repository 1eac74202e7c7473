//! Entity registry: one sphere mesh paired with one rigid body per grid cell.
//!
//! Entities are stored in creation order, which is stable for indexing.
//!
//! # Invariants
//! - Exactly one body and one mesh per entity; no sharing.
//! - The body is the source of truth. [`EntityRegistry::sync_meshes`] copies
//!   body position and orientation into the mesh verbatim.
//! - Highlight start time is set iff the entity is animating.

pub mod highlight;
pub mod spawn;

use ballpit_assets::MaterialHandle;
use ballpit_common::Transform;
use ballpit_kernel::{BodyHandle, PhysicsWorld, Ray, ray_sphere};

pub use highlight::{HighlightState, HighlightVariant};
pub use spawn::{ContainerBounds, spawn_grid};

/// Visual half of an entity: derived transform plus highlight variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mesh {
    /// Written from the body every frame. `scale` is uniform.
    pub transform: Transform,
    /// Geometry radius before scaling.
    pub radius: f32,
    pub variant: HighlightVariant,
}

impl Mesh {
    /// World-space radius used for picking.
    pub fn world_radius(&self) -> f32 {
        self.radius * self.transform.scale.x
    }
}

/// Paired body/mesh unit representing one sphere.
#[derive(Debug, Clone)]
pub struct Entity {
    pub body: BodyHandle,
    pub mesh: Mesh,
    /// Palette entry the sphere was spawned with. Never changes.
    pub material: MaterialHandle,
    pub highlight: HighlightState,
}

/// Ordered collection of entities.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: Entity) -> usize {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.entities.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    /// Copy every body's position and orientation into its mesh.
    pub fn sync_meshes(&mut self, world: &PhysicsWorld) {
        for entity in &mut self.entities {
            if let Some(body) = world.body(entity.body) {
                entity.mesh.transform.position = body.position;
                entity.mesh.transform.rotation = body.rotation;
            }
        }
    }

    /// Nearest entity whose mesh the ray intersects, with the hit distance.
    pub fn raycast(&self, ray: &Ray) -> Option<(usize, f32)> {
        self.entities
            .iter()
            .enumerate()
            .filter_map(|(i, e)| {
                ray_sphere(ray, e.mesh.transform.position, e.mesh.world_radius()).map(|t| (i, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Number of entities currently showing the glow variant.
    pub fn glowing_count(&self) -> usize {
        self.entities
            .iter()
            .filter(|e| e.mesh.variant.is_glowing())
            .count()
    }

    /// Remove every body from the world and drop all entities.
    ///
    /// Returns how many entities were released; a second call returns 0.
    pub fn release(&mut self, world: &mut PhysicsWorld) -> usize {
        let count = self.entities.len();
        for entity in self.entities.drain(..) {
            world.remove_body(entity.body);
        }
        if count > 0 {
            tracing::debug!(count, "released entities");
        }
        count
    }
}

pub fn crate_info() -> &'static str {
    "ballpit-ecs v0.1.0"
}
