use ballpit_assets::MaterialHandle;
use ballpit_ecs::EntityRegistry;
use ballpit_kernel::PhysicsWorld;

/// Pit inspector for developer tooling.
///
/// Read-only queries over the world and entity registry for debugging and the
/// desktop side panel.
pub struct PitInspector;

impl PitInspector {
    /// Produce a summary of the pit state.
    pub fn summary(world: &PhysicsWorld, registry: &EntityRegistry) -> PitSummary {
        let mut kinetic_energy = 0.0;
        let mut max_speed = 0.0f32;
        for (_, body) in world.bodies() {
            let speed = body.linear_velocity.length();
            kinetic_energy += 0.5 * body.mass() * speed * speed;
            max_speed = max_speed.max(speed);
        }
        PitSummary {
            tick: world.tick(),
            time: world.time(),
            entity_count: registry.len(),
            body_count: world.body_count(),
            plane_count: world.plane_count(),
            glowing: registry.glowing_count(),
            kinetic_energy,
            max_speed,
        }
    }

    /// Details of the entity at registry `index`.
    pub fn inspect_entity(
        world: &PhysicsWorld,
        registry: &EntityRegistry,
        index: usize,
    ) -> Option<EntityInfo> {
        let entity = registry.get(index)?;
        let body = world.body(entity.body)?;
        let p = body.position;
        let v = body.linear_velocity;
        Some(EntityInfo {
            index,
            position: [p.x, p.y, p.z],
            velocity: [v.x, v.y, v.z],
            scale: entity.mesh.transform.scale.x,
            material: entity.material,
            glow: entity.mesh.variant.intensity(),
            animating: entity.highlight.is_animating(),
        })
    }
}

/// Summary of pit state for the inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct PitSummary {
    pub tick: u64,
    /// Simulated seconds.
    pub time: f64,
    pub entity_count: usize,
    pub body_count: usize,
    pub plane_count: usize,
    pub glowing: usize,
    pub kinetic_energy: f32,
    pub max_speed: f32,
}

impl std::fmt::Display for PitSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pit: tick={} time={:.2}s entities={} bodies={} planes={} glowing={} energy={:.3} max_speed={:.2}",
            self.tick,
            self.time,
            self.entity_count,
            self.body_count,
            self.plane_count,
            self.glowing,
            self.kinetic_energy,
            self.max_speed
        )
    }
}

/// Detailed info about a single entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    pub index: usize,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub scale: f32,
    pub material: MaterialHandle,
    pub glow: f32,
    pub animating: bool,
}

impl std::fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Entity [{}] pos=({:.2}, {:.2}, {:.2}) vel=({:.2}, {:.2}, {:.2}) scale={:.2} material={} glow={:.2}",
            self.index,
            self.position[0],
            self.position[1],
            self.position[2],
            self.velocity[0],
            self.velocity[1],
            self.velocity[2],
            self.scale,
            self.material.0,
            self.glow,
        )
    }
}
