use ballpit_assets::MaterialPalette;
use ballpit_common::PitConfig;
use ballpit_ecs::{ContainerBounds, EntityRegistry, spawn_grid};
use ballpit_kernel::PhysicsWorld;
use rand::Rng;

/// Everything that exists once setup completes.
#[derive(Debug)]
pub struct Scene {
    pub world: PhysicsWorld,
    pub registry: EntityRegistry,
    pub bounds: ContainerBounds,
    pub palette: MaterialPalette,
}

impl Scene {
    /// Build the world, walls and sphere grid described by `config`.
    pub fn build<R: Rng + ?Sized>(
        config: &PitConfig,
        palette: MaterialPalette,
        rng: &mut R,
    ) -> Self {
        let mut world = PhysicsWorld::new(&config.physics);
        let mut bounds = ContainerBounds::new(config.grid, &config.spawn);
        bounds.install(&mut world);
        let registry = spawn_grid(&mut world, config.grid, &config.spawn, &palette, rng);
        Self {
            world,
            registry,
            bounds,
            palette,
        }
    }

    /// Remove every entity body and wall from the world.
    ///
    /// Returns the number of entities released; 0 on repeated calls.
    pub fn release(&mut self) -> usize {
        let released = self.registry.release(&mut self.world);
        let walls = self.bounds.remove(&mut self.world);
        tracing::debug!(released, walls, "scene released");
        released
    }
}
