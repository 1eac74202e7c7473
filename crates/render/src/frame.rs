use ballpit_assets::{Material, MaterialPalette};
use ballpit_ecs::EntityRegistry;
use glam::{Mat4, Vec3};

use crate::PitCamera;

/// One sphere instance with its resolved material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceDraw {
    /// Unit sphere to world.
    pub model: Mat4,
    pub base_color: [f32; 4],
    pub roughness: f32,
    pub metalness: f32,
    /// Zero unless the entity is glowing.
    pub emissive: [f32; 3],
}

impl InstanceDraw {
    pub fn is_glowing(&self) -> bool {
        self.emissive.iter().any(|&c| c > 0.0)
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub view_proj: Mat4,
    pub eye: Vec3,
    pub instances: Vec<InstanceDraw>,
}

impl RenderFrame {
    /// Snapshot the registry's meshes through `camera`.
    pub fn build(camera: &PitCamera, registry: &EntityRegistry, palette: &MaterialPalette) -> Self {
        let fallback = Material::default();
        let instances = registry
            .iter()
            .map(|entity| {
                let material = palette.get(entity.material).unwrap_or(&fallback);
                let t = &entity.mesh.transform;
                let intensity = entity.mesh.variant.intensity();
                let c = material.base_color;
                InstanceDraw {
                    model: Mat4::from_scale_rotation_translation(
                        t.scale * entity.mesh.radius,
                        t.rotation,
                        t.position,
                    ),
                    base_color: c,
                    roughness: material.roughness,
                    metalness: material.metalness,
                    emissive: [c[0] * intensity, c[1] * intensity, c[2] * intensity],
                }
            })
            .collect();
        Self {
            view_proj: camera.view_projection(),
            eye: camera.position(),
            instances,
        }
    }

    pub fn glowing_count(&self) -> usize {
        self.instances.iter().filter(|i| i.is_glowing()).count()
    }
}
