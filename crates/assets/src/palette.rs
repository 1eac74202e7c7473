use serde::{Deserialize, Serialize};

/// A handle referencing a palette material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialHandle(pub u32);

/// Physically based surface description for one sphere color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Linear RGBA.
    pub base_color: [f32; 4],
    pub roughness: f32,
    pub metalness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".into(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            roughness: 0.5,
            metalness: 0.0,
        }
    }
}

/// Fixed, immutable set of materials the spawner picks from.
///
/// Entities hold a [`MaterialHandle`] into the palette; the highlight glow is
/// a render-time variant, so palette entries are never cloned or mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialPalette {
    materials: Vec<Material>,
}

impl Default for MaterialPalette {
    fn default() -> Self {
        let entry = |name: &str, rgb: [f32; 3], roughness: f32, metalness: f32| Material {
            name: name.into(),
            base_color: [rgb[0], rgb[1], rgb[2], 1.0],
            roughness,
            metalness,
        };
        Self::new(vec![
            entry("coral", [0.95, 0.33, 0.28], 0.35, 0.0),
            entry("mint", [0.30, 0.85, 0.62], 0.4, 0.0),
            entry("sky", [0.25, 0.55, 0.95], 0.3, 0.1),
            entry("lilac", [0.62, 0.45, 0.90], 0.45, 0.0),
            entry("sun", [0.98, 0.78, 0.22], 0.25, 0.2),
            entry("graphite", [0.12, 0.12, 0.14], 0.2, 0.8),
            entry("pearl", [0.92, 0.92, 0.90], 0.15, 0.0),
        ])
    }
}

impl MaterialPalette {
    pub fn new(materials: Vec<Material>) -> Self {
        Self { materials }
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn get(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle.0 as usize)
    }

    pub fn handles(&self) -> impl Iterator<Item = MaterialHandle> + '_ {
        (0..self.materials.len() as u32).map(MaterialHandle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialHandle, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialHandle(i as u32), m))
    }
}
