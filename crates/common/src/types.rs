use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// Number of grid cells along each axis. Fixed once the pit is initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDims {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Default for GridDims {
    fn default() -> Self {
        Self {
            width: 5,
            height: 5,
            depth: 5,
        }
    }
}

impl GridDims {
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Total number of cells (and therefore entities) in the grid.
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    /// Iterate cells outer-to-inner: x, then y, then z.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        (0..self.width).flat_map(move |x| {
            (0..self.height).flat_map(move |y| (0..self.depth).map(move |z| (x, y, z)))
        })
    }
}
