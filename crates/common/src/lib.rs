//! Shared types and configuration for the ball pit workspace.

pub mod config;
pub mod types;

pub use config::{
    AssetConfig, BloomConfig, CameraConfig, ConfigError, ContactMaterial, DragConfig,
    HighlightConfig, PhysicsConfig, PitConfig, SpawnConfig,
};
pub use types::{GridDims, Transform};
