//! Frame driver: owns the pit and sequences every frame.
//!
//! Nothing steps or renders until the environment map resolves (or fails and
//! falls back to flat lighting). Once ready, each frame runs in a fixed order:
//! FPS update, hover hit-test, highlight animation, drag impulses, physics
//! step, mesh sync, render.
//!
//! # Invariants
//! - Mesh sync always precedes render within a frame.
//! - After `cancel` no frame does any work.
//! - `teardown` releases each resource once; repeated calls are no-ops, and
//!   input or resize events afterwards are ignored.

mod driver;
mod scene;

pub use driver::{FrameDriver, FrameOutcome, InitState};
pub use scene::Scene;

use ballpit_common::ConfigError;

/// Lighting used when the environment map cannot be loaded.
pub const FALLBACK_RADIANCE: [f32; 3] = [0.6, 0.6, 0.65];

/// Errors from the frame driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("render failed: {0}")]
    Render(Box<dyn std::error::Error + Send + Sync>),
}

impl DriverError {
    pub(crate) fn render<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
        Self::Render(Box::new(e))
    }
}
