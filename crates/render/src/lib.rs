//! Rendering adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers never mutate world or entity state.
//! - A [`RenderFrame`] is derived from synced meshes, the palette and the camera.
//! - Glow is resolved here from the highlight variant; palette materials are
//!   never copied into entities.

mod camera;
mod frame;
mod renderer;

pub use camera::PitCamera;
pub use frame::{InstanceDraw, RenderFrame};
pub use renderer::{DebugTextRenderer, Renderer};

pub fn crate_info() -> &'static str {
    "ballpit-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
