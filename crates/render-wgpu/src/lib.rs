//! wgpu render backend for the ball pit.
//!
//! Draws instanced UV spheres lit by an equirectangular environment map, with
//! an emissive channel for hover glow. The bloom path renders scene color and
//! glow into HDR targets, blurs the glow and composites it onto the surface.
//!
//! # Invariants
//! - Renderer never mutates world or entity state.
//! - Bloom parameters are uploaded every frame, so edits apply immediately.
//! - `release` destroys every texture and buffer exactly once.

mod bloom;
mod gpu;
mod mesh;
mod renderer;
mod shaders;

pub use gpu::{GpuContext, GpuError};
pub use renderer::WgpuRenderer;
