use std::convert::Infallible;
use std::fmt::Write;

use ballpit_assets::EnvironmentMap;
use ballpit_common::BloomConfig;

use crate::RenderFrame;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// Renderers consume a [`RenderFrame`] snapshot and never touch world state.
pub trait Renderer {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Install the lighting image used for reflections and ambient light.
    fn set_environment(&mut self, environment: &EnvironmentMap) -> Result<(), Self::Error>;

    /// Draw the frame straight to the output.
    fn render(&mut self, frame: &RenderFrame) -> Result<(), Self::Error>;

    /// Draw through the bloom post-processing pipeline.
    fn render_with_bloom(
        &mut self,
        frame: &RenderFrame,
        bloom: &BloomConfig,
    ) -> Result<(), Self::Error>;

    /// Resize output and intermediate targets.
    fn resize(&mut self, width: u32, height: u32);

    /// Free every owned resource. Returns false if already released.
    fn release(&mut self) -> bool;
}

/// Headless renderer that describes each frame as text.
///
/// Counts which render path was taken, for the CLI and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    direct_frames: u64,
    composite_frames: u64,
    size: (u32, u32),
    environment: Option<(u32, u32)>,
    last_output: String,
    released: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn direct_frames(&self) -> u64 {
        self.direct_frames
    }

    pub fn composite_frames(&self) -> u64 {
        self.composite_frames
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Dimensions of the installed environment map.
    pub fn environment(&self) -> Option<(u32, u32)> {
        self.environment
    }

    pub fn last_output(&self) -> &str {
        &self.last_output
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn describe(&mut self, frame: &RenderFrame, path: &str) {
        let mut out = String::new();
        let _ = writeln!(out, "=== Frame ({path}) ===");
        let _ = writeln!(
            out,
            "Instances: {} (glowing: {})",
            frame.instances.len(),
            frame.glowing_count()
        );
        let _ = writeln!(
            out,
            "Eye: ({:.1}, {:.1}, {:.1})",
            frame.eye.x, frame.eye.y, frame.eye.z
        );
        for (i, draw) in frame.instances.iter().enumerate() {
            let p = draw.model.w_axis;
            let _ = writeln!(
                out,
                "  [{i:>3}] pos=({:.2}, {:.2}, {:.2}) emissive={:.2}",
                p.x,
                p.y,
                p.z,
                draw.emissive.iter().copied().fold(0.0f32, f32::max)
            );
        }
        self.last_output = out;
    }
}

impl Renderer for DebugTextRenderer {
    type Error = Infallible;

    fn set_environment(&mut self, environment: &EnvironmentMap) -> Result<(), Infallible> {
        self.environment = Some((environment.width(), environment.height()));
        Ok(())
    }

    fn render(&mut self, frame: &RenderFrame) -> Result<(), Infallible> {
        if self.released {
            return Ok(());
        }
        self.direct_frames += 1;
        self.describe(frame, "direct");
        Ok(())
    }

    fn render_with_bloom(
        &mut self,
        frame: &RenderFrame,
        bloom: &BloomConfig,
    ) -> Result<(), Infallible> {
        if self.released {
            return Ok(());
        }
        self.composite_frames += 1;
        let path = format!(
            "bloom strength={:.2} radius={:.2} threshold={:.2}",
            bloom.strength, bloom.radius, bloom.threshold
        );
        self.describe(frame, &path);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.environment = None;
        self.last_output.clear();
        tracing::debug!(
            direct = self.direct_frames,
            composite = self.composite_frames,
            "debug renderer released"
        );
        true
    }
}
