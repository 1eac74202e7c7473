//! Assets: the sphere material palette and the environment-lighting image.
//!
//! The renderer consumes materials by handle, never by value copies. The
//! environment map is the only file the pit loads; it is decoded on a worker
//! thread and polled by the frame driver.

mod environment;
mod palette;

pub use environment::{EnvironmentLoader, EnvironmentMap, LoadPoll};
pub use palette::{Material, MaterialHandle, MaterialPalette};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("environment map load timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("environment loader thread exited without a result")]
    LoaderGone,
}

pub fn crate_info() -> &'static str {
    "ballpit-assets v0.1.0"
}
