use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use crate::AssetError;

/// Equirectangular lighting image in linear RGBA floats.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentMap {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
    source: Option<PathBuf>,
}

impl EnvironmentMap {
    /// Single-texel map: uniform lighting from every direction.
    pub fn flat(rgb: [f32; 3]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![[rgb[0], rgb[1], rgb[2], 1.0]],
            source: None,
        }
    }

    /// Build from raw pixels. Returns `None` if the pixel count does not match.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<[f32; 4]>) -> Option<Self> {
        if width == 0 || height == 0 || pixels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
            source: None,
        })
    }

    /// Decode an image file (Radiance HDR, PNG or JPEG) into RGBA floats.
    ///
    /// HDR radiance is kept as-is; 8-bit formats map to `0.0..=1.0`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let image = image::open(path)?.into_rgba32f();
        let (width, height) = image.dimensions();
        let pixels = image
            .into_raw()
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
            source: Some(path.to_path_buf()),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn is_flat(&self) -> bool {
        self.width == 1 && self.height == 1
    }

    /// Mean RGB over all texels.
    pub fn average_radiance(&self) -> [f32; 3] {
        let n = self.pixels.len().max(1) as f32;
        let sum = self.pixels.iter().fold([0.0f32; 3], |acc, p| {
            [acc[0] + p[0], acc[1] + p[1], acc[2] + p[2]]
        });
        [sum[0] / n, sum[1] / n, sum[2] / n]
    }

    /// Box-downsample by a power of two until both sides fit in `max_dim`.
    pub fn fit_within(self, max_dim: u32) -> Self {
        let max_dim = max_dim.max(1);
        let mut map = self;
        while map.width > max_dim || map.height > max_dim {
            map = map.halved();
        }
        map
    }

    fn halved(&self) -> Self {
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let mut acc = [0.0f32; 4];
                let mut count = 0.0;
                for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    let sx = (x * 2 + dx).min(self.width - 1);
                    let sy = (y * 2 + dy).min(self.height - 1);
                    let p = self.pixels[(sy * self.width + sx) as usize];
                    for c in 0..4 {
                        acc[c] += p[c];
                    }
                    count += 1.0;
                }
                pixels.push(acc.map(|v| v / count));
            }
        }
        Self {
            width,
            height,
            pixels,
            source: self.source.clone(),
        }
    }
}

/// Result of polling an [`EnvironmentLoader`].
#[derive(Debug)]
pub enum LoadPoll {
    Pending,
    Ready(EnvironmentMap),
    Failed(AssetError),
}

/// Environment map decode running on a worker thread.
///
/// The frame driver polls once per frame; nothing blocks the event loop.
#[derive(Debug)]
pub struct EnvironmentLoader {
    rx: Receiver<Result<EnvironmentMap, AssetError>>,
    started: Instant,
    timeout: Option<Duration>,
}

impl EnvironmentLoader {
    /// Start decoding `path` in the background.
    pub fn spawn(path: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        let path = path.into();
        let (tx, rx) = mpsc::channel();
        let worker_path = path.clone();
        thread::spawn(move || {
            let result = EnvironmentMap::load(&worker_path);
            let _ = tx.send(result);
        });
        tracing::info!(path = %path.display(), ?timeout, "loading environment map");
        Self {
            rx,
            started: Instant::now(),
            timeout,
        }
    }

    /// A loader that resolves immediately with `map`.
    pub fn ready(map: EnvironmentMap) -> Self {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(Ok(map));
        Self {
            rx,
            started: Instant::now(),
            timeout: None,
        }
    }

    pub fn poll(&self) -> LoadPoll {
        match self.rx.try_recv() {
            Ok(Ok(map)) => LoadPoll::Ready(map),
            Ok(Err(e)) => LoadPoll::Failed(e),
            Err(TryRecvError::Disconnected) => LoadPoll::Failed(AssetError::LoaderGone),
            Err(TryRecvError::Empty) => match self.timeout {
                Some(limit) if self.started.elapsed() >= limit => {
                    LoadPoll::Failed(AssetError::Timeout(limit))
                }
                _ => LoadPoll::Pending,
            },
        }
    }
}
