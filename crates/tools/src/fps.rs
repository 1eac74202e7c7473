use std::time::Duration;

const WINDOW: Duration = Duration::from_secs(1);

/// Frames-per-second estimate recomputed once per one-second window.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    window_start: Option<Duration>,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one frame at `now`. Returns the new estimate when a window closes.
    pub fn tick(&mut self, now: Duration) -> Option<f32> {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return None;
        };
        self.frames += 1;
        let elapsed = now.saturating_sub(start);
        if elapsed < WINDOW {
            return None;
        }
        self.fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = Some(now);
        tracing::debug!(fps = self.fps, "frame rate");
        Some(self.fps)
    }

    /// Last completed estimate; 0 until the first window closes.
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_until_first_window() {
        let mut fps = FpsCounter::new();
        for i in 0..30 {
            assert_eq!(fps.tick(Duration::from_millis(i * 16)), None);
        }
        assert_eq!(fps.fps(), 0.0);
    }

    #[test]
    fn fifty_frames_per_second() {
        let mut fps = FpsCounter::new();
        let mut last = None;
        for i in 0..=50 {
            last = fps.tick(Duration::from_millis(i * 20)).or(last);
        }
        let value = last.unwrap();
        assert!((value - 50.0).abs() < 1e-3, "{value}");
        assert_eq!(fps.fps(), value);
    }

    #[test]
    fn recomputes_once_per_window() {
        let mut fps = FpsCounter::new();
        let updates = (0..=300)
            .filter_map(|i| fps.tick(Duration::from_millis(i * 10)))
            .count();
        assert_eq!(updates, 3);
    }
}
