use glam::Vec2;

/// Bounding rectangle of the surface the pit is mounted in, in client pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewportRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rectangle anchored at the client origin.
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Convert client coordinates to normalized device coordinates.
    ///
    /// x grows right, y grows up, both in `-1..=1` inside the rectangle.
    /// Returns `None` for a degenerate rectangle.
    pub fn to_ndc(&self, x: f32, y: f32) -> Option<Vec2> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(Vec2::new(
            (x - self.left) / self.width * 2.0 - 1.0,
            -((y - self.top) / self.height * 2.0 - 1.0),
        ))
    }
}

/// Pointer events in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Move { x: f32, y: f32 },
    Down { x: f32, y: f32 },
    Up,
    /// Pointer left the surface.
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
    Cancelled,
}

/// Maps the first active touch point to mouse-style pointer events.
///
/// Additional simultaneous touches are ignored until the tracked one ends.
#[derive(Debug, Default, Clone)]
pub struct TouchTracker {
    active: Option<u64>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<u64> {
        self.active
    }

    pub fn touch(&mut self, id: u64, phase: TouchPhase, x: f32, y: f32) -> Option<PointerEvent> {
        match (phase, self.active) {
            (TouchPhase::Started, None) => {
                self.active = Some(id);
                Some(PointerEvent::Down { x, y })
            }
            (TouchPhase::Moved, Some(active)) if active == id => Some(PointerEvent::Move { x, y }),
            (TouchPhase::Ended | TouchPhase::Cancelled, Some(active)) if active == id => {
                self.active = None;
                Some(PointerEvent::Up)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ndc_corners_and_center() {
        let rect = ViewportRect::new(10.0, 20.0, 200.0, 100.0);
        assert_eq!(rect.to_ndc(10.0, 20.0), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(rect.to_ndc(210.0, 120.0), Some(Vec2::new(1.0, -1.0)));
        assert_eq!(rect.to_ndc(110.0, 70.0), Some(Vec2::ZERO));
    }

    #[test]
    fn degenerate_rect_has_no_ndc() {
        assert!(ViewportRect::from_size(0.0, 100.0).to_ndc(0.0, 0.0).is_none());
    }

    #[test]
    fn first_touch_only() {
        let mut touches = TouchTracker::new();
        assert_eq!(
            touches.touch(1, TouchPhase::Started, 5.0, 6.0),
            Some(PointerEvent::Down { x: 5.0, y: 6.0 })
        );
        assert_eq!(touches.touch(2, TouchPhase::Started, 1.0, 1.0), None);
        assert_eq!(touches.touch(2, TouchPhase::Moved, 2.0, 2.0), None);
        assert_eq!(
            touches.touch(1, TouchPhase::Moved, 7.0, 8.0),
            Some(PointerEvent::Move { x: 7.0, y: 8.0 })
        );
        assert_eq!(touches.touch(2, TouchPhase::Ended, 0.0, 0.0), None);
        assert_eq!(
            touches.touch(1, TouchPhase::Ended, 0.0, 0.0),
            Some(PointerEvent::Up)
        );
        assert_eq!(touches.active(), None);
    }

    #[test]
    fn cancelled_touch_releases() {
        let mut touches = TouchTracker::new();
        touches.touch(4, TouchPhase::Started, 0.0, 0.0);
        assert_eq!(
            touches.touch(4, TouchPhase::Cancelled, 0.0, 0.0),
            Some(PointerEvent::Up)
        );
    }
}
