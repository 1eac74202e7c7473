//! Hover glow animation.
//!
//! A hovered sphere fades its emissive glow in over a fixed duration; when the
//! pointer leaves it fades back out over the same duration and then returns to
//! its original material. The timer runs on wall-clock timestamps, so it is
//! independent of the physics step size.

use std::time::Duration;

use ballpit_common::HighlightConfig;

use crate::{Entity, EntityRegistry};

/// Render-time material variant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HighlightVariant {
    /// Palette material as-is.
    #[default]
    Original,
    /// Palette material plus an emissive channel of the given intensity.
    Glowing { intensity: f32 },
}

impl HighlightVariant {
    pub fn is_glowing(&self) -> bool {
        matches!(self, Self::Glowing { .. })
    }

    pub fn intensity(&self) -> f32 {
        match self {
            Self::Original => 0.0,
            Self::Glowing { intensity } => *intensity,
        }
    }
}

/// Per-entity animation bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HighlightState {
    pub is_hovered: bool,
    /// Timestamp the current animation started. Set iff animating.
    started_at: Option<Duration>,
    /// Intensity at the moment the fade-out began.
    fade_from: f32,
}

impl HighlightState {
    pub fn is_animating(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn animation_start(&self) -> Option<Duration> {
        self.started_at
    }
}

impl Entity {
    /// Apply the glow variant and (re)start the fade-in.
    ///
    /// Re-entering mid fade-out overrides the fade.
    pub fn hover_enter(&mut self, now: Duration) {
        self.highlight.is_hovered = true;
        self.highlight.started_at = Some(now);
        self.highlight.fade_from = 0.0;
        self.mesh.variant = HighlightVariant::Glowing { intensity: 0.0 };
    }

    /// Start fading the glow out. No-op for entities that are not glowing.
    pub fn hover_exit(&mut self, now: Duration) {
        self.highlight.is_hovered = false;
        if let HighlightVariant::Glowing { intensity } = self.mesh.variant {
            self.highlight.started_at = Some(now);
            self.highlight.fade_from = intensity;
        }
    }

    /// Advance this entity's animation. Returns true when it finished this call.
    pub fn advance_highlight(&mut self, now: Duration, config: &HighlightConfig) -> bool {
        let Some(start) = self.highlight.started_at else {
            return false;
        };
        let duration = config.duration();
        let elapsed = now.saturating_sub(start);

        if elapsed >= duration {
            self.highlight.started_at = None;
            if self.highlight.is_hovered {
                self.mesh.variant = HighlightVariant::Glowing {
                    intensity: config.peak_intensity,
                };
            } else {
                self.mesh.variant = HighlightVariant::Original;
                self.highlight.fade_from = 0.0;
            }
            return true;
        }

        let progress = if duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0)
        };
        if let HighlightVariant::Glowing { intensity } = &mut self.mesh.variant {
            *intensity = if self.highlight.is_hovered {
                config.peak_intensity * progress
            } else {
                self.highlight.fade_from * (1.0 - progress)
            };
        }
        false
    }
}

impl EntityRegistry {
    /// Advance every animating entity. Returns how many finished this call.
    pub fn advance_highlights(&mut self, now: Duration, config: &HighlightConfig) -> usize {
        self.iter_mut()
            .filter(|e| e.highlight.is_animating())
            .map(|e| e.advance_highlight(now, config))
            .filter(|done| *done)
            .count()
    }
}
