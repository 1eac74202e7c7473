//! Pointer interaction: client coordinates to NDC, touch-to-mouse mapping,
//! and the hover/drag state machine driven by camera rays.
//!
//! # Invariants
//! - At most one entity is hovered at a time.
//! - While dragging, hover hit-testing is suspended.
//! - Release always ends the drag, whatever the ray currently hits.

pub mod interaction;
pub mod pointer;

pub use interaction::{DragFrame, InteractionController, PointerPhase, SessionState};
pub use pointer::{PointerEvent, TouchPhase, TouchTracker, ViewportRect};
