// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll state tracker: accumulate offset events from an externally owned scroll view.
//!
//! ## Usage
//!
//! 1) Set the viewport size with [`ScrollTracker::set_viewport_size`].
//! 2) Forward every scroll event with [`ScrollTracker::on_scroll_event`].
//! 3) Hand the returned [`ScrollMetrics`] to a [`HeaderFrameModel`](crate::HeaderFrameModel).
//!
//! Offsets use a top-origin convention: `y == 0` is the top of the content and
//! positive `y` scrolls further into it. Offsets outside the content bounds are
//! kept as-is so that elastic overscroll stays observable.
//!
//! ```
//! use kurbo::{Size, Vec2};
//! use understory_flexible_header::{GesturePhase, ScrollTracker};
//!
//! let mut tracker = ScrollTracker::new(Size::new(320.0, 480.0));
//! let m = tracker.on_scroll_event(Vec2::new(0.0, -30.0), Size::new(320.0, 2000.0), true);
//! assert_eq!(m.offset.y, -30.0);
//! assert_eq!(m.top_overscroll(), 30.0);
//! assert_eq!(m.phase, GesturePhase::Tracking);
//! ```

use kurbo::{Point, Size, Vec2};

/// Gesture state of the tracked scroll view.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum GesturePhase {
    /// Not moving, or moved programmatically without a gesture.
    #[default]
    Idle,
    /// A finger (or pointer) is actively dragging the content.
    Tracking,
    /// The content keeps moving after the gesture ended.
    Decelerating,
}

/// Snapshot of the tracked scroll view.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScrollMetrics {
    /// Current content offset, unclamped.
    pub offset: Point,
    /// Offset delta of the most recent event.
    pub last_delta: Vec2,
    /// Size of the scrollable content.
    pub content_size: Size,
    /// Size of the visible viewport.
    pub viewport_size: Size,
    /// Whether a gesture is currently dragging the content.
    pub is_tracking: bool,
    /// Derived gesture phase.
    pub phase: GesturePhase,
}

impl Default for ScrollMetrics {
    fn default() -> Self {
        Self {
            offset: Point::ZERO,
            last_delta: Vec2::ZERO,
            content_size: Size::ZERO,
            viewport_size: Size::ZERO,
            is_tracking: false,
            phase: GesturePhase::Idle,
        }
    }
}

impl ScrollMetrics {
    /// Vertical distance the content can scroll.
    ///
    /// Content shorter than the viewport has no scroll range.
    #[must_use]
    pub fn scroll_range(&self) -> f64 {
        (self.content_size.height - self.viewport_size.height).max(0.0)
    }

    /// Vertical offset clamped into `[0, scroll_range]`.
    #[must_use]
    pub fn clamped_offset_y(&self) -> f64 {
        self.offset.y.max(0.0).min(self.scroll_range())
    }

    /// How far the content is pulled past its top edge.
    #[must_use]
    pub fn top_overscroll(&self) -> f64 {
        (-self.offset.y).max(0.0)
    }

    /// Fraction of the scroll range consumed, in `[0, 1]`.
    #[must_use]
    pub fn scrolled_fraction(&self) -> f64 {
        let range = self.scroll_range();
        if range <= 0.0 {
            0.0
        } else {
            self.clamped_offset_y() / range
        }
    }
}

/// Accumulates scroll events into [`ScrollMetrics`].
///
/// The tracker has no side effects beyond its own state and never fails.
#[derive(Clone, Debug, Default)]
pub struct ScrollTracker {
    metrics: ScrollMetrics,
}

impl ScrollTracker {
    /// Creates a tracker at offset zero for the given viewport.
    #[must_use]
    pub fn new(viewport_size: Size) -> Self {
        Self {
            metrics: ScrollMetrics {
                viewport_size,
                ..ScrollMetrics::default()
            },
        }
    }

    /// Returns the latest metrics.
    #[must_use]
    pub fn metrics(&self) -> ScrollMetrics {
        self.metrics
    }

    /// Sets the viewport size used to derive the scroll range.
    pub fn set_viewport_size(&mut self, size: Size) {
        self.metrics.viewport_size = size;
    }

    /// Applies one scroll event and returns the updated metrics.
    pub fn on_scroll_event(
        &mut self,
        offset_delta: Vec2,
        content_size: Size,
        is_tracking: bool,
    ) -> ScrollMetrics {
        let moved = offset_delta != Vec2::ZERO;
        let phase = if is_tracking {
            GesturePhase::Tracking
        } else if moved && self.metrics.phase != GesturePhase::Idle {
            GesturePhase::Decelerating
        } else {
            GesturePhase::Idle
        };

        self.metrics.offset += offset_delta;
        self.metrics.last_delta = offset_delta;
        self.metrics.content_size = content_size;
        self.metrics.is_tracking = is_tracking;
        self.metrics.phase = phase;
        self.metrics
    }

    /// Moves to an absolute offset, keeping the current content size and gesture state.
    pub fn scroll_to(&mut self, offset: Point) -> ScrollMetrics {
        let delta = offset - self.metrics.offset;
        self.on_scroll_event(delta, self.metrics.content_size, self.metrics.is_tracking)
    }

    /// Records a gesture beginning or ending without moving the content.
    ///
    /// Lifting the finger enters [`GesturePhase::Decelerating`]; the next
    /// event without movement settles to [`GesturePhase::Idle`].
    pub fn set_tracking(&mut self, is_tracking: bool) -> ScrollMetrics {
        let was_tracking = self.metrics.is_tracking;
        self.on_scroll_event(Vec2::ZERO, self.metrics.content_size, is_tracking);
        if was_tracking && !is_tracking {
            self.metrics.phase = GesturePhase::Decelerating;
        }
        self.metrics
    }
}
