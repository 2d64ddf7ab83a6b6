// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Header frame model: derive header height and shift from scroll metrics.
//!
//! The header starts fully expanded at its maximum height. Scrolling into the
//! content shrinks it linearly with the offset until it reaches its minimum
//! height. With shifting enabled, further scrolling translates the collapsed
//! header off-screen, and scrolling back brings it on-screen again before it
//! grows.
//!
//! Resize and shift never happen at the same time on a reversal:
//!
//! - Collapsing deltas shrink first; only a header at its minimum height shifts.
//! - Expanding deltas un-shift first; only an unshifted header grows.
//!
//! At the top of the content (or in top overscroll) the header is always fully
//! expanded and unshifted.

use crate::scroll::ScrollMetrics;

/// Whether and how a collapsed header may translate off-screen.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ShiftBehavior {
    /// The header never shifts; it stays at its minimum height.
    #[default]
    Disabled,
    /// The collapsed header shifts off-screen; the status bar stays.
    Enabled,
    /// The collapsed header shifts off-screen and asks for the status bar to hide with it.
    EnabledWithStatusBar,
}

impl ShiftBehavior {
    /// Returns `true` if the header may shift at all.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// Returns `true` if a shifted header requests the status bar to auto-hide.
    #[must_use]
    pub fn hides_status_bar(self) -> bool {
        matches!(self, Self::EnabledWithStatusBar)
    }
}

/// Configured height limits and shift behavior of a header.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HeaderLimits {
    minimum_height: f64,
    maximum_height: f64,
    /// Shift behavior picked up on the next recompute.
    pub shift_behavior: ShiftBehavior,
}

impl HeaderLimits {
    /// Creates limits from a height range.
    ///
    /// The range is normalized so that `minimum <= maximum`; negative heights
    /// are raised to zero.
    #[must_use]
    pub fn new(minimum_height: f64, maximum_height: f64) -> Self {
        let a = minimum_height.max(0.0);
        let b = maximum_height.max(0.0);
        let (minimum_height, maximum_height) = if a <= b { (a, b) } else { (b, a) };
        Self {
            minimum_height,
            maximum_height,
            shift_behavior: ShiftBehavior::Disabled,
        }
    }

    /// Returns these limits with the given shift behavior.
    #[must_use]
    pub fn with_shift_behavior(mut self, shift_behavior: ShiftBehavior) -> Self {
        self.shift_behavior = shift_behavior;
        self
    }

    /// Height of the fully collapsed header.
    #[must_use]
    pub fn minimum_height(&self) -> f64 {
        self.minimum_height
    }

    /// Height of the fully expanded header.
    #[must_use]
    pub fn maximum_height(&self) -> f64 {
        self.maximum_height
    }

    /// Height implied by a clamped scroll offset when the header only resizes.
    fn height_for_offset(&self, offset_y: f64) -> f64 {
        (self.maximum_height - offset_y).clamp(self.minimum_height, self.maximum_height)
    }
}

impl Default for HeaderLimits {
    /// A 56pt collapsed / 128pt expanded header without shifting.
    ///
    /// These are starting points; products are expected to supply their own.
    fn default() -> Self {
        Self::new(56.0, 128.0)
    }
}

/// Observable header geometry.
///
/// After every recompute `minimum_height <= current_height <= maximum_height`
/// and `0 <= shift_offset <= current_height`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HeaderGeometry {
    /// Current header height.
    pub current_height: f64,
    /// Configured minimum height.
    pub minimum_height: f64,
    /// Configured maximum height.
    pub maximum_height: f64,
    /// Distance the header is translated off-screen.
    pub shift_offset: f64,
    /// Whether shifting was enabled for this recompute.
    pub is_shifting_enabled: bool,
}

impl HeaderGeometry {
    /// Fully expanded, unshifted geometry for the given limits.
    #[must_use]
    pub fn expanded(limits: &HeaderLimits) -> Self {
        Self {
            current_height: limits.maximum_height,
            minimum_height: limits.minimum_height,
            maximum_height: limits.maximum_height,
            shift_offset: 0.0,
            is_shifting_enabled: limits.shift_behavior.is_enabled(),
        }
    }

    /// Height of the header still on-screen.
    #[must_use]
    pub fn visible_height(&self) -> f64 {
        (self.current_height - self.shift_offset).max(0.0)
    }

    /// Fraction of the current height still on-screen, in `[0, 1]`.
    #[must_use]
    pub fn visible_fraction(&self) -> f64 {
        if self.current_height <= 0.0 {
            0.0
        } else {
            self.visible_height() / self.current_height
        }
    }

    /// How far the header has collapsed, `0` when expanded and `1` at minimum height.
    #[must_use]
    pub fn fraction_collapsed(&self) -> f64 {
        let span = self.maximum_height - self.minimum_height;
        if span <= 0.0 {
            0.0
        } else {
            (self.maximum_height - self.current_height) / span
        }
    }

    fn same_frame(&self, other: &Self) -> bool {
        self.current_height == other.current_height && self.shift_offset == other.shift_offset
    }
}

/// What the header is doing in response to scrolling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScrollPhase {
    /// The collapsed header is translating on or off screen.
    Shifting,
    /// The header is resizing between its minimum and maximum height.
    Collapsing,
    /// The content is pulled past its top edge.
    OverExtending,
}

/// Result of [`HeaderFrameModel::recompute`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameUpdate {
    /// Geometry after the recompute.
    pub geometry: HeaderGeometry,
    /// Whether height or shift changed.
    pub changed: bool,
}

/// Owns the header geometry and recomputes it from scroll metrics.
#[derive(Clone, Debug)]
pub struct HeaderFrameModel {
    limits: HeaderLimits,
    geometry: HeaderGeometry,
    consumed_offset_y: f64,
    top_overscroll: f64,
}

impl HeaderFrameModel {
    /// Creates a fully expanded model.
    #[must_use]
    pub fn new(limits: HeaderLimits) -> Self {
        Self {
            limits,
            geometry: HeaderGeometry::expanded(&limits),
            consumed_offset_y: 0.0,
            top_overscroll: 0.0,
        }
    }

    /// Returns the configured limits.
    #[must_use]
    pub fn limits(&self) -> HeaderLimits {
        self.limits
    }

    /// Returns the current geometry.
    #[must_use]
    pub fn geometry(&self) -> HeaderGeometry {
        self.geometry
    }

    /// Replaces the limits and resets the geometry to fully expanded.
    ///
    /// Returns `true` if height or shift changed.
    pub fn set_limits(&mut self, limits: HeaderLimits) -> bool {
        self.limits = limits;
        self.reset()
    }

    /// Changes the shift behavior; the next recompute picks it up.
    pub fn set_shift_behavior(&mut self, behavior: ShiftBehavior) {
        self.limits.shift_behavior = behavior;
    }

    /// Resets the geometry to fully expanded and unshifted.
    ///
    /// The consumed scroll position is kept. The next recompute that does not
    /// scroll toward the top brings the height back in line with the offset.
    /// Returns `true` if height or shift changed.
    pub fn reset(&mut self) -> bool {
        let next = HeaderGeometry::expanded(&self.limits);
        let changed = !next.same_frame(&self.geometry);
        self.geometry = next;
        changed
    }

    /// Recomputes the geometry for a new scroll snapshot.
    ///
    /// Recomputing with a snapshot whose clamped offset was already consumed
    /// leaves the geometry as-is and reports no change.
    pub fn recompute(&mut self, metrics: &ScrollMetrics) -> FrameUpdate {
        let limits = self.limits;
        let (min, max) = (limits.minimum_height, limits.maximum_height);
        let y = metrics.clamped_offset_y();
        let dy = y - self.consumed_offset_y;
        self.consumed_offset_y = y;
        self.top_overscroll = metrics.top_overscroll();

        let bound = limits.height_for_offset(y);
        let previous = self.geometry.current_height.clamp(min, max);
        let mut height = previous;
        let mut shift = self.geometry.shift_offset.max(0.0);

        if !limits.shift_behavior.is_enabled() || y <= 0.0 {
            height = bound;
            shift = 0.0;
        } else if dy > 0.0 {
            let shrunk = height.min(bound);
            let remainder = (dy - (height - shrunk)).max(0.0);
            height = shrunk;
            if height <= min {
                shift += remainder;
            }
        } else if dy < 0.0 {
            let unshift = (-dy).min(shift);
            shift -= unshift;
            if shift <= 0.0 {
                height = (height + (-dy - unshift)).min(bound);
            }
        } else {
            height = height.min(bound);
        }

        // An expanding delta never shrinks the header, even right after a reset.
        if dy < 0.0 {
            height = height.max(previous);
        }

        // Settle any overshoot before anyone observes it.
        let height = height.clamp(min, max);
        let next = HeaderGeometry {
            current_height: height,
            minimum_height: min,
            maximum_height: max,
            shift_offset: shift.clamp(0.0, height),
            is_shifting_enabled: limits.shift_behavior.is_enabled(),
        };
        let changed = !next.same_frame(&self.geometry);
        self.geometry = next;
        FrameUpdate {
            geometry: next,
            changed,
        }
    }

    /// Current scroll phase.
    #[must_use]
    pub fn scroll_phase(&self) -> ScrollPhase {
        if self.geometry.shift_offset > 0.0 {
            ScrollPhase::Shifting
        } else if self.top_overscroll > 0.0 {
            ScrollPhase::OverExtending
        } else {
            ScrollPhase::Collapsing
        }
    }

    /// Progress within the current [`ScrollPhase`].
    ///
    /// - `Shifting`: fraction of the height shifted off-screen, in `(0, 1]`.
    /// - `Collapsing`: `1` when expanded, `0` at minimum height.
    /// - `OverExtending`: `1` plus the overscroll relative to the maximum height.
    #[must_use]
    pub fn scroll_phase_percentage(&self) -> f64 {
        let g = &self.geometry;
        match self.scroll_phase() {
            ScrollPhase::Shifting => 1.0 - g.visible_fraction(),
            ScrollPhase::Collapsing => 1.0 - g.fraction_collapsed(),
            ScrollPhase::OverExtending => {
                if g.maximum_height <= 0.0 {
                    1.0
                } else {
                    1.0 + self.top_overscroll / g.maximum_height
                }
            }
        }
    }
}
