// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Status presentation resolver: status bar visibility and style from header state.

use peniko::Color;

use crate::geometry::HeaderGeometry;

/// Content style of the host status bar.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum StatusBarStyle {
    /// Dark content, for light backgrounds.
    #[default]
    Default,
    /// Light content, for dark backgrounds.
    LightContent,
}

/// Resolved status bar presentation. Recomputed on demand, never stored.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct StatusPresentation {
    /// Whether the status bar should be hidden.
    pub hidden: bool,
    /// Preferred content style.
    pub style: StatusBarStyle,
}

/// Tunable thresholds for status bar resolution.
///
/// The defaults are calibration starting points rather than fixed design values.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StatusPolicy {
    /// The status bar may hide once the on-screen fraction of the header drops below this.
    pub hide_visibility_threshold: f64,
    /// Backgrounds with luminance below this get light status bar content.
    pub luminance_threshold: f32,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            hide_visibility_threshold: 0.5,
            luminance_threshold: 0.5,
        }
    }
}

impl StatusPolicy {
    /// Resolves the status bar presentation.
    ///
    /// - Hidden only when `auto_hide` is requested and the visible fraction of
    ///   the header is below [`StatusPolicy::hide_visibility_threshold`].
    /// - Translucent backgrounds always get [`StatusBarStyle::Default`].
    /// - Opaque backgrounds get [`StatusBarStyle::LightContent`] when dark.
    #[must_use]
    pub fn resolve(
        &self,
        geometry: &HeaderGeometry,
        background: Color,
        auto_hide: bool,
    ) -> StatusPresentation {
        let hidden = auto_hide && geometry.visible_fraction() < self.hide_visibility_threshold;
        StatusPresentation {
            hidden,
            style: self.style_for(background),
        }
    }

    /// Status bar style for a background color sample.
    #[must_use]
    pub fn style_for(&self, background: Color) -> StatusBarStyle {
        let [r, g, b, a] = background.components;
        if a < 1.0 {
            return StatusBarStyle::Default;
        }
        if luma(r, g, b) < self.luminance_threshold {
            StatusBarStyle::LightContent
        } else {
            StatusBarStyle::Default
        }
    }
}

/// Perceived brightness of gamma-encoded sRGB components (Rec. 601 weights).
fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}
