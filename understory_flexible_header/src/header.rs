// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The coordinator: a flexible header driven by a scroll view it does not own.

use alloc::boxed::Box;
use alloc::rc::Weak;
use core::cell::RefCell;
use core::fmt;

use kurbo::{Point, Size, Vec2};
use peniko::Color;

use crate::geometry::{
    FrameUpdate, HeaderFrameModel, HeaderGeometry, HeaderLimits, ScrollPhase, ShiftBehavior,
};
use crate::hierarchy::{OwnerId, OwnerTree};
use crate::inset::{
    HostCapabilities, InsetBehavior, InsetConfig, InsetOwner, InsetPolicy, InsetResult, reconcile,
};
use crate::scroll::{ScrollMetrics, ScrollTracker};
use crate::status::{StatusBarStyle, StatusPolicy, StatusPresentation};

/// Receives header frame changes.
///
/// At most one delegate is registered on a [`FlexibleHeader`]. It is called at
/// most once per input event, and only when height or shift actually changed.
/// Use [`FlexibleHeader::scroll_phase`] to interpret the change.
pub trait LayoutDelegate {
    /// The header frame changed to `geometry`.
    fn header_frame_did_change(&mut self, geometry: &HeaderGeometry);
}

/// A non-owning delegate: notifications stop once the last strong reference is gone.
///
/// A delegate that is already borrowed (for example because it is the caller
/// of the event being processed) is skipped.
impl<D: LayoutDelegate> LayoutDelegate for Weak<RefCell<D>> {
    fn header_frame_did_change(&mut self, geometry: &HeaderGeometry) {
        let Some(delegate) = self.upgrade() else {
            return;
        };
        if let Ok(mut delegate) = delegate.try_borrow_mut() {
            delegate.header_frame_did_change(geometry);
        } else {
            tracing::debug!("layout delegate busy, dropping frame change");
        }
    }
}

/// Coordinates a collapsible header with the scroll position of a content view.
///
/// `FlexibleHeader` composes a [`ScrollTracker`], a [`HeaderFrameModel`], the
/// inset reconciler and the status presentation resolver. Configuration changes
/// take effect on the next event or query and never rewrite past results.
pub struct FlexibleHeader {
    tracker: ScrollTracker,
    frame: HeaderFrameModel,
    parent: Option<OwnerId>,
    owner: Option<OwnerId>,
    adjustment_enabled: bool,
    behavior: InsetBehavior,
    inset_policy: InsetPolicy,
    host: HostCapabilities,
    status_policy: StatusPolicy,
    background: Color,
    delegate: Option<Box<dyn LayoutDelegate>>,
}

impl fmt::Debug for FlexibleHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlexibleHeader")
            .field("tracker", &self.tracker)
            .field("frame", &self.frame)
            .field("parent", &self.parent)
            .field("owner", &self.owner)
            .field("adjustment_enabled", &self.adjustment_enabled)
            .field("behavior", &self.behavior)
            .field("inset_policy", &self.inset_policy)
            .field("host", &self.host)
            .field("status_policy", &self.status_policy)
            .field("background", &self.background)
            .field("has_delegate", &self.delegate.is_some())
            .finish()
    }
}

impl Default for FlexibleHeader {
    fn default() -> Self {
        Self::new(HeaderLimits::default())
    }
}

impl FlexibleHeader {
    /// Creates a fully expanded header in legacy owner mode.
    #[must_use]
    pub fn new(limits: HeaderLimits) -> Self {
        Self {
            tracker: ScrollTracker::default(),
            frame: HeaderFrameModel::new(limits),
            parent: None,
            owner: None,
            adjustment_enabled: false,
            behavior: InsetBehavior::empty(),
            inset_policy: InsetPolicy::default(),
            host: HostCapabilities::default(),
            status_policy: StatusPolicy::default(),
            background: Color::WHITE,
            delegate: None,
        }
    }

    /// Current header geometry.
    #[must_use]
    pub fn geometry(&self) -> HeaderGeometry {
        self.frame.geometry()
    }

    /// Latest scroll metrics.
    #[must_use]
    pub fn metrics(&self) -> ScrollMetrics {
        self.tracker.metrics()
    }

    /// Configured height limits.
    #[must_use]
    pub fn limits(&self) -> HeaderLimits {
        self.frame.limits()
    }

    /// Replaces the height limits and resets the header to fully expanded.
    pub fn set_limits(&mut self, limits: HeaderLimits) -> Option<HeaderGeometry> {
        let changed = self.frame.set_limits(limits);
        tracing::debug!(
            minimum = limits.minimum_height(),
            maximum = limits.maximum_height(),
            "header limits reset"
        );
        self.notify(FrameUpdate {
            geometry: self.frame.geometry(),
            changed,
        })
    }

    /// Changes the shift behavior; picked up by the next scroll event.
    pub fn set_shift_behavior(&mut self, behavior: ShiftBehavior) {
        self.frame.set_shift_behavior(behavior);
    }

    /// Sets the tracked scroll view's viewport size.
    pub fn set_viewport_size(&mut self, size: Size) {
        self.tracker.set_viewport_size(size);
    }

    /// Forwards one scroll event from the tracked scroll view.
    ///
    /// Returns the new geometry if the frame changed; the delegate has already
    /// been notified by then.
    pub fn forward_scroll_event(
        &mut self,
        offset_delta: Vec2,
        content_size: Size,
        is_tracking: bool,
    ) -> Option<HeaderGeometry> {
        let metrics = self
            .tracker
            .on_scroll_event(offset_delta, content_size, is_tracking);
        let update = self.frame.recompute(&metrics);
        self.notify(update)
    }

    /// Forwards an absolute offset from the tracked scroll view.
    pub fn scroll_to(&mut self, offset: Point) -> Option<HeaderGeometry> {
        let metrics = self.tracker.scroll_to(offset);
        let update = self.frame.recompute(&metrics);
        self.notify(update)
    }

    /// A drag gesture began on the tracked scroll view.
    pub fn begin_tracking(&mut self) -> Option<HeaderGeometry> {
        let metrics = self.tracker.set_tracking(true);
        let update = self.frame.recompute(&metrics);
        self.notify(update)
    }

    /// The drag gesture on the tracked scroll view ended.
    pub fn end_tracking(&mut self) -> Option<HeaderGeometry> {
        let metrics = self.tracker.set_tracking(false);
        let update = self.frame.recompute(&metrics);
        self.notify(update)
    }

    /// Current scroll phase.
    #[must_use]
    pub fn scroll_phase(&self) -> ScrollPhase {
        self.frame.scroll_phase()
    }

    /// Progress within the current scroll phase.
    #[must_use]
    pub fn scroll_phase_percentage(&self) -> f64 {
        self.frame.scroll_phase_percentage()
    }

    /// Registers the layout delegate, replacing any previous one.
    ///
    /// Only a weak reference is kept; once the delegate is dropped, notifications stop.
    pub fn set_layout_delegate<D>(&mut self, delegate: Weak<RefCell<D>>)
    where
        D: LayoutDelegate + 'static,
    {
        self.delegate = Some(Box::new(delegate));
    }

    /// Removes the layout delegate.
    pub fn clear_layout_delegate(&mut self) {
        self.delegate = None;
    }

    /// Returns `true` if a layout delegate is registered.
    #[must_use]
    pub fn has_layout_delegate(&self) -> bool {
        self.delegate.is_some()
    }

    /// Node the header is embedded under; the owner in legacy mode.
    #[must_use]
    pub fn parent(&self) -> Option<OwnerId> {
        self.parent
    }

    /// Re-embeds the header and resets it to fully expanded.
    pub fn attach_to_parent(&mut self, parent: Option<OwnerId>) -> Option<HeaderGeometry> {
        self.parent = parent;
        let changed = self.frame.reset();
        tracing::debug!(?parent, "header reattached");
        self.notify(FrameUpdate {
            geometry: self.frame.geometry(),
            changed,
        })
    }

    /// Whether the explicit owner decides which node's top inset is adjusted.
    #[must_use]
    pub fn is_top_layout_guide_adjustment_enabled(&self) -> bool {
        self.adjustment_enabled
    }

    /// Switches between legacy (parent is owner) and explicit owner mode.
    pub fn set_top_layout_guide_adjustment_enabled(&mut self, enabled: bool) {
        self.adjustment_enabled = enabled;
    }

    /// Explicitly configured inset owner.
    #[must_use]
    pub fn top_layout_guide_owner(&self) -> Option<OwnerId> {
        self.owner
    }

    /// Sets the explicit inset owner. Ignored in legacy mode.
    ///
    /// This only redirects where the inset goes on the next
    /// [`FlexibleHeader::update_top_layout_guide`]; the geometry is kept.
    /// Re-embedding the header goes through [`FlexibleHeader::attach_to_parent`],
    /// which resets it.
    pub fn set_top_layout_guide_owner(&mut self, owner: Option<OwnerId>) {
        self.owner = owner;
    }

    /// Whether the top safe area is inferred from the owner's ancestor.
    #[must_use]
    pub fn infers_top_safe_area_from_ancestor(&self) -> bool {
        self.behavior
            .contains(InsetBehavior::INFER_SAFE_AREA_FROM_ANCESTOR)
    }

    /// Enables or disables safe-area inference.
    pub fn set_infers_top_safe_area_from_ancestor(&mut self, enabled: bool) {
        self.behavior
            .set(InsetBehavior::INFER_SAFE_AREA_FROM_ANCESTOR, enabled);
    }

    /// Whether additional safe-area insets are preferred over content insets.
    #[must_use]
    pub fn uses_additional_safe_area_insets(&self) -> bool {
        self.behavior
            .contains(InsetBehavior::PREFER_ADDITIONAL_SAFE_AREA_INSETS)
    }

    /// Prefers additional safe-area insets over content insets where supported.
    pub fn set_uses_additional_safe_area_insets(&mut self, enabled: bool) {
        self.behavior
            .set(InsetBehavior::PREFER_ADDITIONAL_SAFE_AREA_INSETS, enabled);
    }

    /// All inset behavior toggles.
    #[must_use]
    pub fn inset_behavior(&self) -> InsetBehavior {
        self.behavior
    }

    /// Sets the tunable inset constants.
    pub fn set_inset_policy(&mut self, policy: InsetPolicy) {
        self.inset_policy = policy;
    }

    /// Declares what the host layout system supports.
    pub fn set_host_capabilities(&mut self, host: HostCapabilities) {
        self.host = host;
    }

    /// Owner mode as the reconciler will see it.
    #[must_use]
    pub fn inset_owner(&self) -> InsetOwner {
        if self.adjustment_enabled {
            InsetOwner::Explicit(self.owner)
        } else {
            InsetOwner::Legacy
        }
    }

    /// Snapshot of the inset configuration.
    #[must_use]
    pub fn inset_config(&self) -> InsetConfig {
        InsetConfig {
            owner: self.inset_owner(),
            behavior: self.behavior,
            policy: self.inset_policy,
            host: self.host,
        }
    }

    /// Reconciles the owner's top inset with the on-screen header height.
    ///
    /// Additional safe-area adjustments are written into `tree`; content-inset
    /// adjustments are returned for the caller to apply to its scroll view.
    ///
    /// # Panics
    ///
    /// Panics if safe-area inference is enabled in explicit mode and the owner
    /// has no ancestor.
    pub fn update_top_layout_guide(&self, tree: &mut OwnerTree) -> InsetResult {
        let height = self.geometry().visible_height();
        let result = reconcile(tree, height, self.parent, &self.inset_config());
        if let Err(err) = result.apply(tree) {
            tracing::debug!(%err, "inset owner vanished before apply");
        }
        result
    }

    /// Header background color sample used for the status bar style.
    #[must_use]
    pub fn background_color(&self) -> Color {
        self.background
    }

    /// Updates the header background color sample.
    pub fn set_background_color(&mut self, color: Color) {
        self.background = color;
    }

    /// Status bar thresholds.
    #[must_use]
    pub fn status_policy(&self) -> StatusPolicy {
        self.status_policy
    }

    /// Replaces the status bar thresholds.
    pub fn set_status_policy(&mut self, policy: StatusPolicy) {
        self.status_policy = policy;
    }

    /// Resolved status bar presentation for the current state.
    #[must_use]
    pub fn status_presentation(&self) -> StatusPresentation {
        self.status_policy.resolve(
            &self.geometry(),
            self.background,
            self.limits().shift_behavior.hides_status_bar(),
        )
    }

    /// Whether the host should hide its status bar.
    #[must_use]
    pub fn prefers_status_bar_hidden(&self) -> bool {
        self.status_presentation().hidden
    }

    /// Status bar style matching the header background.
    #[must_use]
    pub fn preferred_status_bar_style(&self) -> StatusBarStyle {
        self.status_presentation().style
    }

    /// Snapshot of the coordinator state for debugging and inspection.
    #[must_use]
    pub fn debug_info(&self) -> FlexibleHeaderDebugInfo {
        FlexibleHeaderDebugInfo {
            geometry: self.geometry(),
            metrics: self.metrics(),
            scroll_phase: self.scroll_phase(),
            inset_owner: self.inset_owner(),
            parent: self.parent,
            behavior: self.behavior,
            status: self.status_presentation(),
        }
    }

    fn notify(&mut self, update: FrameUpdate) -> Option<HeaderGeometry> {
        if !update.changed {
            return None;
        }
        let g = update.geometry;
        tracing::trace!(
            height = g.current_height,
            shift = g.shift_offset,
            "header frame changed"
        );
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.header_frame_did_change(&g);
        }
        Some(g)
    }
}

/// Debug snapshot of a [`FlexibleHeader`].
#[derive(Clone, Debug)]
pub struct FlexibleHeaderDebugInfo {
    /// Current header geometry.
    pub geometry: HeaderGeometry,
    /// Latest scroll metrics.
    pub metrics: ScrollMetrics,
    /// Current scroll phase.
    pub scroll_phase: ScrollPhase,
    /// Owner mode as the reconciler sees it.
    pub inset_owner: InsetOwner,
    /// Embedding parent.
    pub parent: Option<OwnerId>,
    /// Inset behavior toggles.
    pub behavior: InsetBehavior,
    /// Resolved status bar presentation.
    pub status: StatusPresentation,
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use kurbo::{Size, Vec2};

    use super::{FlexibleHeader, LayoutDelegate};
    use crate::geometry::{HeaderGeometry, HeaderLimits, ShiftBehavior};
    use crate::hierarchy::OwnerTree;
    use crate::inset::InsetOwner;

    #[derive(Default)]
    struct Recorder {
        heights: Vec<f64>,
    }

    impl LayoutDelegate for Recorder {
        fn header_frame_did_change(&mut self, geometry: &HeaderGeometry) {
            self.heights.push(geometry.current_height);
        }
    }

    const CONTENT: Size = Size::new(320.0, 2000.0);

    fn header() -> FlexibleHeader {
        let mut header = FlexibleHeader::new(HeaderLimits::new(50.0, 200.0));
        header.set_viewport_size(Size::new(320.0, 500.0));
        header
    }

    #[test]
    fn delegate_sees_each_change_once() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut header = header();
        header.set_layout_delegate(Rc::downgrade(&recorder));

        header.forward_scroll_event(Vec2::new(0.0, 30.0), CONTENT, true);
        header.forward_scroll_event(Vec2::ZERO, CONTENT, true);
        header.forward_scroll_event(Vec2::new(0.0, 30.0), CONTENT, true);

        assert_eq!(recorder.borrow().heights, [170.0, 140.0]);
    }

    #[test]
    fn dropped_delegate_is_silently_absent() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut header = header();
        header.set_layout_delegate(Rc::downgrade(&recorder));
        drop(recorder);

        let changed = header.forward_scroll_event(Vec2::new(0.0, 30.0), CONTENT, true);
        assert_eq!(changed.map(|g| g.current_height), Some(170.0));
        assert!(header.has_layout_delegate());
    }

    #[test]
    fn owner_mode_follows_flags() {
        let mut header = header();
        assert_eq!(header.inset_owner(), InsetOwner::Legacy);

        header.set_top_layout_guide_adjustment_enabled(true);
        assert_eq!(header.inset_owner(), InsetOwner::Explicit(None));

        header.set_infers_top_safe_area_from_ancestor(true);
        header.set_uses_additional_safe_area_insets(true);
        assert!(header.infers_top_safe_area_from_ancestor());
        assert!(header.uses_additional_safe_area_insets());

        header.set_uses_additional_safe_area_insets(false);
        assert!(!header.uses_additional_safe_area_insets());
        assert!(header.infers_top_safe_area_from_ancestor());
    }

    #[test]
    fn reattach_resets_and_notifies() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut header = header();
        header.forward_scroll_event(Vec2::new(0.0, 300.0), CONTENT, false);
        header.set_layout_delegate(Rc::downgrade(&recorder));

        let g = header.attach_to_parent(None);
        assert_eq!(g.map(|g| g.current_height), Some(200.0));
        assert_eq!(recorder.borrow().heights, [200.0]);

        // Already expanded: nothing to report.
        assert!(header.attach_to_parent(None).is_none());
    }

    #[test]
    fn scrolling_up_after_reattach_keeps_the_header_expanded() {
        let mut header = header();
        header.set_shift_behavior(ShiftBehavior::Enabled);
        header.forward_scroll_event(Vec2::new(0.0, 300.0), CONTENT, false);
        assert_eq!(header.geometry().visible_height(), 0.0);
        header.attach_to_parent(None);

        for _ in 0..3 {
            assert!(
                header
                    .forward_scroll_event(Vec2::new(0.0, -10.0), CONTENT, true)
                    .is_none()
            );
            assert_eq!(header.geometry().current_height, 200.0);
        }
    }

    #[test]
    fn changing_the_owner_keeps_the_geometry() {
        let mut owners = OwnerTree::new();
        let root = owners.insert_root(20.0);
        let first = owners.insert_child(root).unwrap();
        let second = owners.insert_child(root).unwrap();

        let mut header = header();
        header.set_top_layout_guide_adjustment_enabled(true);
        header.set_top_layout_guide_owner(Some(first));
        header.forward_scroll_event(Vec2::new(0.0, 80.0), CONTENT, true);
        let before = header.geometry();

        header.set_top_layout_guide_owner(Some(second));
        assert_eq!(header.geometry(), before);
        let insets = header.update_top_layout_guide(&mut owners);
        assert_eq!(insets.owner, Some(second));
        assert_eq!(insets.top_inset, 120.0);
    }

    #[test]
    fn debug_info_reflects_state() {
        let mut header = header();
        header.forward_scroll_event(Vec2::new(0.0, 100.0), CONTENT, true);
        let info = header.debug_info();
        assert_eq!(info.geometry.current_height, 100.0);
        assert_eq!(info.metrics.offset.y, 100.0);
        assert!(!info.status.hidden);
    }
}
