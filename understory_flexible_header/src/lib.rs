// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Flexible Header: headless coordination of a collapsible header with a scroll view.
//!
//! This crate models a header that shrinks, shifts off-screen, and comes back
//! as an associated content view scrolls, along with the presentation state
//! derived from it:
//!
//! - [`ScrollTracker`]: accumulates offset, content size, and gesture events.
//! - [`HeaderFrameModel`]: turns scroll metrics into [`HeaderGeometry`].
//! - [`reconcile`]: decides how much top inset a layout owner reserves.
//! - [`StatusPolicy`]: derives status bar visibility and style.
//! - [`FlexibleHeader`]: composes the above and notifies a [`LayoutDelegate`].
//!
//! It does **not** own a scroll view, a window, or a renderer. Callers are
//! expected to:
//! - Forward scroll events from their scroll view.
//! - Model their view/controller hierarchy as an [`OwnerTree`] and keep
//!   [`OwnerId`] handles instead of references.
//! - Apply the resulting frame, content insets, and status bar preferences.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::{Size, Vec2};
//! use understory_flexible_header::{FlexibleHeader, HeaderLimits, OwnerTree};
//!
//! let mut owners = OwnerTree::new();
//! let window = owners.insert_root(20.0);
//! let screen = owners.insert_child(window).unwrap();
//!
//! let mut header = FlexibleHeader::new(HeaderLimits::new(50.0, 200.0));
//! header.set_viewport_size(Size::new(320.0, 480.0));
//! header.attach_to_parent(Some(screen));
//!
//! // Content moves up by 120pt: the header shrinks by the same amount.
//! let changed = header.forward_scroll_event(Vec2::new(0.0, 120.0), Size::new(320.0, 2000.0), true);
//! assert_eq!(changed.map(|g| g.current_height), Some(80.0));
//!
//! // Legacy mode: the embedding parent owns the inset.
//! let insets = header.update_top_layout_guide(&mut owners);
//! assert_eq!(insets.owner, Some(screen));
//! assert_eq!(insets.content_inset(), Some(80.0));
//! ```
//!
//! ## Explicit owners and additional safe-area insets
//!
//! ```rust
//! use kurbo::{Size, Vec2};
//! use understory_flexible_header::{FlexibleHeader, HeaderLimits, OwnerTree};
//!
//! let mut owners = OwnerTree::new();
//! let window = owners.insert_root(47.0);
//! let nav = owners.insert_child(window).unwrap();
//! let content = owners.insert_child(nav).unwrap();
//!
//! let mut header = FlexibleHeader::new(HeaderLimits::new(103.0, 159.0));
//! header.set_top_layout_guide_adjustment_enabled(true);
//! header.set_top_layout_guide_owner(Some(content));
//! header.set_infers_top_safe_area_from_ancestor(true);
//! header.set_uses_additional_safe_area_insets(true);
//!
//! let insets = header.update_top_layout_guide(&mut owners);
//! assert_eq!(insets.additional_safe_area_inset(), Some(112.0));
//! assert_eq!(insets.content_inset(), None);
//! assert_eq!(owners.safe_area_top(content), Some(159.0));
//! ```
//!
//! ## Design notes
//!
//! - Offsets use a top-origin convention: `y == 0` is the top of the content
//!   and positive `y` scrolls into it.
//! - Shift and resize are sequenced, never concurrent; see [`HeaderFrameModel`].
//! - Owners and delegates are never retained: owners are [`OwnerId`] handles
//!   checked for liveness, and a [`LayoutDelegate`] can be a `Weak<RefCell<_>>`.
//! - Every policy constant ([`InsetPolicy`], [`StatusPolicy`], [`HeaderLimits`])
//!   is configuration, with defaults meant to be calibrated.
//! - Everything runs synchronously on the caller's thread.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod geometry;
mod header;
mod hierarchy;
mod inset;
mod scroll;
mod status;

pub use geometry::{
    FrameUpdate, HeaderFrameModel, HeaderGeometry, HeaderLimits, ScrollPhase, ShiftBehavior,
};
pub use header::{FlexibleHeader, FlexibleHeaderDebugInfo, LayoutDelegate};
pub use hierarchy::{Ancestors, HierarchyError, OwnerId, OwnerTree};
pub use inset::{
    HostCapabilities, InsetAdjustment, InsetBehavior, InsetConfig, InsetError, InsetOwner,
    InsetPolicy, InsetResult, reconcile, try_reconcile,
};
pub use scroll::{GesturePhase, ScrollMetrics, ScrollTracker};
pub use status::{StatusBarStyle, StatusPolicy, StatusPresentation};
