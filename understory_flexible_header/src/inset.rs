// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout guide reconciler: how much top inset an owner reserves for the header.
//!
//! ## Owner resolution
//!
//! [`InsetOwner::Legacy`] always uses the header's embedding parent and ignores
//! any explicitly configured owner. [`InsetOwner::Explicit`] uses exactly the
//! configured owner; when that owner is missing or stale nothing is adjusted,
//! and there is no fallback to the embedding parent.
//!
//! ## Safe-area source
//!
//! With [`InsetBehavior::INFER_SAFE_AREA_FROM_ANCESTOR`] the existing top safe
//! area is read from the owner's nearest ancestor. Reading it from the owner
//! itself would include the inset this reconciler writes there, and the header
//! would grow on every pass. An explicit owner without an ancestor is therefore
//! a configuration bug: [`try_reconcile`] reports it and [`reconcile`] panics.
//! Without inference, [`InsetPolicy::device_top_safe_area`] is assumed, which
//! is only right for full-screen presentation.
//!
//! ## Output channel
//!
//! With [`InsetBehavior::PREFER_ADDITIONAL_SAFE_AREA_INSETS`] on a host that
//! supports it, the result carries an additional safe-area inset for the owner
//! and leaves the tracked scroll view alone. Otherwise it carries a content
//! inset for the tracked scroll view. Never both.

use core::fmt;

use crate::hierarchy::{HierarchyError, OwnerId, OwnerTree};

bitflags::bitflags! {
    /// Independently toggleable inset behaviors.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct InsetBehavior: u8 {
        /// Read the existing top safe area from the owner's nearest ancestor.
        const INFER_SAFE_AREA_FROM_ANCESTOR = 0b0000_0001;
        /// Adjust the owner's additional safe-area inset instead of the scroll view's content inset.
        const PREFER_ADDITIONAL_SAFE_AREA_INSETS = 0b0000_0010;
    }
}

/// Which node owns the top inset, resolved once per reconcile call.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum InsetOwner {
    /// The embedding parent is the owner.
    #[default]
    Legacy,
    /// The given owner, if any. `None` means no inset is applied.
    Explicit(Option<OwnerId>),
}

impl InsetOwner {
    /// Picks the owner handle for a header embedded under `embedding_parent`.
    #[must_use]
    pub fn resolve(self, embedding_parent: Option<OwnerId>) -> Option<OwnerId> {
        match self {
            Self::Legacy => embedding_parent,
            Self::Explicit(owner) => owner,
        }
    }
}

/// Tunable inset constants.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InsetPolicy {
    /// Top safe area assumed when it is not inferred from the hierarchy.
    ///
    /// The default of `20.0` is the classic status bar height and should be
    /// calibrated per device family.
    pub device_top_safe_area: f64,
}

impl Default for InsetPolicy {
    fn default() -> Self {
        Self {
            device_top_safe_area: 20.0,
        }
    }
}

/// What the host layout system can do.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Whether owners accept additional safe-area insets.
    pub supports_additional_safe_area_insets: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            supports_additional_safe_area_insets: true,
        }
    }
}

/// Everything [`reconcile`] reads besides the header height and the hierarchy.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct InsetConfig {
    /// Owner resolution mode.
    pub owner: InsetOwner,
    /// Behavior toggles.
    pub behavior: InsetBehavior,
    /// Tunable constants.
    pub policy: InsetPolicy,
    /// Host capabilities.
    pub host: HostCapabilities,
}

/// The single channel an [`InsetResult`] adjusts.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum InsetAdjustment {
    /// Set the owner's additional top safe-area inset.
    AdditionalSafeArea {
        /// Owner receiving the inset.
        owner: OwnerId,
        /// Additional top inset.
        top: f64,
    },
    /// Set the tracked scroll view's top content inset.
    ContentInset {
        /// Top content inset.
        top: f64,
    },
}

/// Output of [`reconcile`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InsetResult {
    /// Resolved owner, if one was live.
    pub owner: Option<OwnerId>,
    /// Top inset the owner exposes to its descendants.
    pub top_inset: f64,
    /// Existing top safe area the adjustment was computed against.
    pub safe_area_top: f64,
    /// Channel to adjust; `None` when no owner was resolved.
    pub adjustment: Option<InsetAdjustment>,
}

impl InsetResult {
    /// No owner, no inset.
    pub const NONE: Self = Self {
        owner: None,
        top_inset: 0.0,
        safe_area_top: 0.0,
        adjustment: None,
    };

    /// Additional safe-area inset for the owner, if that channel was chosen.
    #[must_use]
    pub fn additional_safe_area_inset(&self) -> Option<f64> {
        match self.adjustment {
            Some(InsetAdjustment::AdditionalSafeArea { top, .. }) => Some(top),
            _ => None,
        }
    }

    /// Content inset for the tracked scroll view, if that channel was chosen.
    #[must_use]
    pub fn content_inset(&self) -> Option<f64> {
        match self.adjustment {
            Some(InsetAdjustment::ContentInset { top }) => Some(top),
            _ => None,
        }
    }

    /// Writes an additional safe-area adjustment into the owner tree.
    ///
    /// Content-inset adjustments belong to the caller's scroll view and are
    /// left untouched. Returns `Ok(true)` if the tree was written.
    pub fn apply(&self, tree: &mut OwnerTree) -> Result<bool, HierarchyError> {
        match self.adjustment {
            Some(InsetAdjustment::AdditionalSafeArea { owner, top }) => {
                tree.set_additional_safe_area_top(owner, top)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Error returned by [`try_reconcile`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InsetError {
    /// Safe-area inference was requested for an explicit owner without ancestors.
    RootOwnerInference {
        /// The ancestor-less owner.
        owner: OwnerId,
    },
}

impl fmt::Display for InsetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootOwnerInference { owner } => write!(
                f,
                "cannot infer the top safe area for root owner {owner:?}: \
                 the owner needs at least one ancestor"
            ),
        }
    }
}

impl core::error::Error for InsetError {}

/// Computes the inset for a header of `header_height`, reporting misconfiguration.
///
/// `embedding_parent` is the node the header is embedded under; only
/// [`InsetOwner::Legacy`] consults it.
pub fn try_reconcile(
    tree: &OwnerTree,
    header_height: f64,
    embedding_parent: Option<OwnerId>,
    config: &InsetConfig,
) -> Result<InsetResult, InsetError> {
    let resolved = config.owner.resolve(embedding_parent);
    let Some(owner) = resolved.filter(|&id| tree.is_alive(id)) else {
        tracing::debug!(
            mode = ?config.owner,
            stale = resolved.is_some(),
            "no live inset owner, skipping top inset"
        );
        return Ok(InsetResult::NONE);
    };

    let safe_area_top = if config
        .behavior
        .contains(InsetBehavior::INFER_SAFE_AREA_FROM_ANCESTOR)
    {
        match (tree.parent(owner), config.owner) {
            (Some(ancestor), _) => tree
                .safe_area_top(ancestor)
                .unwrap_or(config.policy.device_top_safe_area),
            (None, InsetOwner::Explicit(_)) => {
                return Err(InsetError::RootOwnerInference { owner });
            }
            // The embedding parent is a root: its host inset never includes
            // what we write, so it is safe to read.
            (None, InsetOwner::Legacy) => tree
                .host_safe_area_top(owner)
                .unwrap_or(config.policy.device_top_safe_area),
        }
    } else {
        config.policy.device_top_safe_area
    };

    let prefer_additional = config
        .behavior
        .contains(InsetBehavior::PREFER_ADDITIONAL_SAFE_AREA_INSETS)
        && config.host.supports_additional_safe_area_insets;
    let adjustment = if prefer_additional {
        InsetAdjustment::AdditionalSafeArea {
            owner,
            top: (header_height - safe_area_top).max(0.0),
        }
    } else {
        InsetAdjustment::ContentInset { top: header_height }
    };

    Ok(InsetResult {
        owner: Some(owner),
        top_inset: header_height,
        safe_area_top,
        adjustment: Some(adjustment),
    })
}

/// Computes the inset for a header of `header_height`.
///
/// # Panics
///
/// Panics if safe-area inference is requested for an explicit owner that has
/// no ancestor. See [`try_reconcile`] for a non-panicking variant.
#[must_use]
pub fn reconcile(
    tree: &OwnerTree,
    header_height: f64,
    embedding_parent: Option<OwnerId>,
    config: &InsetConfig,
) -> InsetResult {
    match try_reconcile(tree, header_height, embedding_parent, config) {
        Ok(result) => result,
        Err(err) => panic!("{err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        HostCapabilities, InsetAdjustment, InsetBehavior, InsetConfig, InsetError, InsetOwner,
        InsetResult, reconcile, try_reconcile,
    };
    use crate::hierarchy::{OwnerId, OwnerTree};

    fn explicit(owner: Option<OwnerId>, behavior: InsetBehavior) -> InsetConfig {
        InsetConfig {
            owner: InsetOwner::Explicit(owner),
            behavior,
            ..InsetConfig::default()
        }
    }

    #[test]
    fn explicit_without_owner_applies_nothing() {
        let mut tree = OwnerTree::new();
        let root = tree.insert_root(44.0);
        let parent = tree.insert_child(root).unwrap();

        for height in [0.0, 56.0, 400.0] {
            let config = explicit(None, InsetBehavior::all());
            let result = reconcile(&tree, height, Some(parent), &config);
            assert_eq!(result, InsetResult::NONE);
            assert_eq!(result.top_inset, 0.0);
        }
    }

    #[test]
    fn legacy_ignores_explicit_owner_and_uses_parent() {
        let mut tree = OwnerTree::new();
        let root = tree.insert_root(20.0);
        let parent = tree.insert_child(root).unwrap();
        let other = tree.insert_child(root).unwrap();

        let config = InsetConfig::default();
        let result = reconcile(&tree, 120.0, Some(parent), &config);
        assert_eq!(result.owner, Some(parent));
        assert_eq!(result.top_inset, 120.0);
        assert_eq!(result.content_inset(), Some(120.0));

        // There is nowhere to put an owner in legacy mode; switching to
        // explicit is the only way `other` can matter.
        let config = explicit(Some(other), InsetBehavior::empty());
        let result_explicit = reconcile(&tree, 120.0, Some(parent), &config);
        assert_eq!(result_explicit.owner, Some(other));
        assert_eq!(InsetOwner::Legacy.resolve(Some(parent)), Some(parent));
    }

    #[test]
    fn stale_owner_is_absent() {
        let mut tree = OwnerTree::new();
        let root = tree.insert_root(20.0);
        let owner = tree.insert_child(root).unwrap();
        tree.remove(owner);

        let config = explicit(Some(owner), InsetBehavior::empty());
        let result = reconcile(&tree, 100.0, None, &config);
        assert_eq!(result, InsetResult::NONE);

        let result = reconcile(&tree, 100.0, Some(owner), &InsetConfig::default());
        assert_eq!(result, InsetResult::NONE);
    }

    #[test]
    fn additional_safe_area_subtracts_inferred_inset() {
        let mut tree = OwnerTree::new();
        let root = tree.insert_root(47.0);
        let owner = tree.insert_child(root).unwrap();

        let config = explicit(Some(owner), InsetBehavior::all());
        let result = reconcile(&tree, 103.0, None, &config);
        assert_eq!(result.safe_area_top, 47.0);
        assert_eq!(result.additional_safe_area_inset(), Some(56.0));
        assert_eq!(result.content_inset(), None);

        assert_eq!(result.apply(&mut tree), Ok(true));
        assert_eq!(tree.safe_area_top(owner), Some(103.0));

        // Reading from the ancestor keeps repeated passes stable.
        let again = reconcile(&tree, 103.0, None, &config);
        assert_eq!(again, result);
    }

    #[test]
    fn device_default_is_used_without_inference() {
        let mut tree = OwnerTree::new();
        let root = tree.insert_root(47.0);
        let owner = tree.insert_child(root).unwrap();

        let config = explicit(Some(owner), InsetBehavior::PREFER_ADDITIONAL_SAFE_AREA_INSETS);
        let result = reconcile(&tree, 76.0, None, &config);
        assert_eq!(result.safe_area_top, 20.0);
        assert_eq!(result.additional_safe_area_inset(), Some(56.0));
    }

    #[test]
    fn unsupported_host_falls_back_to_content_inset() {
        let mut tree = OwnerTree::new();
        let root = tree.insert_root(20.0);
        let owner = tree.insert_child(root).unwrap();

        let config = InsetConfig {
            host: HostCapabilities {
                supports_additional_safe_area_insets: false,
            },
            ..explicit(Some(owner), InsetBehavior::PREFER_ADDITIONAL_SAFE_AREA_INSETS)
        };
        let result = reconcile(&tree, 90.0, None, &config);
        assert_eq!(
            result.adjustment,
            Some(InsetAdjustment::ContentInset { top: 90.0 })
        );
        assert_eq!(result.apply(&mut tree), Ok(false));
        assert_eq!(tree.additional_safe_area_top(owner), Some(0.0));
    }

    #[test]
    fn additional_inset_never_goes_negative() {
        let mut tree = OwnerTree::new();
        let root = tree.insert_root(60.0);
        let owner = tree.insert_child(root).unwrap();

        let config = explicit(Some(owner), InsetBehavior::all());
        let result = reconcile(&tree, 30.0, None, &config);
        assert_eq!(result.additional_safe_area_inset(), Some(0.0));
    }

    #[test]
    fn legacy_root_parent_reads_host_inset() {
        let mut tree = OwnerTree::new();
        let root = tree.insert_root(44.0);

        let config = InsetConfig {
            behavior: InsetBehavior::all(),
            ..InsetConfig::default()
        };
        let result = reconcile(&tree, 100.0, Some(root), &config);
        assert_eq!(result.safe_area_top, 44.0);
        assert_eq!(result.additional_safe_area_inset(), Some(56.0));
    }

    #[test]
    fn root_owner_without_inference_uses_device_default() {
        let mut tree = OwnerTree::new();
        let root = tree.insert_root(44.0);

        let config = explicit(Some(root), InsetBehavior::PREFER_ADDITIONAL_SAFE_AREA_INSETS);
        let result = try_reconcile(&tree, 100.0, None, &config)
            .expect("a root owner is fine without inference");
        assert_eq!(result.owner, Some(root));
        assert_eq!(result.top_inset, 100.0);
        assert_eq!(result.safe_area_top, 20.0);
        assert_eq!(
            result.adjustment,
            Some(InsetAdjustment::AdditionalSafeArea {
                owner: root,
                top: 80.0,
            })
        );

        let config = explicit(Some(root), InsetBehavior::empty());
        let result = reconcile(&tree, 100.0, None, &config);
        assert_eq!(result.content_inset(), Some(100.0));
    }

    #[test]
    fn root_owner_inference_is_reported() {
        let mut tree = OwnerTree::new();
        let root = tree.insert_root(20.0);

        let config = explicit(Some(root), InsetBehavior::INFER_SAFE_AREA_FROM_ANCESTOR);
        assert_eq!(
            try_reconcile(&tree, 100.0, None, &config),
            Err(InsetError::RootOwnerInference { owner: root })
        );
    }

    #[test]
    #[should_panic(expected = "needs at least one ancestor")]
    fn root_owner_inference_fails_fast() {
        let mut tree = OwnerTree::new();
        let root = tree.insert_root(20.0);

        let config = explicit(Some(root), InsetBehavior::INFER_SAFE_AREA_FROM_ANCESTOR);
        let _ = reconcile(&tree, 100.0, None, &config);
    }
}
