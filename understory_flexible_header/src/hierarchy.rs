// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout owner registry: the nodes whose top insets a header reserves space in.
//!
//! A header never holds on to its owners. It keeps an [`OwnerId`] and asks the
//! [`OwnerTree`] whether that handle is still alive each time it needs one, so
//! removing an owner from the tree is all it takes to make it "absent".

use alloc::vec::Vec;
use core::fmt;

/// Handle to a node in an [`OwnerTree`].
///
/// This is a small, copyable handle made of a slot index and a generation
/// counter. Removing a node frees its slot; reusing the slot bumps the
/// generation, so stale handles never alias a newer node.
///
/// Use [`OwnerTree::is_alive`] to check liveness. Every other tree query treats
/// a stale handle as an absent node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct OwnerId(u32, u32);

impl OwnerId {
    const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Generation of the slot this handle was issued for.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.1
    }
}

/// Error returned by structural edits on an [`OwnerTree`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HierarchyError {
    /// The handle does not refer to a live node.
    StaleOwner(OwnerId),
    /// Reparenting `child` under `parent` would make `child` its own ancestor.
    Cycle {
        /// Node being reparented.
        child: OwnerId,
        /// Requested new parent.
        parent: OwnerId,
    },
}

impl fmt::Display for HierarchyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleOwner(id) => write!(f, "owner {id:?} is not alive"),
            Self::Cycle { child, parent } => write!(
                f,
                "attaching {child:?} under {parent:?} would create a cycle"
            ),
        }
    }
}

impl core::error::Error for HierarchyError {}

#[derive(Clone, Debug)]
struct OwnerNode {
    parent: Option<OwnerId>,
    host_safe_area_top: f64,
    additional_safe_area_top: f64,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    node: Option<OwnerNode>,
}

/// Arena of layout owners with parent links and safe-area insets.
///
/// Each node exposes a top safe-area inset computed as:
///
/// - the parent's exposed inset, or the node's host inset when it is a root,
/// - plus the node's own additional safe-area inset.
///
/// This mirrors how a host layout system propagates safe areas down a
/// hierarchy, which is exactly why a header must never infer its inset from
/// the same node it writes an additional inset to.
#[derive(Clone, Debug, Default)]
pub struct OwnerTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl OwnerTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    /// Returns `true` if the tree has no live nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts a root node whose host provides `host_safe_area_top`.
    pub fn insert_root(&mut self, host_safe_area_top: f64) -> OwnerId {
        self.alloc(OwnerNode {
            parent: None,
            host_safe_area_top,
            additional_safe_area_top: 0.0,
        })
    }

    /// Inserts a node under `parent`.
    pub fn insert_child(&mut self, parent: OwnerId) -> Result<OwnerId, HierarchyError> {
        if !self.is_alive(parent) {
            return Err(HierarchyError::StaleOwner(parent));
        }
        Ok(self.alloc(OwnerNode {
            parent: Some(parent),
            host_safe_area_top: 0.0,
            additional_safe_area_top: 0.0,
        }))
    }

    /// Removes `id` and its whole subtree.
    ///
    /// Returns `false` if `id` was already stale.
    pub fn remove(&mut self, id: OwnerId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let doomed: Vec<OwnerId> = self
            .live_ids()
            .filter(|&candidate| candidate == id || self.ancestors(candidate).any(|a| a == id))
            .collect();
        for victim in doomed {
            let slot = &mut self.slots[victim.idx()];
            slot.node = None;
            self.free.push(victim.0);
        }
        true
    }

    /// Returns `true` if `id` refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: OwnerId) -> bool {
        self.node(id).is_some()
    }

    /// Parent of `id`, or `None` for roots and stale handles.
    #[must_use]
    pub fn parent(&self, id: OwnerId) -> Option<OwnerId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Iterates the ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: OwnerId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Moves `id` under `parent`, or makes it a root when `parent` is `None`.
    ///
    /// A node that becomes a root keeps whatever host inset it had; set it with
    /// [`OwnerTree::set_host_safe_area_top`].
    pub fn set_parent(
        &mut self,
        id: OwnerId,
        parent: Option<OwnerId>,
    ) -> Result<(), HierarchyError> {
        if !self.is_alive(id) {
            return Err(HierarchyError::StaleOwner(id));
        }
        if let Some(p) = parent {
            if !self.is_alive(p) {
                return Err(HierarchyError::StaleOwner(p));
            }
            if p == id || self.ancestors(p).any(|a| a == id) {
                return Err(HierarchyError::Cycle { child: id, parent: p });
            }
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = parent;
        }
        Ok(())
    }

    /// Host-provided top inset of `id` (only meaningful for roots).
    #[must_use]
    pub fn host_safe_area_top(&self, id: OwnerId) -> Option<f64> {
        self.node(id).map(|n| n.host_safe_area_top)
    }

    /// Sets the host-provided top inset of `id`.
    pub fn set_host_safe_area_top(&mut self, id: OwnerId, top: f64) -> Result<(), HierarchyError> {
        let node = self.node_mut(id).ok_or(HierarchyError::StaleOwner(id))?;
        node.host_safe_area_top = top;
        Ok(())
    }

    /// Additional top safe-area inset applied directly to `id`.
    #[must_use]
    pub fn additional_safe_area_top(&self, id: OwnerId) -> Option<f64> {
        self.node(id).map(|n| n.additional_safe_area_top)
    }

    /// Sets the additional top safe-area inset of `id`.
    pub fn set_additional_safe_area_top(
        &mut self,
        id: OwnerId,
        top: f64,
    ) -> Result<(), HierarchyError> {
        let node = self.node_mut(id).ok_or(HierarchyError::StaleOwner(id))?;
        node.additional_safe_area_top = top;
        Ok(())
    }

    /// Top safe-area inset that `id` exposes to its descendants.
    ///
    /// Returns `None` for stale handles.
    #[must_use]
    pub fn safe_area_top(&self, id: OwnerId) -> Option<f64> {
        let mut node = self.node(id)?;
        let mut total = node.additional_safe_area_top;
        while let Some(parent) = node.parent.and_then(|p| self.node(p)) {
            total += parent.additional_safe_area_top;
            node = parent;
        }
        Some(total + node.host_safe_area_top)
    }

    fn alloc(&mut self, node: OwnerNode) -> OwnerId {
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(node);
            OwnerId::new(idx, slot.generation)
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "Owner counts stay far below u32::MAX"
            )]
            let idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 1,
                node: Some(node),
            });
            OwnerId::new(idx, 1)
        }
    }

    fn live_ids(&self) -> impl Iterator<Item = OwnerId> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "Slot indices were issued from u32"
            )]
            let idx = i as u32;
            slot.node
                .as_ref()
                .map(|_| OwnerId::new(idx, slot.generation))
        })
    }

    fn node(&self, id: OwnerId) -> Option<&OwnerNode> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: OwnerId) -> Option<&mut OwnerNode> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.node.as_mut()
    }
}

/// Iterator over the ancestors of a node, nearest first.
///
/// Returned by [`OwnerTree::ancestors`].
#[derive(Clone, Debug)]
pub struct Ancestors<'a> {
    tree: &'a OwnerTree,
    next: Option<OwnerId>,
}

impl Iterator for Ancestors<'_> {
    type Item = OwnerId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::{HierarchyError, OwnerTree};

    #[test]
    fn safe_area_accumulates_down_the_chain() {
        let mut tree = OwnerTree::new();
        let root = tree.insert_root(47.0);
        let nav = tree.insert_child(root).unwrap();
        let leaf = tree.insert_child(nav).unwrap();

        tree.set_additional_safe_area_top(nav, 10.0).unwrap();
        tree.set_additional_safe_area_top(leaf, 3.0).unwrap();

        assert_eq!(tree.safe_area_top(root), Some(47.0));
        assert_eq!(tree.safe_area_top(nav), Some(57.0));
        assert_eq!(tree.safe_area_top(leaf), Some(60.0));
    }

    #[test]
    fn ancestors_are_nearest_first() {
        let mut tree = OwnerTree::new();
        let root = tree.insert_root(0.0);
        let mid = tree.insert_child(root).unwrap();
        let leaf = tree.insert_child(mid).unwrap();

        let chain: Vec<_> = tree.ancestors(leaf).collect();
        assert_eq!(chain, vec![mid, root]);
        assert_eq!(tree.ancestors(root).count(), 0);
    }

    #[test]
    fn remove_drops_subtree_and_stales_handles() {
        let mut tree = OwnerTree::new();
        let root = tree.insert_root(20.0);
        let mid = tree.insert_child(root).unwrap();
        let leaf = tree.insert_child(mid).unwrap();
        let sibling = tree.insert_child(root).unwrap();

        assert!(tree.remove(mid));
        assert!(!tree.is_alive(mid));
        assert!(!tree.is_alive(leaf));
        assert!(tree.is_alive(sibling));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.safe_area_top(leaf), None);

        // Second removal of the same handle is a no-op.
        assert!(!tree.remove(mid));
    }

    #[test]
    fn reused_slot_does_not_alias_stale_handle() {
        let mut tree = OwnerTree::new();
        let a = tree.insert_root(0.0);
        tree.remove(a);
        let b = tree.insert_root(5.0);

        assert_ne!(a, b);
        assert!(b.generation() > a.generation());
        assert!(!tree.is_alive(a));
        assert_eq!(tree.host_safe_area_top(a), None);
        assert_eq!(tree.host_safe_area_top(b), Some(5.0));
    }

    #[test]
    fn set_parent_rejects_cycles_and_stale_handles() {
        let mut tree = OwnerTree::new();
        let root = tree.insert_root(0.0);
        let child = tree.insert_child(root).unwrap();
        let grandchild = tree.insert_child(child).unwrap();

        assert_eq!(
            tree.set_parent(root, Some(grandchild)),
            Err(HierarchyError::Cycle {
                child: root,
                parent: grandchild
            })
        );
        assert_eq!(
            tree.set_parent(child, Some(child)),
            Err(HierarchyError::Cycle {
                child,
                parent: child
            })
        );

        let gone = tree.insert_root(0.0);
        tree.remove(gone);
        assert_eq!(
            tree.set_parent(child, Some(gone)),
            Err(HierarchyError::StaleOwner(gone))
        );
        assert_eq!(tree.insert_child(gone), Err(HierarchyError::StaleOwner(gone)));

        tree.set_parent(grandchild, None).unwrap();
        assert_eq!(tree.parent(grandchild), None);
    }
}
