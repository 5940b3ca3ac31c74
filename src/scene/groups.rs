//! Named node groups.
//!
//! [`GroupIndex`] maps a group name to a dense list of member handles. Each
//! member remembers its slot in that list ([`GroupMembership::slot`]), so
//! removal is a swap-with-last plus one slot fix-up on the moved member.
//! Member order is stable between removals but not across them.
//!
//! Only nodes inside the tree are indexed. A node keeps its group names while
//! detached and is re-indexed when it enters the tree again.

use rustc_hash::FxHashMap;

use crate::errors::{GroveError, Result};
use crate::scene::{NodeHandle, SceneTree};
use crate::utils::interner::{self, Symbol};

/// A node's membership in one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupMembership {
    pub group: Symbol,
    /// Slot in the group's member list while the node is indexed.
    pub slot: Option<usize>,
}

/// Secondary index from group name to member nodes.
#[derive(Debug, Default)]
pub struct GroupIndex {
    groups: FxHashMap<Symbol, Vec<NodeHandle>>,
}

impl GroupIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `node` to `group` and returns its slot.
    pub fn insert(&mut self, group: Symbol, node: NodeHandle) -> usize {
        let members = self.groups.entry(group).or_default();
        members.push(node);
        members.len() - 1
    }

    /// Removes the member at `slot` by swapping in the last member.
    ///
    /// Returns the node that moved into `slot`, whose cached slot the caller
    /// must update, or `None` if the removed member was the last one.
    pub fn remove(&mut self, group: Symbol, slot: usize) -> Option<NodeHandle> {
        let members = self.groups.get_mut(&group)?;
        if slot >= members.len() {
            log::warn!(
                "Group '{}' has no slot {} (len {})",
                interner::resolve(group),
                slot,
                members.len()
            );
            return None;
        }
        members.swap_remove(slot);
        let moved = members.get(slot).copied();
        if members.is_empty() {
            self.groups.remove(&group);
        }
        moved
    }

    /// Members of `group`, empty if the group has none.
    #[must_use]
    pub fn members(&self, group: Symbol) -> &[NodeHandle] {
        self.groups.get(&group).map_or(&[], Vec::as_slice)
    }

    /// Number of non-empty groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

impl SceneTree {
    /// Adds `node` to the named group. No-op if it is already a member.
    pub fn add_to_group(&mut self, node: NodeHandle, group: &str) -> Result<()> {
        let group = interner::intern(group);
        let n = self.nodes.get_mut(node).ok_or(GroveError::NodeNotFound(node))?;
        if n.groups.iter().any(|m| m.group == group) {
            return Ok(());
        }
        let slot = n
            .is_inside_tree()
            .then(|| self.groups.insert(group, node));
        n.groups.push(GroupMembership { group, slot });
        Ok(())
    }

    /// Removes `node` from the named group. No-op if it is not a member.
    pub fn remove_from_group(&mut self, node: NodeHandle, group: &str) -> Result<()> {
        let n = self.nodes.get_mut(node).ok_or(GroveError::NodeNotFound(node))?;
        let Some(group) = interner::get(group) else {
            return Ok(());
        };
        let Some(pos) = n.groups.iter().position(|m| m.group == group) else {
            return Ok(());
        };
        let membership = n.groups.remove(pos);
        if let Some(slot) = membership.slot {
            self.unindex(group, slot);
        }
        Ok(())
    }

    /// Returns `true` if `node` is a member of the named group.
    #[must_use]
    pub fn is_in_group(&self, node: NodeHandle, group: &str) -> bool {
        let Some(group) = interner::get(group) else {
            return false;
        };
        self.nodes
            .get(node)
            .is_some_and(|n| n.groups.iter().any(|m| m.group == group))
    }

    /// In-tree members of the named group.
    #[must_use]
    pub fn nodes_in_group(&self, group: &str) -> &[NodeHandle] {
        interner::get(group).map_or(&[], |g| self.groups.members(g))
    }

    /// Slot of `node` in the named group's member list, if indexed.
    #[must_use]
    pub fn group_slot(&self, node: NodeHandle, group: &str) -> Option<usize> {
        let group = interner::get(group)?;
        self.nodes
            .get(node)?
            .groups
            .iter()
            .find(|m| m.group == group)?
            .slot
    }

    /// Calls `f` for every in-tree member of the named group, in index order.
    ///
    /// Members are snapshotted first, so `f` may change group membership.
    pub fn for_each_in_group(
        &mut self,
        group: &str,
        mut f: impl FnMut(&mut SceneTree, NodeHandle) -> Result<()>,
    ) -> Result<()> {
        let members = self.nodes_in_group(group).to_vec();
        for node in members {
            if self.nodes.contains_key(node) {
                f(self, node)?;
            }
        }
        Ok(())
    }

    /// Indexes every membership of `node` (on tree entry).
    pub(crate) fn index_groups(&mut self, node: NodeHandle) {
        let Some(n) = self.nodes.get_mut(node) else {
            return;
        };
        for membership in &mut n.groups {
            if membership.slot.is_none() {
                membership.slot = Some(self.groups.insert(membership.group, node));
            }
        }
    }

    /// Drops every membership of `node` from the index (on tree exit).
    pub(crate) fn unindex_groups(&mut self, node: NodeHandle) {
        let Some(n) = self.nodes.get_mut(node) else {
            return;
        };
        let slots: smallvec::SmallVec<[(Symbol, usize); 2]> = n
            .groups
            .iter_mut()
            .filter_map(|m| m.slot.take().map(|slot| (m.group, slot)))
            .collect();
        for (group, slot) in slots {
            self.unindex(group, slot);
        }
    }

    fn unindex(&mut self, group: Symbol, slot: usize) {
        let Some(moved) = self.groups.remove(group, slot) else {
            return;
        };
        if let Some(m) = self
            .nodes
            .get_mut(moved)
            .and_then(|n| n.groups.iter_mut().find(|m| m.group == group))
        {
            m.slot = Some(slot);
        }
    }
}
