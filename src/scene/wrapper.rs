//! Chainable node operation wrapper.
//!
//! [`SceneNode`] borrows a [`SceneTree`] mutably and provides a fluent API
//! for editing nodes without needing `get_node_mut().unwrap()`.
//!
//! All methods silently no-op when the handle is stale, so users never
//! encounter panics from dangling handles.
//!
//! # Example
//!
//! ```rust,ignore
//! tree.node(handle)
//!     .set_position(0.0, 3.0)
//!     .set_scale(2.0)
//!     .rotate(0.5)
//!     .set_enabled(false);
//! ```
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::must_use_candidate)]
use glam::Vec2;

use crate::scene::{NodeHandle, SceneTree};

/// Temporary mutable borrow of a scene node for chainable operations.
pub struct SceneNode<'a> {
    tree: &'a mut SceneTree,
    handle: NodeHandle,
}

impl<'a> SceneNode<'a> {
    #[inline]
    pub fn new(tree: &'a mut SceneTree, handle: NodeHandle) -> Self {
        Self { tree, handle }
    }

    /// Returns the underlying handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    // -- Transform setters (chainable) --

    /// Sets the node's local position.
    #[inline]
    pub fn set_position(self, x: f32, y: f32) -> Self {
        self.set_position_vec(Vec2::new(x, y))
    }

    /// Sets the node's local position from a Vec2.
    #[inline]
    pub fn set_position_vec(self, pos: Vec2) -> Self {
        if let Some(node) = self.tree.get_node_mut(self.handle) {
            node.transform.set_position(pos);
        }
        self
    }

    /// Sets the node's world position.
    #[inline]
    pub fn set_world_position(self, pos: Vec2) -> Self {
        let _ = self.tree.set_world_position(self.handle, pos);
        self
    }

    /// Sets uniform scale.
    #[inline]
    pub fn set_scale(self, s: f32) -> Self {
        self.set_scale_xy(s, s)
    }

    /// Sets non-uniform scale.
    #[inline]
    pub fn set_scale_xy(self, x: f32, y: f32) -> Self {
        if let Some(node) = self.tree.get_node_mut(self.handle) {
            node.transform.set_scale(Vec2::new(x, y));
        }
        self
    }

    /// Sets rotation in radians.
    #[inline]
    pub fn set_rotation(self, angle: f32) -> Self {
        if let Some(node) = self.tree.get_node_mut(self.handle) {
            node.transform.set_rotation(angle);
        }
        self
    }

    /// Rotates by `angle` radians (cumulative).
    #[inline]
    pub fn rotate(self, angle: f32) -> Self {
        if let Some(node) = self.tree.get_node_mut(self.handle) {
            node.transform.rotate(angle);
        }
        self
    }

    // -- State setters (chainable) --

    /// Enables or disables the node.
    #[inline]
    pub fn set_enabled(self, enabled: bool) -> Self {
        let _ = self.tree.set_enabled(self.handle, enabled);
        self
    }

    /// Adds the node to a named group.
    #[inline]
    pub fn add_to_group(self, group: &str) -> Self {
        let _ = self.tree.add_to_group(self.handle, group);
        self
    }
}
