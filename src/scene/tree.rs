//! The scene tree.
//!
//! [`SceneTree`] owns every node of a running engine in one arena, together
//! with the tree-level registries (registered cameras, current camera, focused
//! control, group index), the component storages and the bound services.
//! Nodes never reach for globals: every cross-node query goes through the tree.
//!
//! # Ownership
//!
//! - The root is created with the tree and can never be detached or freed.
//! - [`create_node`](SceneTree::create_node) inserts a detached node. It stays
//!   in the arena (an orphan) until attached with
//!   [`add_child`](SceneTree::add_child) or freed with
//!   [`remove_node`](SceneTree::remove_node).
//! - Children are exclusively owned by their parent; freeing a node frees
//!   its whole subtree, including behaviors and components.
//!
//! # Lifecycle
//!
//! Attaching under an in-tree parent fires `enter_tree` on the whole subtree
//! in pre-order, then `ready` (once per node lifetime) in pre-order.
//! Detaching fires `exit_tree` in pre-order before unlinking.

use std::any::Any;
use std::sync::Arc;

use glam::Vec2;
use slotmap::SlotMap;

use crate::components::{Component, Components};
use crate::errors::{GroveError, Result};
use crate::scene::behavior::{NodeBehavior, ProcessingFlags, ProcessingOverrideCache};
use crate::scene::groups::GroupIndex;
use crate::scene::node::{Node, NodeFlags};
use crate::scene::transform::WorldTransform;
use crate::scene::transform_system;
use crate::scene::wrapper::SceneNode;
use crate::scene::NodeHandle;
use crate::services::Services;

/// Hierarchical scene graph with lifecycle dispatch and tree-level registries.
pub struct SceneTree {
    pub(crate) nodes: SlotMap<NodeHandle, Node>,
    root: NodeHandle,

    // ==== Components & registries ====
    pub(crate) components: Components,
    pub(crate) groups: GroupIndex,
    pub(crate) cameras: Vec<NodeHandle>,
    pub(crate) current_camera: Option<NodeHandle>,
    pub(crate) focused: Option<NodeHandle>,

    /// Engine services bound for the lifetime of a running engine.
    pub services: Services,

    override_cache: Arc<ProcessingOverrideCache>,
    /// Reused pre-order buffer for per-tick walks
    scratch: Vec<NodeHandle>,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTree {
    /// Creates a tree whose root is in-tree and ready, sharing the
    /// process-wide override cache.
    #[must_use]
    pub fn new() -> Self {
        Self::with_override_cache(ProcessingOverrideCache::global())
    }

    /// Creates a tree with its own processing override cache.
    #[must_use]
    pub fn with_override_cache(override_cache: Arc<ProcessingOverrideCache>) -> Self {
        let mut nodes = SlotMap::with_key();
        let mut root = Node::new("root");
        root.flags.insert(NodeFlags::IN_TREE | NodeFlags::READY);
        let root = nodes.insert(root);

        Self {
            nodes,
            root,
            components: Components::default(),
            groups: GroupIndex::new(),
            cameras: Vec::new(),
            current_camera: None,
            focused: None,
            services: Services::new(),
            override_cache,
            scratch: Vec::with_capacity(64),
        }
    }

    // ========================================================================
    // Node access
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// Number of live nodes, orphans included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds at least its root.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Inserts a detached node.
    pub fn create_node(&mut self, mut node: Node) -> NodeHandle {
        node.flags.remove(NodeFlags::IN_TREE);
        node.parent = None;
        node.children.clear();
        self.nodes.insert(node)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    /// Gets a read-only reference.
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    /// Gets a mutable reference (for transform and name edits).
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Like [`get_node`](Self::get_node), failing on stale handles.
    pub fn node_checked(&self, handle: NodeHandle) -> Result<&Node> {
        self.nodes
            .get(handle)
            .ok_or(GroveError::NodeNotFound(handle))
    }

    /// Like [`get_node_mut`](Self::get_node_mut), failing on stale handles.
    pub fn node_checked_mut(&mut self, handle: NodeHandle) -> Result<&mut Node> {
        self.nodes
            .get_mut(handle)
            .ok_or(GroveError::NodeNotFound(handle))
    }

    /// Chainable wrapper for quick node edits.
    pub fn node(&mut self, handle: NodeHandle) -> SceneNode<'_> {
        SceneNode::new(self, handle)
    }

    #[must_use]
    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(handle)?.parent
    }

    /// Children of `handle`, empty for stale handles.
    #[must_use]
    pub fn children(&self, handle: NodeHandle) -> &[NodeHandle] {
        self.nodes.get(handle).map_or(&[], |n| n.children.as_slice())
    }

    #[must_use]
    pub fn name(&self, handle: NodeHandle) -> Option<&str> {
        self.nodes.get(handle).map(|n| n.name.as_ref())
    }

    /// First direct child of `parent` with the given name.
    #[must_use]
    pub fn find_child(&self, parent: NodeHandle, name: &str) -> Option<NodeHandle> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.name(c) == Some(name))
    }

    #[must_use]
    pub fn is_inside_tree(&self, handle: NodeHandle) -> bool {
        self.nodes.get(handle).is_some_and(Node::is_inside_tree)
    }

    /// Returns `true` if `ancestor` is a strict ancestor of `node`.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = self.parent(node);
        while let Some(h) = current {
            if h == ancestor {
                return true;
            }
            current = self.parent(h);
        }
        false
    }

    /// Handles of the subtree rooted at `start`, parents before children,
    /// siblings in insertion order.
    #[must_use]
    pub fn traverse_preorder(&self, start: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        self.collect_preorder(start, &mut out);
        out
    }

    pub(crate) fn collect_preorder(&self, start: NodeHandle, out: &mut Vec<NodeHandle>) {
        let mut stack: Vec<NodeHandle> = Vec::with_capacity(32);
        stack.push(start);
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            out.push(handle);
            // Reverse so the first child is popped first
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// Enables or disables per-tick callbacks and render/physics contribution
    /// of this node only. Group and registry memberships are unaffected.
    pub fn set_enabled(&mut self, handle: NodeHandle, enabled: bool) -> Result<()> {
        let node = self.node_checked_mut(handle)?;
        node.flags.set(NodeFlags::ENABLED, enabled);
        Ok(())
    }

    /// Returns `true` for live, enabled, in-tree nodes.
    #[must_use]
    pub fn is_active(&self, handle: NodeHandle) -> bool {
        self.nodes
            .get(handle)
            .is_some_and(|n| n.is_enabled() && n.is_inside_tree())
    }

    // ========================================================================
    // Behaviors
    // ========================================================================

    /// Replaces the behavior of a node, returning the previous one.
    ///
    /// Lifecycle hooks are not replayed for the new behavior; its processing
    /// flags are resolved immediately when the node is in the tree.
    pub fn set_behavior(
        &mut self,
        handle: NodeHandle,
        behavior: Box<dyn NodeBehavior>,
    ) -> Result<Option<Box<dyn NodeBehavior>>> {
        let cache = Arc::clone(&self.override_cache);
        let node = self.node_checked_mut(handle)?;
        if node.is_inside_tree() {
            node.processing = cache.resolve(&*behavior);
        }
        Ok(node.behavior.replace(behavior))
    }

    /// Downcasts the behavior of a node.
    #[must_use]
    pub fn behavior<T: NodeBehavior>(&self, handle: NodeHandle) -> Option<&T> {
        let behavior: &dyn NodeBehavior = self.nodes.get(handle)?.behavior.as_deref()?;
        (behavior as &dyn Any).downcast_ref::<T>()
    }

    /// Mutably downcasts the behavior of a node.
    pub fn behavior_mut<T: NodeBehavior>(&mut self, handle: NodeHandle) -> Option<&mut T> {
        let behavior: &mut dyn NodeBehavior = self.nodes.get_mut(handle)?.behavior.as_deref_mut()?;
        (behavior as &mut dyn Any).downcast_mut::<T>()
    }

    /// The override cache consulted on tree entry.
    #[must_use]
    pub fn override_cache(&self) -> &Arc<ProcessingOverrideCache> {
        &self.override_cache
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Attaches a parentless node under `parent`.
    ///
    /// If `parent` is in the tree, `enter_tree` and then `ready` fire on the
    /// attached subtree before this returns.
    pub fn add_child(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        if child == self.root {
            return Err(GroveError::RootNode);
        }
        let parent_in_tree = self.node_checked(parent)?.is_inside_tree();
        let child_node = self.node_checked(child)?;
        if let Some(existing) = child_node.parent {
            return Err(GroveError::AlreadyHasParent {
                child,
                parent: existing,
            });
        }
        if child_node.is_inside_tree() {
            return Err(GroveError::AlreadyInTree(child));
        }
        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(GroveError::WouldCreateCycle { child, parent });
        }

        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
            c.transform.touch();
        }

        if parent_in_tree {
            self.propagate_enter(child)?;
        }
        Ok(())
    }

    /// Detaches `child` from its parent, keeping it alive as an orphan.
    ///
    /// If it was in the tree, `exit_tree` fires on its subtree in pre-order
    /// before unlinking. Detaching an orphan is a no-op.
    ///
    /// A failing exit hook is reported, but the node is still unlinked.
    pub fn detach(&mut self, child: NodeHandle) -> Result<()> {
        if child == self.root {
            return Err(GroveError::RootNode);
        }
        let node = self.node_checked(child)?;
        let Some(parent) = node.parent else {
            return Ok(());
        };

        let exited = if node.is_inside_tree() {
            self.propagate_exit(child)
        } else {
            Ok(())
        };

        // Exit hooks may already have moved the node
        if self.parent(child) != Some(parent) {
            return exited;
        }
        if let Some(p) = self.nodes.get_mut(parent)
            && let Some(pos) = p.children.iter().position(|&c| c == child)
        {
            p.children.remove(pos);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = None;
            c.transform.touch();
        }
        exited
    }

    /// Moves `child` under `new_parent`. `ready` does not fire again.
    pub fn reparent(&mut self, child: NodeHandle, new_parent: NodeHandle) -> Result<()> {
        self.node_checked(new_parent)?;
        if child == new_parent || self.is_ancestor_of(child, new_parent) {
            return Err(GroveError::WouldCreateCycle {
                child,
                parent: new_parent,
            });
        }
        self.detach(child)?;
        self.add_child(new_parent, child)
    }

    /// Detaches `handle` and frees its whole subtree.
    pub fn remove_node(&mut self, handle: NodeHandle) -> Result<()> {
        self.detach(handle)?;

        for h in self.traverse_preorder(handle) {
            self.cameras.retain(|&c| c != h);
            if self.current_camera == Some(h) {
                self.current_camera = None;
            }
            if self.focused == Some(h) {
                self.focused = None;
            }
            self.components.remove_all(h);
            self.nodes.remove(h);
        }
        Ok(())
    }

    // ========================================================================
    // World transforms
    // ========================================================================

    /// World pose of a node, recomposing stale caches along its ancestor chain.
    pub fn world_transform(&self, handle: NodeHandle) -> Result<WorldTransform> {
        transform_system::resolve_world(&self.nodes, handle)
    }

    /// World version of a node; changes whenever its world pose changes.
    pub fn world_version(&self, handle: NodeHandle) -> Result<u64> {
        Ok(self.world_transform(handle)?.version)
    }

    /// Moves a node so its world position becomes `position`.
    ///
    /// Returns `true` if the local position changed.
    pub fn set_world_position(&mut self, handle: NodeHandle, position: Vec2) -> Result<bool> {
        let parent_world = self.parent_world(handle)?;
        let local = parent_world.inverse_transform_point(position);
        Ok(self.node_checked_mut(handle)?.transform.set_position(local))
    }

    /// Rotates a node so its world rotation becomes `rotation`.
    ///
    /// Returns `true` if the local rotation changed.
    pub fn set_world_rotation(&mut self, handle: NodeHandle, rotation: f32) -> Result<bool> {
        let parent_world = self.parent_world(handle)?;
        let local = rotation - parent_world.rotation;
        Ok(self.node_checked_mut(handle)?.transform.set_rotation(local))
    }

    fn parent_world(&self, handle: NodeHandle) -> Result<WorldTransform> {
        match self.node_checked(handle)?.parent {
            Some(parent) => self.world_transform(parent),
            None => Ok(WorldTransform::IDENTITY),
        }
    }

    // ========================================================================
    // Components
    // ========================================================================

    /// Attaches a component; a node holds at most one of each type.
    pub fn attach_component<C: Component>(&mut self, node: NodeHandle, mut component: C) -> Result<()> {
        self.node_checked(node)?;
        let storage = C::storage_mut(&mut self.components);
        if storage.contains_key(node) {
            return Err(GroveError::ComponentAlreadyAttached {
                component: C::NAME,
                node,
            });
        }
        component.bind_owner(Some(node));
        storage.insert(node, component);
        C::on_attached(self, node);
        Ok(())
    }

    /// Takes a component off a node and returns it.
    pub fn detach_component<C: Component>(&mut self, node: NodeHandle) -> Result<C> {
        if !self.has_component::<C>(node) {
            return Err(GroveError::ComponentMissing {
                component: C::NAME,
                node,
            });
        }
        C::on_detached(self, node);
        let mut component = C::storage_mut(&mut self.components)
            .remove(node)
            .ok_or(GroveError::ComponentMissing {
                component: C::NAME,
                node,
            })?;
        component.bind_owner(None);
        Ok(component)
    }

    /// Component of a node; querying a component the node never attached
    /// is a contract violation.
    pub fn component<C: Component>(&self, node: NodeHandle) -> Result<&C> {
        C::storage(&self.components)
            .get(node)
            .ok_or(GroveError::ComponentMissing {
                component: C::NAME,
                node,
            })
    }

    pub fn component_mut<C: Component>(&mut self, node: NodeHandle) -> Result<&mut C> {
        C::storage_mut(&mut self.components)
            .get_mut(node)
            .ok_or(GroveError::ComponentMissing {
                component: C::NAME,
                node,
            })
    }

    /// Component of a node, if attached.
    #[must_use]
    pub fn try_component<C: Component>(&self, node: NodeHandle) -> Option<&C> {
        C::storage(&self.components).get(node)
    }

    #[must_use]
    pub fn has_component<C: Component>(&self, node: NodeHandle) -> bool {
        C::storage(&self.components).contains_key(node)
    }

    // ========================================================================
    // Per-tick dispatch
    // ========================================================================

    /// Runs the variable-rate `process` hook in pre-order.
    ///
    /// Only enabled, in-tree, readied nodes whose behavior type overrides
    /// `process` are called. Returns the number of calls.
    pub fn process(&mut self, delta: f32) -> Result<usize> {
        self.run_tick(ProcessingFlags::PROCESS, delta)
    }

    /// Runs the fixed-rate `physics_process` hook in pre-order.
    pub fn physics_process(&mut self, fixed_delta: f32) -> Result<usize> {
        self.run_tick(ProcessingFlags::PHYSICS_PROCESS, fixed_delta)
    }

    fn run_tick(&mut self, hook: ProcessingFlags, delta: f32) -> Result<usize> {
        let mut order = std::mem::take(&mut self.scratch);
        order.clear();
        self.collect_preorder(self.root, &mut order);

        let mut calls = 0;
        let mut result = Ok(());
        for &handle in &order {
            if !self.nodes.get(handle).is_some_and(|n| n.ticks(hook)) {
                continue;
            }
            calls += 1;
            let outcome = if hook == ProcessingFlags::PROCESS {
                self.call_hook(handle, |b, tree| b.process(tree, handle, delta))
            } else {
                self.call_hook(handle, |b, tree| b.physics_process(tree, handle, delta))
            };
            if let Err(e) = outcome {
                result = Err(e);
                break;
            }
        }

        self.scratch = order;
        result.map(|()| calls)
    }

    // ========================================================================
    // Lifecycle internals
    // ========================================================================

    fn propagate_enter(&mut self, start: NodeHandle) -> Result<()> {
        let order = self.traverse_preorder(start);

        for &handle in &order {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            let parent_in_tree = node
                .parent
                .is_some_and(|p| self.is_inside_tree(p));
            if node.is_inside_tree() || !parent_in_tree {
                continue;
            }
            self.enter_single(handle)?;
        }

        for &handle in &order {
            let Some(node) = self.nodes.get_mut(handle) else {
                continue;
            };
            if !node.is_inside_tree() || node.is_ready() {
                continue;
            }
            node.flags.insert(NodeFlags::READY);
            self.call_hook(handle, |b, tree| b.ready(tree, handle))?;
        }
        Ok(())
    }

    fn enter_single(&mut self, handle: NodeHandle) -> Result<()> {
        let Some(node) = self.nodes.get_mut(handle) else {
            return Ok(());
        };
        node.flags.insert(NodeFlags::IN_TREE);
        node.processing = node
            .behavior
            .as_deref()
            .map_or(ProcessingFlags::empty(), |b| self.override_cache.resolve(b));
        log::trace!("'{}' entered the tree", node.name);

        self.index_groups(handle);
        if self.components.cameras.contains_key(handle) {
            self.register_camera(handle);
        }
        self.call_hook(handle, |b, tree| b.enter_tree(tree, handle))
    }

    /// Takes the subtree out of the tree in pre-order.
    ///
    /// After the first failing `exit_tree` hook no further hooks run, but the
    /// remaining nodes still leave the registries and lose `IN_TREE`, so the
    /// subtree never ends up half inside. The first error is returned.
    fn propagate_exit(&mut self, start: NodeHandle) -> Result<()> {
        let mut first_error = None;
        for handle in self.traverse_preorder(start) {
            if !self.is_inside_tree(handle) {
                continue;
            }
            if first_error.is_none()
                && let Err(err) = self.call_hook(handle, |b, tree| b.exit_tree(tree, handle))
            {
                first_error = Some(err);
            }

            if self.cameras.contains(&handle) {
                self.unregister_camera(handle);
            }
            if self.focused == Some(handle) {
                self.clear_focus();
            }
            self.unindex_groups(handle);
            if let Some(node) = self.nodes.get_mut(handle) {
                node.flags.remove(NodeFlags::IN_TREE);
                log::trace!("'{}' exited the tree", node.name);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Runs `f` with the node's behavior taken out, so the hook can borrow
    /// the tree mutably. The behavior is put back unless the hook freed the
    /// node or installed a replacement.
    fn call_hook(
        &mut self,
        handle: NodeHandle,
        f: impl FnOnce(&mut dyn NodeBehavior, &mut SceneTree) -> Result<()>,
    ) -> Result<()> {
        let Some(mut behavior) = self.nodes.get_mut(handle).and_then(|n| n.behavior.take()) else {
            return Ok(());
        };

        let result = f(behavior.as_mut(), self);

        if let Some(node) = self.nodes.get_mut(handle)
            && node.behavior.is_none()
        {
            node.behavior = Some(behavior);
        }
        result
    }
}

impl std::fmt::Debug for SceneTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneTree")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("cameras", &self.cameras)
            .field("current_camera", &self.current_camera)
            .field("focused", &self.focused)
            .finish_non_exhaustive()
    }
}
