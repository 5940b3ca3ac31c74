use std::borrow::Cow;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::scene::behavior::{NodeBehavior, ProcessingFlags};
use crate::scene::groups::GroupMembership;
use crate::scene::transform::Transform;
use crate::scene::NodeHandle;

bitflags! {
    /// Lifecycle and state flags of a node.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Receives per-tick callbacks and contributes to rendering/physics.
        const ENABLED = 1 << 0;
        /// Connected to the tree root.
        const IN_TREE = 1 << 1;
        /// `ready` already fired for this node.
        const READY   = 1 << 2;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::ENABLED
    }
}

/// A scene-tree entity.
///
/// # Design Principles
///
/// - Keeps only hierarchy, transform, lifecycle state and the behavior
/// - Components (sprites, bodies, cameras, controls) live in the tree's
///   component storages, keyed by the node handle
/// - Nodes are created detached and become tree members through
///   [`SceneTree::add_child`](crate::scene::SceneTree::add_child)
///
/// # Hierarchy
///
/// - `parent`: handle of the owning parent (None for the root and orphans)
/// - `children`: ordered child handles; insertion order drives traversal and
///   render tie-breaks
pub struct Node {
    /// Display name; not required to be unique.
    pub name: Cow<'static, str>,

    // === Core Hierarchy ===
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    // === Core Spatial Data ===
    pub transform: Transform,

    // === Core State ===
    pub(crate) flags: NodeFlags,
    pub(crate) processing: ProcessingFlags,
    pub(crate) groups: SmallVec<[GroupMembership; 2]>,
    pub(crate) behavior: Option<Box<dyn NodeBehavior>>,
}

impl Node {
    /// Creates a detached, enabled node without behavior.
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            flags: NodeFlags::default(),
            processing: ProcessingFlags::empty(),
            groups: SmallVec::new(),
            behavior: None,
        }
    }

    /// Creates a detached node driven by `behavior`.
    #[must_use]
    pub fn with_behavior(
        name: impl Into<Cow<'static, str>>,
        behavior: impl NodeBehavior,
    ) -> Self {
        let mut node = Self::new(name);
        node.behavior = Some(Box::new(behavior));
        node
    }

    /// Builder-style local transform setup.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.flags.contains(NodeFlags::ENABLED)
    }

    #[inline]
    #[must_use]
    pub fn is_inside_tree(&self) -> bool {
        self.flags.contains(NodeFlags::IN_TREE)
    }

    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.flags.contains(NodeFlags::READY)
    }

    /// Hooks the scheduler calls on this node, as resolved on tree entry.
    #[inline]
    #[must_use]
    pub fn processing(&self) -> ProcessingFlags {
        self.processing
    }

    /// Returns `true` if a behavior is attached (and not currently running a hook).
    #[inline]
    #[must_use]
    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }

    /// Names of the groups this node belongs to.
    pub fn group_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.groups.iter().map(|m| crate::utils::interner::resolve(m.group))
    }

    /// Returns `true` if the node should receive the given per-tick hook.
    #[inline]
    pub(crate) fn ticks(&self, hook: ProcessingFlags) -> bool {
        self.flags
            .contains(NodeFlags::ENABLED | NodeFlags::IN_TREE | NodeFlags::READY)
            && self.processing.contains(hook)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("transform", &self.transform)
            .field("flags", &self.flags)
            .field("processing", &self.processing)
            .field(
                "behavior",
                &self.behavior.as_ref().map(|b| b.type_name()),
            )
            .finish_non_exhaustive()
    }
}
