//! Scene graph module.
//!
//! Manages the node hierarchy and everything keyed by it:
//! - Node: hierarchy, transform, lifecycle state and behavior
//! - Transform: local 2D pose with change versioning
//! - SceneTree: arena owner, lifecycle dispatch and tree-level registries
//! - Camera2D / Control: components backing the camera and focus registries
//! - Groups: named node sets
//! - TransformSystem: decoupled world-pose propagation

pub mod behavior;
pub mod camera;
pub mod focus;
pub mod groups;
pub mod node;
pub mod transform;
pub mod transform_system;
pub mod tree;
pub mod version_tracker;
pub mod wrapper;

pub use behavior::{NodeBehavior, ProcessingFlags, ProcessingOverrideCache};
pub use camera::{Camera2D, PixelPerfect, SnapMode};
pub use focus::Control;
pub use groups::GroupIndex;
pub use node::{Node, NodeFlags};
pub use transform::{Transform, WorldTransform};
pub use tree::SceneTree;
pub use version_tracker::VersionCache;
pub use wrapper::SceneNode;

use slotmap::new_key_type;

new_key_type! {
    /// Generational handle of a node in a [`SceneTree`].
    pub struct NodeHandle;
}
