//! Transform system.
//!
//! Composes world poses from the node hierarchy. Kept apart from
//! [`SceneTree`] so it only borrows the node arena, never the whole tree.
//!
//! World poses are also composed lazily on read
//! ([`SceneTree::world_transform`]); [`propagate`] refreshes every in-tree
//! pose once per frame so that readers later in the frame hit warm caches.

use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::errors::{GroveError, Result};
use crate::scene::node::Node;
use crate::scene::transform::WorldTransform;
use crate::scene::{NodeHandle, SceneTree};

/// Composes the world pose of `handle` along its ancestor chain.
///
/// Only the stale part of the chain is rebuilt: every ancestor's cache is
/// checked against its own local version and its parent's world version.
pub fn resolve_world(
    nodes: &SlotMap<NodeHandle, Node>,
    handle: NodeHandle,
) -> Result<WorldTransform> {
    let mut chain: SmallVec<[&Node; 16]> = SmallVec::new();
    let mut current = Some(handle);
    while let Some(h) = current {
        let node = nodes.get(h).ok_or(GroveError::NodeNotFound(h))?;
        chain.push(node);
        current = node.parent;
    }

    let mut world = WorldTransform::IDENTITY;
    for node in chain.iter().rev() {
        world = node.transform.resolve(&world).0;
    }
    Ok(world)
}

/// Refreshes the world pose of every in-tree node, parents before children.
///
/// Cameras whose owner moved get their view-projection rebuilt as well.
/// Returns the number of poses that had to be recomposed.
pub fn propagate(tree: &SceneTree) -> usize {
    let mut rebuilt = 0;
    // (node, parent world pose)
    let mut stack: Vec<(NodeHandle, WorldTransform)> = Vec::with_capacity(64);
    stack.push((tree.root(), WorldTransform::IDENTITY));

    while let Some((handle, parent_world)) = stack.pop() {
        let Some(node) = tree.nodes.get(handle) else {
            continue;
        };

        let (world, changed) = node.transform.resolve(&parent_world);
        if changed {
            rebuilt += 1;
            if let Some(camera) = tree.components.cameras.get(handle) {
                camera.view_projection(&world);
            }
        }

        for &child in node.children.iter().rev() {
            stack.push((child, world));
        }
    }

    rebuilt
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_hierarchy_update() {
        let mut nodes: SlotMap<NodeHandle, Node> = SlotMap::with_key();

        let mut parent = Node::new("parent");
        parent.transform.set_position(Vec2::new(1.0, 0.0));
        let parent_handle = nodes.insert(parent);

        let mut child = Node::new("child");
        child.transform.set_position(Vec2::new(0.0, 1.0));
        child.parent = Some(parent_handle);
        let child_handle = nodes.insert(child);
        nodes[parent_handle].children.push(child_handle);

        let world = resolve_world(&nodes, child_handle).unwrap();
        assert!((world.position.x - 1.0).abs() < 1e-5);
        assert!((world.position.y - 1.0).abs() < 1e-5);

        // Unchanged chain keeps the same version
        let again = resolve_world(&nodes, child_handle).unwrap();
        assert_eq!(world.version, again.version);

        nodes[parent_handle].transform.set_position(Vec2::new(2.0, 0.0));
        let moved = resolve_world(&nodes, child_handle).unwrap();
        assert!(moved.version > world.version);
        assert!((moved.position.x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_propagate_skips_clean_nodes() {
        let mut tree = SceneTree::new();
        let a = tree.create_node(Node::new("a"));
        tree.add_child(tree.root(), a).unwrap();

        assert!(propagate(&tree) > 0);
        assert_eq!(propagate(&tree), 0);

        tree.get_node_mut(a).unwrap().transform.translate(Vec2::X);
        assert_eq!(propagate(&tree), 1);
    }
}
