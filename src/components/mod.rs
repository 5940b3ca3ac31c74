//! Components attachable to scene nodes.
//!
//! Components are value-like services owned by exactly one node. They are
//! stored in per-type [`SparseSecondaryMap`]s on the [`SceneTree`], keyed by
//! the owner's handle, and dropped together with their owner.
//!
//! World-dependent components keep a [`VersionCache`](crate::scene::VersionCache)
//! and rebuild derived data only when the owner's world version moved.

pub mod animator;
pub mod collider;
pub mod rigidbody;
pub mod sprite;

pub use animator::{LoopMode, SpriteAnimator};
pub use collider::{Aabb, Collider, ColliderShape};
pub use rigidbody::{BodyKind, Rigidbody};
pub use sprite::{Sprite, SpriteVertex, UvRect};

use slotmap::SparseSecondaryMap;

use crate::scene::camera::Camera2D;
use crate::scene::focus::Control;
use crate::scene::{NodeHandle, SceneTree};

/// Per-type component storages of a tree.
#[derive(Debug, Default)]
pub struct Components {
    pub(crate) sprites: SparseSecondaryMap<NodeHandle, Sprite>,
    pub(crate) bodies: SparseSecondaryMap<NodeHandle, Rigidbody>,
    pub(crate) colliders: SparseSecondaryMap<NodeHandle, Collider>,
    pub(crate) cameras: SparseSecondaryMap<NodeHandle, Camera2D>,
    pub(crate) controls: SparseSecondaryMap<NodeHandle, Control>,
    pub(crate) animators: SparseSecondaryMap<NodeHandle, SpriteAnimator>,
}

impl Components {
    /// Drops every component owned by `node`.
    pub(crate) fn remove_all(&mut self, node: NodeHandle) {
        self.sprites.remove(node);
        self.bodies.remove(node);
        self.colliders.remove(node);
        self.cameras.remove(node);
        self.controls.remove(node);
        self.animators.remove(node);
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A component type with a storage on the [`SceneTree`].
///
/// Sealed: the set of component types is fixed by the engine core.
#[allow(unused_variables)]
pub trait Component: sealed::Sealed + Sized + 'static {
    /// Type name used in error messages.
    const NAME: &'static str;

    #[doc(hidden)]
    fn storage(components: &Components) -> &SparseSecondaryMap<NodeHandle, Self>;

    #[doc(hidden)]
    fn storage_mut(components: &mut Components) -> &mut SparseSecondaryMap<NodeHandle, Self>;

    /// Records (or clears) the owner back-reference.
    fn bind_owner(&mut self, owner: Option<NodeHandle>);

    /// Runs whenever the owner back-reference changes.
    ///
    /// Derived state keyed on the owner's world version must be dropped here:
    /// world versions are per-node counters and mean nothing for a new owner.
    #[doc(hidden)]
    fn on_bind(&mut self) {}

    /// Runs after the component was stored on `node`.
    #[doc(hidden)]
    fn on_attached(tree: &mut SceneTree, node: NodeHandle) {}

    /// Runs right before the component is taken off `node`.
    #[doc(hidden)]
    fn on_detached(tree: &mut SceneTree, node: NodeHandle) {}
}

macro_rules! impl_component {
    ($ty:ty, $field:ident, $name:literal $(, { $($hooks:tt)* })?) => {
        impl sealed::Sealed for $ty {}

        impl Component for $ty {
            const NAME: &'static str = $name;

            #[inline]
            fn storage(components: &Components) -> &SparseSecondaryMap<NodeHandle, Self> {
                &components.$field
            }

            #[inline]
            fn storage_mut(
                components: &mut Components,
            ) -> &mut SparseSecondaryMap<NodeHandle, Self> {
                &mut components.$field
            }

            #[inline]
            fn bind_owner(&mut self, owner: Option<NodeHandle>) {
                self.owner = owner;
                self.on_bind();
            }

            $($($hooks)*)?
        }
    };
}

impl_component!(Sprite, sprites, "Sprite", {
    fn on_bind(&mut self) {
        self.invalidate();
    }
});

impl_component!(Rigidbody, bodies, "Rigidbody", {
    fn on_bind(&mut self) {
        self.cache.invalidate();
    }
});

impl_component!(Collider, colliders, "Collider");
impl_component!(SpriteAnimator, animators, "SpriteAnimator");

impl_component!(Camera2D, cameras, "Camera2D", {
    fn on_bind(&mut self) {
        self.invalidate();
    }

    fn on_attached(tree: &mut SceneTree, node: NodeHandle) {
        if tree.is_inside_tree(node) {
            tree.register_camera(node);
        }
    }

    fn on_detached(tree: &mut SceneTree, node: NodeHandle) {
        if tree.is_inside_tree(node) {
            tree.unregister_camera(node);
        }
    }
});

impl_component!(Control, controls, "Control", {
    fn on_detached(tree: &mut SceneTree, node: NodeHandle) {
        if tree.focused_control() == Some(node) {
            tree.clear_focus();
        }
    }
});
