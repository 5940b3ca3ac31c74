use glam::Vec2;

use crate::scene::{NodeHandle, VersionCache};

/// How a body takes part in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyKind {
    /// Never moves; other bodies collide against it.
    Static,
    /// Integrated by the physics backend and written back to the node.
    #[default]
    Dynamic,
    /// Moved by game code through its node; physics only reads it.
    Kinematic,
}

/// Physics body attached to a node.
///
/// `position`/`rotation` are the physics-side pose. The physics system pushes
/// the node's world pose into them only when the owner's world version moved,
/// and pulls the solved pose of dynamic bodies back into the node after
/// each step.
#[derive(Debug, Clone)]
pub struct Rigidbody {
    pub(crate) owner: Option<NodeHandle>,
    pub kind: BodyKind,
    pub velocity: Vec2,
    pub mass: f32,
    pub gravity_scale: f32,

    pub(crate) position: Vec2,
    pub(crate) rotation: f32,
    pub(crate) cache: VersionCache,

    pushes: u64,
    pulls: u64,
}

impl Rigidbody {
    #[must_use]
    pub fn new(kind: BodyKind) -> Self {
        Self {
            owner: None,
            kind,
            velocity: Vec2::ZERO,
            mass: 1.0,
            gravity_scale: 1.0,
            position: Vec2::ZERO,
            rotation: 0.0,
            cache: VersionCache::new(),
            pushes: 0,
            pulls: 0,
        }
    }

    #[must_use]
    pub fn dynamic() -> Self {
        Self::new(BodyKind::Dynamic)
    }

    #[must_use]
    pub fn fixed() -> Self {
        Self::new(BodyKind::Static)
    }

    #[must_use]
    pub fn kinematic() -> Self {
        Self::new(BodyKind::Kinematic)
    }

    #[inline]
    #[must_use]
    pub fn owner(&self) -> Option<NodeHandle> {
        self.owner
    }

    /// Physics-side position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[must_use]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Number of node-to-body pose pushes.
    #[must_use]
    pub fn push_count(&self) -> u64 {
        self.pushes
    }

    /// Number of body-to-node pose pulls.
    #[must_use]
    pub fn pull_count(&self) -> u64 {
        self.pulls
    }

    /// Copies the node's world pose into the body if `version` is new.
    ///
    /// Returns `true` if the pose was pushed.
    pub(crate) fn push_pose(&mut self, position: Vec2, rotation: f32, version: u64) -> bool {
        if !self.cache.needs_sync(version) {
            return false;
        }
        self.position = position;
        self.rotation = rotation;
        self.cache.mark_synced(version);
        self.pushes += 1;
        true
    }

    /// Records that the solved pose was written back to the node, which
    /// moved it to world `version`.
    pub(crate) fn mark_pulled(&mut self, version: u64) {
        self.cache.mark_synced(version);
        self.pulls += 1;
    }
}

impl Default for Rigidbody {
    fn default() -> Self {
        Self::dynamic()
    }
}
