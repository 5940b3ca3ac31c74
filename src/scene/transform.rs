use std::cell::Cell;

use glam::{Affine2, Mat4, Vec2, Vec3};

/// World-space pose of a node, tagged with the world version it was read at.
///
/// The version is the single source of truth consumers compare against their
/// [`VersionCache`](crate::scene::VersionCache) to decide whether anything
/// derived from this pose must be recomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    pub position: Vec2,
    /// Rotation in radians, counter-clockwise.
    pub rotation: f32,
    pub scale: Vec2,
    pub version: u64,
}

impl WorldTransform {
    /// Identity pose used as the parent of detached subtree roots.
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        rotation: 0.0,
        scale: Vec2::ONE,
        version: 0,
    };

    /// Maps a point from this pose's local space to world space.
    #[inline]
    #[must_use]
    pub fn transform_point(&self, local: Vec2) -> Vec2 {
        self.position + Vec2::from_angle(self.rotation).rotate(self.scale * local)
    }

    /// Maps a world-space point into this pose's local space.
    ///
    /// Axes with zero scale collapse to zero.
    #[must_use]
    pub fn inverse_transform_point(&self, world: Vec2) -> Vec2 {
        let unrotated = Vec2::from_angle(-self.rotation).rotate(world - self.position);
        Vec2::new(
            safe_div(unrotated.x, self.scale.x),
            safe_div(unrotated.y, self.scale.y),
        )
    }

    #[must_use]
    pub fn to_affine(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(self.scale, self.rotation, self.position)
    }

    /// Matrix form for renderers working in 3D clip space.
    #[must_use]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale.extend(1.0),
            glam::Quat::from_rotation_z(self.rotation),
            Vec3::new(self.position.x, self.position.y, 0.0),
        )
    }
}

#[inline]
fn safe_div(value: f32, by: f32) -> f32 {
    if by == 0.0 { 0.0 } else { value / by }
}

#[derive(Debug, Clone, Copy)]
struct WorldCache {
    pose: WorldTransform,
    /// Local version the pose was composed from
    local_version: u64,
    /// Parent world version the pose was composed from
    parent_version: u64,
    valid: bool,
}

/// Local 2D transform of a node.
///
/// Position, rotation and scale are only mutable through setters, which bump
/// the local version when (and only when) the value actually changes. The
/// world pose is composed lazily from the ancestor chain and cached; its
/// version increases every time the composed pose actually changes.
#[derive(Debug, Clone)]
pub struct Transform {
    position: Vec2,
    rotation: f32,
    scale: Vec2,

    local_version: u64,
    world: Cell<WorldCache>,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            local_version: 1,
            world: Cell::new(WorldCache {
                pose: WorldTransform::IDENTITY,
                local_version: 0,
                parent_version: 0,
                valid: false,
            }),
        }
    }

    #[must_use]
    pub fn from_position(position: Vec2) -> Self {
        let mut t = Self::new();
        t.position = position;
        t
    }

    // ========================================================================
    // Local state
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    #[inline]
    #[must_use]
    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    /// Sets the local position. Returns `true` if it changed.
    pub fn set_position(&mut self, position: Vec2) -> bool {
        if self.position == position {
            return false;
        }
        self.position = position;
        self.touch();
        true
    }

    /// Sets the local rotation in radians. Returns `true` if it changed.
    pub fn set_rotation(&mut self, rotation: f32) -> bool {
        if self.rotation == rotation {
            return false;
        }
        self.rotation = rotation;
        self.touch();
        true
    }

    /// Sets the local scale. Returns `true` if it changed.
    pub fn set_scale(&mut self, scale: Vec2) -> bool {
        if self.scale == scale {
            return false;
        }
        self.scale = scale;
        self.touch();
        true
    }

    pub fn translate(&mut self, offset: Vec2) -> bool {
        self.set_position(self.position + offset)
    }

    pub fn rotate(&mut self, angle: f32) -> bool {
        self.set_rotation(self.rotation + angle)
    }

    /// Local version; increases on every effective local mutation.
    #[inline]
    #[must_use]
    pub fn local_version(&self) -> u64 {
        self.local_version
    }

    /// Local matrix.
    #[must_use]
    pub fn local_affine(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(self.scale, self.rotation, self.position)
    }

    /// Forces the next world read to recompose, e.g. after re-parenting.
    pub fn touch(&mut self) {
        self.local_version += 1;
    }

    // ========================================================================
    // World state
    // ========================================================================

    /// Returns the world pose composed under `parent`, rebuilding the cache if
    /// this transform or the parent pose changed since the last read.
    ///
    /// The world version only advances when the recomposed pose differs from
    /// the cached one. The second tuple element reports whether the pose was
    /// recomposed.
    pub(crate) fn resolve(&self, parent: &WorldTransform) -> (WorldTransform, bool) {
        let mut cache = self.world.get();
        if cache.valid
            && cache.local_version == self.local_version
            && cache.parent_version == parent.version
        {
            return (cache.pose, false);
        }

        let position = parent.transform_point(self.position);
        let rotation = parent.rotation + self.rotation;
        let scale = parent.scale * self.scale;
        let unchanged = cache.valid
            && cache.pose.position == position
            && cache.pose.rotation == rotation
            && cache.pose.scale == scale;
        if !unchanged {
            cache.pose = WorldTransform {
                position,
                rotation,
                scale,
                version: cache.pose.version + 1,
            };
        }
        cache.local_version = self.local_version;
        cache.parent_version = parent.version;
        cache.valid = true;
        self.world.set(cache);

        (cache.pose, true)
    }

    /// Last composed world pose, possibly stale. Use
    /// [`SceneTree::world_transform`](crate::scene::SceneTree::world_transform)
    /// for a validated read.
    #[must_use]
    pub fn cached_world(&self) -> WorldTransform {
        self.world.get().pose
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setter_reports_change_only_on_new_value() {
        let mut t = Transform::new();
        let v0 = t.local_version();
        assert!(!t.set_position(Vec2::ZERO));
        assert_eq!(t.local_version(), v0);
        assert!(t.set_position(Vec2::new(1.0, 0.0)));
        assert_eq!(t.local_version(), v0 + 1);
    }

    #[test]
    fn test_resolve_is_cached_until_mutation() {
        let mut t = Transform::new();
        t.set_position(Vec2::new(2.0, 3.0));

        let (first, rebuilt) = t.resolve(&WorldTransform::IDENTITY);
        assert!(rebuilt);
        let (second, rebuilt) = t.resolve(&WorldTransform::IDENTITY);
        assert!(!rebuilt);
        assert_eq!(first.version, second.version);

        t.set_rotation(0.5);
        let (third, rebuilt) = t.resolve(&WorldTransform::IDENTITY);
        assert!(rebuilt);
        assert!(third.version > second.version);
    }

    #[test]
    fn test_recompose_to_same_pose_keeps_version() {
        let mut t = Transform::new();
        t.set_position(Vec2::new(3.0, 4.0));
        let (first, _) = t.resolve(&WorldTransform::IDENTITY);

        t.touch();
        let (second, rebuilt) = t.resolve(&WorldTransform::IDENTITY);
        assert!(rebuilt);
        assert_eq!(second.version, first.version);

        let moved_parent = WorldTransform {
            position: Vec2::X,
            version: 1,
            ..WorldTransform::IDENTITY
        };
        let (third, _) = t.resolve(&moved_parent);
        assert!(third.version > first.version);
    }

    #[test]
    fn test_inverse_transform_point_undoes_transform_point() {
        let pose = WorldTransform {
            position: Vec2::new(3.0, -1.0),
            rotation: 0.7,
            scale: Vec2::new(2.0, 0.5),
            version: 1,
        };
        let p = Vec2::new(1.5, 4.0);
        let back = pose.inverse_transform_point(pose.transform_point(p));
        assert!((back - p).length() < 1e-4);
    }
}
