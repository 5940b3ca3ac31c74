use glam::Vec2;

use crate::scene::{NodeHandle, WorldTransform};

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    #[must_use]
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Touching edges do not count as an intersection.
    #[must_use]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Penetration depth per axis, or `None` if the boxes are apart.
    #[must_use]
    pub fn overlap(&self, other: &Aabb) -> Option<Vec2> {
        if !self.intersects(other) {
            return None;
        }
        Some(Vec2::new(
            self.max.x.min(other.max.x) - self.min.x.max(other.min.x),
            self.max.y.min(other.max.y) - self.min.y.max(other.min.y),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Rect { half_extents: Vec2 },
    Circle { radius: f32 },
}

/// Collision shape attached to a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    pub(crate) owner: Option<NodeHandle>,
    pub shape: ColliderShape,
    /// Shape center relative to the owner, in local units.
    pub offset: Vec2,
    /// Renderer draws the shape outline when set.
    pub debug_draw: bool,
}

impl Collider {
    #[must_use]
    pub fn rect(half_extents: Vec2) -> Self {
        Self::new(ColliderShape::Rect { half_extents })
    }

    #[must_use]
    pub fn circle(radius: f32) -> Self {
        Self::new(ColliderShape::Circle { radius })
    }

    fn new(shape: ColliderShape) -> Self {
        Self {
            owner: None,
            shape,
            offset: Vec2::ZERO,
            debug_draw: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn owner(&self) -> Option<NodeHandle> {
        self.owner
    }

    /// World bounds of the shape at `position` (the owner's world position
    /// as seen by physics), scaled by the owner's world scale.
    ///
    /// Rotation is ignored; rotated rectangles keep their unrotated bounds.
    #[must_use]
    pub fn aabb_at(&self, position: Vec2, scale: Vec2) -> Aabb {
        let scale = scale.abs();
        let center = position + self.offset * scale;
        let half = match self.shape {
            ColliderShape::Rect { half_extents } => half_extents * scale,
            ColliderShape::Circle { radius } => Vec2::splat(radius * scale.max_element()),
        };
        Aabb::from_center(center, half)
    }

    #[must_use]
    pub fn world_aabb(&self, world: &WorldTransform) -> Aabb {
        self.aabb_at(world.position, world.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_depth() {
        let a = Aabb::from_center(Vec2::ZERO, Vec2::ONE);
        let b = Aabb::from_center(Vec2::new(1.5, 0.0), Vec2::ONE);
        let depth = a.overlap(&b).unwrap();
        assert!((depth.x - 0.5).abs() < 1e-6);
        assert!((depth.y - 2.0).abs() < 1e-6);

        let c = Aabb::from_center(Vec2::new(2.0, 0.0), Vec2::ONE);
        assert!(a.overlap(&c).is_none());
    }

    #[test]
    fn test_circle_bounds_follow_scale() {
        let collider = Collider::circle(0.5);
        let aabb = collider.aabb_at(Vec2::new(1.0, 1.0), Vec2::new(2.0, 1.0));
        assert_eq!(aabb.min, Vec2::new(0.0, 0.0));
        assert_eq!(aabb.max, Vec2::new(2.0, 2.0));
    }
}
