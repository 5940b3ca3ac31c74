use std::cell::Cell;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec4};

use crate::assets::TextureHandle;
use crate::scene::{NodeHandle, VersionCache, WorldTransform};

/// One corner of a sprite quad, laid out for direct upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

/// Normalized texture region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl UvRect {
    pub const FULL: Self = Self {
        min: Vec2::ZERO,
        max: Vec2::ONE,
    };
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// Textured quad drawn at its owner's world pose.
///
/// The sprite only holds an opaque texture handle and size metadata. Its
/// world quad is rebuilt lazily when the owner's world version moves or a
/// visual property changes.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub(crate) owner: Option<NodeHandle>,

    texture: Option<TextureHandle>,
    /// Quad size in world units, centered on the owner.
    size: Vec2,
    uv: UvRect,
    layer: i32,
    pub(crate) layer_dirty: Cell<bool>,
    tint: Vec4,
    flip_x: bool,
    flip_y: bool,
    pub visible: bool,

    cache: Cell<VersionCache>,
    quad: Cell<[SpriteVertex; 4]>,
    rebuilds: Cell<u64>,
}

impl Sprite {
    #[must_use]
    pub fn new(texture: Option<TextureHandle>, size: Vec2) -> Self {
        Self {
            owner: None,
            texture,
            size,
            uv: UvRect::FULL,
            layer: 0,
            layer_dirty: Cell::new(true),
            tint: Vec4::ONE,
            flip_x: false,
            flip_y: false,
            visible: true,
            cache: Cell::new(VersionCache::new()),
            quad: Cell::new([SpriteVertex::zeroed(); 4]),
            rebuilds: Cell::new(0),
        }
    }

    /// Builder-style render layer.
    #[must_use]
    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    #[inline]
    #[must_use]
    pub fn owner(&self) -> Option<NodeHandle> {
        self.owner
    }

    #[must_use]
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[must_use]
    pub fn layer(&self) -> i32 {
        self.layer
    }

    #[must_use]
    pub fn tint(&self) -> Vec4 {
        self.tint
    }

    #[must_use]
    pub fn uv(&self) -> UvRect {
        self.uv
    }

    /// Returns `true` until the renderer consumed the last layer change.
    #[must_use]
    pub fn is_layer_dirty(&self) -> bool {
        self.layer_dirty.get()
    }

    pub fn set_texture(&mut self, texture: Option<TextureHandle>) {
        self.texture = texture;
    }

    pub fn set_size(&mut self, size: Vec2) {
        if self.size != size {
            self.size = size;
            self.invalidate();
        }
    }

    /// Changes the render layer; the renderer re-sorts on its next pass.
    pub fn set_layer(&mut self, layer: i32) {
        if self.layer != layer {
            self.layer = layer;
            self.layer_dirty.set(true);
        }
    }

    pub fn set_tint(&mut self, tint: Vec4) {
        if self.tint != tint {
            self.tint = tint;
            self.invalidate();
        }
    }

    pub fn set_uv(&mut self, uv: UvRect) {
        if self.uv != uv {
            self.uv = uv;
            self.invalidate();
        }
    }

    pub fn set_flip(&mut self, flip_x: bool, flip_y: bool) {
        if (self.flip_x, self.flip_y) != (flip_x, flip_y) {
            self.flip_x = flip_x;
            self.flip_y = flip_y;
            self.invalidate();
        }
    }

    /// How many times the world quad was rebuilt.
    #[must_use]
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.get()
    }

    pub(crate) fn invalidate(&mut self) {
        self.cache.get_mut().invalidate();
    }

    /// World-space quad (bottom-left, bottom-right, top-right, top-left).
    pub fn world_quad(&self, world: &WorldTransform) -> [SpriteVertex; 4] {
        let mut cache = self.cache.get();
        if !cache.needs_sync(world.version) {
            return self.quad.get();
        }

        let half = self.size * 0.5;
        let (mut u0, mut u1) = (self.uv.min.x, self.uv.max.x);
        let (mut v0, mut v1) = (self.uv.max.y, self.uv.min.y);
        if self.flip_x {
            std::mem::swap(&mut u0, &mut u1);
        }
        if self.flip_y {
            std::mem::swap(&mut v0, &mut v1);
        }
        let color = self.tint.to_array();
        let corner = |local: Vec2, uv: [f32; 2]| SpriteVertex {
            position: world.transform_point(local).to_array(),
            uv,
            color,
        };

        let quad = [
            corner(Vec2::new(-half.x, -half.y), [u0, v0]),
            corner(Vec2::new(half.x, -half.y), [u1, v0]),
            corner(Vec2::new(half.x, half.y), [u1, v1]),
            corner(Vec2::new(-half.x, half.y), [u0, v1]),
        ];

        self.quad.set(quad);
        cache.mark_synced(world.version);
        self.cache.set(cache);
        self.rebuilds.set(self.rebuilds.get() + 1);
        quad
    }
}

impl Default for Sprite {
    fn default() -> Self {
        Self::new(None, Vec2::ONE)
    }
}
