//! Render traversal.
//!
//! The [`RenderSystem`] is a read-only consumer of the tree. Once per frame it
//! collects enabled visible sprites and debug-drawn colliders in one pre-order
//! walk, keeps the sprite draw order sorted by layer, and submits
//! [`DrawCommand`]s to a [`RenderBackend`].
//!
//! The draw list is only re-sorted when a collected sprite reports a dirty
//! layer or a sprite joined the list; on most frames no sorting happens.

use std::any::Any;

use glam::Mat4;
use rustc_hash::FxHashSet;

use crate::assets::TextureHandle;
use crate::components::{Aabb, Collider, Sprite, SpriteVertex};
use crate::errors::Result;
use crate::scene::{NodeHandle, SceneTree};
use crate::systems::{EngineSystem, order};
use crate::utils::Time;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawKind {
    Sprite {
        texture: Option<TextureHandle>,
        layer: i32,
        quad: [SpriteVertex; 4],
    },
    ColliderOutline {
        bounds: Aabb,
    },
}

/// One draw submitted to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub node: NodeHandle,
    pub kind: DrawKind,
}

/// Receives the frame's draws. Implementations own all GPU concerns.
pub trait RenderBackend: Any {
    fn begin_frame(&mut self, view_projection: Option<Mat4>) -> Result<()>;

    fn draw(&mut self, command: &DrawCommand) -> Result<()>;

    fn end_frame(&mut self) -> Result<()>;
}

/// Backend that keeps the commands of the last frame, for tests and tools.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub commands: Vec<DrawCommand>,
    pub view_projection: Option<Mat4>,
    pub frames: u64,
}

impl RenderBackend for RecordingBackend {
    fn begin_frame(&mut self, view_projection: Option<Mat4>) -> Result<()> {
        self.commands.clear();
        self.view_projection = view_projection;
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand) -> Result<()> {
        self.commands.push(command.clone());
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        self.frames += 1;
        Ok(())
    }
}

/// Collects and submits the frame's draws.
pub struct RenderSystem {
    backend: Box<dyn RenderBackend>,
    /// Sprite nodes sorted by layer, pre-order within a layer
    draw_order: Vec<NodeHandle>,
    outlines: Vec<NodeHandle>,
    sort_count: u64,
}

impl RenderSystem {
    #[must_use]
    pub fn new(backend: impl RenderBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            draw_order: Vec::new(),
            outlines: Vec::new(),
            sort_count: 0,
        }
    }

    /// How many times the draw list was re-sorted.
    #[must_use]
    pub fn sort_count(&self) -> u64 {
        self.sort_count
    }

    /// Sprite nodes in draw order, as of the last collection.
    #[must_use]
    pub fn draw_order(&self) -> &[NodeHandle] {
        &self.draw_order
    }

    #[must_use]
    pub fn outlines(&self) -> &[NodeHandle] {
        &self.outlines
    }

    /// Downcasts the backend, e.g. to inspect a [`RecordingBackend`].
    #[must_use]
    pub fn backend<T: RenderBackend>(&self) -> Option<&T> {
        (&*self.backend as &dyn Any).downcast_ref::<T>()
    }

    /// Collects the frame's sprites and debug outlines in one pre-order walk.
    pub fn collect_sprites(&mut self, tree: &SceneTree) {
        let mut collected: Vec<(NodeHandle, i32)> = Vec::with_capacity(self.draw_order.len());
        let mut any_dirty = false;
        self.outlines.clear();

        for handle in tree.traverse_preorder(tree.root()) {
            if !tree.is_active(handle) {
                continue;
            }
            if let Some(sprite) = tree.try_component::<Sprite>(handle)
                && sprite.visible
            {
                any_dirty |= sprite.is_layer_dirty();
                collected.push((handle, sprite.layer()));
            }
            if tree
                .try_component::<Collider>(handle)
                .is_some_and(|c| c.debug_draw)
            {
                self.outlines.push(handle);
            }
        }

        // Drop sprites that left the list; the survivors stay sorted
        let present: FxHashSet<NodeHandle> = collected.iter().map(|&(h, _)| h).collect();
        self.draw_order.retain(|h| present.contains(h));

        if any_dirty || self.draw_order.len() != collected.len() {
            collected.sort_by_key(|&(_, layer)| layer);
            self.draw_order.clear();
            self.draw_order.extend(collected.iter().map(|&(h, _)| h));
            self.sort_count += 1;
            for &(handle, _) in &collected {
                if let Some(sprite) = tree.try_component::<Sprite>(handle) {
                    sprite.layer_dirty.set(false);
                }
            }
        }
    }

    /// Submits the collected draws to the backend.
    pub fn render_all(&mut self, tree: &SceneTree) -> Result<()> {
        self.backend.begin_frame(tree.current_view_projection()?)?;

        for &node in &self.draw_order {
            let sprite = tree.component::<Sprite>(node)?;
            let world = tree.world_transform(node)?;
            self.backend.draw(&DrawCommand {
                node,
                kind: DrawKind::Sprite {
                    texture: sprite.texture(),
                    layer: sprite.layer(),
                    quad: sprite.world_quad(&world),
                },
            })?;
        }

        for &node in &self.outlines {
            let collider = tree.component::<Collider>(node)?;
            let world = tree.world_transform(node)?;
            self.backend.draw(&DrawCommand {
                node,
                kind: DrawKind::ColliderOutline {
                    bounds: collider.world_aabb(&world),
                },
            })?;
        }

        self.backend.end_frame()
    }
}

impl Default for RenderSystem {
    fn default() -> Self {
        Self::new(RecordingBackend::default())
    }
}

impl EngineSystem for RenderSystem {
    fn name(&self) -> &str {
        "render"
    }

    fn order(&self) -> i32 {
        order::RENDER
    }

    fn late_update(&mut self, tree: &SceneTree, _time: &Time) -> Result<()> {
        self.collect_sprites(tree);
        self.render_all(tree)
    }
}
