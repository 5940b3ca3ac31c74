//! 2D cameras and current-camera selection.
//!
//! A [`Camera2D`] component registers with its tree while its owner is in the
//! tree. Registration never implies "current": exactly one registered camera
//! at most is selected through [`SceneTree::set_current_camera`].

use std::cell::Cell;

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::errors::{GroveError, Result};
use crate::scene::transform::WorldTransform;
use crate::scene::version_tracker::VersionCache;
use crate::scene::{NodeHandle, SceneTree};

const NEAR: f32 = -1000.0;
const FAR: f32 = 1000.0;

/// Rounding policy used to snap a camera onto the pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SnapMode {
    Floor,
    Ceil,
    #[default]
    Round,
}

/// Pixel-perfect camera settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPerfect {
    /// Vertical resolution of the virtual render target, in pixels.
    pub render_height: u32,
    /// World units are `pixels_per_unit` pixels tall.
    pub pixels_per_unit: f32,
    pub snap: SnapMode,
    /// Forces the view rotation to zero.
    pub lock_rotation: bool,
}

impl PixelPerfect {
    #[must_use]
    pub fn new(render_height: u32, pixels_per_unit: f32) -> Self {
        Self {
            render_height,
            pixels_per_unit,
            snap: SnapMode::Round,
            lock_rotation: true,
        }
    }

    /// Orthographic half-height: `render_height / (2 * ppu)`.
    #[must_use]
    pub fn half_height(&self) -> f32 {
        self.render_height as f32 / (2.0 * self.pixels_per_unit)
    }

    /// Snaps a world position onto a grid of `1 / ppu`.
    #[must_use]
    pub fn snap_point(&self, position: Vec2) -> Vec2 {
        let ppu = self.pixels_per_unit;
        if ppu <= 0.0 {
            return position;
        }
        let scaled = position * ppu;
        let snapped = match self.snap {
            SnapMode::Floor => scaled.floor(),
            SnapMode::Ceil => scaled.ceil(),
            SnapMode::Round => scaled.round(),
        };
        snapped / ppu
    }
}

/// Orthographic 2D camera component.
#[derive(Debug, Clone)]
pub struct Camera2D {
    pub(crate) owner: Option<NodeHandle>,
    pub(crate) current: bool,

    half_height: f32,
    aspect: f32,
    zoom: f32,
    pixel_perfect: Option<PixelPerfect>,

    // Derived state, rebuilt on owner world-version change
    cache: Cell<VersionCache>,
    view_projection: Cell<Mat4>,
    rebuilds: Cell<u64>,
}

impl Camera2D {
    #[must_use]
    pub fn new(half_height: f32, aspect: f32) -> Self {
        Self {
            owner: None,
            current: false,
            half_height,
            aspect,
            zoom: 1.0,
            pixel_perfect: None,
            cache: Cell::new(VersionCache::new()),
            view_projection: Cell::new(Mat4::IDENTITY),
            rebuilds: Cell::new(0),
        }
    }

    /// Pixel-perfect camera; its half-height derives from the render height.
    #[must_use]
    pub fn pixel_perfect(settings: PixelPerfect, aspect: f32) -> Self {
        let mut camera = Self::new(settings.half_height(), aspect);
        camera.pixel_perfect = Some(settings);
        camera
    }

    /// Owning node, while attached.
    #[inline]
    #[must_use]
    pub fn owner(&self) -> Option<NodeHandle> {
        self.owner
    }

    /// Whether this camera holds the tree's current-camera slot.
    #[inline]
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.current
    }

    #[must_use]
    pub fn half_height(&self) -> f32 {
        self.pixel_perfect
            .as_ref()
            .map_or(self.half_height, PixelPerfect::half_height)
    }

    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    #[must_use]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    #[must_use]
    pub fn pixel_settings(&self) -> Option<&PixelPerfect> {
        self.pixel_perfect.as_ref()
    }

    pub fn set_half_height(&mut self, half_height: f32) {
        self.half_height = half_height;
        self.invalidate();
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.invalidate();
    }

    /// Zoom factor; values above one magnify.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.max(f32::EPSILON);
        self.invalidate();
    }

    pub fn set_pixel_perfect(&mut self, settings: Option<PixelPerfect>) {
        self.pixel_perfect = settings;
        self.invalidate();
    }

    /// How many times the view-projection was rebuilt.
    #[must_use]
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.get()
    }

    pub(crate) fn invalidate(&mut self) {
        self.cache.get_mut().invalidate();
    }

    /// View-projection matrix for the owner's world pose.
    ///
    /// Rebuilt only when `world.version` differs from the last one seen.
    pub fn view_projection(&self, world: &WorldTransform) -> Mat4 {
        let mut cache = self.cache.get();
        if !cache.needs_sync(world.version) {
            return self.view_projection.get();
        }

        let half_h = self.half_height() / self.zoom;
        let half_w = half_h * self.aspect;
        let projection = Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, NEAR, FAR);

        let (position, rotation) = match &self.pixel_perfect {
            Some(pp) => (
                pp.snap_point(world.position),
                if pp.lock_rotation { 0.0 } else { world.rotation },
            ),
            None => (world.position, world.rotation),
        };
        let view = Mat4::from_rotation_translation(
            glam::Quat::from_rotation_z(rotation),
            Vec3::new(position.x, position.y, 0.0),
        )
        .inverse();

        let vp = projection * view;
        self.view_projection.set(vp);
        cache.mark_synced(world.version);
        self.cache.set(cache);
        self.rebuilds.set(self.rebuilds.get() + 1);
        vp
    }
}

impl Default for Camera2D {
    fn default() -> Self {
        Self::new(5.0, 16.0 / 9.0)
    }
}

// ============================================================================
// Tree registry
// ============================================================================

impl SceneTree {
    /// Adds a camera node to the registry. Does not make it current.
    ///
    /// Only in-tree nodes carrying a [`Camera2D`] are accepted; the registry
    /// follows tree membership and is never edited from outside the crate.
    pub(crate) fn register_camera(&mut self, node: NodeHandle) {
        if !self.is_inside_tree(node) || !self.has_component::<Camera2D>(node) {
            log::warn!("Refusing to register {node:?}: not an in-tree Camera2D");
            return;
        }
        if self.cameras.contains(&node) {
            return;
        }
        self.cameras.push(node);
        log::debug!("Camera registered: {node:?}");
    }

    /// Removes a camera node from the registry.
    ///
    /// If it was current, the current slot is cleared; no other registered
    /// camera is promoted.
    pub(crate) fn unregister_camera(&mut self, node: NodeHandle) {
        let Some(pos) = self.cameras.iter().position(|&c| c == node) else {
            log::warn!("Unregistering unknown camera {node:?}");
            return;
        };
        self.cameras.remove(pos);
        if self.current_camera == Some(node) {
            self.clear_current_camera();
        }
        log::debug!("Camera unregistered: {node:?}");
    }

    /// Makes `node` the current camera, clearing the previous one's flag.
    pub fn set_current_camera(&mut self, node: NodeHandle) -> Result<()> {
        self.node_checked(node)?;
        if !self.has_component::<Camera2D>(node) {
            return Err(GroveError::ComponentMissing {
                component: "Camera2D",
                node,
            });
        }
        if !self.cameras.contains(&node) {
            return Err(GroveError::CameraNotRegistered(node));
        }
        if self.current_camera == Some(node) {
            return Ok(());
        }

        self.clear_current_camera();
        if let Some(camera) = self.components.cameras.get_mut(node) {
            camera.current = true;
        }
        self.current_camera = Some(node);
        log::debug!("Current camera: {node:?}");
        Ok(())
    }

    /// Leaves the tree without a current camera.
    pub fn clear_current_camera(&mut self) {
        if let Some(previous) = self.current_camera.take()
            && let Some(camera) = self.components.cameras.get_mut(previous)
        {
            camera.current = false;
        }
    }

    #[inline]
    #[must_use]
    pub fn current_camera(&self) -> Option<NodeHandle> {
        self.current_camera
    }

    /// Registered camera nodes in registration order.
    #[must_use]
    pub fn registered_cameras(&self) -> &[NodeHandle] {
        &self.cameras
    }

    /// View-projection of the current camera, if any.
    pub fn current_view_projection(&self) -> Result<Option<Mat4>> {
        let Some(node) = self.current_camera else {
            return Ok(None);
        };
        let world = self.world_transform(node)?;
        Ok(Some(self.component::<Camera2D>(node)?.view_projection(&world)))
    }
}
