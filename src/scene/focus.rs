//! UI controls and keyboard focus.
//!
//! At most one [`Control`] in a tree holds focus. Grabbing focus takes it
//! from the previous holder; a holder that leaves the tree or loses its
//! `Control` releases focus implicitly.

use glam::Vec2;

use crate::errors::{GroveError, Result};
use crate::scene::{NodeHandle, SceneTree};

/// A rectangular UI element that can hold keyboard focus.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub(crate) owner: Option<NodeHandle>,
    pub size: Vec2,
    pub focusable: bool,
    pub(crate) has_focus: bool,
}

impl Control {
    #[must_use]
    pub fn new(size: Vec2) -> Self {
        Self {
            owner: None,
            size,
            focusable: true,
            has_focus: false,
        }
    }

    /// A control that never takes focus (labels, panels).
    #[must_use]
    pub fn passive(size: Vec2) -> Self {
        Self {
            focusable: false,
            ..Self::new(size)
        }
    }

    #[inline]
    #[must_use]
    pub fn owner(&self) -> Option<NodeHandle> {
        self.owner
    }

    #[inline]
    #[must_use]
    pub fn has_focus(&self) -> bool {
        self.has_focus
    }
}

impl Default for Control {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

impl SceneTree {
    /// Gives keyboard focus to `node`, taking it from the previous holder.
    pub fn grab_focus(&mut self, node: NodeHandle) -> Result<()> {
        let control = self.component::<Control>(node)?;
        if !control.focusable || !self.is_inside_tree(node) {
            return Err(GroveError::NotFocusable(node));
        }
        if self.focused == Some(node) {
            return Ok(());
        }

        self.clear_focus();
        if let Some(control) = self.components.controls.get_mut(node) {
            control.has_focus = true;
        }
        self.focused = Some(node);
        log::debug!("Focus grabbed by {node:?}");
        Ok(())
    }

    /// Releases focus if `node` holds it. Returns `true` if it did.
    pub fn release_focus(&mut self, node: NodeHandle) -> bool {
        if self.focused != Some(node) {
            return false;
        }
        self.clear_focus();
        true
    }

    /// Returns `true` if `node` holds focus.
    #[must_use]
    pub fn has_focus(&self, node: NodeHandle) -> bool {
        self.focused == Some(node)
    }

    /// The control currently holding focus, if any.
    #[inline]
    #[must_use]
    pub fn focused_control(&self) -> Option<NodeHandle> {
        self.focused
    }

    /// Leaves no control focused.
    pub fn clear_focus(&mut self) {
        if let Some(previous) = self.focused.take() {
            if let Some(control) = self.components.controls.get_mut(previous) {
                control.has_focus = false;
            }
            log::debug!("Focus released by {previous:?}");
        }
    }
}
