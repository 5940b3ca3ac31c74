//! Error Types
//!
//! This module defines the error types used throughout the engine core.
//!
//! # Overview
//!
//! The main error type [`GroveError`] covers programming-contract violations:
//! - Hierarchy misuse (re-parenting an attached node, cycles, unknown handles)
//! - Component queries for components a node never attached
//! - Registry misuse (current camera, focus)
//! - Scheduling misuse (registering systems after startup)
//! - Unbound engine services and invalid settings
//!
//! Absence (no current camera, no focus), a full input channel and the
//! physics stub never produce an error; those are recovered locally.
//!
//! # Usage
//!
//! All fallible APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, GroveError>`.
//!
//! ```rust,ignore
//! use grove::errors::Result;
//!
//! fn build(tree: &mut SceneTree) -> Result<()> {
//!     let child = tree.create_node(Node::new("Player"));
//!     tree.add_child(tree.root(), child)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::scene::NodeHandle;

/// The main error type for the engine core.
///
/// Every variant signals a caller bug; the frame driver propagates the
/// first one it sees and terminates the frame.
#[derive(Error, Debug)]
pub enum GroveError {
    // ========================================================================
    // Hierarchy Errors
    // ========================================================================
    /// The handle does not refer to a live node.
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeHandle),

    /// The node already has a parent and must be detached first.
    #[error("Node {child:?} already has parent {parent:?}")]
    AlreadyHasParent {
        /// The node being attached
        child: NodeHandle,
        /// Its current parent
        parent: NodeHandle,
    },

    /// The node still reports tree membership.
    #[error("Node {0:?} is already inside the tree")]
    AlreadyInTree(NodeHandle),

    /// Attaching would make a node its own ancestor.
    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    WouldCreateCycle {
        /// The node being attached
        child: NodeHandle,
        /// The requested parent
        parent: NodeHandle,
    },

    /// The tree root cannot be detached, reparented or freed.
    #[error("The root node cannot be detached or freed")]
    RootNode,

    // ========================================================================
    // Component Errors
    // ========================================================================
    /// The node has no component of the requested type.
    #[error("Node {node:?} has no {component} component")]
    ComponentMissing {
        /// Component type name
        component: &'static str,
        /// The queried node
        node: NodeHandle,
    },

    /// The node already carries a component of this type.
    #[error("Node {node:?} already has a {component} component")]
    ComponentAlreadyAttached {
        /// Component type name
        component: &'static str,
        /// The target node
        node: NodeHandle,
    },

    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// The camera is not registered with the tree (not inside it).
    #[error("Camera {0:?} is not registered with the scene tree")]
    CameraNotRegistered(NodeHandle),

    /// The control cannot take focus.
    #[error("Control {0:?} is not focusable")]
    NotFocusable(NodeHandle),

    // ========================================================================
    // Scheduling & Service Errors
    // ========================================================================
    /// Systems must be registered before the engine starts.
    #[error("Cannot register system '{0}' after startup")]
    SystemsStarted(String),

    /// The engine service is not bound.
    #[error("Service not bound: {0}")]
    ServiceUnbound(&'static str),

    /// The requested texture id is unknown to the asset provider.
    #[error("Texture not found: {0}")]
    TextureNotFound(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A settings value is out of range.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Settings JSON could not be parsed or written.
    #[error("Settings parse error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Alias for `Result<T, GroveError>`.
pub type Result<T> = std::result::Result<T, GroveError>;
