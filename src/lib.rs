#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Runtime core of a 2D game engine: a scene tree of nodes with attachable
//! components, world-version change tracking, tree-level registries
//! (cameras, focus, groups) and a fixed/variable step frame scheduler.

pub mod assets;
pub mod components;
pub mod engine;
pub mod errors;
pub mod input;
pub mod scene;
pub mod services;
pub mod settings;
pub mod systems;
pub mod utils;

pub use engine::{Engine, FrameState};
pub use errors::{GroveError, Result};
pub use scene::{Node, NodeBehavior, NodeHandle, SceneTree};
pub use utils::interner;

/// Common imports for game code.
pub mod prelude {
    pub use crate::assets::{AssetProvider, TextureHandle, TextureRegistry};
    pub use crate::components::{
        Aabb, BodyKind, Collider, ColliderShape, Rigidbody, Sprite, SpriteAnimator,
    };
    pub use crate::engine::{Engine, FrameState};
    pub use crate::errors::{GroveError, Result};
    pub use crate::input::{ButtonState, Input, InputEvent, InputPublisher, Key, MouseButton};
    pub use crate::scene::{
        Camera2D, Control, Node, NodeBehavior, NodeHandle, PixelPerfect, ProcessingFlags,
        SceneTree, SnapMode, Transform, WorldTransform,
    };
    pub use crate::settings::EngineSettings;
    pub use crate::systems::EngineSystem;
    pub use glam::Vec2;
}
