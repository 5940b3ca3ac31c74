//! Engine subsystems and their scheduler.
//!
//! An [`EngineSystem`] is a long-lived subsystem (input, animation, physics,
//! rendering) driven by the frame loop around the tree's own passes. The
//! [`SystemManager`] keeps systems sorted by [`EngineSystem::order`]; lower
//! orders run first everywhere except shutdown, which runs in reverse.

pub mod animation;
pub mod input;
pub mod physics;
pub mod render;

pub use animation::AnimationSystem;
pub use input::InputSystem;
pub use physics::{BasicBackend, PhysicsBackend, PhysicsSystem, StubBackend};
pub use render::{DrawCommand, DrawKind, RecordingBackend, RenderBackend, RenderSystem};

use std::any::Any;

use crate::errors::{GroveError, Result};
use crate::scene::SceneTree;
use crate::utils::Time;

/// Default execution orders of the built-in systems.
pub mod order {
    pub const INPUT: i32 = -100;
    pub const ANIMATION: i32 = -50;
    pub const PHYSICS: i32 = 0;
    pub const RENDER: i32 = 100;
}

/// A subsystem ticked by the frame loop.
///
/// Per frame the engine calls `update` before the tree's `process` pass,
/// `fixed_update` after each `physics_process` pass, and `late_update` once
/// the simulation for the frame is committed.
#[allow(unused_variables)]
pub trait EngineSystem: Any {
    /// Human-readable name for this system
    fn name(&self) -> &str;

    /// Execution-order key; lower runs first.
    fn order(&self) -> i32 {
        0
    }

    /// Called once when the engine starts.
    fn initialize(&mut self, tree: &mut SceneTree) -> Result<()> {
        Ok(())
    }

    /// Called once per frame, before the tree's `process` pass.
    fn update(&mut self, tree: &mut SceneTree, time: &Time) -> Result<()> {
        Ok(())
    }

    /// Called once per consumed fixed step, after `physics_process`.
    fn fixed_update(&mut self, tree: &mut SceneTree, fixed_delta: f32) -> Result<()> {
        Ok(())
    }

    /// Called once per frame after all simulation. Must not mutate the tree.
    fn late_update(&mut self, tree: &SceneTree, time: &Time) -> Result<()> {
        Ok(())
    }

    /// Called once when the engine stops, in reverse order.
    fn shutdown(&mut self, tree: &mut SceneTree) -> Result<()> {
        Ok(())
    }
}

/// Ordered list of engine systems.
#[derive(Default)]
pub struct SystemManager {
    systems: Vec<Box<dyn EngineSystem>>,
    started: bool,
}

impl SystemManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a system. Systems with equal order keep registration order.
    pub fn add(&mut self, system: Box<dyn EngineSystem>) -> Result<()> {
        if self.started {
            return Err(GroveError::SystemsStarted(system.name().to_owned()));
        }
        log::debug!("System registered: {} (order {})", system.name(), system.order());
        self.systems.push(system);
        self.systems.sort_by_key(|s| s.order());
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// System names in execution order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|s| s.name())
    }

    /// Initializes every system in ascending order.
    ///
    /// If one fails, the systems initialized before it are shut down in
    /// reverse and the error is returned.
    pub fn initialize_all(&mut self, tree: &mut SceneTree) -> Result<()> {
        if self.started {
            return Ok(());
        }
        for i in 0..self.systems.len() {
            if let Err(e) = self.systems[i].initialize(tree) {
                log::error!("System '{}' failed to initialize: {e}", self.systems[i].name());
                for system in self.systems[..i].iter_mut().rev() {
                    if let Err(shutdown_err) = system.shutdown(tree) {
                        log::warn!("System '{}' failed to shut down: {shutdown_err}", system.name());
                    }
                }
                return Err(e);
            }
        }
        self.started = true;
        Ok(())
    }

    pub fn update_all(&mut self, tree: &mut SceneTree, time: &Time) -> Result<()> {
        for system in &mut self.systems {
            system.update(tree, time)?;
        }
        Ok(())
    }

    pub fn fixed_update_all(&mut self, tree: &mut SceneTree, fixed_delta: f32) -> Result<()> {
        for system in &mut self.systems {
            system.fixed_update(tree, fixed_delta)?;
        }
        Ok(())
    }

    pub fn late_update_all(&mut self, tree: &SceneTree, time: &Time) -> Result<()> {
        for system in &mut self.systems {
            system.late_update(tree, time)?;
        }
        Ok(())
    }

    /// Shuts every system down in descending order.
    ///
    /// All systems get their shutdown call; the first error is returned.
    pub fn shutdown_all(&mut self, tree: &mut SceneTree) -> Result<()> {
        if !self.started {
            return Ok(());
        }
        self.started = false;
        let mut first_err = None;
        for system in self.systems.iter_mut().rev() {
            if let Err(e) = system.shutdown(tree) {
                log::warn!("System '{}' failed to shut down: {e}", system.name());
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// First registered system of type `T`.
    #[must_use]
    pub fn get<T: EngineSystem>(&self) -> Option<&T> {
        self.systems
            .iter()
            .find_map(|s| (&**s as &dyn Any).downcast_ref::<T>())
    }

    pub fn get_mut<T: EngineSystem>(&mut self) -> Option<&mut T> {
        self.systems
            .iter_mut()
            .find_map(|s| (&mut **s as &mut dyn Any).downcast_mut::<T>())
    }
}

impl std::fmt::Debug for SystemManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemManager")
            .field("systems", &self.names().collect::<Vec<_>>())
            .field("started", &self.started)
            .finish()
    }
}
