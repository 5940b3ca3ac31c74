//! Engine Core Module
//!
//! This module contains [`Engine`], the frame driver of the runtime core. It
//! is a pure engine instance without any window or GPU logic, allowing it to
//! be driven by different frontends (desktop loops, tools, headless tests).
//!
//! # Frame order
//!
//! Every frame runs strictly in sequence on the calling thread:
//!
//! 1. sample the clock (or take an explicit delta) and fill the fixed-step budget
//! 2. `update` on every system (input first, by order)
//! 3. the tree's `process` pass
//! 4. for each consumable fixed step: the tree's `physics_process` pass,
//!    then `fixed_update` on every system (physics stepping)
//! 5. world-pose propagation
//! 6. `late_update` on every system (rendering), read-only
//!
//! The first error stops the frame and is returned to the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use grove::prelude::*;
//!
//! let mut engine = Engine::with_default_systems(EngineSettings::default())?;
//! let player = engine.tree.create_node(Node::new("Player"));
//! engine.tree.add_child(engine.tree.root(), player)?;
//!
//! engine.start()?;
//! loop {
//!     engine.frame()?;
//! }
//! ```

use std::sync::Arc;

use crate::assets::{AssetProvider, TextureRegistry};
use crate::errors::Result;
use crate::input::{Input, InputPublisher};
use crate::scene::{SceneTree, transform_system};
use crate::settings::EngineSettings;
use crate::systems::{
    AnimationSystem, BasicBackend, EngineSystem, InputSystem, PhysicsSystem, RenderSystem,
    SystemManager,
};
use crate::utils::Time;

/// Snapshot of the last completed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameState {
    /// Frames sampled so far, this one included
    pub frame: u64,
    /// Scaled delta, in seconds
    pub delta: f64,
    /// Clamped delta before scaling, in seconds
    pub unscaled_delta: f64,
    /// Total scaled time, in seconds
    pub elapsed: f64,
    /// Fixed steps consumed this frame
    pub fixed_steps: u32,
    /// Behaviors called by the `process` pass
    pub process_calls: usize,
    /// Behaviors called by all `physics_process` passes
    pub physics_calls: usize,
    /// World poses recomposed by propagation
    pub poses_refreshed: usize,
}

/// The core engine instance that drives the tree and the subsystems.
///
/// # Lifecycle
///
/// 1. Create with [`Engine::new`] or [`Engine::with_default_systems`]
/// 2. Register systems with [`Engine::add_system`]
/// 3. [`start`](Self::start) binds services and initializes systems
/// 4. Run frames with [`frame`](Self::frame) or
///    [`frame_with_delta`](Self::frame_with_delta)
/// 5. [`stop`](Self::stop) shuts systems down in reverse order and unbinds
///    services
pub struct Engine {
    pub tree: SceneTree,
    systems: SystemManager,
    time: Time,
    settings: EngineSettings,
    assets: Arc<dyn AssetProvider>,
    running: bool,
    last_frame: FrameState,
}

impl Engine {
    /// Creates an engine without systems.
    pub fn new(settings: EngineSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            tree: SceneTree::new(),
            systems: SystemManager::new(),
            time: Time::new(settings.time),
            settings,
            assets: Arc::new(TextureRegistry::new()),
            running: false,
            last_frame: FrameState::default(),
        })
    }

    /// Creates an engine with the built-in input, animation, physics
    /// (basic backend) and render (recording backend) systems.
    pub fn with_default_systems(settings: EngineSettings) -> Result<Self> {
        let capacity = settings.input.event_capacity;
        let gravity = settings.physics.gravity;
        let mut engine = Self::new(settings)?;
        engine.add_system(InputSystem::new(capacity))?;
        engine.add_system(AnimationSystem)?;
        engine.add_system(PhysicsSystem::new(BasicBackend, gravity))?;
        engine.add_system(RenderSystem::default())?;
        Ok(engine)
    }

    /// Replaces the asset provider bound on start.
    #[must_use]
    pub fn with_assets(mut self, assets: Arc<dyn AssetProvider>) -> Self {
        self.assets = assets;
        self
    }

    /// Registers a system; only allowed before [`start`](Self::start).
    pub fn add_system(&mut self, system: impl EngineSystem) -> Result<()> {
        self.systems.add(Box::new(system))
    }

    #[must_use]
    pub fn system<T: EngineSystem>(&self) -> Option<&T> {
        self.systems.get::<T>()
    }

    pub fn system_mut<T: EngineSystem>(&mut self) -> Option<&mut T> {
        self.systems.get_mut::<T>()
    }

    #[must_use]
    pub fn systems(&self) -> &SystemManager {
        &self.systems
    }

    /// Publishing handle of the input system, if one is registered.
    #[must_use]
    pub fn input_publisher(&self) -> Option<InputPublisher> {
        self.system::<InputSystem>().map(InputSystem::publisher)
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn time_mut(&mut self) -> &mut Time {
        &mut self.time
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The last completed frame.
    #[must_use]
    pub fn last_frame(&self) -> FrameState {
        self.last_frame
    }

    /// Binds services and initializes systems in ascending order.
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }
        self.tree.services.bind_input(Input::new());
        self.tree.services.bind_assets(Arc::clone(&self.assets));

        if let Err(e) = self.systems.initialize_all(&mut self.tree) {
            self.unbind_services();
            return Err(e);
        }

        self.time.reset_baseline();
        self.running = true;
        log::info!("Engine started with {} systems", self.systems.len());
        Ok(())
    }

    /// Runs one frame using the wall clock. Starts the engine if needed.
    pub fn frame(&mut self) -> Result<FrameState> {
        self.ensure_started()?;
        self.time.tick();
        self.run_frame()
    }

    /// Runs one frame with an explicit raw delta in seconds. Starts the engine
    /// if needed.
    pub fn frame_with_delta(&mut self, raw_delta: f64) -> Result<FrameState> {
        self.ensure_started()?;
        self.time.advance(raw_delta);
        self.run_frame()
    }

    /// Shuts systems down in descending order and unbinds services.
    pub fn stop(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        let result = self.systems.shutdown_all(&mut self.tree);
        self.unbind_services();
        log::info!(
            "Engine stopped after {} frames ({:.2}s simulated)",
            self.time.frame_count,
            self.time.elapsed()
        );
        result
    }

    fn ensure_started(&mut self) -> Result<()> {
        if self.running { Ok(()) } else { self.start() }
    }

    fn unbind_services(&mut self) {
        self.tree.services.unbind_input();
        self.tree.services.unbind_assets();
    }

    fn run_frame(&mut self) -> Result<FrameState> {
        self.systems.update_all(&mut self.tree, &self.time)?;
        let process_calls = self.tree.process(self.time.dt_seconds())?;

        let fixed_delta = self.time.fixed_step() as f32;
        let mut fixed_steps = 0;
        let mut physics_calls = 0;
        while self.time.try_consume_fixed_step() {
            physics_calls += self.tree.physics_process(fixed_delta)?;
            self.systems.fixed_update_all(&mut self.tree, fixed_delta)?;
            fixed_steps += 1;
        }

        let poses_refreshed = transform_system::propagate(&self.tree);
        self.systems.late_update_all(&self.tree, &self.time)?;

        self.last_frame = FrameState {
            frame: self.time.frame_count,
            delta: self.time.delta(),
            unscaled_delta: self.time.unscaled_delta(),
            elapsed: self.time.elapsed(),
            fixed_steps,
            process_calls,
            physics_calls,
            poses_refreshed,
        };
        Ok(self.last_frame)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("tree", &self.tree)
            .field("systems", &self.systems)
            .field("running", &self.running)
            .field("last_frame", &self.last_frame)
            .finish_non_exhaustive()
    }
}
