//! Engine services reachable from the scene tree.
//!
//! Services are bound by the engine on start and unbound on stop. Lookups on
//! an unbound slot are contract violations and fail with
//! [`GroveError::ServiceUnbound`].

use std::sync::Arc;

use crate::assets::AssetProvider;
use crate::errors::{GroveError, Result};
use crate::input::Input;
use crate::scene::SceneTree;

#[derive(Default)]
pub struct Services {
    input: Option<Input>,
    assets: Option<Arc<dyn AssetProvider>>,
}

impl Services {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the input state, returning the previously bound one.
    pub fn bind_input(&mut self, input: Input) -> Option<Input> {
        self.input.replace(input)
    }

    pub fn unbind_input(&mut self) -> Option<Input> {
        self.input.take()
    }

    pub fn bind_assets(&mut self, assets: Arc<dyn AssetProvider>) -> Option<Arc<dyn AssetProvider>> {
        self.assets.replace(assets)
    }

    pub fn unbind_assets(&mut self) -> Option<Arc<dyn AssetProvider>> {
        self.assets.take()
    }

    #[must_use]
    pub fn input(&self) -> Option<&Input> {
        self.input.as_ref()
    }

    pub fn input_mut(&mut self) -> Option<&mut Input> {
        self.input.as_mut()
    }

    #[must_use]
    pub fn assets(&self) -> Option<&Arc<dyn AssetProvider>> {
        self.assets.as_ref()
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("input", &self.input.is_some())
            .field("assets", &self.assets.is_some())
            .finish()
    }
}

impl SceneTree {
    /// Bound input state.
    pub fn input(&self) -> Result<&Input> {
        self.services.input().ok_or(GroveError::ServiceUnbound("input"))
    }

    pub fn input_mut(&mut self) -> Result<&mut Input> {
        self.services
            .input_mut()
            .ok_or(GroveError::ServiceUnbound("input"))
    }

    /// Bound asset provider.
    pub fn assets(&self) -> Result<&dyn AssetProvider> {
        self.services
            .assets()
            .map(AsRef::as_ref)
            .ok_or(GroveError::ServiceUnbound("assets"))
    }
}
