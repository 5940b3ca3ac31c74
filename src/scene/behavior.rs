//! Node behaviors and the per-type processing override cache.
//!
//! A node's custom logic lives in a [`NodeBehavior`]. The scheduler only calls
//! `process`/`physics_process` on behaviors whose concrete type declares the
//! hook through [`NodeBehavior::hooks`]. That declaration is read once per
//! concrete type and memoized in a [`ProcessingOverrideCache`].

use std::any::{Any, TypeId};
use std::sync::{Arc, LazyLock};

use bitflags::bitflags;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::errors::Result;
use crate::scene::{NodeHandle, SceneTree};

bitflags! {
    /// Per-tick hooks a behavior type customizes.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ProcessingFlags: u8 {
        const PROCESS         = 1 << 0;
        const PHYSICS_PROCESS = 1 << 1;
    }
}

/// Custom logic attached to a node.
///
/// Every hook receives the owning tree and the node's handle. While a hook
/// runs the behavior is taken out of its node, so the hook may freely borrow
/// the tree mutably (including its own node).
///
/// Errors returned from hooks are contract violations; they abort the current
/// tree operation and propagate to the frame driver.
///
/// # Example
///
/// ```rust,ignore
/// struct Spinner { speed: f32 }
///
/// impl NodeBehavior for Spinner {
///     fn hooks(&self) -> ProcessingFlags {
///         ProcessingFlags::PROCESS
///     }
///
///     fn process(&mut self, tree: &mut SceneTree, node: NodeHandle, delta: f32) -> Result<()> {
///         tree.node_checked_mut(node)?.transform.rotate(self.speed * delta);
///         Ok(())
///     }
/// }
/// ```
#[allow(unused_variables)]
pub trait NodeBehavior: Any {
    /// Declares which per-tick hooks this type overrides.
    ///
    /// Queried once per concrete type; the answer must not depend on instance state.
    fn hooks(&self) -> ProcessingFlags {
        ProcessingFlags::empty()
    }

    /// Called when the node enters the tree, before `ready`.
    fn enter_tree(&mut self, tree: &mut SceneTree, node: NodeHandle) -> Result<()> {
        Ok(())
    }

    /// Called once per node lifetime, after the first `enter_tree`.
    fn ready(&mut self, tree: &mut SceneTree, node: NodeHandle) -> Result<()> {
        Ok(())
    }

    /// Called when the node leaves the tree, before it is unlinked.
    fn exit_tree(&mut self, tree: &mut SceneTree, node: NodeHandle) -> Result<()> {
        Ok(())
    }

    /// Variable-rate update.
    fn process(&mut self, tree: &mut SceneTree, node: NodeHandle, delta: f32) -> Result<()> {
        Ok(())
    }

    /// Fixed-rate update, once per consumed fixed step.
    fn physics_process(
        &mut self,
        tree: &mut SceneTree,
        node: NodeHandle,
        fixed_delta: f32,
    ) -> Result<()> {
        Ok(())
    }

    /// Human-readable type name for diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

static GLOBAL_CACHE: LazyLock<Arc<ProcessingOverrideCache>> =
    LazyLock::new(|| Arc::new(ProcessingOverrideCache::new()));

/// Memo of [`NodeBehavior::hooks`] per concrete behavior type.
///
/// Lookups of known types only take the shared read lock. The population
/// mutex is held strictly while a missing type is resolved, so each type's
/// `hooks` runs exactly once even with concurrent first lookups.
#[derive(Debug, Default)]
pub struct ProcessingOverrideCache {
    entries: RwLock<FxHashMap<TypeId, ProcessingFlags>>,
    populate: Mutex<()>,
}

impl ProcessingOverrideCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache shared by every tree that does not bring its own.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_CACHE)
    }

    /// Returns the processing flags of `behavior`'s concrete type.
    pub fn resolve(&self, behavior: &dyn NodeBehavior) -> ProcessingFlags {
        let type_id = (behavior as &dyn Any).type_id();
        if let Some(flags) = self.get(type_id) {
            return flags;
        }

        let _guard = self.populate.lock();
        if let Some(flags) = self.get(type_id) {
            return flags;
        }

        let flags = behavior.hooks();
        log::debug!(
            "Processing overrides for {}: {:?}",
            behavior.type_name(),
            flags
        );
        self.entries.write().insert(type_id, flags);
        flags
    }

    /// Cached flags for a type, if it was resolved before.
    #[must_use]
    pub fn get(&self, type_id: TypeId) -> Option<ProcessingFlags> {
        self.entries.read().get(&type_id).copied()
    }

    /// Number of resolved types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
