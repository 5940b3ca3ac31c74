//! Texture metadata provider.
//!
//! The core never loads assets. Components hold opaque [`TextureHandle`]s and
//! size metadata; an [`AssetProvider`] resolves handles for renderers.

use glam::UVec2;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::errors::{GroveError, Result};

slotmap::new_key_type! {
    /// Opaque texture handle.
    pub struct TextureHandle;
}

/// Size metadata of a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    pub name: String,
    pub size: UVec2,
}

/// Read access to texture metadata.
pub trait AssetProvider: Send + Sync {
    /// Handle of a texture by name; fails if it is unknown.
    fn get_texture(&self, name: &str) -> Result<TextureHandle> {
        self.try_get_texture(name)
            .ok_or_else(|| GroveError::TextureNotFound(name.to_owned()))
    }

    /// Handle of a texture by name, if known.
    fn try_get_texture(&self, name: &str) -> Option<TextureHandle>;

    /// Metadata of a handle.
    fn texture_info(&self, handle: TextureHandle) -> Option<&TextureInfo>;
}

/// In-memory texture table.
#[derive(Debug, Default)]
pub struct TextureRegistry {
    textures: SlotMap<TextureHandle, TextureInfo>,
    by_name: FxHashMap<String, TextureHandle>,
}

impl TextureRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a texture; re-registering a name updates its size.
    pub fn register(&mut self, name: impl Into<String>, size: UVec2) -> TextureHandle {
        let name = name.into();
        if let Some(&handle) = self.by_name.get(&name) {
            if let Some(info) = self.textures.get_mut(handle) {
                info.size = size;
            }
            return handle;
        }
        let handle = self.textures.insert(TextureInfo {
            name: name.clone(),
            size,
        });
        self.by_name.insert(name, handle);
        handle
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl AssetProvider for TextureRegistry {
    fn try_get_texture(&self, name: &str) -> Option<TextureHandle> {
        self.by_name.get(name).copied()
    }

    fn texture_info(&self, handle: TextureHandle) -> Option<&TextureInfo> {
        self.textures.get(handle)
    }
}
