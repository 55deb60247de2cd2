//! Shared read-only assets
//!
//! Models, textures and audio clips are created once per process and shared by
//! every game instance. The cache hands out opaque handles; the host resolves
//! them to real engine resources.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Kind of shared asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Model,
    Texture,
    AudioClip,
}

/// Opaque handle to a cached asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetHandle(pub u32);

/// A cached asset entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetEntry {
    pub kind: AssetKind,
    pub key: String,
}

/// Get-or-create cache keyed by (kind, key)
#[derive(Debug, Default)]
pub struct AssetCache {
    handles: HashMap<(AssetKind, String), AssetHandle>,
    entries: Vec<AssetEntry>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an asset, creating it on first use. Idempotent per (kind, key).
    pub fn get_or_create(&mut self, kind: AssetKind, key: &str) -> AssetHandle {
        if let Some(handle) = self.handles.get(&(kind, key.to_string())) {
            return *handle;
        }

        let handle = AssetHandle(self.entries.len() as u32);
        self.entries.push(AssetEntry {
            kind,
            key: key.to_string(),
        });
        self.handles.insert((kind, key.to_string()), handle);
        log::debug!("Created {:?} asset {} -> {:?}", kind, key, handle);
        handle
    }

    pub fn model(&mut self, key: &str) -> AssetHandle {
        self.get_or_create(AssetKind::Model, key)
    }

    pub fn texture(&mut self, key: &str) -> AssetHandle {
        self.get_or_create(AssetKind::Texture, key)
    }

    pub fn clip(&mut self, key: &str) -> AssetHandle {
        self.get_or_create(AssetKind::AudioClip, key)
    }

    /// Resolve a handle back to its entry
    pub fn entry(&self, handle: AssetHandle) -> Option<&AssetEntry> {
        self.entries.get(handle.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut cache = AssetCache::new();
        let a = cache.texture("Materials/PlatypusPlatoon/Bush.png");
        let b = cache.texture("Materials/PlatypusPlatoon/Bush.png");
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_same_key_different_kind_is_distinct() {
        let mut cache = AssetCache::new();
        let model = cache.model("Disk");
        let clip = cache.clip("Disk");
        assert_ne!(model, clip);

        let entry = cache.entry(clip).unwrap();
        assert_eq!(entry.kind, AssetKind::AudioClip);
        assert_eq!(entry.key, "Disk");
    }
}
