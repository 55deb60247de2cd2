//! Platform abstraction layer
//!
//! The engine that renders the arcade owns meshes, textures and audio. The
//! simulation only tells it what changed:
//! - `Host::apply` for effects (visibility, text, textures, sounds)
//! - `Host::sync` for transforms written by motions
//!
//! `HeadlessHost` keeps the resulting scene state in memory. The binary and
//! the scene tests run against it.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec3;

use crate::assets::AssetHandle;
use crate::sim::{Effect, EntityId, PivotEntity};

/// Engine-side half of the game instances
pub trait Host {
    /// Apply one side effect to a host entity
    fn apply(&mut self, effect: &Effect);

    /// Copy an entity's simulated transform to its host object
    fn sync(&mut self, entity: &PivotEntity);
}

/// Last synced transform of one host object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub yaw: f32,
    pub scale: Vec3,
    pub visible: bool,
}

/// In-memory host with no rendering or audio
#[derive(Debug, Default)]
pub struct HeadlessHost {
    pub transforms: BTreeMap<EntityId, Transform>,
    pub texts: BTreeMap<EntityId, String>,
    pub textures: BTreeMap<EntityId, AssetHandle>,
    /// Looping clips per emitter
    pub loops: BTreeSet<(EntityId, AssetHandle)>,
    /// One-shot sounds played so far
    pub sounds_played: usize,
    pub effects_applied: usize,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(&self, id: EntityId) -> Option<&Transform> {
        self.transforms.get(&id)
    }

    pub fn text(&self, id: EntityId) -> Option<&str> {
        self.texts.get(&id).map(String::as_str)
    }

    pub fn is_looping(&self, emitter: EntityId, clip: AssetHandle) -> bool {
        self.loops.contains(&(emitter, clip))
    }

    fn set_visible(&mut self, id: EntityId, visible: bool) {
        if let Some(t) = self.transforms.get_mut(&id) {
            t.visible = visible;
        }
    }
}

impl Host for HeadlessHost {
    fn apply(&mut self, effect: &Effect) {
        match effect {
            Effect::Show(id) => self.set_visible(*id, true),
            Effect::Hide(id) => self.set_visible(*id, false),
            Effect::SetText(id, text) => {
                self.texts.insert(*id, text.clone());
            }
            Effect::SetTexture(id, texture) => {
                self.textures.insert(*id, *texture);
            }
            Effect::PlaySound { .. } => self.sounds_played += 1,
            Effect::LoopSound { emitter, clip } => {
                self.loops.insert((*emitter, *clip));
            }
            Effect::StopSound { emitter, clip } => {
                self.loops.remove(&(*emitter, *clip));
            }
        }
        self.effects_applied += 1;
    }

    fn sync(&mut self, entity: &PivotEntity) {
        self.transforms.insert(
            entity.id,
            Transform {
                position: entity.position,
                yaw: entity.yaw,
                scale: entity.scale,
                visible: entity.visible,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{InstanceId, Origin};

    #[test]
    fn test_headless_host_tracks_scene_state() {
        let origin = Origin::new(Vec3::new(1.0, 0.0, 1.0), 90.0);
        let id = EntityId::new(InstanceId(3), 2);
        let entity = PivotEntity::new(id, &origin, Vec3::new(0.0, 1.0, 1.0));
        let clip = AssetHandle(4);

        let mut host = HeadlessHost::new();
        host.sync(&entity);
        host.apply(&Effect::Hide(id));
        host.apply(&Effect::SetText(id, "3".into()));
        host.apply(&Effect::LoopSound { emitter: id, clip });
        host.apply(&Effect::PlaySound { emitter: id, clip });

        let t = host.transform(id).unwrap();
        assert_eq!(t.position, entity.position);
        assert!(!t.visible);
        assert_eq!(host.text(id), Some("3"));
        assert!(host.is_looping(id, clip));
        assert_eq!(host.sounds_played, 1);

        host.apply(&Effect::StopSound { emitter: id, clip });
        assert!(!host.is_looping(id, clip));
        assert_eq!(host.effects_applied, 5);
    }
}
