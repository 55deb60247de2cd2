//! Pivot geometry for objects placed around a rotated game origin
//!
//! Every part of a game is authored as an offset from the instance origin in
//! the unrotated frame. Rotating the origin by yaw θ moves each part along its
//! orbit circle:
//! - radius: horizontal distance from the origin to the part (never changes)
//! - bearing: initial bearing of the offset minus θ
//!
//! Positions are always re-derived from the absolute angle, so applying a
//! rotation any number of times gives the same result.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::state::EntityId;
use super::trigger::TriggerZone;
use crate::assets::AssetHandle;
use crate::{bearing_degrees, distance_2d, horizontal, normalize_degrees, polar_offset, sum_vec3};

/// A game instance's fixed placement in the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub position: Vec3,
    /// Yaw in degrees
    pub yaw: f32,
    pub scale: Vec3,
}

impl Origin {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            yaw,
            scale: Vec3::ONE,
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// World position of an offset given in the unrotated frame
    pub fn to_world(&self, offset: Vec3) -> Vec3 {
        let parent = horizontal(self.position);
        let radius = distance_2d(parent, parent + horizontal(offset));
        let bearing = bearing_degrees(horizontal(offset)) - self.yaw;
        let corrected = polar_offset(bearing, radius);

        Vec3::new(
            self.position.x + corrected.x,
            self.position.y + offset.y,
            self.position.z + corrected.y,
        )
    }

    /// Re-express a point authored as `origin.position + offset` (ignoring
    /// rotation) in the rotated frame.
    pub fn corrected_point(&self, unrotated_world: Vec3) -> Vec3 {
        self.to_world(unrotated_world - self.position)
    }

    /// Offset in the unrotated frame of a world position (inverse of `to_world`)
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        let rel = world - self.position;
        let flat = horizontal(rel);
        let radius = flat.length();
        let theta = (bearing_degrees(flat) + self.yaw).to_radians();
        Vec3::new(radius * theta.cos(), rel.y, radius * theta.sin())
    }

    /// Rotate a local direction into the world frame
    pub fn to_world_dir(&self, dir: Vec3) -> Vec3 {
        rotate_horizontal(dir, -self.yaw)
    }

    /// Rotate a world direction into the local frame
    pub fn to_local_dir(&self, dir: Vec3) -> Vec3 {
        rotate_horizontal(dir, self.yaw)
    }
}

/// Rotate the (x, z) part of a vector by `degrees` (bearing convention)
fn rotate_horizontal(v: Vec3, degrees: f32) -> Vec3 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vec3::new(v.x * cos - v.z * sin, v.y, v.x * sin + v.z * cos)
}

/// A host entity positioned as an offset from its game's origin
#[derive(Debug, Clone)]
pub struct PivotEntity {
    pub id: EntityId,
    /// Offset from the origin in the unrotated frame
    pub offset: Vec3,
    /// Current world position
    pub position: Vec3,
    /// World yaw in degrees
    pub yaw: f32,
    /// Extra yaw on top of the origin's (e.g. side-facing score texts)
    pub local_yaw: f32,
    pub scale: Vec3,
    pub visible: bool,
    /// Mesh/texture the host attaches, if any
    pub asset: Option<AssetHandle>,
    /// Optional trigger capability
    pub zone: Option<TriggerZone>,
}

impl PivotEntity {
    /// Create an entity and place it for the origin's current rotation
    pub fn new(id: EntityId, origin: &Origin, offset: Vec3) -> Self {
        let mut entity = Self {
            id,
            offset,
            position: sum_vec3(origin.position, offset),
            yaw: 0.0,
            local_yaw: 0.0,
            scale: Vec3::ONE,
            visible: true,
            asset: None,
            zone: None,
        };
        entity.pivot_rotate(origin);
        entity
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_local_yaw(mut self, local_yaw: f32, origin: &Origin) -> Self {
        self.local_yaw = local_yaw;
        self.pivot_rotate(origin);
        self
    }

    pub fn with_asset(mut self, asset: AssetHandle) -> Self {
        self.asset = Some(asset);
        self
    }

    pub fn with_zone(mut self, zone: TriggerZone) -> Self {
        self.zone = Some(zone);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Horizontal orbit radius around the origin
    pub fn orbit_radius(&self) -> f32 {
        horizontal(self.offset).length()
    }

    /// Home position for the origin's rotation
    pub fn home(&self, origin: &Origin) -> Vec3 {
        origin.to_world(self.offset)
    }

    /// Place the entity on its orbit for the origin's rotation
    pub fn pivot_rotate(&mut self, origin: &Origin) {
        self.position = self.home(origin);
        self.yaw = normalize_degrees(origin.yaw + self.local_yaw);
    }

    /// Back to the home position (same as re-applying the pivot rotation)
    pub fn reset(&mut self, origin: &Origin) {
        self.pivot_rotate(origin);
    }

    /// Offset of the current position in the origin's unrotated frame
    pub fn local_position(&self, origin: &Origin) -> Vec3 {
        origin.to_local(self.position)
    }

    /// Slide along the tangent of the orbit circle.
    ///
    /// The base point is where the orbit crosses the rotated frame's forward
    /// (+z) axis; the entity ends up `distance` away from it along the
    /// tangent line, so repeated calls do not accumulate. Positive distances
    /// point towards the rotated local +x axis.
    pub fn move_along_tangent(&mut self, origin: &Origin, distance: f32) {
        let radius = self.orbit_radius();
        let base = polar_offset(90.0 - origin.yaw, radius);
        let axis = horizontal(origin.to_world_dir(Vec3::X));

        let direction = if base.x == 0.0 {
            // Radius line parallel to z: tangent runs along x
            Vec2::new(if axis.x >= 0.0 { 1.0 } else { -1.0 }, 0.0)
        } else if base.y == 0.0 {
            // Radius line parallel to x: tangent runs along z
            Vec2::new(0.0, if axis.y >= 0.0 { 1.0 } else { -1.0 })
        } else {
            let radial_slope = base.y / base.x;
            let tangent_slope = -1.0 / radial_slope;
            let step = (1.0 / (1.0 + tangent_slope * tangent_slope)).sqrt();
            let candidate = Vec2::new(step, tangent_slope * step);
            if candidate.dot(axis) < 0.0 { -candidate } else { candidate }
        };

        self.position = Vec3::new(
            origin.position.x + base.x + distance * direction.x,
            origin.position.y + self.offset.y,
            origin.position.z + base.y + distance * direction.y,
        );
    }
}
