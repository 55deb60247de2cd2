//! NeoArcadia - arcade mini-games hosted inside a larger 3D scene
//!
//! Core modules:
//! - `sim`: Engine-agnostic simulation (pivot geometry, timed motions, trigger zones, game state machines)
//! - `arcade`: Scene composition that places and drives many game instances
//! - `assets`: Shared read-only asset handles (get-or-create cache)
//! - `platform`: Host engine abstraction
//! - `tuning`: Data-driven game balance
//!
//! The horizontal plane is (x, z). Angles handed to the geometry helpers are
//! degrees, measured from +x towards +z.

pub mod arcade;
pub mod assets;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use arcade::{Arcade, Layout, MiniGame, RoundResult};
pub use tuning::Tuning;

use glam::{Vec2, Vec3};

/// Game configuration constants
pub mod consts {
    /// Host tick interval (the engine's frame callback runs at 30 Hz)
    pub const SIM_DT: f32 = 1.0 / 30.0;

    /// Polar offsets are rounded to this many parts per unit (3 decimals)
    pub const POLAR_PRECISION: f32 = 1000.0;

    /// Offsets shorter than this have no meaningful bearing
    pub const MIN_PIVOT_RADIUS: f32 = 1e-6;

    /// Collision layers (bit masks)
    pub const LAYER_DEFAULT: u32 = 1 << 0;
    pub const LAYER_DISK: u32 = 1 << 1;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Round to the fixed 3-decimal grid used by pivot offsets
#[inline]
pub fn round3(value: f32) -> f32 {
    (value * consts::POLAR_PRECISION).round() / consts::POLAR_PRECISION
}

/// Convert a polar offset (degrees, radius) to a horizontal (dx, dz) offset.
///
/// Both components are rounded to 3 decimals. Repeated pivot corrections are
/// always re-derived from absolute angles, and the rounding keeps the results
/// on a stable grid instead of accumulating float noise.
#[inline]
pub fn polar_offset(angle_degrees: f32, radius: f32) -> Vec2 {
    let theta = angle_degrees.to_radians();
    Vec2::new(round3(radius * theta.cos()), round3(radius * theta.sin()))
}

/// Bearing of a horizontal offset in degrees, in [0, 360).
///
/// A zero-length offset has no direction; it reports 0.
#[inline]
pub fn bearing_degrees(offset: Vec2) -> f32 {
    if !(offset.length() >= consts::MIN_PIVOT_RADIUS) {
        return 0.0;
    }
    normalize_degrees(offset.y.atan2(offset.x).to_degrees())
}

/// Euclidean distance between two horizontal-plane points
#[inline]
pub fn distance_2d(p1: Vec2, p2: Vec2) -> f32 {
    ((p2.x - p1.x).powi(2) + (p2.y - p1.y).powi(2)).sqrt()
}

/// Project a 3D point onto the horizontal plane as (x, z)
#[inline]
pub fn horizontal(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Component-wise sum
#[inline]
pub fn sum_vec3(v1: Vec3, v2: Vec3) -> Vec3 {
    Vec3::new(v1.x + v2.x, v1.y + v2.y, v1.z + v2.z)
}

/// Component-wise product (used to combine instance and part scales)
#[inline]
pub fn mul_vec3(v1: Vec3, v2: Vec3) -> Vec3 {
    Vec3::new(v1.x * v2.x, v1.y * v2.y, v1.z * v2.z)
}
