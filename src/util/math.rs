//! Math type re-exports and transform helpers.
//!
//! Matrices are glam column-major `Mat4`, matching the GPU record layout
//! byte for byte.

pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

/// Compose a local transform in the fixed order translate, rotate X,
/// rotate Y, rotate Z, scale.
///
/// `rotation` holds Euler angles in radians. Each rotation is applied about
/// its own axis, so the result equals `T * Rx * Ry * Rz * S`.
#[inline]
pub fn compose_trs(translation: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_translation(translation)
        * Mat4::from_rotation_x(rotation.x)
        * Mat4::from_rotation_y(rotation.y)
        * Mat4::from_rotation_z(rotation.z)
        * Mat4::from_scale(scale)
}

/// Rounds up to the next power of two; 0 stays 0.
#[inline]
pub fn round_up_pow2(x: u32) -> u32 {
    if x == 0 {
        0
    } else {
        x.checked_next_power_of_two().unwrap_or(1 << 31)
    }
}
