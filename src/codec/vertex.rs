//! GPU vertex layout.

use bytemuck::{Pod, Zeroable};

use super::VERTEX_SIZE;
use crate::util::{Vec2, Vec3, Vec4};

/// Mesh vertex (64 bytes, matches the kernel `Vertex` struct).
///
/// `tangent.w` stores the bitangent sign so the kernel can rebuild the
/// bitangent as `cross(normal, tangent) * tangent.w`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 4],
    pub normal: [f32; 4],
    pub tangent: [f32; 4],
    pub tex_coords: [f32; 2],
    pub _pad: [f32; 2],
}

impl Vertex {
    /// Vertex without tangent information.
    pub fn new(position: Vec4, normal: Vec4, tex_coords: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            tangent: [0.0; 4],
            tex_coords: tex_coords.to_array(),
            _pad: [0.0; 2],
        }
    }

    /// Vertex at a point (w = 1) with a normal direction (w = 0).
    pub fn from_point(position: Vec3, normal: Vec3, tex_coords: Vec2) -> Self {
        Self::new(position.extend(1.0), normal.extend(0.0), tex_coords)
    }

    /// Vertex with a full tangent frame.
    ///
    /// Only the handedness of `bitangent` is kept: `tangent.w` becomes
    /// `sign(dot(cross(normal, tangent), bitangent))`.
    pub fn with_tangent_frame(
        position: Vec4,
        normal: Vec4,
        tangent: Vec4,
        bitangent: Vec4,
        tex_coords: Vec2,
    ) -> Self {
        let computed = normal.truncate().cross(tangent.truncate());
        let handedness = sign(computed.dot(bitangent.truncate()));
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            tangent: tangent.truncate().extend(handedness).to_array(),
            tex_coords: tex_coords.to_array(),
            _pad: [0.0; 2],
        }
    }

    /// Encode into the fixed 64-byte block.
    #[inline]
    pub fn to_bytes(&self) -> [u8; VERTEX_SIZE] {
        bytemuck::cast(*self)
    }

    /// Decode from the first 64 bytes of `bytes`.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        bytemuck::try_pod_read_unaligned(bytes.get(..VERTEX_SIZE)?).ok()
    }
}

/// Sign with zero mapped to zero (`signum` maps +0.0 to 1.0).
#[inline]
fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
