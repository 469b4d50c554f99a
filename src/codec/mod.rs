//! Fixed-layout binary records shared with the GPU kernels.
//!
//! Every record is a `#[repr(C)]` Pod struct whose size and field offsets
//! match the kernel-side structs exactly:
//!
//! ```text
//! Vertex    64 B  position(0) normal(16) tangent(32) uv(48) pad(56)
//! Mesh      80 B  matrix(0) vertex_offset(64) index_offset(68) index_count(72) material(76)
//! Material  80 B  albedo(0) f0(16) roughness(32) metalness(36) ao(40) textures(44) pad(68)
//! Light     48 B  position(0) type(12) direction(16) visibility(28) radiance(32) ambient(44)
//! ```
//!
//! Encoding is infallible and never validates: NaNs and other garbage
//! are written through untouched. Decoding returns `None` only when the
//! input slice is shorter than the record.

mod records;
mod vertex;

pub use records::{LightRecord, MaterialRecord, MeshRecord, NR_MATERIAL_TEXTURES};
pub use vertex::Vertex;

/// Size of an encoded [`Vertex`] in bytes.
pub const VERTEX_SIZE: usize = 64;
/// Size of an encoded [`MeshRecord`] in bytes.
pub const MESH_RECORD_SIZE: usize = 80;
/// Size of an encoded [`MaterialRecord`] in bytes.
pub const MATERIAL_RECORD_SIZE: usize = 80;
/// Size of an encoded [`LightRecord`] in bytes.
pub const LIGHT_RECORD_SIZE: usize = 48;
/// Size of one vertex index in bytes.
pub const INDEX_SIZE: usize = 4;

const _: () = assert!(std::mem::size_of::<Vertex>() == VERTEX_SIZE);
const _: () = assert!(std::mem::size_of::<MeshRecord>() == MESH_RECORD_SIZE);
const _: () = assert!(std::mem::size_of::<MaterialRecord>() == MATERIAL_RECORD_SIZE);
const _: () = assert!(std::mem::size_of::<LightRecord>() == LIGHT_RECORD_SIZE);

/// Vertex slice as raw bytes, ready for a storage buffer.
#[inline]
pub fn vertices_bytes(vertices: &[Vertex]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

/// Index slice as raw bytes, ready for a storage buffer.
#[inline]
pub fn indices_bytes(indices: &[u32]) -> &[u8] {
    bytemuck::cast_slice(indices)
}
