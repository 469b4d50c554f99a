//! Mesh, material and light records.

use bytemuck::{Pod, Zeroable};

use super::{LIGHT_RECORD_SIZE, MATERIAL_RECORD_SIZE, MESH_RECORD_SIZE};
use crate::util::Mat4;

/// Number of texture slots per material.
pub const NR_MATERIAL_TEXTURES: usize = 6;

/// Per-mesh record (80 bytes).
///
/// `vertex_offset` indexes the partition the mesh lives in (static or
/// dynamic); `index_offset` indexes the unified index numbering where
/// dynamic indices follow the static ones.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshRecord {
    /// World matrix, column-major.
    pub transform: [f32; 16],
    pub vertex_offset: u32,
    pub index_offset: u32,
    pub index_count: u32,
    pub material_index: u32,
}

impl MeshRecord {
    pub fn new(
        transform: &Mat4,
        vertex_offset: u32,
        index_offset: u32,
        index_count: u32,
        material_index: u32,
    ) -> Self {
        Self {
            transform: transform.to_cols_array(),
            vertex_offset,
            index_offset,
            index_count,
            material_index,
        }
    }

    /// World matrix as glam type.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_cols_array(&self.transform)
    }

    #[inline]
    pub fn to_bytes(&self) -> [u8; MESH_RECORD_SIZE] {
        bytemuck::cast(*self)
    }

    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        bytemuck::try_pod_read_unaligned(bytes.get(..MESH_RECORD_SIZE)?).ok()
    }
}

/// Material record (80 bytes).
///
/// Texture slots are ordered albedo, F0, roughness, metalness, AO, normal;
/// -1 marks an empty slot.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialRecord {
    pub albedo: [f32; 3],
    pub _pad0: f32,
    pub f0: [f32; 3],
    pub _pad1: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub ao: f32,
    pub textures: [i32; NR_MATERIAL_TEXTURES],
    pub _pad2: [f32; 3],
}

impl MaterialRecord {
    #[inline]
    pub fn to_bytes(&self) -> [u8; MATERIAL_RECORD_SIZE] {
        bytemuck::cast(*self)
    }

    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        bytemuck::try_pod_read_unaligned(bytes.get(..MATERIAL_RECORD_SIZE)?).ok()
    }
}

/// Light record (48 bytes).
///
/// `direction` is only meaningful for directional lights and is zero
/// otherwise.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightRecord {
    pub position: [f32; 3],
    pub light_type: i32,
    pub direction: [f32; 3],
    pub visibility: i32,
    pub radiance: [f32; 3],
    pub ambient_multiplier: f32,
}

impl LightRecord {
    #[inline]
    pub fn to_bytes(&self) -> [u8; LIGHT_RECORD_SIZE] {
        bytemuck::cast(*self)
    }

    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        bytemuck::try_pod_read_unaligned(bytes.get(..LIGHT_RECORD_SIZE)?).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Vec3;

    fn read_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_ne_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn read_i32(bytes: &[u8], offset: usize) -> i32 {
        i32::from_ne_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn read_f32(bytes: &[u8], offset: usize) -> f32 {
        f32::from_ne_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn test_mesh_layout() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let bytes = MeshRecord::new(&m, 7, 11, 36, 2).to_bytes();
        // Column-major: translation sits in column 3 (floats 12..15)
        assert_eq!(read_f32(&bytes, 48), 1.0);
        assert_eq!(read_f32(&bytes, 52), 2.0);
        assert_eq!(read_f32(&bytes, 56), 3.0);
        assert_eq!(read_f32(&bytes, 60), 1.0);
        assert_eq!(read_u32(&bytes, 64), 7);
        assert_eq!(read_u32(&bytes, 68), 11);
        assert_eq!(read_u32(&bytes, 72), 36);
        assert_eq!(read_u32(&bytes, 76), 2);
    }

    #[test]
    fn test_mesh_roundtrip() {
        let m = Mat4::from_cols_array(&std::array::from_fn(|i| i as f32 * 0.5 - 3.0));
        let rec = MeshRecord::new(&m, u32::MAX, 0, 3, 9);
        let back = MeshRecord::from_bytes(&rec.to_bytes()).unwrap();
        assert_eq!(back, rec);
        assert_eq!(back.matrix(), m);
    }

    #[test]
    fn test_material_layout() {
        let rec = MaterialRecord {
            albedo: [0.1, 0.2, 0.3],
            _pad0: 0.0,
            f0: [0.4, 0.5, 0.6],
            _pad1: 0.0,
            roughness: 0.7,
            metalness: 0.8,
            ao: 0.9,
            textures: [0, -1, 2, -1, 4, 5],
            _pad2: [0.0; 3],
        };
        let bytes = rec.to_bytes();
        assert_eq!(read_f32(&bytes, 0), 0.1);
        assert_eq!(read_f32(&bytes, 8), 0.3);
        assert_eq!(read_f32(&bytes, 16), 0.4);
        assert_eq!(read_f32(&bytes, 32), 0.7);
        assert_eq!(read_f32(&bytes, 36), 0.8);
        assert_eq!(read_f32(&bytes, 40), 0.9);
        let slots: Vec<i32> = (0..6).map(|i| read_i32(&bytes, 44 + i * 4)).collect();
        assert_eq!(slots, vec![0, -1, 2, -1, 4, 5]);
        assert_eq!(&bytes[68..80], &[0u8; 12]);
        assert_eq!(MaterialRecord::from_bytes(&bytes), Some(rec));
    }

    #[test]
    fn test_light_layout() {
        let rec = LightRecord {
            position: [1.0, 2.0, 3.0],
            light_type: 1,
            direction: [0.0, -1.0, 0.0],
            visibility: 1,
            radiance: [4.0, 5.0, 6.0],
            ambient_multiplier: 0.25,
        };
        let bytes = rec.to_bytes();
        assert_eq!(read_f32(&bytes, 8), 3.0);
        assert_eq!(read_i32(&bytes, 12), 1);
        assert_eq!(read_f32(&bytes, 20), -1.0);
        assert_eq!(read_i32(&bytes, 28), 1);
        assert_eq!(read_f32(&bytes, 32), 4.0);
        assert_eq!(read_f32(&bytes, 44), 0.25);
        assert_eq!(LightRecord::from_bytes(&bytes), Some(rec));
    }

    #[test]
    fn test_to_bytes_matches_memory() {
        let mesh = MeshRecord::new(&Mat4::IDENTITY, 1, 2, 3, 4);
        assert_eq!(mesh.to_bytes().as_slice(), bytemuck::bytes_of(&mesh));
        assert_eq!(mesh.to_bytes().len(), MESH_RECORD_SIZE);

        let material = MaterialRecord::zeroed();
        assert_eq!(material.to_bytes().as_slice(), bytemuck::bytes_of(&material));
        assert_eq!(material.to_bytes().len(), MATERIAL_RECORD_SIZE);
    }

    #[test]
    fn test_short_input() {
        assert!(MeshRecord::from_bytes(&[0u8; 79]).is_none());
        assert!(MaterialRecord::from_bytes(&[]).is_none());
        assert!(LightRecord::from_bytes(&[0u8; 47]).is_none());
    }
}
