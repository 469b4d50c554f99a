//! PBR material description.

use crate::codec::{MaterialRecord, MATERIAL_RECORD_SIZE, NR_MATERIAL_TEXTURES};
use crate::util::Vec3;

/// Name of the built-in material stored at index 0.
pub const DEFAULT_MATERIAL_NAME: &str = "default_material";

/// Texture slot of a material, in record order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Albedo = 0,
    F0 = 1,
    Roughness = 2,
    Metalness = 3,
    AmbientOcclusion = 4,
    Normal = 5,
}

impl TextureSlot {
    /// All slots in record order.
    pub const ALL: [TextureSlot; NR_MATERIAL_TEXTURES] = [
        TextureSlot::Albedo,
        TextureSlot::F0,
        TextureSlot::Roughness,
        TextureSlot::Metalness,
        TextureSlot::AmbientOcclusion,
        TextureSlot::Normal,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Metal/roughness material.
///
/// The name is the material's identity: once a registry has seen a name,
/// later materials with the same name resolve to the first one's index
/// and their fields are never read.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    name: String,
    pub albedo: Vec3,
    /// Specular reflectance at normal incidence.
    pub f0: Vec3,
    pub roughness: f32,
    pub metalness: f32,
    pub ao: f32,
    /// Texture paths in [`TextureSlot`] order; empty means no texture.
    pub texture_paths: [String; NR_MATERIAL_TEXTURES],
}

impl Material {
    /// Material with default parameters (magenta dielectric).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            albedo: Vec3::new(1.0, 0.0, 1.0),
            f0: Vec3::splat(0.04),
            roughness: 0.5,
            metalness: 0.0,
            ao: 0.1,
            texture_paths: Default::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_albedo(mut self, albedo: Vec3) -> Self {
        self.albedo = albedo;
        self
    }

    pub fn with_f0(mut self, f0: Vec3) -> Self {
        self.f0 = f0;
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    pub fn with_metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness;
        self
    }

    pub fn with_ao(mut self, ao: f32) -> Self {
        self.ao = ao;
        self
    }

    pub fn with_texture(mut self, slot: TextureSlot, path: impl Into<String>) -> Self {
        self.set_texture(slot, path);
        self
    }

    pub fn set_texture(&mut self, slot: TextureSlot, path: impl Into<String>) {
        self.texture_paths[slot.index()] = path.into();
    }

    /// Texture path of a slot (empty if unset).
    pub fn texture(&self, slot: TextureSlot) -> &str {
        &self.texture_paths[slot.index()]
    }

    /// GPU record with already resolved texture indices.
    pub fn to_record(&self, texture_indices: &[i32; NR_MATERIAL_TEXTURES]) -> MaterialRecord {
        MaterialRecord {
            albedo: self.albedo.to_array(),
            _pad0: 0.0,
            f0: self.f0.to_array(),
            _pad1: 0.0,
            roughness: self.roughness,
            metalness: self.metalness,
            ao: self.ao,
            textures: *texture_indices,
            _pad2: [0.0; 3],
        }
    }

    /// Encode with resolved texture indices (same order as `texture_paths`).
    pub fn encode(&self, texture_indices: &[i32; NR_MATERIAL_TEXTURES]) -> [u8; MATERIAL_RECORD_SIZE] {
        self.to_record(texture_indices).to_bytes()
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(DEFAULT_MATERIAL_NAME)
    }
}
