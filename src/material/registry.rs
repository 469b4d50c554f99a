//! Deduplicating material and texture tables.

use std::collections::HashMap;
use std::fmt;

use super::params::Material;
use super::texture::{ImageFileSource, TextureSource};
use crate::codec::{MATERIAL_RECORD_SIZE, NR_MATERIAL_TEXTURES};
use crate::render::Settings;
use crate::util::Error;

/// Index into the material table.
pub type MaterialIndex = u32;
/// Index into the texture array; [`NO_TEXTURE`] means absent.
pub type TextureIndex = i32;

/// Index of the built-in material every mesh without one falls back to.
pub const DEFAULT_MATERIAL_INDEX: MaterialIndex = 0;
/// Texture index of an empty slot.
pub const NO_TEXTURE: TextureIndex = -1;

/// Default atlas layer size.
const DEFAULT_TEXTURE_SIZE: u32 = 512;

/// Owns the encoded material table and the RGBA8 texture atlas.
///
/// Indices are handed out in first-seen order and never change for the
/// lifetime of the registry. Material index 0 is the built-in default
/// material; texture index -1 means "no texture".
pub struct MaterialRegistry {
    texture_width: u32,
    texture_height: u32,

    /// Encoded [`crate::codec::MaterialRecord`]s, default material first.
    materials: Vec<u8>,
    material_name_to_index: HashMap<String, MaterialIndex>,

    /// Atlas layers, each exactly `bytes_per_image()` long.
    textures: Vec<u8>,
    texture_count: u32,
    texture_path_to_index: HashMap<String, TextureIndex>,

    source: Box<dyn TextureSource>,
}

impl MaterialRegistry {
    /// Registry loading textures from disk at `width` x `height`.
    pub fn new(texture_width: u32, texture_height: u32) -> Self {
        Self::with_source(texture_width, texture_height, ImageFileSource::default())
    }

    /// Disk-backed registry sized to the configured atlas layers.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.texture_width, settings.texture_height)
    }

    /// Registry with a custom texture source.
    pub fn with_source(
        texture_width: u32,
        texture_height: u32,
        source: impl TextureSource + 'static,
    ) -> Self {
        let default_material = Material::default();
        let materials = default_material.encode(&[NO_TEXTURE; NR_MATERIAL_TEXTURES]).to_vec();

        Self {
            texture_width,
            texture_height,
            materials,
            material_name_to_index: HashMap::new(),
            textures: Vec::new(),
            texture_count: 0,
            texture_path_to_index: HashMap::new(),
            source: Box::new(source),
        }
    }

    /// Index of `material`, registering it on first sight.
    ///
    /// `None` maps to [`DEFAULT_MATERIAL_INDEX`] without registering
    /// anything. A known name returns the cached index without looking at
    /// the material's fields again.
    pub fn get_material_index(&mut self, material: Option<&Material>) -> MaterialIndex {
        let Some(material) = material else {
            return DEFAULT_MATERIAL_INDEX;
        };

        if let Some(&index) = self.material_name_to_index.get(material.name()) {
            return index;
        }

        let mut texture_indices = [NO_TEXTURE; NR_MATERIAL_TEXTURES];
        for (slot, path) in texture_indices.iter_mut().zip(&material.texture_paths) {
            *slot = self.get_texture_index(path);
        }

        self.materials.extend_from_slice(&material.encode(&texture_indices));
        let index = self.material_count() - 1;
        self.material_name_to_index.insert(material.name().to_string(), index);

        tracing::debug!(name = material.name(), index, ?texture_indices, "registered material");
        index
    }

    /// Index of the texture at `path`, loading it on first sight.
    ///
    /// An empty path is [`NO_TEXTURE`] and is never registered. Load
    /// failures still consume an index; the layer is left transparent
    /// black so the rest of the scene keeps rendering.
    pub fn get_texture_index(&mut self, path: &str) -> TextureIndex {
        if path.is_empty() {
            return NO_TEXTURE;
        }

        if let Some(&index) = self.texture_path_to_index.get(path) {
            return index;
        }

        let pixels = self.acquire(path);
        self.textures.extend_from_slice(&pixels);

        let index = self.texture_count as TextureIndex;
        self.texture_count += 1;
        self.texture_path_to_index.insert(path.to_string(), index);

        tracing::debug!(path, index, "registered texture");
        index
    }

    /// Pixels for one atlas layer, normalized to `bytes_per_image()`.
    fn acquire(&self, path: &str) -> Vec<u8> {
        let expected = self.bytes_per_image();

        match self.source.load_rgba8(path, self.texture_width, self.texture_height) {
            Ok(mut pixels) => {
                if pixels.len() != expected {
                    let err = Error::TextureSize { expected, actual: pixels.len() };
                    tracing::warn!(path, %err, "texture resized to atlas layer");
                    pixels.resize(expected, 0);
                }
                pixels
            }
            Err(err) => {
                tracing::warn!(path, %err, "failed to load texture, using empty layer");
                vec![0; expected]
            }
        }
    }

    pub fn texture_width(&self) -> u32 {
        self.texture_width
    }

    pub fn texture_height(&self) -> u32 {
        self.texture_height
    }

    /// Bytes in one `texture_width * texture_height` RGBA8 layer.
    pub fn bytes_per_image(&self) -> usize {
        self.texture_width as usize * self.texture_height as usize * 4
    }

    /// Encoded material table (default material at index 0).
    pub fn materials(&self) -> &[u8] {
        &self.materials
    }

    /// Flat texture atlas, layer after layer.
    pub fn textures(&self) -> &[u8] {
        &self.textures
    }

    /// Number of material records, including the default material.
    pub fn material_count(&self) -> u32 {
        (self.materials.len() / MATERIAL_RECORD_SIZE) as u32
    }

    /// Number of atlas layers.
    pub fn texture_count(&self) -> u32 {
        self.texture_count
    }

    /// Cached index of a material name, if registered.
    pub fn material_index_of(&self, name: &str) -> Option<MaterialIndex> {
        self.material_name_to_index.get(name).copied()
    }

    /// Cached index of a texture path, if registered.
    pub fn texture_index_of(&self, path: &str) -> Option<TextureIndex> {
        self.texture_path_to_index.get(path).copied()
    }
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_TEXTURE_SIZE, DEFAULT_TEXTURE_SIZE)
    }
}

impl fmt::Debug for MaterialRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialRegistry")
            .field("texture_width", &self.texture_width)
            .field("texture_height", &self.texture_height)
            .field("material_count", &self.material_count())
            .field("texture_count", &self.texture_count)
            .finish_non_exhaustive()
    }
}
