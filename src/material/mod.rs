//! Materials, textures and their deduplicating registry.
//!
//! Materials are identified by name and textures by path. The
//! [`MaterialRegistry`] hands out stable indices in first-seen order and
//! owns the flat tables the GPU kernels index into.

mod params;
mod registry;
mod texture;

pub use params::{Material, TextureSlot, DEFAULT_MATERIAL_NAME};
pub use registry::{MaterialIndex, MaterialRegistry, TextureIndex, DEFAULT_MATERIAL_INDEX, NO_TEXTURE};
pub use texture::{ImageFileSource, TextureSource};
