//! # raytrace-scene
//!
//! Scene graph to GPU buffer synchronization for a compute-shader raytracer.
//!
//! A mutable hierarchy of nodes, meshes, lights and materials is flattened
//! every frame into bit-exact storage buffers a compute kernel indexes
//! directly. Materials and textures are deduplicated into append-only
//! tables, geometry given at scene construction is frozen into a static
//! partition, and everything else is re-encoded per frame with index
//! offsets linked across both partitions.
//!
//! ## Modules
//!
//! - [`util`] - Errors and math helpers
//! - [`codec`] - Fixed-layout GPU records (vertex, mesh, material, light)
//! - [`material`] - Materials, texture sources and the deduplicating registry
//! - [`scene`] - Nodes, meshes, lights and the scene root
//! - [`render`] - Per-frame synchronizer, camera, settings and GPU backends
//!
//! ## Example
//!
//! ```ignore
//! use raytrace_scene::prelude::*;
//!
//! let floor = primitives::quad(None).into_shared();
//! let mut scene = Scene::with_static_meshes(&[floor]);
//! scene.add_node(Node::light(PointLight::default()).with_translation(Vec3::Y * 3.0));
//!
//! let mut renderer = Renderer::new(HeadlessBackend::new(), Settings::default());
//! renderer.set_scene(scene);
//! renderer.set_camera(FlyCamera::new(Vec3::new(0.0, 1.0, 4.0), 0.0, -10.0));
//! renderer.render(&(), 640, 480);
//! ```

pub mod util;
pub mod codec;
pub mod material;
pub mod scene;
pub mod render;

// Re-export commonly used types
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result, Mat4, Vec2, Vec3, Vec4};
    pub use crate::codec::Vertex;
    pub use crate::material::{Material, MaterialRegistry, TextureSlot};
    pub use crate::scene::{
        primitives, Light, Mesh, Node, NodeKind, PointLight, Scene, SharedMesh, SunLight, Visibility,
    };
    pub use crate::render::{Camera, FlyCamera, GpuBackend, HeadlessBackend, Renderer, Settings};
}
