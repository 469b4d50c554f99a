//! Scene root with its frozen static partition.

use super::mesh::SharedMesh;
use super::node::Node;
use crate::codec::{vertices_bytes, MESH_RECORD_SIZE, VERTEX_SIZE};
use crate::material::MaterialRegistry;
use crate::render::Settings;
use crate::util::Mat4;

/// Root of a renderable hierarchy.
///
/// Wraps a [`Node`] instead of being one, so a scene can never end up as
/// another node's child. Meshes given at construction are encoded once
/// into the static buffers with an identity transform; everything added
/// later through the node API is dynamic and re-encoded each frame.
#[derive(Debug)]
pub struct Scene {
    root: Node,
    registry: MaterialRegistry,
    static_vertices: Vec<u8>,
    static_indices: Vec<u32>,
    static_meshes: Vec<u8>,
}

impl Scene {
    /// Empty scene with a default registry.
    pub fn new() -> Self {
        Self::with_registry(MaterialRegistry::default(), &[])
    }

    /// Scene whose static partition holds `meshes`.
    pub fn with_static_meshes(meshes: &[SharedMesh]) -> Self {
        Self::with_registry(MaterialRegistry::default(), meshes)
    }

    /// Scene whose registry uses the configured texture size.
    pub fn from_settings(settings: &Settings, meshes: &[SharedMesh]) -> Self {
        Self::with_registry(MaterialRegistry::from_settings(settings), meshes)
    }

    /// Scene with an explicit registry, freezing `meshes` as static.
    #[tracing::instrument(skip_all, fields(static_meshes = meshes.len()))]
    pub fn with_registry(mut registry: MaterialRegistry, meshes: &[SharedMesh]) -> Self {
        let mut static_vertices = Vec::new();
        let mut static_indices = Vec::new();
        let mut static_meshes = Vec::with_capacity(meshes.len() * MESH_RECORD_SIZE);

        for handle in meshes {
            let mesh = handle.read();
            let vertex_offset = (static_vertices.len() / VERTEX_SIZE) as u32;
            let index_offset = static_indices.len() as u32;

            static_indices.extend_from_slice(mesh.indices());
            static_vertices.extend_from_slice(vertices_bytes(mesh.vertices()));

            let material_index = registry.get_material_index(mesh.material().map(|m| m.as_ref()));
            static_meshes.extend_from_slice(&mesh.encode(
                &Mat4::IDENTITY,
                vertex_offset,
                index_offset,
                material_index,
            ));
        }

        tracing::debug!(
            vertices = static_vertices.len() / VERTEX_SIZE,
            indices = static_indices.len(),
            "froze static partition"
        );

        Self {
            root: Node::named("Scene"),
            registry,
            static_vertices,
            static_indices,
            static_meshes,
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Append a dynamic child node to the root.
    pub fn add_node(&mut self, node: Node) -> usize {
        self.root.add_node(node)
    }

    /// Append a dynamic mesh to the root.
    pub fn add_mesh(&mut self, mesh: SharedMesh) -> usize {
        self.root.add_mesh(mesh)
    }

    pub fn registry(&self) -> &MaterialRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MaterialRegistry {
        &mut self.registry
    }

    /// Encoded static vertices.
    pub fn static_vertices(&self) -> &[u8] {
        &self.static_vertices
    }

    pub fn static_indices(&self) -> &[u32] {
        &self.static_indices
    }

    /// Encoded static mesh records.
    pub fn static_meshes(&self) -> &[u8] {
        &self.static_meshes
    }

    pub fn static_vertex_count(&self) -> u32 {
        (self.static_vertices.len() / VERTEX_SIZE) as u32
    }

    pub fn static_index_count(&self) -> u32 {
        self.static_indices.len() as u32
    }

    pub fn static_mesh_count(&self) -> u32 {
        (self.static_meshes.len() / MESH_RECORD_SIZE) as u32
    }

    /// Tree for reading alongside the registry for writing, as traversal needs.
    pub(crate) fn split_mut(&mut self) -> (&Node, &mut MaterialRegistry) {
        (&self.root, &mut self.registry)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
