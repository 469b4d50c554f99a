//! Per-frame dynamic buffers and the traversal that fills them.

use crate::codec::{vertices_bytes, LIGHT_RECORD_SIZE, MESH_RECORD_SIZE, VERTEX_SIZE};
use crate::material::MaterialRegistry;
use crate::scene::{Node, NodeKind};
use crate::util::Mat4;

/// Dynamic partition rebuilt from the scene graph every frame.
///
/// `meshes` starts with the scene's static mesh records, followed by one
/// record per dynamic mesh occurrence in depth-first order.
#[derive(Debug, Default, Clone)]
pub struct FrameData {
    pub dynamic_vertices: Vec<u8>,
    pub dynamic_indices: Vec<u32>,
    pub meshes: Vec<u8>,
    pub lights: Vec<u8>,
}

impl FrameData {
    /// Clear everything and seed the mesh records with the static ones.
    pub fn reset(&mut self, static_meshes: &[u8]) {
        self.dynamic_vertices.clear();
        self.dynamic_indices.clear();
        self.lights.clear();
        self.meshes.clear();
        self.meshes.extend_from_slice(static_meshes);
    }

    /// Encode `node` and its subtree under the parent world transform.
    ///
    /// Index offsets are shifted by `static_index_count` because dynamic
    /// indices follow the static ones in the unified numbering.
    pub fn traverse(
        &mut self,
        node: &Node,
        parent: Mat4,
        registry: &mut MaterialRegistry,
        static_index_count: u32,
    ) {
        let world = parent * node.transformation();

        if let NodeKind::Light(light) = node.kind() {
            self.lights.extend_from_slice(&light.encode(&world));
        }

        for handle in node.child_meshes() {
            let mesh = handle.read();
            let vertex_offset = self.dynamic_vertex_count();
            let index_offset = self.dynamic_index_count() + static_index_count;
            let material_index = registry.get_material_index(mesh.material().map(|m| m.as_ref()));

            self.dynamic_vertices.extend_from_slice(vertices_bytes(mesh.vertices()));
            self.dynamic_indices.extend_from_slice(mesh.indices());
            self.meshes.extend_from_slice(&mesh.encode(
                &world,
                vertex_offset,
                index_offset,
                material_index,
            ));
        }

        for child in node.child_nodes() {
            self.traverse(child, world, registry, static_index_count);
        }
    }

    pub fn dynamic_vertex_count(&self) -> u32 {
        (self.dynamic_vertices.len() / VERTEX_SIZE) as u32
    }

    pub fn dynamic_index_count(&self) -> u32 {
        self.dynamic_indices.len() as u32
    }

    pub fn mesh_count(&self) -> u32 {
        (self.meshes.len() / MESH_RECORD_SIZE) as u32
    }

    pub fn light_count(&self) -> u32 {
        (self.lights.len() / LIGHT_RECORD_SIZE) as u32
    }
}
