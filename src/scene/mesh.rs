//! Triangle meshes.

use std::ops::Range;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::codec::{MeshRecord, Vertex, MESH_RECORD_SIZE};
use crate::material::{Material, MaterialIndex};
use crate::util::Mat4;

/// Mesh handle shared between nodes.
pub type SharedMesh = Arc<RwLock<Mesh>>;

/// Indexed triangle mesh with an optional material.
///
/// A mesh without a material renders with the registry's default material.
#[derive(Debug, Clone)]
pub struct Mesh {
    name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    material: Option<Arc<Material>>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>, material: Option<Arc<Material>>) -> Self {
        Self {
            name: "Mesh".to_string(),
            vertices,
            indices,
            material,
        }
    }

    /// Mesh with no geometry yet.
    pub fn empty(material: Option<Arc<Material>>) -> Self {
        Self::new(Vec::new(), Vec::new(), material)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Wrap in a shared handle.
    pub fn into_shared(self) -> SharedMesh {
        Arc::new(RwLock::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn material(&self) -> Option<&Arc<Material>> {
        self.material.as_ref()
    }

    pub fn set_material(&mut self, material: Option<Arc<Material>>) {
        self.material = material;
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Insert vertices before `at` (clamped to the end).
    pub fn insert_vertices(&mut self, vertices: &[Vertex], at: usize) {
        let at = at.min(self.vertices.len());
        self.vertices.splice(at..at, vertices.iter().copied());
    }

    /// Remove the vertices in `range` (clamped to the mesh).
    pub fn erase_vertices(&mut self, range: Range<usize>) {
        let range = clamp_range(range, self.vertices.len());
        self.vertices.drain(range);
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Insert indices before `at` (clamped to the end).
    pub fn insert_indices(&mut self, indices: &[u32], at: usize) {
        let at = at.min(self.indices.len());
        self.indices.splice(at..at, indices.iter().copied());
    }

    /// Remove the indices in `range` (clamped to the mesh).
    pub fn erase_indices(&mut self, range: Range<usize>) {
        let range = clamp_range(range, self.indices.len());
        self.indices.drain(range);
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Mesh record for one occurrence of this mesh.
    pub fn record(
        &self,
        transform: &Mat4,
        vertex_offset: u32,
        index_offset: u32,
        material_index: MaterialIndex,
    ) -> MeshRecord {
        MeshRecord::new(transform, vertex_offset, index_offset, self.index_count(), material_index)
    }

    /// Encoded mesh record for one occurrence of this mesh.
    pub fn encode(
        &self,
        transform: &Mat4,
        vertex_offset: u32,
        index_offset: u32,
        material_index: MaterialIndex,
    ) -> [u8; MESH_RECORD_SIZE] {
        self.record(transform, vertex_offset, index_offset, material_index).to_bytes()
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::empty(None)
    }
}

fn clamp_range(range: Range<usize>, len: usize) -> Range<usize> {
    let end = range.end.min(len);
    let start = range.start.min(end);
    start..end
}
