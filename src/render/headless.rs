//! CPU backend that records every GPU operation.
//!
//! Buffers live in host memory and geometry resolution runs on the CPU
//! with the same rules as the WGSL kernel, so whole frames can be checked
//! without a device.

use super::backend::{BufferCounts, BufferSlot, DispatchSize, GpuBackend, TraceParams};
use crate::codec::{MeshRecord, Vertex, MESH_RECORD_SIZE, VERTEX_SIZE};
use crate::util::{Mat3, Vec3};

/// Texture array as last rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureArray {
    pub width: u32,
    pub height: u32,
    pub layers: u32,
    pub pixels: Vec<u8>,
}

/// One trace dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceCall {
    pub params: TraceParams,
    pub dispatch: DispatchSize,
}

/// Host-memory [`GpuBackend`].
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    buffers: [Vec<u8>; BufferSlot::COUNT],
    upload_counts: [u32; BufferSlot::COUNT],
    texture_array: Option<TextureArray>,
    texture_rebuilds: u32,
    resolves: Vec<(BufferCounts, DispatchSize)>,
    traces: Vec<TraceCall>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of `slot`.
    pub fn buffer(&self, slot: BufferSlot) -> &[u8] {
        &self.buffers[slot as usize]
    }

    /// How many times `slot` was uploaded to.
    pub fn upload_count(&self, slot: BufferSlot) -> u32 {
        self.upload_counts[slot as usize]
    }

    pub fn texture_array(&self) -> Option<&TextureArray> {
        self.texture_array.as_ref()
    }

    pub fn texture_rebuilds(&self) -> u32 {
        self.texture_rebuilds
    }

    /// Geometry resolution dispatches, oldest first.
    pub fn resolves(&self) -> &[(BufferCounts, DispatchSize)] {
        &self.resolves
    }

    /// Trace dispatches, oldest first.
    pub fn traces(&self) -> &[TraceCall] {
        &self.traces
    }

    /// Unified vertex buffer decoded.
    pub fn resolved_vertices(&self) -> Vec<Vertex> {
        self.buffer(BufferSlot::Vertices)
            .chunks_exact(VERTEX_SIZE)
            .filter_map(Vertex::from_bytes)
            .collect()
    }

    fn resolve_vertex(&self, index: u32, counts: &BufferCounts) -> Option<Vertex> {
        if index < counts.static_vertices {
            return vertex_at(self.buffer(BufferSlot::StaticVertices), index);
        }
        let local = index - counts.static_vertices;
        let vertex = vertex_at(self.buffer(BufferSlot::DynamicVertices), local)?;

        // Owning mesh: last dynamic record starting at or before `local`
        let meshes = self.buffer(BufferSlot::Meshes);
        let owner = (counts.static_meshes..counts.meshes)
            .filter_map(|i| mesh_at(meshes, i))
            .take_while(|m| m.vertex_offset <= local)
            .last()?;
        Some(transform_vertex(&vertex, &owner))
    }
}

fn vertex_at(bytes: &[u8], index: u32) -> Option<Vertex> {
    Vertex::from_bytes(bytes.get(index as usize * VERTEX_SIZE..)?)
}

fn mesh_at(bytes: &[u8], index: u32) -> Option<MeshRecord> {
    MeshRecord::from_bytes(bytes.get(index as usize * MESH_RECORD_SIZE..)?)
}

/// Position by the full matrix, normal and tangent by its upper 3x3.
fn transform_vertex(vertex: &Vertex, mesh: &MeshRecord) -> Vertex {
    let world = mesh.matrix();
    let basis = Mat3::from_mat4(world);
    let position = world.transform_point3(Vec3::from_slice(&vertex.position[..3]));
    let normal = (basis * Vec3::from_slice(&vertex.normal[..3])).normalize_or_zero();
    let tangent = (basis * Vec3::from_slice(&vertex.tangent[..3])).normalize_or_zero();

    Vertex {
        position: position.extend(vertex.position[3]).to_array(),
        normal: normal.extend(vertex.normal[3]).to_array(),
        tangent: tangent.extend(vertex.tangent[3]).to_array(),
        ..*vertex
    }
}

impl GpuBackend for HeadlessBackend {
    type Target = ();

    fn upload(&mut self, slot: BufferSlot, bytes: &[u8]) {
        let buffer = &mut self.buffers[slot as usize];
        buffer.clear();
        buffer.extend_from_slice(bytes);
        self.upload_counts[slot as usize] += 1;
    }

    fn allocate(&mut self, slot: BufferSlot, size: usize) {
        self.buffers[slot as usize].resize(size, 0);
    }

    fn rebuild_texture_array(&mut self, width: u32, height: u32, layers: u32, pixels: &[u8]) {
        self.texture_array = Some(TextureArray {
            width,
            height,
            layers,
            pixels: pixels.to_vec(),
        });
        self.texture_rebuilds += 1;
    }

    fn resolve_geometry(&mut self, counts: &BufferCounts, dispatch: DispatchSize) {
        let resolved: Vec<u8> = (0..counts.vertices)
            .flat_map(|i| self.resolve_vertex(i, counts).unwrap_or_default().to_bytes())
            .collect();
        self.buffers[BufferSlot::Vertices as usize] = resolved;
        self.resolves.push((*counts, dispatch));
    }

    fn trace(&mut self, _target: &(), params: &TraceParams, dispatch: DispatchSize) -> bool {
        self.traces.push(TraceCall {
            params: *params,
            dispatch,
        });
        true
    }
}
