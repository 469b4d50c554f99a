//! Device seam between the buffer synchronizer and the GPU.
//!
//! Binding layout shared by every kernel:
//!
//! ```text
//!  0  unified vertices     rw storage   (written by geometry resolution)
//!  1  static indices       storage
//!  2  dynamic indices      storage
//!  3  static vertices      storage
//!  4  dynamic vertices     storage
//!  5  mesh records         storage
//!  6  material records     storage
//!  7  light records        storage
//!  8  output image         storage texture, rgba32float
//!  9  material textures    2D array texture, rgba8unorm
//! 10  texture sampler
//! 11  kernel parameters    uniform (TraceParams)
//! ```

use bytemuck::{Pod, Zeroable};

use crate::util::round_up_pow2;

/// Storage buffers with fixed binding indices.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BufferSlot {
    Vertices = 0,
    StaticIndices = 1,
    DynamicIndices = 2,
    StaticVertices = 3,
    DynamicVertices = 4,
    Meshes = 5,
    Materials = 6,
    Lights = 7,
}

impl BufferSlot {
    pub const COUNT: usize = 8;

    pub const ALL: [BufferSlot; Self::COUNT] = [
        BufferSlot::Vertices,
        BufferSlot::StaticIndices,
        BufferSlot::DynamicIndices,
        BufferSlot::StaticVertices,
        BufferSlot::DynamicVertices,
        BufferSlot::Meshes,
        BufferSlot::Materials,
        BufferSlot::Lights,
    ];

    #[inline]
    pub const fn binding(self) -> u32 {
        self as u32
    }

    pub const fn label(self) -> &'static str {
        match self {
            BufferSlot::Vertices => "vertices",
            BufferSlot::StaticIndices => "static_indices",
            BufferSlot::DynamicIndices => "dynamic_indices",
            BufferSlot::StaticVertices => "static_vertices",
            BufferSlot::DynamicVertices => "dynamic_vertices",
            BufferSlot::Meshes => "meshes",
            BufferSlot::Materials => "materials",
            BufferSlot::Lights => "lights",
        }
    }
}

pub const OUTPUT_IMAGE_BINDING: u32 = 8;
pub const TEXTURE_ARRAY_BINDING: u32 = 9;
pub const SAMPLER_BINDING: u32 = 10;
pub const PARAMS_BINDING: u32 = 11;

/// Element counts of every published buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct BufferCounts {
    pub vertices: u32,
    pub static_vertices: u32,
    pub dynamic_vertices: u32,
    pub static_indices: u32,
    pub dynamic_indices: u32,
    pub static_meshes: u32,
    pub meshes: u32,
    pub materials: u32,
    pub lights: u32,
    pub _pad: [u32; 3],
}

/// Uniform block for both kernels (binding 11).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct TraceParams {
    /// Camera position; w unused.
    pub eye: [f32; 4],
    pub ray00: [f32; 4],
    pub ray10: [f32; 4],
    pub ray01: [f32; 4],
    pub ray11: [f32; 4],
    pub counts: BufferCounts,
    pub width: u32,
    pub height: u32,
    pub _pad: [u32; 2],
}

const _: () = assert!(std::mem::size_of::<BufferCounts>() == 48);
const _: () = assert!(std::mem::size_of::<TraceParams>() == 144);

/// Workgroup grid for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSize {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl DispatchSize {
    /// Grid for geometry resolution: `next_pow2(vertices) / rows + 1` by `rows`.
    pub fn resolve(total_vertices: u32, rows: u32) -> Self {
        let rows = rows.max(1);
        Self {
            x: round_up_pow2(total_vertices) / rows + 1,
            y: rows,
            z: 1,
        }
    }

    /// Grid for the trace pass over a `width` x `height` image.
    pub fn trace(width: u32, height: u32, workgroup: [u32; 2]) -> Self {
        Self {
            x: (round_up_pow2(width) / workgroup[0].max(1)).max(1),
            y: (round_up_pow2(height) / workgroup[1].max(1)).max(1),
            z: 1,
        }
    }

    pub fn invocations(&self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }
}

/// GPU operations the synchronizer needs.
///
/// Calls arrive in frame order: uploads and allocations, an optional
/// texture-array rebuild, geometry resolution, then at most one trace.
/// Implementations must keep the ordering visible to the kernels.
pub trait GpuBackend {
    /// Image the trace kernel writes into.
    type Target: ?Sized;

    /// Replace the contents of `slot` with `bytes`.
    fn upload(&mut self, slot: BufferSlot, bytes: &[u8]);

    /// Make `slot` hold at least `size` bytes; contents are undefined.
    fn allocate(&mut self, slot: BufferSlot, size: usize);

    /// Recreate the material texture array with `layers` layers.
    ///
    /// `pixels` holds `layers` tightly packed RGBA8 images.
    fn rebuild_texture_array(&mut self, width: u32, height: u32, layers: u32, pixels: &[u8]);

    /// Fill the unified vertex buffer from the static and dynamic partitions.
    fn resolve_geometry(&mut self, counts: &BufferCounts, dispatch: DispatchSize);

    /// Run the trace kernel. Returns false when no kernel is available.
    fn trace(&mut self, target: &Self::Target, params: &TraceParams, dispatch: DispatchSize) -> bool;
}
