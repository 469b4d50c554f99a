//! Buffer synchronization and GPU dispatch.
//!
//! ## Architecture
//! ```text
//! Scene ──traverse──> FrameData ──upload──> GpuBackend ──> resolve kernel ──> trace kernel
//!   │                     ▲                    ▲
//!   └─ static partition ──┘ (seeded)           └─ MaterialRegistry tables / texture array
//! ```
//!
//! [`Renderer`] is generic over [`GpuBackend`]. [`HeadlessBackend`] keeps
//! everything in host memory; `WgpuBackend` (feature `gpu`) drives a real
//! device.

mod backend;
mod camera;
mod frame;
mod headless;
mod renderer;
mod settings;
#[cfg(feature = "gpu")]
mod wgpu_backend;

pub use backend::{
    BufferCounts, BufferSlot, DispatchSize, GpuBackend, TraceParams, OUTPUT_IMAGE_BINDING,
    PARAMS_BINDING, SAMPLER_BINDING, TEXTURE_ARRAY_BINDING,
};
pub use camera::{Camera, CornerRays, FlyCamera};
pub use frame::FrameData;
pub use headless::{HeadlessBackend, TextureArray, TraceCall};
pub use renderer::Renderer;
pub use settings::Settings;
#[cfg(feature = "gpu")]
pub use wgpu_backend::WgpuBackend;
