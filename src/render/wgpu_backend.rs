//! wgpu implementation of [`GpuBackend`].
//!
//! Storage buffers grow but never shrink: a buffer is recreated only when
//! new contents exceed its capacity, and empty buffers are backed by a
//! small zeroed allocation since wgpu rejects zero-sized bindings.
//!
//! ## Usage
//! ```ignore
//! let backend = WgpuBackend::from_settings(device, queue, &settings)?;
//! let mut renderer = Renderer::new(backend, settings);
//! renderer.set_scene(scene);
//! renderer.set_camera(FlyCamera::default());
//! renderer.render(&output_view, width, height); // rgba32float storage view
//! ```

use std::path::Path;

use super::backend::{
    BufferCounts, BufferSlot, DispatchSize, GpuBackend, TraceParams, OUTPUT_IMAGE_BINDING,
    PARAMS_BINDING, SAMPLER_BINDING, TEXTURE_ARRAY_BINDING,
};
use super::settings::Settings;
use crate::util::{Error, Result};

/// Built-in geometry resolution kernel.
const RESOLVE_WGSL: &str = include_str!("shaders/resolve_vertices.wgsl");

/// Smallest storage allocation; also backs empty buffers.
const MIN_BUFFER_SIZE: u64 = 256;

/// Entry point expected in both kernels.
const ENTRY_POINT: &str = "main";

struct StorageBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
}

/// Device-backed buffers, texture array and the two compute pipelines.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,

    buffers: Vec<StorageBuffer>,
    params_buffer: wgpu::Buffer,
    params: TraceParams,

    texture_array: wgpu::Texture,
    texture_view: wgpu::TextureView,
    sampler: wgpu::Sampler,

    resolve_layout: wgpu::BindGroupLayout,
    resolve_pipeline: wgpu::ComputePipeline,
    // Dropped whenever a bound buffer is reallocated
    resolve_bind_group: Option<wgpu::BindGroup>,

    trace_layout: wgpu::BindGroupLayout,
    trace_pipeline: Option<wgpu::ComputePipeline>,
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn params_entry() -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: PARAMS_BINDING,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Allocation size for `size` bytes: at least [`MIN_BUFFER_SIZE`], copy aligned.
fn storage_capacity(size: u64) -> u64 {
    size.max(MIN_BUFFER_SIZE).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT)
}

/// New capacity when `requested` bytes no longer fit in `current`.
fn grown_capacity(current: u64, requested: u64) -> Option<u64> {
    (requested > current).then(|| storage_capacity(requested))
}

/// Bytes of `pixels` to copy into a `width` x `height` x `layers` array,
/// or `None` when there is nothing to copy or the data is too short.
fn texture_upload(width: u32, height: u32, layers: u32, pixels: &[u8]) -> Option<&[u8]> {
    let expected = width as usize * height as usize * 4 * layers as usize;
    if expected == 0 {
        return None;
    }
    pixels.get(..expected)
}

fn create_storage(device: &wgpu::Device, slot: BufferSlot, size: u64) -> StorageBuffer {
    let capacity = storage_capacity(size);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(slot.label()),
        size: capacity,
        usage: wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });
    StorageBuffer { buffer, capacity }
}

fn create_texture_array(device: &wgpu::Device, width: u32, height: u32, layers: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("material_textures"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: layers.max(1),
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("material_textures_view"),
        dimension: Some(wgpu::TextureViewDimension::D2Array),
        ..Default::default()
    });
    (texture, view)
}

impl WgpuBackend {
    /// Backend without a trace kernel; frames are synchronized but not traced.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let buffers = BufferSlot::ALL
            .iter()
            .map(|&slot| create_storage(&device, slot, MIN_BUFFER_SIZE))
            .collect();

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("kernel_params"),
            size: std::mem::size_of::<TraceParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let (texture_array, texture_view) = create_texture_array(&device, 1, 1, 1);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        let resolve_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("resolve_bind_group_layout"),
            entries: &[
                storage_entry(BufferSlot::Vertices.binding(), false),
                storage_entry(BufferSlot::StaticVertices.binding(), true),
                storage_entry(BufferSlot::DynamicVertices.binding(), true),
                storage_entry(BufferSlot::Meshes.binding(), true),
                params_entry(),
            ],
        });

        let mut trace_entries: Vec<wgpu::BindGroupLayoutEntry> = BufferSlot::ALL
            .iter()
            .map(|slot| storage_entry(slot.binding(), true))
            .collect();
        trace_entries.extend([
            wgpu::BindGroupLayoutEntry {
                binding: OUTPUT_IMAGE_BINDING,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::StorageTexture {
                    access: wgpu::StorageTextureAccess::WriteOnly,
                    format: wgpu::TextureFormat::Rgba32Float,
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: TEXTURE_ARRAY_BINDING,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2Array,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: SAMPLER_BINDING,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            params_entry(),
        ]);
        let trace_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("trace_bind_group_layout"),
            entries: &trace_entries,
        });

        let resolve_pipeline = Self::create_pipeline(&device, &resolve_layout, RESOLVE_WGSL, "resolve_vertices");

        Self {
            device,
            queue,
            buffers,
            params_buffer,
            params: TraceParams::default(),
            texture_array,
            texture_view,
            sampler,
            resolve_layout,
            resolve_pipeline,
            resolve_bind_group: None,
            trace_layout,
            trace_pipeline: None,
        }
    }

    /// Backend with the trace kernel named in `settings`, if any.
    pub fn from_settings(device: wgpu::Device, queue: wgpu::Queue, settings: &Settings) -> Result<Self> {
        let mut backend = Self::new(device, queue);
        if let Some(path) = &settings.trace_kernel {
            backend.load_trace_kernel(path)?;
        }
        Ok(backend)
    }

    /// Compile a WGSL trace kernel from a file.
    pub fn load_trace_kernel(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        tracing::info!(path = %path.display(), "loading trace kernel");
        self.set_trace_kernel(&source)
    }

    /// Compile a WGSL trace kernel with a `main` entry point.
    ///
    /// Parse and validation errors are returned instead of reaching the
    /// device's uncaptured error handler; the previous kernel stays bound.
    pub fn set_trace_kernel(&mut self, source: &str) -> Result<()> {
        if !source.contains(ENTRY_POINT) {
            return Err(Error::kernel(format!("trace kernel has no `{ENTRY_POINT}` entry point")));
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = Self::create_pipeline(&self.device, &self.trace_layout, source, "trace");
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            tracing::warn!(%err, "trace kernel rejected");
            return Err(Error::kernel(err.to_string()));
        }

        self.trace_pipeline = Some(pipeline);
        Ok(())
    }

    pub fn has_trace_kernel(&self) -> bool {
        self.trace_pipeline.is_some()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Buffer backing `slot`.
    pub fn buffer(&self, slot: BufferSlot) -> &wgpu::Buffer {
        &self.buffers[slot as usize].buffer
    }

    pub fn texture_array(&self) -> &wgpu::Texture {
        &self.texture_array
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        source: &str,
        label: &str,
    ) -> wgpu::ComputePipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[layout],
            push_constant_ranges: &[],
        });
        device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some(ENTRY_POINT),
            compilation_options: Default::default(),
            cache: None,
        })
    }

    /// Grow `slot` to hold `size` bytes, dropping stale bind groups.
    fn reserve(&mut self, slot: BufferSlot, size: u64) {
        let Some(capacity) = grown_capacity(self.buffers[slot as usize].capacity, size) else {
            return;
        };
        tracing::debug!(slot = slot.label(), size, capacity, "growing storage buffer");
        self.buffers[slot as usize] = create_storage(&self.device, slot, capacity);
        self.resolve_bind_group = None;
    }

    fn write_params(&mut self) {
        self.queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&self.params));
    }

    fn ensure_resolve_bind_group(&mut self) {
        if self.resolve_bind_group.is_some() {
            return;
        }
        let entry = |slot: BufferSlot| wgpu::BindGroupEntry {
            binding: slot.binding(),
            resource: self.buffers[slot as usize].buffer.as_entire_binding(),
        };
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("resolve_bind_group"),
            layout: &self.resolve_layout,
            entries: &[
                entry(BufferSlot::Vertices),
                entry(BufferSlot::StaticVertices),
                entry(BufferSlot::DynamicVertices),
                entry(BufferSlot::Meshes),
                wgpu::BindGroupEntry {
                    binding: PARAMS_BINDING,
                    resource: self.params_buffer.as_entire_binding(),
                },
            ],
        });
        self.resolve_bind_group = Some(bind_group);
    }

    fn dispatch(&self, pipeline: &wgpu::ComputePipeline, bind_group: &wgpu::BindGroup, size: DispatchSize, label: &str) {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(label),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(size.x, size.y, size.z);
        }
        // Submissions on one queue execute in order
        self.queue.submit(Some(encoder.finish()));
    }
}

impl GpuBackend for WgpuBackend {
    type Target = wgpu::TextureView;

    fn upload(&mut self, slot: BufferSlot, bytes: &[u8]) {
        self.reserve(slot, bytes.len() as u64);
        if !bytes.is_empty() {
            self.queue.write_buffer(&self.buffers[slot as usize].buffer, 0, bytes);
        }
    }

    fn allocate(&mut self, slot: BufferSlot, size: usize) {
        self.reserve(slot, size as u64);
    }

    fn rebuild_texture_array(&mut self, width: u32, height: u32, layers: u32, pixels: &[u8]) {
        let (texture, view) = create_texture_array(&self.device, width, height, layers);
        if let Some(data) = texture_upload(width, height, layers, pixels) {
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(width * 4),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: layers,
                },
            );
        } else if layers > 0 {
            tracing::warn!(width, height, layers, actual = pixels.len(), "texture array data too short, left blank");
        }
        self.texture_array = texture;
        self.texture_view = view;
    }

    fn resolve_geometry(&mut self, counts: &BufferCounts, dispatch: DispatchSize) {
        self.params.counts = *counts;
        self.write_params();
        if counts.vertices == 0 {
            return;
        }
        self.ensure_resolve_bind_group();
        if let Some(bind_group) = &self.resolve_bind_group {
            self.dispatch(&self.resolve_pipeline, bind_group, dispatch, "resolve_vertices");
        }
    }

    fn trace(&mut self, target: &wgpu::TextureView, params: &TraceParams, dispatch: DispatchSize) -> bool {
        if self.trace_pipeline.is_none() {
            return false;
        }
        self.params = *params;
        self.write_params();

        let mut entries: Vec<wgpu::BindGroupEntry> = self
            .buffers
            .iter()
            .zip(BufferSlot::ALL)
            .map(|(storage, slot)| wgpu::BindGroupEntry {
                binding: slot.binding(),
                resource: storage.buffer.as_entire_binding(),
            })
            .collect();
        entries.extend([
            wgpu::BindGroupEntry {
                binding: OUTPUT_IMAGE_BINDING,
                resource: wgpu::BindingResource::TextureView(target),
            },
            wgpu::BindGroupEntry {
                binding: TEXTURE_ARRAY_BINDING,
                resource: wgpu::BindingResource::TextureView(&self.texture_view),
            },
            wgpu::BindGroupEntry {
                binding: SAMPLER_BINDING,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            },
            wgpu::BindGroupEntry {
                binding: PARAMS_BINDING,
                resource: self.params_buffer.as_entire_binding(),
            },
        ]);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("trace_bind_group"),
            layout: &self.trace_layout,
            entries: &entries,
        });

        let Some(pipeline) = &self.trace_pipeline else {
            return false;
        };
        self.dispatch(pipeline, &bind_group, dispatch, "trace");
        true
    }
}
