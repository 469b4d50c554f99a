//! Scene-to-GPU buffer synchronizer.

use super::backend::{BufferCounts, BufferSlot, DispatchSize, GpuBackend, TraceParams};
use super::camera::Camera;
use super::frame::FrameData;
use super::settings::Settings;
use crate::codec::{indices_bytes, MATERIAL_RECORD_SIZE, VERTEX_SIZE};
use crate::scene::{Scene, SharedMesh};
use crate::util::Mat4;

/// Owns the bound scene and camera and republishes the scene to a
/// [`GpuBackend`] every frame.
///
/// ## Usage
/// ```ignore
/// let mut renderer = Renderer::new(HeadlessBackend::new(), Settings::default());
/// renderer.set_scene(scene);
/// renderer.set_camera(FlyCamera::default());
/// renderer.render(&(), 800, 600);
/// ```
pub struct Renderer<B: GpuBackend> {
    backend: B,
    settings: Settings,
    scene: Option<Scene>,
    camera: Option<Box<dyn Camera>>,
    frame: FrameData,
    counts: BufferCounts,
    /// Layer count of the texture array currently on the device.
    texture_layers: u32,
    prev_width: u32,
    prev_height: u32,
}

impl<B: GpuBackend> Renderer<B> {
    pub fn new(backend: B, settings: Settings) -> Self {
        Self {
            backend,
            settings: settings.validated(),
            scene: None,
            camera: None,
            frame: FrameData::default(),
            counts: BufferCounts::default(),
            texture_layers: 0,
            prev_width: 0,
            prev_height: 0,
        }
    }

    /// Bind `scene` and upload its static partition. Returns the previous scene.
    #[tracing::instrument(skip_all)]
    pub fn set_scene(&mut self, scene: Scene) -> Option<Scene> {
        self.backend.upload(BufferSlot::StaticVertices, scene.static_vertices());
        self.backend.upload(BufferSlot::StaticIndices, indices_bytes(scene.static_indices()));

        self.counts = BufferCounts {
            static_vertices: scene.static_vertex_count(),
            static_indices: scene.static_index_count(),
            static_meshes: scene.static_mesh_count(),
            ..Default::default()
        };
        // Rebuilt by the next update
        self.texture_layers = 0;

        let registry = scene.registry();
        let configured = (self.settings.texture_width, self.settings.texture_height);
        if (registry.texture_width(), registry.texture_height()) != configured {
            tracing::warn!(
                scene_width = registry.texture_width(),
                scene_height = registry.texture_height(),
                width = configured.0,
                height = configured.1,
                "scene texture size differs from settings"
            );
        }

        tracing::debug!(
            static_vertices = self.counts.static_vertices,
            static_indices = self.counts.static_indices,
            "bound scene"
        );
        self.scene.replace(scene)
    }

    /// Unbind and return the current scene.
    pub fn take_scene(&mut self) -> Option<Scene> {
        self.counts = BufferCounts::default();
        self.scene.take()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Mutable access for editing the dynamic partition between frames.
    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    /// Scene sized by this renderer's settings, freezing `meshes` as static.
    pub fn create_scene(&self, meshes: &[SharedMesh]) -> Scene {
        Scene::from_settings(&self.settings, meshes)
    }

    /// Bind `camera`, fitting it to the last rendered size if there is one.
    pub fn set_camera(&mut self, camera: impl Camera + 'static) {
        let mut camera: Box<dyn Camera> = Box::new(camera);
        if self.prev_width > 0 && self.prev_height > 0 {
            camera.update_perspective(self.prev_width as f32 / self.prev_height as f32);
        }
        self.camera = Some(camera);
    }

    pub fn camera(&self) -> Option<&dyn Camera> {
        self.camera.as_deref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut (dyn Camera + 'static)> {
        self.camera.as_deref_mut()
    }

    /// Re-encode the dynamic partition and publish every buffer.
    ///
    /// Returns false when no scene is bound.
    #[tracing::instrument(skip_all)]
    pub fn update(&mut self) -> bool {
        let Some(scene) = self.scene.as_mut() else {
            return false;
        };

        self.frame.reset(scene.static_meshes());
        let static_index_count = scene.static_index_count();
        let (root, registry) = scene.split_mut();
        self.frame.traverse(root, Mat4::IDENTITY, registry, static_index_count);

        let frame = &self.frame;
        self.backend.upload(BufferSlot::DynamicVertices, &frame.dynamic_vertices);
        self.backend.upload(BufferSlot::DynamicIndices, indices_bytes(&frame.dynamic_indices));
        self.backend.upload(BufferSlot::Meshes, &frame.meshes);
        self.backend.upload(BufferSlot::Lights, &frame.lights);
        self.backend.upload(BufferSlot::Materials, registry.materials());

        let counts = &mut self.counts;
        counts.dynamic_vertices = frame.dynamic_vertex_count();
        counts.dynamic_indices = frame.dynamic_index_count();
        counts.meshes = frame.mesh_count();
        counts.lights = frame.light_count();
        counts.materials = (registry.materials().len() / MATERIAL_RECORD_SIZE) as u32;
        counts.vertices = counts.static_vertices + counts.dynamic_vertices;
        self.backend.allocate(BufferSlot::Vertices, counts.vertices as usize * VERTEX_SIZE);

        let layers = registry.texture_count();
        if layers != self.texture_layers {
            tracing::debug!(from = self.texture_layers, to = layers, "rebuilding texture array");
            self.texture_layers = layers;
            self.backend.rebuild_texture_array(
                registry.texture_width(),
                registry.texture_height(),
                layers,
                registry.textures(),
            );
        }

        let dispatch = DispatchSize::resolve(self.counts.vertices, self.settings.resolve_rows);
        self.backend.resolve_geometry(&self.counts, dispatch);

        tracing::trace!(
            vertices = self.counts.vertices,
            meshes = self.counts.meshes,
            lights = self.counts.lights,
            materials = self.counts.materials,
            "published frame"
        );
        true
    }

    /// Synchronize and trace one `width` x `height` frame into `target`.
    ///
    /// Returns false unless both a scene and a camera are bound and the
    /// backend ran the trace kernel.
    #[tracing::instrument(skip(self, target))]
    pub fn render(&mut self, target: &B::Target, width: u32, height: u32) -> bool {
        if self.camera.is_none() || self.scene.is_none() {
            return false;
        }
        self.update();

        let Some(camera) = self.camera.as_deref_mut() else {
            return false;
        };
        if self.prev_width != width || self.prev_height != height {
            self.prev_width = width;
            self.prev_height = height;
            camera.update_perspective(width as f32 / height.max(1) as f32);
        }
        camera.update_view();
        let rays = camera.corner_rays();

        let params = TraceParams {
            eye: camera.position().extend(1.0).to_array(),
            ray00: rays.r00.extend(0.0).to_array(),
            ray10: rays.r10.extend(0.0).to_array(),
            ray01: rays.r01.extend(0.0).to_array(),
            ray11: rays.r11.extend(0.0).to_array(),
            counts: self.counts,
            width,
            height,
            _pad: [0; 2],
        };
        let dispatch = DispatchSize::trace(width, height, self.settings.workgroup_size);
        let traced = self.backend.trace(target, &params, dispatch);
        if !traced {
            tracing::warn!("trace kernel unavailable, frame skipped");
        }
        traced
    }

    /// Counts published by the last update.
    pub fn counts(&self) -> &BufferCounts {
        &self.counts
    }

    /// Dynamic buffers built by the last update.
    pub fn frame(&self) -> &FrameData {
        &self.frame
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
