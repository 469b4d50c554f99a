//! Frame synchronization scenarios driven through the headless backend.

use std::sync::Arc;

use raytrace_scene::codec::{
    LightRecord, MaterialRecord, MeshRecord, Vertex, INDEX_SIZE, MATERIAL_RECORD_SIZE,
    MESH_RECORD_SIZE, VERTEX_SIZE,
};
use raytrace_scene::material::{MaterialRegistry, TextureSlot};
use raytrace_scene::prelude::*;
use raytrace_scene::render::{BufferSlot, DispatchSize};

fn renderer() -> Renderer<HeadlessBackend> {
    Renderer::new(HeadlessBackend::new(), Settings::default())
}

fn mesh_record(bytes: &[u8], i: usize) -> MeshRecord {
    MeshRecord::from_bytes(&bytes[i * MESH_RECORD_SIZE..]).unwrap()
}

fn solid(_path: &str, w: u32, h: u32) -> raytrace_scene::Result<Vec<u8>> {
    Ok(vec![128; (w * h * 4) as usize])
}

#[test]
fn static_triangle_plus_dynamic_quad() {
    let tri = primitives::triangle(None).into_shared();
    let mut scene = Scene::with_static_meshes(&[tri]);
    scene.add_mesh(primitives::quad(None).into_shared());

    let mut r = renderer();
    r.set_scene(scene);
    assert!(r.update());

    let backend = r.backend();
    assert_eq!(backend.buffer(BufferSlot::DynamicVertices).len(), 4 * VERTEX_SIZE);
    assert_eq!(backend.buffer(BufferSlot::DynamicVertices).len(), 256);
    assert_eq!(backend.buffer(BufferSlot::Meshes).len(), 2 * MESH_RECORD_SIZE);
    assert_eq!(backend.buffer(BufferSlot::StaticVertices).len(), 3 * VERTEX_SIZE);
    assert_eq!(backend.buffer(BufferSlot::DynamicIndices).len(), 6 * INDEX_SIZE);

    let counts = r.counts();
    assert_eq!(counts.vertices, 7);
    assert_eq!(counts.static_vertices, 3);
    assert_eq!(counts.dynamic_vertices, 4);
    assert_eq!(counts.meshes, 2);
    assert_eq!(counts.static_meshes, 1);
    assert_eq!(backend.buffer(BufferSlot::Vertices).len(), 7 * VERTEX_SIZE);
}

#[test]
fn dynamic_index_offsets_follow_static_indices() {
    let statics = [
        primitives::triangle(None).into_shared(),
        primitives::cube(None).into_shared(),
    ];
    let mut scene = Scene::with_static_meshes(&statics);
    let n_static = scene.static_index_count();
    assert_eq!(n_static, 39);

    scene.add_mesh(primitives::quad(None).into_shared());
    scene.add_node(Node::with_mesh(primitives::triangle(None).into_shared()));

    let mut r = renderer();
    r.set_scene(scene);
    r.update();

    let meshes = r.backend().buffer(BufferSlot::Meshes);
    let first_dynamic = mesh_record(meshes, 2);
    assert_eq!(first_dynamic.vertex_offset, 0);
    assert_eq!(first_dynamic.index_offset, n_static);

    let second_dynamic = mesh_record(meshes, 3);
    assert_eq!(second_dynamic.vertex_offset, 4);
    assert_eq!(second_dynamic.index_offset, n_static + 6);

    // Static records are carried over untouched
    let static_cube = mesh_record(meshes, 1);
    assert_eq!((static_cube.vertex_offset, static_cube.index_offset), (3, 3));
}

#[test]
fn grandchild_world_transform_composes_ancestors() {
    let t1 = Vec3::new(1.0, 0.0, 0.0);
    let t2 = Vec3::new(0.0, 2.0, 0.0);
    let t3 = Vec3::new(0.0, 0.0, 3.0);
    let r2 = Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2);

    let grandchild = Node::with_mesh(primitives::triangle(None).into_shared()).with_translation(t3);
    let child = Node::named("child").with_translation(t2).with_rotation(r2).with_child(grandchild);
    let root = Node::named("root").with_translation(t1).with_child(child);

    let mut scene = Scene::new();
    scene.add_node(root);
    let mut r = renderer();
    r.set_scene(scene);
    r.update();

    let world = mesh_record(r.backend().buffer(BufferSlot::Meshes), 0).matrix();
    let expected = Mat4::from_translation(t1)
        * (Mat4::from_translation(t2) * Mat4::from_rotation_z(r2.z))
        * Mat4::from_translation(t3);
    assert!(world.abs_diff_eq(expected, 1e-5));

    // Origin lands at t1 + t2 + Rz(90) * t3 = (1, 2, 3)
    let p = world.transform_point3(Vec3::ZERO);
    assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-5));

    // The resolved vertex buffer holds world-space positions
    let resolved = r.backend().resolved_vertices();
    let local = primitives::triangle(None).vertices()[0];
    let expected_pos = expected.transform_point3(Vec3::from_slice(&local.position[..3]));
    assert!(Vec3::from_slice(&resolved[0].position[..3]).abs_diff_eq(expected_pos, 1e-5));
}

#[test]
fn update_is_repeatable() {
    let mut scene = Scene::with_static_meshes(&[primitives::quad(None).into_shared()]);
    scene.add_mesh(primitives::cube(None).into_shared());
    let mut r = renderer();
    r.set_scene(scene);

    r.update();
    let first = r.backend().buffer(BufferSlot::Meshes).to_vec();
    let first_vertices = r.backend().buffer(BufferSlot::DynamicVertices).to_vec();
    r.update();
    assert_eq!(r.backend().buffer(BufferSlot::Meshes), &first[..]);
    assert_eq!(r.backend().buffer(BufferSlot::DynamicVertices), &first_vertices[..]);
    assert_eq!(r.counts().meshes, 2);
    // Static partition uploaded once per scene
    assert_eq!(r.backend().upload_count(BufferSlot::StaticVertices), 1);
    assert_eq!(r.backend().upload_count(BufferSlot::Meshes), 2);
}

#[test]
fn lights_are_encoded_with_world_transforms() {
    let mut scene = Scene::new();
    let lamp = Node::light(PointLight::new(Vec3::new(5.0, 5.0, 5.0), 0.2)).with_translation(Vec3::Y);
    scene.add_node(Node::named("rig").with_translation(Vec3::X).with_child(lamp));
    scene.add_node(Node::light(SunLight::default()));

    let mut r = renderer();
    r.set_scene(scene);
    r.update();

    let lights = r.backend().buffer(BufferSlot::Lights);
    assert_eq!(r.counts().lights, 2);
    let point = LightRecord::from_bytes(lights).unwrap();
    assert_eq!(point.position, [1.0, 1.0, 0.0]);
    assert_eq!(point.light_type, 1);
    assert_eq!(point.radiance, [5.0, 5.0, 5.0]);
    let sun = LightRecord::from_bytes(&lights[48..]).unwrap();
    assert_eq!(sun.light_type, 0);
    assert_eq!(sun.direction, [0.0, -1.0, 0.0]);
    assert_eq!(sun.visibility, 0);
}

#[test]
fn materials_resolve_during_traversal() {
    let red = Arc::new(Material::new("red").with_albedo(Vec3::X));
    let impostor = Arc::new(Material::new("red").with_albedo(Vec3::Y));

    let mut scene = Scene::new();
    scene.add_mesh(primitives::triangle(Some(red)).into_shared());
    scene.add_mesh(primitives::triangle(Some(impostor)).into_shared());
    scene.add_mesh(primitives::triangle(None).into_shared());

    let mut r = renderer();
    r.set_scene(scene);
    r.update();

    let meshes = r.backend().buffer(BufferSlot::Meshes);
    let indices: Vec<u32> = (0..3).map(|i| mesh_record(meshes, i).material_index).collect();
    assert_eq!(indices, vec![1, 1, 0]);

    let materials = r.backend().buffer(BufferSlot::Materials);
    assert_eq!(materials.len(), 2 * MATERIAL_RECORD_SIZE);
    let registered = MaterialRecord::from_bytes(&materials[MATERIAL_RECORD_SIZE..]).unwrap();
    // First definition wins
    assert_eq!(registered.albedo, [1.0, 0.0, 0.0]);
    assert_eq!(r.counts().materials, 2);
}

#[test]
fn texture_array_rebuilt_only_when_count_changes() {
    let registry = MaterialRegistry::with_source(4, 4, solid);
    let mut scene = Scene::with_registry(registry, &[]);
    let brick = Arc::new(Material::new("brick").with_texture(TextureSlot::Albedo, "brick.png"));
    scene.add_mesh(primitives::quad(Some(brick)).into_shared());

    let mut r = renderer();
    r.set_scene(scene);
    r.update();
    r.update();
    assert_eq!(r.backend().texture_rebuilds(), 1);
    let array = r.backend().texture_array().unwrap();
    assert_eq!((array.width, array.height, array.layers), (4, 4, 1));
    assert_eq!(array.pixels.len(), 64);

    // Same texture through another material: no new layer
    let tiles = Arc::new(
        Material::new("tiles")
            .with_texture(TextureSlot::Albedo, "brick.png")
            .with_texture(TextureSlot::Normal, ""),
    );
    r.scene_mut().unwrap().add_mesh(primitives::quad(Some(tiles)).into_shared());
    r.update();
    assert_eq!(r.backend().texture_rebuilds(), 1);

    // New path grows the array
    let moss = Arc::new(Material::new("moss").with_texture(TextureSlot::Roughness, "moss.png"));
    r.scene_mut().unwrap().add_mesh(primitives::quad(Some(moss)).into_shared());
    r.update();
    assert_eq!(r.backend().texture_rebuilds(), 2);
    assert_eq!(r.backend().texture_array().unwrap().layers, 2);
}

#[test]
fn rebinding_scene_resets_texture_marker() {
    let make_scene = || {
        let registry = MaterialRegistry::with_source(2, 2, solid);
        let mut scene = Scene::with_registry(registry, &[]);
        let mat = Arc::new(Material::new("m").with_texture(TextureSlot::Albedo, "a.png"));
        scene.add_mesh(primitives::quad(Some(mat)).into_shared());
        scene
    };

    let mut r = renderer();
    r.set_scene(make_scene());
    r.update();
    let previous = r.set_scene(make_scene());
    assert!(previous.is_some());
    r.update();
    assert_eq!(r.backend().texture_rebuilds(), 2);
}

#[test]
fn render_needs_scene_and_camera() {
    let mut r = renderer();
    r.set_camera(FlyCamera::default());
    assert!(!r.render(&(), 32, 32));
    assert!(r.backend().traces().is_empty());

    let mut r = renderer();
    r.set_scene(Scene::new());
    assert!(!r.render(&(), 32, 32));
    assert!(r.backend().traces().is_empty());
    assert!(r.backend().resolves().is_empty());
}

#[test]
fn render_runs_update_and_trace() {
    let mut scene = Scene::new();
    scene.add_mesh(primitives::cube(None).into_shared());
    let mut r = renderer();
    r.set_scene(scene);
    r.set_camera(FlyCamera::new(Vec3::new(0.0, 0.0, 5.0), 0.0, 0.0));

    assert!(r.render(&(), 320, 240));
    assert!(r.render(&(), 320, 240));
    let backend = r.backend();
    assert_eq!(backend.resolves().len(), 2);
    assert_eq!(backend.traces().len(), 2);

    let (counts, dispatch) = backend.resolves()[0];
    assert_eq!(counts.vertices, 24);
    assert_eq!(dispatch, DispatchSize::resolve(24, 32));

    let call = &backend.traces()[1];
    assert_eq!(call.params.eye, [0.0, 0.0, 5.0, 1.0]);
    assert_eq!(call.dispatch, DispatchSize { x: 64, y: 32, z: 1 });
    // Wider than tall: corner rays spread more in x than y
    let r11 = Vec3::from_slice(&call.params.ray11[..3]);
    assert!(r11.x > r11.y && r11.y > 0.0 && r11.z < 0.0);
}

#[test]
fn resize_updates_projection() {
    let mut r = renderer();
    r.set_scene(Scene::new());
    r.set_camera(FlyCamera::default());

    r.render(&(), 100, 100);
    let square = r.backend().traces()[0].params.ray11;
    r.render(&(), 200, 100);
    let wide = r.backend().traces()[1].params.ray11;
    assert!((square[0] / square[1] - 1.0).abs() < 1e-4);
    assert!((wide[0] / wide[1] - 2.0).abs() < 1e-4);

    // A camera bound later picks up the last size
    r.set_camera(FlyCamera::default());
    let cam = r.camera().unwrap();
    let proj = cam.perspective();
    assert!((proj.y_axis.y / proj.x_axis.x - 2.0).abs() < 1e-4);
}

#[test]
fn empty_mesh_keeps_offsets_consistent() {
    let mut scene = Scene::new();
    scene.add_mesh(Mesh::empty(None).into_shared());
    scene.add_mesh(primitives::triangle(None).into_shared());
    let mut r = renderer();
    r.set_scene(scene);
    r.update();

    let meshes = r.backend().buffer(BufferSlot::Meshes);
    let empty = mesh_record(meshes, 0);
    let tri = mesh_record(meshes, 1);
    assert_eq!((empty.vertex_offset, empty.index_count), (0, 0));
    assert_eq!((tri.vertex_offset, tri.index_offset), (0, 0));

    // Resolution attributes the vertices to the triangle
    let resolved: Vec<Vertex> = r.backend().resolved_vertices();
    assert_eq!(resolved.len(), 3);
}
