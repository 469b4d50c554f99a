//! rtscene - Inspect and exercise the scene-to-buffer pipeline headlessly.

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use raytrace_scene::material::TextureSlot;
use raytrace_scene::prelude::*;
use raytrace_scene::render::{BufferSlot, FrameData};

#[cfg(feature = "chrome-trace")]
type TraceGuard = tracing_chrome::FlushGuard;
#[cfg(not(feature = "chrome-trace"))]
type TraceGuard = ();

/// Verbosity level
const LOG_QUIET: u8 = 0;
const LOG_INFO: u8 = 1;
const LOG_DEBUG: u8 = 2;
const LOG_TRACE: u8 = 3;

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = LOG_INFO;
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = LOG_DEBUG,
            "-vv" | "--trace" => level = LOG_TRACE,
            "-q" | "--quiet" => level = LOG_QUIET,
            _ => filtered_args.push(arg),
        }
    }

    let _guard = init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        "stats" | "s" => cmd_stats(&filtered_args[1..]),
        "tree" | "t" => cmd_tree(),
        "dump" | "d" => match filtered_args.get(1) {
            Some(dir) => cmd_dump(Path::new(dir)),
            None => Err(anyhow::anyhow!("missing directory argument\nUsage: rtscene dump <dir>")),
        },
        "--version" | "-V" | "version" => {
            println!(
                "rtscene {} ({})",
                env!("CARGO_PKG_VERSION"),
                env!("RTSCENE_BUILD_DATE")
            );
            Ok(())
        }
        "help" | "h" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        other => Err(anyhow::anyhow!("unknown command '{}'\nRun 'rtscene help' for usage", other)),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn print_help() {
    println!("rtscene - Scene to GPU buffer synchronization toolkit");
    println!();
    println!("USAGE:");
    println!("    rtscene [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    s, stats [--settings <file>] [--frames N] [--save]");
    println!("                                               Run N headless frames, print buffer stats;");
    println!("                                               --save stores the settings as the new default");
    println!("    t, tree                                    Show the demo scene hierarchy");
    println!("    d, dump  <dir>                             Write every published buffer to <dir>");
    println!("    h, help                                    Show this help");
    println!("       --version                               Show version");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only show errors");
    println!();
    println!("ENVIRONMENT:");
    println!("    RUST_LOG         Overrides the verbosity flags");
    println!("    RTSCENE_TRACE=1  Write a chrome://tracing profile to trace.json");
    println!();
    println!("SETTINGS:");
    match Settings::path() {
        Some(path) => println!("    {} (defaults when missing)", path.display()),
        None => println!("    no config directory, using defaults"),
    }
}

fn init_logging(level: u8) -> Option<TraceGuard> {
    let default = match level {
        LOG_QUIET => "error",
        LOG_INFO => "info",
        LOG_DEBUG => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false));

    #[cfg(feature = "chrome-trace")]
    if env::var("RTSCENE_TRACE").ok().as_deref() == Some("1") {
        let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
            .file("trace.json")
            .build();
        if registry.with(chrome_layer).try_init().is_err() {
            return None;
        }
        return Some(guard);
    }

    let _ = registry.try_init();
    None
}

/// Procedural textures for the demo: `checker:<cells>` or `solid:<r>,<g>,<b>`.
fn procedural_texture(path: &str, width: u32, height: u32) -> raytrace_scene::Result<Vec<u8>> {
    let (kind, arg) = path.split_once(':').unwrap_or((path, ""));
    let pixel_count = width as usize * height as usize;
    match kind {
        "checker" => {
            let cells: u32 = arg.parse().unwrap_or(8).max(1);
            let cell_w = (width / cells).max(1);
            let cell_h = (height / cells).max(1);
            let mut pixels = Vec::with_capacity(pixel_count * 4);
            for y in 0..height {
                for x in 0..width {
                    let v = if (x / cell_w + y / cell_h) % 2 == 0 { 230 } else { 25 };
                    pixels.extend_from_slice(&[v, v, v, 255]);
                }
            }
            Ok(pixels)
        }
        "solid" => {
            let rgb: Vec<u8> = arg.split(',').filter_map(|c| c.trim().parse().ok()).collect();
            let [r, g, b] = <[u8; 3]>::try_from(rgb.as_slice())
                .map_err(|_| raytrace_scene::Error::other(format!("bad color in '{path}'")))?;
            Ok([r, g, b, 255].repeat(pixel_count))
        }
        _ => Err(raytrace_scene::Error::other(format!("unknown procedural texture '{path}'"))),
    }
}

/// Floor as static geometry; a spinning cube rig, lights and a tinted
/// triangle as dynamic geometry.
fn demo_scene(settings: &Settings) -> Scene {
    let floor_mat = Arc::new(
        Material::new("floor")
            .with_roughness(0.9)
            .with_texture(TextureSlot::Albedo, "checker:8"),
    );
    let gold = Arc::new(
        Material::new("gold")
            .with_albedo(Vec3::new(1.0, 0.78, 0.34))
            .with_f0(Vec3::new(1.0, 0.78, 0.34))
            .with_metalness(1.0)
            .with_roughness(0.25),
    );
    let paint = Arc::new(
        Material::new("paint")
            .with_texture(TextureSlot::Albedo, "solid:200,40,40")
            .with_texture(TextureSlot::Roughness, "checker:4"),
    );

    let registry = MaterialRegistry::with_source(
        settings.texture_width,
        settings.texture_height,
        procedural_texture,
    );
    let floor = primitives::quad(Some(floor_mat)).with_name("Floor").into_shared();
    let mut scene = Scene::with_registry(registry, &[floor]);

    let cube = primitives::cube(Some(gold)).into_shared();
    let rig = Node::named("Rig")
        .with_translation(Vec3::new(0.0, 0.5, 0.0))
        .with_child(Node::with_mesh(cube.clone()).with_name("Cube"))
        .with_child(
            Node::with_mesh(cube)
                .with_name("Satellite")
                .with_translation(Vec3::new(1.5, 0.5, 0.0))
                .with_scale(Vec3::splat(0.3)),
        );
    scene.add_node(rig);
    scene.add_node(
        Node::with_mesh(primitives::triangle(Some(paint)).into_shared())
            .with_name("Sign")
            .with_translation(Vec3::new(-1.5, 0.5, 0.0)),
    );
    scene.add_node(Node::light(SunLight::new(Vec3::splat(2.0), 0.1)).with_rotation(Vec3::new(0.4, 0.0, 0.3)));
    scene.add_node(Node::light(PointLight::new(Vec3::new(4.0, 3.5, 3.0), 0.0)).with_translation(Vec3::new(0.0, 3.0, 2.0)));
    scene
}

fn demo_renderer(settings: Settings) -> Renderer<HeadlessBackend> {
    let scene = demo_scene(&settings);
    let camera = FlyCamera::from_settings(Vec3::new(0.0, 1.5, 5.0), 0.0, -12.0, &settings);
    let mut renderer = Renderer::new(HeadlessBackend::new(), settings);
    renderer.set_scene(scene);
    renderer.set_camera(camera);
    renderer
}

fn cmd_stats(args: &[&str]) -> Result<()> {
    let mut settings = Settings::load();
    let mut frames: u32 = 1;
    let mut save = false;

    let mut iter = args.iter();
    while let Some(&arg) = iter.next() {
        match arg {
            "--settings" => {
                let path = iter.next().context("--settings needs a file")?;
                settings = Settings::load_from(path)
                    .with_context(|| format!("failed to load settings from {}", path))?;
            }
            "--frames" => {
                let n = iter.next().context("--frames needs a number")?;
                frames = n.parse().with_context(|| format!("invalid frame count '{}'", n))?;
            }
            "--save" => save = true,
            other => bail!("unexpected argument '{}'", other),
        }
    }

    if save {
        settings.save().context("failed to save settings")?;
        if let Some(path) = Settings::path() {
            tracing::info!(path = %path.display(), "saved settings");
        }
    }

    let mut renderer = demo_renderer(settings);
    let start = Instant::now();
    for frame in 0..frames {
        // Spin the rig so every frame carries new transforms
        if let Some(rig) = renderer.scene_mut().and_then(|s| s.root_mut().child_node_mut(0)) {
            rig.set_rotation(Vec3::new(0.0, frame as f32 * 0.1, 0.0));
        }
        if !renderer.render(&(), 640, 480) {
            bail!("frame {} was not rendered", frame);
        }
    }
    let elapsed = start.elapsed();

    let counts = *renderer.counts();
    println!("Frames: {} in {:.2?} ({:.2?}/frame)", frames, elapsed, elapsed / frames.max(1));
    println!();
    println!("Counts:");
    println!("  Vertices:   {} ({} static + {} dynamic)", counts.vertices, counts.static_vertices, counts.dynamic_vertices);
    println!("  Indices:    {} static + {} dynamic", counts.static_indices, counts.dynamic_indices);
    println!("  Meshes:     {} ({} static)", counts.meshes, counts.static_meshes);
    println!("  Materials:  {}", counts.materials);
    println!("  Lights:     {}", counts.lights);
    if let Some(scene) = renderer.scene() {
        let registry = scene.registry();
        println!(
            "  Textures:   {} layers of {}x{}",
            registry.texture_count(),
            registry.texture_width(),
            registry.texture_height()
        );
    }
    println!();
    println!("Buffers:");
    for slot in BufferSlot::ALL {
        println!(
            "  [{}] {:<17} {:>10} bytes",
            slot.binding(),
            slot.label(),
            renderer.backend().buffer(slot).len()
        );
    }
    if let Some(array) = renderer.backend().texture_array() {
        println!("  [9] {:<17} {:>10} bytes", "textures", array.pixels.len());
    }
    Ok(())
}

fn cmd_tree() -> Result<()> {
    let scene = demo_scene(&Settings::load());
    println!("Scene (static: {} meshes, {} vertices)", scene.static_mesh_count(), scene.static_vertex_count());
    print_node(scene.root(), 0);
    Ok(())
}

fn print_node(node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    let kind = match node.as_light() {
        Some(Light::Sun(_)) => " [sun]",
        Some(Light::Point(_)) => " [point]",
        None => "",
    };
    let t = node.translation();
    println!("{}{}{} @ ({:.2}, {:.2}, {:.2})", indent, node.name(), kind, t.x, t.y, t.z);

    for mesh in node.child_meshes() {
        let mesh = mesh.read();
        let material = mesh.material().map(|m| m.name()).unwrap_or("<default>");
        println!(
            "{}  - {} ({} verts, {} indices, material: {})",
            indent,
            mesh.name(),
            mesh.vertex_count(),
            mesh.index_count(),
            material
        );
    }
    for child in node.child_nodes() {
        print_node(child, depth + 1);
    }
}

fn cmd_dump(dir: &Path) -> Result<()> {
    let mut renderer = demo_renderer(Settings::load());
    if !renderer.render(&(), 640, 480) {
        bail!("frame was not rendered");
    }

    std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    for slot in BufferSlot::ALL {
        let path = dir.join(format!("{}_{}.bin", slot.binding(), slot.label()));
        let bytes = renderer.backend().buffer(slot);
        std::fs::write(&path, bytes).with_context(|| format!("cannot write {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote buffer");
    }
    if let Some(array) = renderer.backend().texture_array() {
        let path = dir.join(format!("9_textures_{}x{}x{}.bin", array.width, array.height, array.layers));
        std::fs::write(&path, &array.pixels).with_context(|| format!("cannot write {}", path.display()))?;
    }

    let FrameData { dynamic_vertices, meshes, lights, .. } = renderer.frame();
    println!(
        "Dumped to {} ({} dynamic vertex bytes, {} mesh bytes, {} light bytes)",
        dir.display(),
        dynamic_vertices.len(),
        meshes.len(),
        lights.len()
    );
    Ok(())
}
