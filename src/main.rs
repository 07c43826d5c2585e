use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use wgpu_scene_loader::{gpu::GpuCommand, Model, RecordingBackend, SamplerBindings, WgpuBackend};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Load a glTF/OBJ model and report what would reach the GPU",
    long_about = None
)]
struct Args {
    /// Model file (.gltf, .glb or .obj)
    path: PathBuf,

    /// Upload to a real headless wgpu device instead of recording the calls
    #[arg(long)]
    gpu: bool,

    /// Print the draw command sequence of one frame
    #[arg(long)]
    trace: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.gpu {
        let mut backend = create_headless_backend()?;
        let model = Model::load(&mut backend, &args.path)
            .with_context(|| format!("Failed to load {}", args.path.display()))?;
        print_summary(&model);
        if args.trace {
            log::warn!("--trace only applies to the recording backend");
        }
        model.release(&mut backend);
    } else {
        let mut backend = RecordingBackend::new();
        let model = Model::load(&mut backend, &args.path)
            .with_context(|| format!("Failed to load {}", args.path.display()))?;
        print_summary(&model);
        println!("GPU calls during load: {}", backend.commands().len());

        backend.take_commands();
        let mut samplers = SamplerBindings::new();
        model.draw(&mut backend, &mut samplers);
        println!("Draw calls per frame: {}", backend.draw_calls());
        if args.trace {
            print_trace(backend.commands(), &samplers);
        }
        model.release(&mut backend);
    }

    Ok(())
}

fn create_headless_backend() -> Result<WgpuBackend> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .context("No suitable GPU adapter found")?;

    let info = adapter.get_info();
    log::info!("Using adapter {} ({:?})", info.name, info.backend);

    let (device, queue) = pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("Scene Inspect Device"),
            required_features: wgpu::Features::empty(),
            required_limits: adapter.limits(),
            memory_hints: Default::default(),
        },
        None,
    ))
    .context("Failed to create device")?;

    Ok(WgpuBackend::new(device, queue))
}

fn print_summary(model: &Model) {
    println!("Directory: {}", model.directory().display());
    println!("Meshes: {}", model.meshes().len());
    for mesh in model.meshes() {
        println!(
            "  {:<24} {:>8} vertices {:>8} indices {:>2} textures",
            mesh.name,
            mesh.vertices.len(),
            mesh.indices.len(),
            mesh.textures.len()
        );
    }
    println!("Unique textures: {}", model.textures().len());
    for record in model.textures().iter() {
        println!(
            "  {:<9} {}x{} {}",
            record.kind.as_str(),
            record.width,
            record.height,
            record.path.display()
        );
    }
    if let Some((min, max)) = model.bounds() {
        println!("Bounds: {:?} .. {:?}", min, max);
    }
}

fn print_trace(commands: &[GpuCommand], samplers: &SamplerBindings) {
    println!("Frame trace:");
    for command in commands {
        println!("  {:?}", command);
    }
    println!("Sampler assignments:");
    for (name, unit) in samplers.assignments() {
        println!("  {} -> {}", name, unit);
    }
}
