//! # Voxel World
//!
//! A chunked voxel world streamed around a moving observer, rendered with
//! wgpu.
//!
//! ## Key Modules
//!
//! * `config` - World configuration, loaded from JSON
//! * `error` - Error types
//! * `engine_state` - Voxels, meshing, rendering and the worker pool
//!
//! ## Architecture
//!
//! * Noise heightmaps are thresholded into fixed-size voxel chunks
//! * Face culling turns each chunk into an opaque and a water mesh
//! * The world keeps exactly the chunks within a radius of the observer,
//!   generating on the calling thread or on background workers
//! * Meshes are uploaded through a [`RenderBackend`], either wgpu or headless
//!
//! ## Usage
//!
//! ```no_run
//! use voxel_world::{HeadlessBackend, World, WorldConfig};
//!
//! let mut world = World::new(WorldConfig::default(), HeadlessBackend::new())?;
//! let update = world.update(cgmath::Point3::new(0.0, 0.0, 0.0));
//! assert_eq!(update.generated.len(), 81);
//! # Ok::<(), voxel_world::WorldError>(())
//! ```

use log::{error, info, warn};

pub mod config;
pub mod engine_state;
pub mod error;

pub use config::{NoiseConfig, StreamingMode, WorldConfig};
pub use engine_state::{
    rendering::{
        camera::Camera,
        headless::{DrawLog, HeadlessBackend},
        pipeline_manager::OffscreenRenderer,
        wgpu_backend::WgpuBackend,
        MeshData, MeshStream, RenderBackend, Vertex,
    },
    voxels::{
        block::VoxelType,
        chunk::{Chunk, ChunkCoord, ChunkDimensions, VoxelGrid},
        noise::NoiseGenerator,
        terrain::TerrainMaterials,
        world::{chunk_coord_at, streaming_window, StreamingUpdate, World, WorldStats},
    },
    EngineState, FlyoverSummary,
};
pub use error::{ConfigError, RenderError, WorldError};

/// Frames the demo flyover runs for.
pub const FLYOVER_FRAMES: u64 = 240;
/// Size of the offscreen frames, in pixels.
pub const FRAME_SIZE: (u32, u32) = (640, 360);

/// Streams a world along a wandering path and logs a summary.
///
/// The first command-line argument, if any, is a JSON [`WorldConfig`]. Frames
/// are rendered offscreen with wgpu when an adapter is available and counted
/// by the headless backend otherwise.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = match std::env::args().nth(1) {
        Some(path) => match WorldConfig::load(&path) {
            Ok(config) => {
                info!("Loaded configuration from {path}");
                config
            }
            Err(err) => {
                error!("{err}");
                return;
            }
        },
        None => WorldConfig::default(),
    };

    let result = match pollster::block_on(WgpuBackend::request_headless()) {
        Ok(backend) => run_gpu(config, backend),
        Err(err) => {
            warn!("No GPU available ({err}), falling back to the headless backend");
            run_headless(config)
        }
    };

    if let Err(err) = result {
        error!("{err}");
    }
}

fn run_gpu(config: WorldConfig, backend: WgpuBackend) -> Result<FlyoverSummary, WorldError> {
    let seed = config.noise.seed as u64;
    let mut renderer = OffscreenRenderer::new(&backend, FRAME_SIZE.0, FRAME_SIZE.1);
    let mut engine = EngineState::new(config, backend, seed)?;

    Ok(engine.run_flyover(FLYOVER_FRAMES, |engine| {
        let stats = renderer.render(engine.world(), &engine.camera());
        stats.opaque_draws + stats.water_draws
    }))
}

fn run_headless(config: WorldConfig) -> Result<FlyoverSummary, WorldError> {
    let seed = config.noise.seed as u64;
    let mut engine = EngineState::new(config, HeadlessBackend::new(), seed)?;

    let summary = engine.run_flyover(FLYOVER_FRAMES, |engine| {
        let mut pass: DrawLog = engine.world().backend().begin_pass();
        engine.world().draw_frame(&mut pass)
    });
    let stats = engine.world().backend().stats();
    info!(
        "Headless backend: {} meshes created, {} released, {} live",
        stats.created, stats.released, stats.live
    );
    Ok(summary)
}
