//! # World Module
//!
//! This module provides the `World` struct which owns every loaded chunk and
//! streams chunks in and out around a moving observer.
//!
//! ## Streaming
//!
//! Each [`World::update`] derives the centre chunk from the observer's
//! horizontal position, computes the square window of chunk coordinates
//! within the streaming radius, generates what is missing and evicts what
//! left the window. Generation always completes before eviction, so a chunk
//! that is still wanted is never dropped and rebuilt in the same update.
//!
//! Per coordinate the state machine is:
//!
//! ```text
//!              synchronous
//!   absent ────────────────────────► loaded
//!     │ ▲                              │
//!     │ └──────── evicted ─────────────┘
//!     │ background              result with current epoch
//!     └─────────► pending ─────────────► loaded
//!                    │
//!                    └── left window: cancelled, late result discarded
//! ```
//!
//! ## Ownership
//!
//! The world is the sole owner of its chunks. References handed out by
//! [`World::active_chunks`] and [`World::get_chunk`] borrow the world, so the
//! borrow checker rejects holding them across the next update.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cgmath::Point3;
use log::{debug, info, warn};

use crate::{
    config::{NoiseConfig, StreamingMode, WorldConfig},
    engine_state::{
        rendering::{MeshStream, RenderBackend},
        task_management::TaskManager,
    },
    error::WorldError,
};

use super::{
    chunk::{Chunk, ChunkCoord, ChunkDimensions},
    noise::NoiseGenerator,
    tasks::{ChunkGenerationTask, GeneratedChunk},
    terrain::TerrainGenerator,
};

/// Chunk containing a world-space position.
///
/// Uses floor division, so positions just below zero map to chunk `-1`.
/// Returns `None` when the position is not finite or its chunk lies outside
/// the `i32` chunk grid.
pub fn chunk_coord_at(position: Point3<f32>, chunk_size: usize) -> Option<ChunkCoord> {
    let size = chunk_size as f64;
    let x = (position.x as f64 / size).floor();
    let z = (position.z as f64 / size).floor();
    let grid = i32::MIN as f64..=i32::MAX as f64;
    (grid.contains(&x) && grid.contains(&z)).then(|| ChunkCoord::new(x as i32, z as i32))
}

/// Every chunk coordinate within Chebyshev distance `radius` of `center`,
/// ordered by x, then y.
///
/// Returns `None` if part of the window falls outside the `i32` chunk grid.
pub fn streaming_window(center: ChunkCoord, radius: u32) -> Option<Vec<ChunkCoord>> {
    let radius = i64::from(radius);
    let offset = |base: i32, delta: i64| i32::try_from(i64::from(base) + delta).ok();
    offset(center.x, -radius)?;
    offset(center.x, radius)?;
    offset(center.y, -radius)?;
    offset(center.y, radius)?;

    let side = usize::try_from(2 * radius + 1).ok()?;
    let mut window = Vec::with_capacity(side.checked_mul(side)?);
    for dx in -radius..=radius {
        for dy in -radius..=radius {
            window.push(ChunkCoord::new(
                offset(center.x, dx)?,
                offset(center.y, dy)?,
            ));
        }
    }
    Some(window)
}

/// What one streaming update changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamingUpdate {
    /// Centre chunk of the window after the update.
    pub center: ChunkCoord,
    /// Chunks generated and uploaded on the calling thread.
    pub generated: Vec<ChunkCoord>,
    /// Chunks handed to background workers.
    pub scheduled: Vec<ChunkCoord>,
    /// Background results uploaded and now loaded.
    pub completed: Vec<ChunkCoord>,
    /// Loaded chunks dropped because they left the window.
    pub evicted: Vec<ChunkCoord>,
    /// Pending chunks dropped because they left the window.
    pub cancelled: Vec<ChunkCoord>,
    /// Background results thrown away because their slot was gone or stale.
    pub discarded: Vec<ChunkCoord>,
}

impl Default for StreamingUpdate {
    fn default() -> Self {
        StreamingUpdate {
            center: ChunkCoord::new(0, 0),
            generated: Vec::new(),
            scheduled: Vec::new(),
            completed: Vec::new(),
            evicted: Vec::new(),
            cancelled: Vec::new(),
            discarded: Vec::new(),
        }
    }
}

impl StreamingUpdate {
    /// `true` when the update generated, scheduled, integrated and evicted nothing.
    pub fn is_idle(&self) -> bool {
        self.generated.is_empty()
            && self.scheduled.is_empty()
            && self.completed.is_empty()
            && self.evicted.is_empty()
            && self.cancelled.is_empty()
            && self.discarded.is_empty()
    }
}

/// Totals across the lifetime of a world.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub updates: u64,
    pub generated: u64,
    pub scheduled: u64,
    pub completed: u64,
    pub evicted: u64,
    pub cancelled: u64,
    pub discarded: u64,
}

impl WorldStats {
    fn record(&mut self, update: &StreamingUpdate) {
        self.generated += update.generated.len() as u64;
        self.scheduled += update.scheduled.len() as u64;
        self.completed += update.completed.len() as u64;
        self.evicted += update.evicted.len() as u64;
        self.cancelled += update.cancelled.len() as u64;
        self.discarded += update.discarded.len() as u64;
    }
}

enum ChunkSlot<M> {
    Loaded(Chunk<M>),
    /// Scheduled on a worker during generation epoch `epoch`.
    Pending { epoch: u64 },
}

impl<M> ChunkSlot<M> {
    fn chunk(&self) -> Option<&Chunk<M>> {
        match self {
            ChunkSlot::Loaded(chunk) => Some(chunk),
            ChunkSlot::Pending { .. } => None,
        }
    }
}

/// A streamed voxel world.
///
/// `B` is the render backend chunks upload their meshes to. All uploads and
/// releases happen on the thread that owns the world.
pub struct World<B: RenderBackend> {
    config: WorldConfig,
    dimensions: ChunkDimensions,
    generator: Arc<TerrainGenerator>,
    chunks: HashMap<ChunkCoord, ChunkSlot<B::Mesh>>,
    /// The current window, in window order.
    active: Vec<ChunkCoord>,
    center: Option<ChunkCoord>,
    /// Bumped whenever generator parameters change, to detect stale results.
    epoch: u64,
    task_manager: Option<TaskManager<GeneratedChunk>>,
    stats: WorldStats,
    backend: B,
}

impl<B: RenderBackend> World<B> {
    /// Creates an empty world.
    ///
    /// # Errors
    /// Returns [`WorldError::Config`] if the configuration is invalid and
    /// [`WorldError::WorkerSpawn`] if background workers cannot be started.
    pub fn new(config: WorldConfig, backend: B) -> Result<Self, WorldError> {
        config.validate()?;

        let dimensions = ChunkDimensions::new(config.chunk_size, config.chunk_height);
        let generator = Arc::new(Self::build_generator(&config, config.noise.clone()));

        let task_manager = match config.streaming {
            StreamingMode::Synchronous => None,
            StreamingMode::Background { workers } => {
                Some(TaskManager::new(workers).map_err(WorldError::WorkerSpawn)?)
            }
        };

        info!(
            "Created world: chunks {}x{}x{}, radius {}, water level {}, seed {}, {:?} streaming",
            dimensions.size,
            dimensions.height,
            dimensions.size,
            config.streaming_radius,
            config.water_level,
            config.noise.seed,
            config.streaming
        );

        Ok(World {
            config,
            dimensions,
            generator,
            chunks: HashMap::new(),
            active: Vec::new(),
            center: None,
            epoch: 0,
            task_manager,
            stats: WorldStats::default(),
            backend,
        })
    }

    fn build_generator(config: &WorldConfig, noise: NoiseConfig) -> TerrainGenerator {
        let dimensions = ChunkDimensions::new(config.chunk_size, config.chunk_height);
        let noise = NoiseGenerator::new(noise, dimensions.size, dimensions.size);
        TerrainGenerator::new(
            Arc::new(noise),
            dimensions,
            config.water_level,
            config.terrain,
        )
    }

    /// Streams chunks around `observer`.
    ///
    /// Background results that finished since the last call are integrated
    /// first. Then every coordinate of the new window that has no slot is
    /// generated (or scheduled), and finally every slot outside the window is
    /// dropped, releasing its GPU resources.
    ///
    /// An observer position that is not finite, or whose window would leave
    /// the `i32` chunk grid, leaves the window unchanged.
    pub fn update(&mut self, observer: Point3<f32>) -> StreamingUpdate {
        let mut update = StreamingUpdate::default();
        self.stats.updates += 1;

        if let Some(task_manager) = &mut self.task_manager {
            let results = task_manager.process_completed_tasks();
            self.integrate(results, &mut update);
        }

        let radius = self.config.streaming_radius;
        let Some((center, window)) = chunk_coord_at(observer, self.dimensions.size)
            .and_then(|center| Some((center, streaming_window(center, radius)?)))
        else {
            warn!("Ignoring observer position {observer:?} outside the chunk grid");
            update.center = self.center.unwrap_or(ChunkCoord::new(0, 0));
            self.finish_update(&update);
            return update;
        };
        update.center = center;

        for &coord in &window {
            if self.chunks.contains_key(&coord) {
                continue;
            }
            if self.task_manager.is_some() {
                self.schedule(coord);
                update.scheduled.push(coord);
            } else {
                let chunk = self.build_chunk(coord);
                self.chunks.insert(coord, ChunkSlot::Loaded(chunk));
                update.generated.push(coord);
            }
        }

        let wanted: HashSet<ChunkCoord> = window.iter().copied().collect();
        let mut leaving: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .filter(|coord| !wanted.contains(coord))
            .copied()
            .collect();
        leaving.sort_by_key(|coord| (coord.x, coord.y));

        for coord in leaving {
            match self.chunks.remove(&coord) {
                Some(ChunkSlot::Loaded(mut chunk)) => {
                    let released = chunk.release_gpu_resources();
                    debug!(
                        "Evicted chunk ({}, {}), released {} meshes",
                        coord.x, coord.y, released
                    );
                    update.evicted.push(coord);
                }
                Some(ChunkSlot::Pending { .. }) => {
                    debug!("Cancelled pending chunk ({}, {})", coord.x, coord.y);
                    update.cancelled.push(coord);
                }
                None => {}
            }
        }

        self.active = window;
        self.center = Some(center);
        self.finish_update(&update);
        update
    }

    fn finish_update(&mut self, update: &StreamingUpdate) {
        self.stats.record(update);
        if !update.is_idle() {
            info!(
                "Streaming update at ({}, {}): {} generated, {} scheduled, {} completed, {} evicted, {} cancelled, {} discarded, {} loaded",
                update.center.x,
                update.center.y,
                update.generated.len(),
                update.scheduled.len(),
                update.completed.len(),
                update.evicted.len(),
                update.cancelled.len(),
                update.discarded.len(),
                self.loaded_count()
            );
        }
    }

    fn build_chunk(&self, coord: ChunkCoord) -> Chunk<B::Mesh> {
        Chunk::upload(self.generator.generate(coord), &self.backend)
    }

    fn schedule(&mut self, coord: ChunkCoord) {
        let Some(task_manager) = &mut self.task_manager else {
            return;
        };
        let task = ChunkGenerationTask::new(coord, self.epoch, Arc::clone(&self.generator));
        task_manager.publish_task(Box::new(task));
        self.chunks
            .insert(coord, ChunkSlot::Pending { epoch: self.epoch });
    }

    /// Uploads background results whose slot is still pending in the same
    /// epoch and discards the rest.
    fn integrate(&mut self, results: Vec<GeneratedChunk>, update: &mut StreamingUpdate) {
        for result in results {
            let coord = result.coord;
            let current = matches!(
                self.chunks.get(&coord),
                Some(ChunkSlot::Pending { epoch }) if *epoch == result.epoch
            );
            if current {
                let chunk = Chunk::upload(result.data, &self.backend);
                self.chunks.insert(coord, ChunkSlot::Loaded(chunk));
                update.completed.push(coord);
            } else {
                debug!(
                    "Discarded stale result for chunk ({}, {}) from epoch {}",
                    coord.x, coord.y, result.epoch
                );
                update.discarded.push(coord);
            }
        }
    }

    /// Blocks until every background task has finished and integrates the
    /// results. Does nothing in synchronous mode.
    pub fn flush_pending(&mut self) -> StreamingUpdate {
        let mut update = StreamingUpdate {
            center: self.center.unwrap_or(ChunkCoord::new(0, 0)),
            ..StreamingUpdate::default()
        };
        if let Some(task_manager) = &mut self.task_manager {
            let results = task_manager.wait_for_all();
            self.integrate(results, &mut update);
        }
        self.finish_update(&update);
        update
    }

    /// Loaded chunks of the current window, in window order. Pending
    /// coordinates are skipped.
    pub fn active_chunks(&self) -> impl Iterator<Item = &Chunk<B::Mesh>> + '_ {
        self.active
            .iter()
            .filter_map(|coord| self.chunks.get(coord).and_then(ChunkSlot::chunk))
    }

    /// Coordinates of the current window, loaded or not.
    pub fn active_coords(&self) -> &[ChunkCoord] {
        &self.active
    }

    /// Looks up a loaded chunk.
    ///
    /// # Errors
    /// [`WorldError::ChunkNotFound`] if nothing is stored at `coord`, and
    /// [`WorldError::ChunkPending`] if it is still generating.
    pub fn get_chunk(&self, coord: ChunkCoord) -> Result<&Chunk<B::Mesh>, WorldError> {
        match self.chunks.get(&coord) {
            Some(ChunkSlot::Loaded(chunk)) => Ok(chunk),
            Some(ChunkSlot::Pending { .. }) => Err(WorldError::ChunkPending(coord)),
            None => Err(WorldError::ChunkNotFound(coord)),
        }
    }

    /// Generates the chunk at `coord` on this thread unless it is already
    /// loaded, and returns it.
    ///
    /// A pending background result for `coord` is discarded when it arrives.
    /// The chunk stays cached until an update evicts it.
    pub fn generate_chunk_at(&mut self, coord: ChunkCoord) -> Result<&Chunk<B::Mesh>, WorldError> {
        let slot = self
            .chunks
            .entry(coord)
            .or_insert(ChunkSlot::Pending { epoch: self.epoch });
        if let ChunkSlot::Pending { .. } = slot {
            let data = self.generator.generate(coord);
            *slot = ChunkSlot::Loaded(Chunk::upload(data, &self.backend));
            self.stats.generated += 1;
        }
        slot.chunk().ok_or(WorldError::ChunkPending(coord))
    }

    /// Draws one mesh stream of every loaded chunk in the window.
    ///
    /// # Returns
    /// The number of draws issued. Empty meshes are not drawn.
    pub fn draw<'p>(&self, pass: &mut B::Pass<'p>, stream: MeshStream) -> usize {
        self.active_chunks()
            .filter(|chunk| chunk.issue_draw(&self.backend, pass, stream))
            .count()
    }

    /// Draws every opaque mesh, then every water mesh, into one pass.
    pub fn draw_frame<'p>(&self, pass: &mut B::Pass<'p>) -> usize {
        MeshStream::ALL
            .into_iter()
            .map(|stream| self.draw(pass, stream))
            .sum()
    }

    /// Replaces the noise parameters used for future generations.
    ///
    /// Loaded chunks keep their terrain until [`World::regenerate`].
    pub fn set_noise_config(&mut self, noise: NoiseConfig) -> Result<(), WorldError> {
        noise.validate()?;
        self.generator = Arc::new(Self::build_generator(&self.config, noise.clone()));
        info!(
            "Noise parameters changed: seed {}, {} octaves, feature size {}",
            noise.seed, noise.octaves, noise.feature_size
        );
        self.config.noise = noise;
        Ok(())
    }

    /// Rebuilds every chunk with the current generator parameters.
    ///
    /// Synchronous worlds regenerate loaded chunks in place. Background worlds
    /// reschedule every loaded and pending coordinate; results already in
    /// flight are discarded when they arrive.
    ///
    /// # Returns
    /// The number of chunks regenerated or rescheduled.
    pub fn regenerate(&mut self) -> usize {
        self.epoch += 1;
        let mut coords: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
        coords.sort_by_key(|coord| (coord.x, coord.y));

        let mut update = StreamingUpdate {
            center: self.center.unwrap_or(ChunkCoord::new(0, 0)),
            ..StreamingUpdate::default()
        };
        for &coord in &coords {
            if self.task_manager.is_some() {
                // replacing the slot drops any loaded chunk first
                self.chunks.remove(&coord);
                self.schedule(coord);
                update.scheduled.push(coord);
            } else {
                self.chunks.remove(&coord);
                let chunk = self.build_chunk(coord);
                self.chunks.insert(coord, ChunkSlot::Loaded(chunk));
                update.generated.push(coord);
            }
        }
        info!(
            "Regenerating {} chunks in epoch {}",
            coords.len(),
            self.epoch
        );
        self.stats.record(&update);
        coords.len()
    }

    /// Number of chunks loaded and uploaded.
    pub fn loaded_count(&self) -> usize {
        self.chunks
            .values()
            .filter(|slot| matches!(slot, ChunkSlot::Loaded(_)))
            .count()
    }

    /// Number of chunks waiting for a background worker.
    pub fn pending_count(&self) -> usize {
        self.chunks.len() - self.loaded_count()
    }

    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        matches!(self.chunks.get(&coord), Some(ChunkSlot::Loaded(_)))
    }

    pub fn center(&self) -> Option<ChunkCoord> {
        self.center
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    pub fn noise(&self) -> &NoiseGenerator {
        self.generator.noise()
    }

    pub fn stats(&self) -> WorldStats {
        self.stats
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
