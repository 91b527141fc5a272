//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which generates the voxels
//! and meshes of one chunk off the world's thread. The result carries no GPU
//! resources: uploading happens when the world integrates it.

use std::sync::Arc;

use crate::engine_state::{
    task_management::task::Task,
    voxels::{
        chunk::{ChunkCoord, ChunkData},
        terrain::TerrainGenerator,
    },
};

/// A task that generates chunk data on a worker thread.
pub struct ChunkGenerationTask {
    /// The position of the chunk to generate (in chunk coordinates)
    coord: ChunkCoord,
    /// Generation epoch of the world when the task was scheduled
    epoch: u64,
    generator: Arc<TerrainGenerator>,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `coord` - The chunk to generate
    /// * `epoch` - The world's generation epoch, echoed back in the result
    /// * `generator` - The terrain generator snapshot to generate with
    pub fn new(coord: ChunkCoord, epoch: u64, generator: Arc<TerrainGenerator>) -> Self {
        ChunkGenerationTask {
            coord,
            epoch,
            generator,
        }
    }
}

/// The result of a chunk generation task.
#[derive(Debug)]
pub struct GeneratedChunk {
    pub coord: ChunkCoord,
    pub epoch: u64,
    pub data: ChunkData,
}

impl Task<GeneratedChunk> for ChunkGenerationTask {
    fn process(self: Box<Self>) -> GeneratedChunk {
        GeneratedChunk {
            coord: self.coord,
            epoch: self.epoch,
            data: self.generator.generate(self.coord),
        }
    }
}
