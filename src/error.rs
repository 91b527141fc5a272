//! # Error Types
//!
//! Errors surfaced by the voxel world. The taxonomy is deliberately narrow:
//! generation itself is deterministic and cannot fail, so everything here is
//! either a configuration mistake caught up front, a lookup that broke the
//! streaming contract, or a failure to acquire a GPU.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::engine_state::voxels::chunk::ChunkCoord;

/// Rejected world configuration.
///
/// Returned by [`crate::WorldConfig::validate`] and by everything that loads a
/// configuration, so bad parameters are caught before any chunk is generated.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The chunk edge length or vertical extent is zero.
    #[error("chunk dimensions must be non-zero (size {size}, height {height})")]
    ZeroChunkDimension { size: usize, height: usize },

    /// Feature size must be a positive finite number of grid cells.
    #[error("noise feature size must be positive and finite, got {0}")]
    InvalidFeatureSize(f32),

    #[error("octave count must be between 1 and {max}, got {octaves}")]
    InvalidOctaves { octaves: usize, max: usize },

    #[error("noise lacunarity must be positive and finite, got {0}")]
    InvalidLacunarity(f32),

    #[error("noise gain must be finite, got {0}")]
    InvalidGain(f32),

    #[error("streaming radius must be at most {max}, got {radius}")]
    InvalidStreamingRadius { radius: u32, max: u32 },

    #[error("water level {water_level} is above the chunk height {height}")]
    WaterLevelAboveHeight { water_level: usize, height: usize },

    #[error("background streaming needs at least one worker")]
    NoWorkers,

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors raised by the [`crate::World`] manager.
#[derive(Debug, Error)]
pub enum WorldError {
    /// A chunk was looked up directly but is not in the loaded map.
    ///
    /// This is a contract violation by the caller: chunks should be reached
    /// through the active set, not by blind coordinate lookup.
    #[error("chunk ({}, {}) is not loaded", .0.x, .0.y)]
    ChunkNotFound(ChunkCoord),

    /// The chunk is scheduled on a background worker but not finished yet.
    #[error("chunk ({}, {}) is still generating", .0.x, .0.y)]
    ChunkPending(ChunkCoord),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to spawn chunk worker: {0}")]
    WorkerSpawn(#[source] io::Error),
}

/// Failure to bring up the wgpu rendering collaborator.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}
