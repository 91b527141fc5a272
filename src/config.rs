//! # World Configuration
//!
//! Every tunable of the voxel world lives in one [`WorldConfig`] value: chunk
//! dimensions, streaming radius, water level, noise parameters, the terrain
//! material palette and the scheduling mode. Configurations are plain serde
//! structures, so they can be built in code or loaded from JSON:
//!
//! ```json
//! {
//!     "chunk_size": 32,
//!     "chunk_height": 100,
//!     "streaming_radius": 4,
//!     "water_level": 30,
//!     "noise": { "octaves": 6, "lacunarity": 2.0, "gain": 0.5, "seed": 0, "feature_size": 128.0 },
//!     "terrain": { "mode": "uniform", "material": "dirt" },
//!     "streaming": { "mode": "synchronous" }
//! }
//! ```
//!
//! Missing fields fall back to their defaults. Validation happens here, at
//! configuration time, so generation never sees a zero-sized chunk or a
//! non-positive feature size.

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::{engine_state::voxels::terrain::TerrainMaterials, error::ConfigError};

/// Upper bound on fractal octaves accepted by the noise generator.
pub const MAX_OCTAVES: usize = 32;

/// Upper bound on the streaming radius, in chunks.
pub const MAX_STREAMING_RADIUS: u32 = 64;

/// Parameters of the fractal noise used for heightmaps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoiseConfig {
    /// Number of fractal layers summed per sample.
    pub octaves: usize,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f32,
    /// Amplitude multiplier between successive octaves.
    pub gain: f32,
    pub seed: u32,
    /// Sample spacing in grid cells; the base frequency is `1 / feature_size`.
    pub feature_size: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            octaves: 6,
            lacunarity: 2.0,
            gain: 0.5,
            seed: 0,
            feature_size: 128.0,
        }
    }
}

impl NoiseConfig {
    /// Checks the noise parameters without looking at the rest of the world.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_OCTAVES).contains(&self.octaves) {
            return Err(ConfigError::InvalidOctaves {
                octaves: self.octaves,
                max: MAX_OCTAVES,
            });
        }
        if !self.lacunarity.is_finite() || self.lacunarity <= 0.0 {
            return Err(ConfigError::InvalidLacunarity(self.lacunarity));
        }
        if !self.gain.is_finite() {
            return Err(ConfigError::InvalidGain(self.gain));
        }
        if !self.feature_size.is_finite() || self.feature_size <= 0.0 {
            return Err(ConfigError::InvalidFeatureSize(self.feature_size));
        }
        Ok(())
    }
}

/// How chunk generation is scheduled relative to the streaming update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StreamingMode {
    /// Generate, mesh and upload inside the update call that needs the chunk.
    #[default]
    Synchronous,
    /// Generate and mesh on a worker pool; chunks are `Pending` until a
    /// later update picks up the result and uploads it.
    Background { workers: usize },
}

/// Complete configuration of a streamed voxel world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Edge length of a chunk along X and Z, in voxels.
    pub chunk_size: usize,
    /// Vertical extent of a chunk, in voxels.
    pub chunk_height: usize,
    /// Chebyshev radius, in chunks, of the square kept loaded around the observer.
    pub streaming_radius: u32,
    /// Air below this layer is filled with water.
    pub water_level: usize,
    pub noise: NoiseConfig,
    pub terrain: TerrainMaterials,
    pub streaming: StreamingMode,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: 32,
            chunk_height: 100,
            streaming_radius: 4,
            water_level: 30,
            noise: NoiseConfig::default(),
            terrain: TerrainMaterials::default(),
            streaming: StreamingMode::default(),
        }
    }
}

impl WorldConfig {
    /// Rejects configurations the world cannot be generated from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 || self.chunk_height == 0 {
            return Err(ConfigError::ZeroChunkDimension {
                size: self.chunk_size,
                height: self.chunk_height,
            });
        }
        if self.streaming_radius > MAX_STREAMING_RADIUS {
            return Err(ConfigError::InvalidStreamingRadius {
                radius: self.streaming_radius,
                max: MAX_STREAMING_RADIUS,
            });
        }
        if self.water_level > self.chunk_height {
            return Err(ConfigError::WaterLevelAboveHeight {
                water_level: self.water_level,
                height: self.chunk_height,
            });
        }
        if let StreamingMode::Background { workers: 0 } = self.streaming {
            return Err(ConfigError::NoWorkers);
        }
        self.noise.validate()
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: WorldConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Number of chunks kept loaded once the streaming window is full.
    pub fn window_chunk_count(&self) -> usize {
        let side = 2 * self.streaming_radius as usize + 1;
        side * side
    }
}
