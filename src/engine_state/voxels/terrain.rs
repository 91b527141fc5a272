//! # Terrain Module
//!
//! Turns heightmaps into voxel grids. One [`TerrainGenerator`] holds
//! everything a chunk generation needs (noise, dimensions, water level and
//! material palette), so it can be shared with background workers and every
//! chunk generated from the same generator is consistent.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};
use web_time::Instant;

use super::{
    block::block_type::VoxelType,
    chunk::{
        chunk_creation::{classify_layer, column_height, normalize_noise},
        ChunkCoord, ChunkData, ChunkDimensions, VoxelGrid, VoxelGridBuilder,
    },
    noise::{HeightMap, NoiseGenerator},
};

/// Material palette applied to terrain voxels.
///
/// The palette only decides *which* solid material a terrain voxel gets;
/// whether a voxel is terrain, water or air depends on the heightmap alone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TerrainMaterials {
    /// Every terrain voxel uses the same material.
    Uniform { material: VoxelType },
    /// Beaches near the waterline, snow on peaks, a soil layer over rock.
    Layered {
        /// Columns whose surface is below `water_level + sand_margin` are sand.
        sand_margin: usize,
        /// Thickness of the dirt layer above rock.
        soil_depth: usize,
        /// Layers at or above this height are snow.
        snow_line: usize,
    },
}

impl Default for TerrainMaterials {
    fn default() -> Self {
        TerrainMaterials::Uniform {
            material: VoxelType::DIRT,
        }
    }
}

impl TerrainMaterials {
    /// Picks the material of terrain voxel `y` in a column with surface `surface`.
    pub fn material_at(&self, y: usize, surface: usize, water_level: usize) -> VoxelType {
        match *self {
            TerrainMaterials::Uniform { material } => material,
            TerrainMaterials::Layered {
                sand_margin,
                soil_depth,
                snow_line,
            } => {
                if surface < water_level + sand_margin {
                    VoxelType::SAND
                } else if y >= snow_line {
                    VoxelType::SNOW
                } else if y + soil_depth < surface {
                    VoxelType::ROCK
                } else {
                    VoxelType::DIRT
                }
            }
        }
    }
}

/// Builds chunk data from noise: heightmap sampling, height thresholding,
/// material selection and mesh extraction.
pub struct TerrainGenerator {
    noise: Arc<NoiseGenerator>,
    dimensions: ChunkDimensions,
    water_level: usize,
    materials: TerrainMaterials,
}

impl TerrainGenerator {
    pub fn new(
        noise: Arc<NoiseGenerator>,
        dimensions: ChunkDimensions,
        water_level: usize,
        materials: TerrainMaterials,
    ) -> Self {
        TerrainGenerator {
            noise,
            dimensions,
            water_level,
            materials,
        }
    }

    pub fn noise(&self) -> &NoiseGenerator {
        &self.noise
    }

    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    pub fn water_level(&self) -> usize {
        self.water_level
    }

    /// Fills a voxel grid from a heightmap.
    ///
    /// # Arguments
    /// * `heightmap` - Raw noise samples, one per column (`x + z * size`)
    ///
    /// # Returns
    /// A grid where layer `y` of column `(x, z)` is terrain iff
    /// `y <= floor(((v + 1) / 2) * (height - 1))`, water iff above that and
    /// below the water level, and air otherwise.
    pub fn fill_voxels(&self, heightmap: &HeightMap) -> VoxelGrid {
        let dims = self.dimensions;
        let surfaces: Vec<usize> = (0..dims.plane_size())
            .map(|column| {
                let x = column % dims.size;
                let z = column / dims.size;
                let sample = heightmap.get(x, z).unwrap_or(-1.0);
                column_height(normalize_noise(sample), dims.height)
            })
            .collect();

        let mut builder = VoxelGridBuilder::new(dims);
        for y in 0..dims.height {
            for surface in &surfaces {
                let voxel = if y <= *surface {
                    self.materials.material_at(y, *surface, self.water_level)
                } else {
                    classify_layer(y, *surface, self.water_level)
                };
                builder.push_voxel_type(voxel);
            }
        }
        builder.return_grid()
    }

    /// Generates the voxels and meshes of one chunk. Runs on any thread.
    pub fn generate(&self, coord: ChunkCoord) -> ChunkData {
        let start = Instant::now();
        let heightmap = self.noise.sample_chunk(coord);
        let voxels = self.fill_voxels(&heightmap);
        let data = ChunkData::new(coord, voxels);
        debug!(
            "Generated chunk ({}, {}) in {:?}: {} opaque faces, {} water faces",
            coord.x,
            coord.y,
            start.elapsed(),
            data.meshes.opaque.face_count(),
            data.meshes.water.face_count()
        );
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NoiseConfig;

    fn generator(materials: TerrainMaterials) -> TerrainGenerator {
        let dims = ChunkDimensions::new(8, 40);
        let noise = NoiseGenerator::new(
            NoiseConfig {
                seed: 3,
                feature_size: 16.0,
                ..NoiseConfig::default()
            },
            dims.size,
            dims.size,
        );
        TerrainGenerator::new(Arc::new(noise), dims, 20, materials)
    }

    #[test]
    fn test_height_threshold_consistency() {
        let generator = generator(TerrainMaterials::default());
        let coord = ChunkCoord::new(-2, 5);
        let heightmap = generator.noise().sample_chunk(coord);
        let grid = generator.fill_voxels(&heightmap);

        for z in 0..8 {
            for x in 0..8 {
                let v = heightmap.get(x, z).unwrap();
                let surface = (((v + 1.0) / 2.0).clamp(0.0, 1.0) * 39.0).floor() as usize;
                for y in 0..40 {
                    let voxel = grid.get(x, y, z).unwrap();
                    if y <= surface {
                        assert_eq!(voxel, VoxelType::DIRT, "({x}, {y}, {z})");
                    } else if y < 20 {
                        assert_eq!(voxel, VoxelType::WATER, "({x}, {y}, {z})");
                    } else {
                        assert_eq!(voxel, VoxelType::AIR, "({x}, {y}, {z})");
                    }
                }
            }
        }
    }

    #[test]
    fn test_layered_palette_keeps_solidity() {
        let uniform = generator(TerrainMaterials::default());
        let layered = generator(TerrainMaterials::Layered {
            sand_margin: 2,
            soil_depth: 3,
            snow_line: 25,
        });
        let coord = ChunkCoord::new(1, 1);
        let a = uniform.generate(coord);
        let b = layered.generate(coord);

        for y in 0..40 {
            for z in 0..8 {
                for x in 0..8 {
                    let ua = a.voxels.get(x, y, z).unwrap();
                    let lb = b.voxels.get(x, y, z).unwrap();
                    assert_eq!(ua.is_solid(), lb.is_solid());
                    assert_eq!(ua.is_water(), lb.is_water());
                }
            }
        }
    }

    #[test]
    fn test_layered_material_rules() {
        let palette = TerrainMaterials::Layered {
            sand_margin: 2,
            soil_depth: 3,
            snow_line: 60,
        };
        // beach column
        assert_eq!(palette.material_at(5, 31, 30), VoxelType::SAND);
        // snow cap
        assert_eq!(palette.material_at(65, 70, 30), VoxelType::SNOW);
        // rock below the soil layer
        assert_eq!(palette.material_at(40, 50, 30), VoxelType::ROCK);
        // soil just below the surface
        assert_eq!(palette.material_at(47, 50, 30), VoxelType::DIRT);
        assert_eq!(palette.material_at(50, 50, 30), VoxelType::DIRT);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = generator(TerrainMaterials::default()).generate(ChunkCoord::new(4, -1));
        let b = generator(TerrainMaterials::default()).generate(ChunkCoord::new(4, -1));
        assert_eq!(a.voxels, b.voxels);
        assert_eq!(a.meshes.opaque, b.meshes.opaque);
        assert_eq!(a.meshes.water, b.meshes.water);
    }
}
