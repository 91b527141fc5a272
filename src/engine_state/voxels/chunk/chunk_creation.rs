//! # Chunk Creation Module
//!
//! This module provides the builder used to fill a chunk's voxel grid in
//! storage order, and the height-thresholding rules that turn a noise sample
//! into a terrain column.
//!
//! ## Height Thresholding
//!
//! The noise generator produces values roughly in `[-1, 1]`. A sample is
//! normalized into `[0, 1]` with `(v + 1) / 2` and scaled to the chunk's
//! vertical extent:
//!
//! ```text
//! surface = floor(normalized * (height - 1))
//! ```
//!
//! Every layer `y <= surface` is terrain, every remaining layer below the water
//! level is water, everything else is air. Water therefore only ever replaces
//! air, never terrain.

use crate::engine_state::voxels::block::block_type::VoxelType;

use super::{ChunkDimensions, VoxelGrid};

/// A builder that fills a voxel grid one voxel at a time.
///
/// Voxels must be pushed in storage order: X fastest, then Z, then Y. The
/// builder tracks the local position of the next voxel so callers can stream
/// values without computing indices.
pub struct VoxelGridBuilder {
    dimensions: ChunkDimensions,
    voxels: Vec<VoxelType>,
    /// X position of the next voxel
    local_x: usize,
    /// Y position of the next voxel
    local_y: usize,
    /// Z position of the next voxel
    local_z: usize,
}

impl VoxelGridBuilder {
    /// Creates a new builder for a grid of the given dimensions.
    pub fn new(dimensions: ChunkDimensions) -> Self {
        VoxelGridBuilder {
            dimensions,
            voxels: Vec::with_capacity(dimensions.volume()),
            local_x: 0,
            local_y: 0,
            local_z: 0,
        }
    }

    /// Chunk-relative position the next pushed voxel will occupy.
    pub fn next_position(&self) -> (usize, usize, usize) {
        (self.local_x, self.local_y, self.local_z)
    }

    pub fn is_complete(&self) -> bool {
        self.voxels.len() == self.dimensions.volume()
    }

    /// Adds a voxel at the current position and advances the position.
    ///
    /// Pushes beyond the grid volume are ignored.
    pub fn push_voxel_type(&mut self, voxel: VoxelType) {
        if self.is_complete() {
            return;
        }
        self.voxels.push(voxel);

        self.local_x += 1;
        if self.local_x == self.dimensions.size {
            self.local_x = 0;
            self.local_z += 1;
            if self.local_z == self.dimensions.size {
                self.local_z = 0;
                self.local_y += 1;
            }
        }
    }

    /// Finalizes the grid.
    ///
    /// Any voxels that were never pushed are air.
    pub fn return_grid(mut self) -> VoxelGrid {
        self.voxels.resize(self.dimensions.volume(), VoxelType::AIR);
        VoxelGrid {
            dimensions: self.dimensions,
            voxels: self.voxels,
        }
    }
}

/// Maps a raw noise sample from `[-1, 1]` into `[0, 1]`, clamping outliers.
#[inline]
pub fn normalize_noise(value: f32) -> f32 {
    ((value + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Highest terrain layer of a column whose normalized height is `normalized`.
#[inline]
pub fn column_height(normalized: f32, height: usize) -> usize {
    let top = height.saturating_sub(1);
    ((normalized * top as f32).floor() as usize).min(top)
}

/// Whether layer `y` of a column with surface `surface` is terrain, water or air.
///
/// The returned `VoxelType` is `DIRT` for terrain; callers pick the concrete
/// material afterwards.
#[inline]
pub fn classify_layer(y: usize, surface: usize, water_level: usize) -> VoxelType {
    if y <= surface {
        VoxelType::DIRT
    } else if y < water_level {
        VoxelType::WATER
    } else {
        VoxelType::AIR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_walks_storage_order() {
        let dims = ChunkDimensions::new(2, 3);
        let mut builder = VoxelGridBuilder::new(dims);

        assert_eq!(builder.next_position(), (0, 0, 0));
        builder.push_voxel_type(VoxelType::DIRT);
        assert_eq!(builder.next_position(), (1, 0, 0));
        builder.push_voxel_type(VoxelType::ROCK);
        assert_eq!(builder.next_position(), (0, 0, 1));
        builder.push_voxel_type(VoxelType::SAND);
        builder.push_voxel_type(VoxelType::SNOW);
        assert_eq!(builder.next_position(), (0, 1, 0));
        builder.push_voxel_type(VoxelType::WATER);

        let grid = builder.return_grid();
        assert_eq!(grid.get(0, 0, 0), Some(VoxelType::DIRT));
        assert_eq!(grid.get(1, 0, 0), Some(VoxelType::ROCK));
        assert_eq!(grid.get(0, 0, 1), Some(VoxelType::SAND));
        assert_eq!(grid.get(1, 0, 1), Some(VoxelType::SNOW));
        assert_eq!(grid.get(0, 1, 0), Some(VoxelType::WATER));
        // never pushed
        assert_eq!(grid.get(1, 2, 1), Some(VoxelType::AIR));
    }

    #[test]
    fn test_builder_ignores_overflow() {
        let dims = ChunkDimensions::new(1, 1);
        let mut builder = VoxelGridBuilder::new(dims);
        builder.push_voxel_type(VoxelType::ROCK);
        assert!(builder.is_complete());
        builder.push_voxel_type(VoxelType::DIRT);

        let grid = builder.return_grid();
        assert_eq!(grid.count(VoxelType::ROCK), 1);
        assert_eq!(grid.count(VoxelType::DIRT), 0);
    }

    #[test]
    fn test_normalize_noise() {
        assert_eq!(normalize_noise(-1.0), 0.0);
        assert_eq!(normalize_noise(0.0), 0.5);
        assert_eq!(normalize_noise(1.0), 1.0);
        assert_eq!(normalize_noise(1.7), 1.0);
        assert_eq!(normalize_noise(-3.0), 0.0);
    }

    #[test]
    fn test_column_height() {
        assert_eq!(column_height(0.0, 100), 0);
        assert_eq!(column_height(0.5, 100), 49);
        assert_eq!(column_height(1.0, 100), 99);
        assert_eq!(column_height(1.0, 1), 0);
    }

    #[test]
    fn test_classify_layer() {
        // surface below the water level
        assert_eq!(classify_layer(10, 10, 30), VoxelType::DIRT);
        assert_eq!(classify_layer(11, 10, 30), VoxelType::WATER);
        assert_eq!(classify_layer(29, 10, 30), VoxelType::WATER);
        assert_eq!(classify_layer(30, 10, 30), VoxelType::AIR);

        // surface above the water level
        assert_eq!(classify_layer(5, 40, 30), VoxelType::DIRT);
        assert_eq!(classify_layer(40, 40, 30), VoxelType::DIRT);
        assert_eq!(classify_layer(41, 40, 30), VoxelType::AIR);
    }
}
