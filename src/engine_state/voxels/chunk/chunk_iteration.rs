//! # Chunk Iteration Module
//!
//! This module provides an iterator over the non-air voxels of a grid. It
//! walks the flat buffer in storage order and tracks the local position
//! alongside the offset, so positions never have to be recovered by division.

use cgmath::Point3;

use crate::engine_state::voxels::block::block_type::VoxelType;

use super::VoxelGrid;

/// An iterator over all non-air voxels in a grid, yielding
/// `(position, voxel)` pairs in storage order.
pub struct VoxelIterator<'a> {
    grid: &'a VoxelGrid,
    /// Current offset into the flat buffer
    offset: usize,
    local_x: usize,
    local_y: usize,
    local_z: usize,
}

impl<'a> VoxelIterator<'a> {
    pub fn new(grid: &'a VoxelGrid) -> Self {
        VoxelIterator {
            grid,
            offset: 0,
            local_x: 0,
            local_y: 0,
            local_z: 0,
        }
    }

    fn advance(&mut self) {
        let size = self.grid.dimensions().size;
        self.offset += 1;
        self.local_x += 1;
        if self.local_x == size {
            self.local_x = 0;
            self.local_z += 1;
            if self.local_z == size {
                self.local_z = 0;
                self.local_y += 1;
            }
        }
    }
}

impl Iterator for VoxelIterator<'_> {
    type Item = (Point3<usize>, VoxelType);

    fn next(&mut self) -> Option<Self::Item> {
        let voxels = self.grid.as_slice();

        // Skip air
        while self.offset < voxels.len() && voxels[self.offset].is_air() {
            self.advance();
        }

        let voxel = *voxels.get(self.offset)?;
        let position = Point3::new(self.local_x, self.local_y, self.local_z);
        self.advance();

        Some((position, voxel))
    }
}
