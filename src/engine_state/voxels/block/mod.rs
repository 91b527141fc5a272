//! # Block Module
//!
//! This module provides the voxel-level building blocks of the world: the
//! material enumeration, the six voxel faces, and the fixed texture atlas
//! layout that maps every material to a sub-rectangle of one shared texture.
//!
//! ## Atlas Layout
//!
//! The atlas is a square texture split into `ATLAS_CELLS x ATLAS_CELLS`
//! equally sized cells. Each material owns exactly one cell, used for all six
//! faces. The layout is an asset contract: the mesh extractor only ever reads
//! UVs from [`VOXEL_TYPE_TO_ATLAS_CELL`], it never computes them from the
//! texture.

pub use block_side::VoxelSide;
pub use block_type::VoxelType;

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent voxel types in memory.
pub type VoxelTypeSize = u8;

/// Number of cells along each edge of the texture atlas.
pub const ATLAS_CELLS: u32 = 4;

/// Maps each voxel type, indexed by discriminant, to its atlas cell
/// `(column, row)`. AIR is never meshed; its entry is unused.
pub static VOXEL_TYPE_TO_ATLAS_CELL: [(u32, u32); 6] = [
    (0, 0), // AIR
    (0, 0), // DIRT
    (1, 0), // ROCK
    (2, 0), // SAND
    (3, 0), // SNOW
    (0, 1), // WATER
];

/// Texture-space rectangle of one atlas cell.
///
/// `v` grows downwards, matching wgpu texture coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UvRect {
    pub u_min: f32,
    pub v_min: f32,
    pub u_max: f32,
    pub v_max: f32,
}

impl UvRect {
    /// Looks up the atlas rectangle of a material.
    pub fn for_voxel(voxel: VoxelType) -> Self {
        let (column, row) = VOXEL_TYPE_TO_ATLAS_CELL[voxel as usize];
        Self::cell(column, row)
    }

    fn cell(column: u32, row: u32) -> Self {
        let cell = 1.0 / ATLAS_CELLS as f32;
        UvRect {
            u_min: column as f32 * cell,
            v_min: row as f32 * cell,
            u_max: (column + 1) as f32 * cell,
            v_max: (row + 1) as f32 * cell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materials_use_distinct_cells() {
        let meshed: Vec<_> = VoxelType::ALL
            .iter()
            .filter(|voxel| !voxel.is_air())
            .map(|voxel| VOXEL_TYPE_TO_ATLAS_CELL[*voxel as usize])
            .collect();

        for (i, a) in meshed.iter().enumerate() {
            for b in &meshed[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_uv_rects_stay_inside_atlas() {
        for voxel in VoxelType::ALL {
            let rect = UvRect::for_voxel(voxel);
            assert!(rect.u_min >= 0.0 && rect.u_max <= 1.0);
            assert!(rect.v_min >= 0.0 && rect.v_max <= 1.0);
            assert!(rect.u_min < rect.u_max && rect.v_min < rect.v_max);
        }

        let water = UvRect::for_voxel(VoxelType::WATER);
        assert_eq!(water.u_min, 0.0);
        assert_eq!(water.v_min, 0.25);
        assert_eq!(water.v_max, 0.5);
    }
}
