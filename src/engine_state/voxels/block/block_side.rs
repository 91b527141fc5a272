//! # Voxel Side Module
//!
//! This module defines the six faces of a voxel and their geometry: the
//! outward normal and the grid offset to the neighbor across each face.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel.
///
/// The discriminants are stable and match the order of [`VoxelSide::all`],
/// which is the order the mesh extractor visits faces in.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum VoxelSide {
    /// The front face (facing positive Z)
    FRONT = 0,

    /// The back face (facing negative Z)
    BACK = 1,

    /// The bottom face (facing negative Y)
    BOTTOM = 2,

    /// The top face (facing positive Y)
    TOP = 3,

    /// The left face (facing negative X)
    LEFT = 4,

    /// The right face (facing positive X)
    RIGHT = 5,
}

impl VoxelSide {
    /// Returns an array containing all six faces in a consistent order.
    ///
    /// The order is: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
    pub fn all() -> [VoxelSide; 6] {
        [
            VoxelSide::FRONT,
            VoxelSide::BACK,
            VoxelSide::BOTTOM,
            VoxelSide::TOP,
            VoxelSide::LEFT,
            VoxelSide::RIGHT,
        ]
    }

    /// Grid step from a voxel to its neighbor across this face.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            VoxelSide::FRONT => Vector3::new(0, 0, 1),
            VoxelSide::BACK => Vector3::new(0, 0, -1),
            VoxelSide::BOTTOM => Vector3::new(0, -1, 0),
            VoxelSide::TOP => Vector3::new(0, 1, 0),
            VoxelSide::LEFT => Vector3::new(-1, 0, 0),
            VoxelSide::RIGHT => Vector3::new(1, 0, 0),
        }
    }

    /// Outward unit normal of this face.
    pub fn normal(self) -> Vector3<f32> {
        self.offset().cast::<f32>().unwrap_or(Vector3::new(0.0, 0.0, 0.0))
    }

    /// The face on the other side of the shared boundary.
    pub fn opposite(self) -> VoxelSide {
        match self {
            VoxelSide::FRONT => VoxelSide::BACK,
            VoxelSide::BACK => VoxelSide::FRONT,
            VoxelSide::BOTTOM => VoxelSide::TOP,
            VoxelSide::TOP => VoxelSide::BOTTOM,
            VoxelSide::LEFT => VoxelSide::RIGHT,
            VoxelSide::RIGHT => VoxelSide::LEFT,
        }
    }
}
