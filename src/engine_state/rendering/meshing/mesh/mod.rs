//! Mesh data for voxel rendering.
//!
//! # Architecture
//! - [`MeshData`]: CPU-side vertices and indices of one mesh stream
//! - [`Face`]: A single quad on one side of a voxel, with its corners and material

mod face;
mod mesh;

pub use face::Face;
pub use mesh::*;
