//! Mesh extraction for voxel chunks.
//!
//! This module converts a chunk's voxel grid into two triangle meshes: one
//! for opaque terrain and one for water, so water can be drawn in its own
//! alpha-blended pass.
//!
//! # Face Culling
//! Every non-air voxel is visited once and each of its six faces is emitted as
//! a quad when
//! - the neighbor across the face lies outside the chunk, or
//! - the neighbor is air, or
//! - the voxel is water and the neighbor is not water.
//!
//! Neighboring chunks are never consulted, so chunk borders always carry
//! faces. Adjacent water voxels never produce a face between them.
//!
//! # Performance Considerations
//! - One quad per visible voxel face; coplanar faces are not merged
//! - Air voxels are skipped by the chunk iterator before any neighbor lookup
//! - Output buffers are plain vectors, uploaded once per chunk

use cgmath::Vector3;
use log::trace;
use web_time::Instant;

use crate::engine_state::voxels::{block::block_side::VoxelSide, chunk::VoxelGrid};

mod mesh;

pub use mesh::*;

/// The two mesh streams of a chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMeshes {
    /// Every non-water material
    pub opaque: MeshData,
    /// Water only
    pub water: MeshData,
}

/// Builds the opaque and water meshes of a voxel grid.
///
/// # Arguments
/// * `voxels` - The chunk's voxel grid
/// * `origin` - World-space position of the chunk's minimum corner, added to
///   every vertex
pub fn extract_chunk_meshes(voxels: &VoxelGrid, origin: Vector3<f32>) -> ChunkMeshes {
    let start = Instant::now();
    let mut meshes = ChunkMeshes::default();

    for (position, voxel) in voxels.iter() {
        let target = if voxel.is_water() {
            &mut meshes.water
        } else {
            &mut meshes.opaque
        };

        for side in VoxelSide::all() {
            let exposed = match voxels.neighbor(position, side) {
                None => true,
                Some(neighbor) => voxel.exposes_face_to(neighbor),
            };
            if exposed {
                let face = Face::new(position.x, position.y, position.z, voxel, side);
                target.push_face(&face, origin);
            }
        }
    }

    trace!(
        "Extracted {} opaque and {} water faces in {:?}",
        meshes.opaque.face_count(),
        meshes.water.face_count(),
        start.elapsed()
    );
    meshes
}
