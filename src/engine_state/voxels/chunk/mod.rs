//! # Chunk Module
//!
//! This module provides the `Chunk` struct and related functionality for managing
//! fixed-size columns of voxel data. A chunk couples an immutable voxel grid
//! with the two GPU mesh streams derived from it (opaque terrain and water).
//!
//! ## Memory Layout
//!
//! Voxels are stored in a single flat buffer, one `VoxelType` (one byte) per
//! cell, addressed through accessors that enforce bounds:
//!
//! ```text
//! index = x + z * size + y * size * size
//! ```
//!
//! X varies fastest, then Z, then Y, so one horizontal layer is contiguous.
//! Both the chunk builder and the chunk iterator walk the buffer in this order.
//!
//! ### Performance Characteristics
//! - **Voxel Lookup**: O(1)
//! - **Neighbor Lookup**: O(1), `None` outside the chunk
//! - **Memory Usage**: `size * size * height` bytes per chunk plus mesh data
//!
//! ## Lifecycle
//!
//! Generation produces a GPU-free [`ChunkData`] that can be built on any
//! thread. [`Chunk::upload`] turns it into a renderable [`Chunk`] on the thread
//! that owns the render backend. Dropping a chunk releases its GPU resources.

use cgmath::{Point2, Point3, Vector3};
use log::trace;

use crate::engine_state::rendering::{
    meshing::{extract_chunk_meshes, ChunkMeshes, MeshData},
    ChunkMesh, MeshStream, RenderBackend,
};

use super::block::{block_side::VoxelSide, block_type::VoxelType};

pub mod chunk_creation;
pub mod chunk_iteration;

pub use chunk_creation::VoxelGridBuilder;
pub use chunk_iteration::VoxelIterator;

/// Horizontal position of a chunk on the chunk grid (`x` along world X,
/// `y` along world Z).
pub type ChunkCoord = Point2<i32>;

/// Size of every chunk of a world, fixed for the world's lifetime.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChunkDimensions {
    /// Edge length along X and Z.
    pub size: usize,
    /// Vertical extent along Y.
    pub height: usize,
}

impl ChunkDimensions {
    pub fn new(size: usize, height: usize) -> Self {
        ChunkDimensions { size, height }
    }

    /// Number of voxels in one horizontal layer.
    #[inline]
    pub fn plane_size(&self) -> usize {
        self.size * self.size
    }

    /// Total number of voxels in a chunk.
    #[inline]
    pub fn volume(&self) -> usize {
        self.plane_size() * self.height
    }

    /// Linear index of a voxel in the flat buffer.
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + z * self.size + y * self.plane_size()
    }

    #[inline]
    pub fn contains(&self, x: i64, y: i64, z: i64) -> bool {
        (0..self.size as i64).contains(&x)
            && (0..self.height as i64).contains(&y)
            && (0..self.size as i64).contains(&z)
    }

    /// World-space position of the minimum corner of the chunk at `coord`.
    pub fn world_origin(&self, coord: ChunkCoord) -> Vector3<f32> {
        Vector3::new(
            coord.x as f32 * self.size as f32,
            0.0,
            coord.y as f32 * self.size as f32,
        )
    }
}

/// Fixed-size 3D grid of voxel types.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelGrid {
    dimensions: ChunkDimensions,
    voxels: Vec<VoxelType>,
}

impl VoxelGrid {
    /// Creates a grid where every voxel has the same type.
    pub fn filled(dimensions: ChunkDimensions, voxel: VoxelType) -> Self {
        VoxelGrid {
            dimensions,
            voxels: vec![voxel; dimensions.volume()],
        }
    }

    /// Creates a grid by evaluating `f(x, y, z)` for every voxel in storage order.
    pub fn from_fn<F>(dimensions: ChunkDimensions, mut f: F) -> Self
    where
        F: FnMut(usize, usize, usize) -> VoxelType,
    {
        let mut builder = VoxelGridBuilder::new(dimensions);
        for y in 0..dimensions.height {
            for z in 0..dimensions.size {
                for x in 0..dimensions.size {
                    builder.push_voxel_type(f(x, y, z));
                }
            }
        }
        builder.return_grid()
    }

    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    /// Gets the voxel at the given chunk-relative coordinates.
    ///
    /// # Returns
    /// `None` if the coordinates are out of bounds.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<VoxelType> {
        let dims = self.dimensions;
        if x >= dims.size || y >= dims.height || z >= dims.size {
            return None;
        }
        Some(self.voxels[dims.index(x, y, z)])
    }

    /// Gets the voxel across `side` from the voxel at `position`.
    ///
    /// # Returns
    /// `None` when the neighbor lies outside the chunk.
    pub fn neighbor(&self, position: Point3<usize>, side: VoxelSide) -> Option<VoxelType> {
        let offset = side.offset();
        let x = position.x as i64 + offset.x as i64;
        let y = position.y as i64 + offset.y as i64;
        let z = position.z as i64 + offset.z as i64;
        if !self.dimensions.contains(x, y, z) {
            return None;
        }
        self.get(x as usize, y as usize, z as usize)
    }

    /// Counts the voxels of a given type.
    pub fn count(&self, voxel: VoxelType) -> usize {
        self.voxels.iter().filter(|v| **v == voxel).count()
    }

    /// Iterates over all non-air voxels with their positions.
    pub fn iter(&self) -> VoxelIterator<'_> {
        VoxelIterator::new(self)
    }

    pub(crate) fn as_slice(&self) -> &[VoxelType] {
        &self.voxels
    }
}

/// A generated chunk before any GPU resources exist.
///
/// This is what generation produces, on the world's thread or on a worker.
#[derive(Debug)]
pub struct ChunkData {
    pub coord: ChunkCoord,
    pub voxels: VoxelGrid,
    pub meshes: ChunkMeshes,
}

impl ChunkData {
    /// Extracts the meshes of `voxels` and bundles them with the grid.
    pub fn new(coord: ChunkCoord, voxels: VoxelGrid) -> Self {
        let origin = voxels.dimensions().world_origin(coord);
        let meshes = extract_chunk_meshes(&voxels, origin);
        ChunkData {
            coord,
            voxels,
            meshes,
        }
    }
}

/// A loaded chunk: voxel grid plus its opaque and water mesh streams.
///
/// `M` is the mesh handle type of the render backend. The voxel grid is never
/// modified after generation.
pub struct Chunk<M> {
    coord: ChunkCoord,
    voxels: VoxelGrid,
    opaque: ChunkMesh<M>,
    water: ChunkMesh<M>,
}

impl<M> Chunk<M> {
    /// Uploads the meshes of freshly generated chunk data.
    ///
    /// # Arguments
    /// * `data` - The generated chunk
    /// * `backend` - The render backend creating the GPU resources
    ///
    /// # Returns
    /// A renderable chunk. Empty mesh streams are kept CPU-side only.
    pub fn upload<B>(data: ChunkData, backend: &B) -> Self
    where
        B: RenderBackend<Mesh = M>,
    {
        let ChunkData {
            coord,
            voxels,
            meshes,
        } = data;

        let mut chunk = Chunk {
            coord,
            voxels,
            opaque: ChunkMesh::new(meshes.opaque),
            water: ChunkMesh::new(meshes.water),
        };
        chunk.create_gpu_resources(backend);
        chunk
    }

    fn create_gpu_resources<B>(&mut self, backend: &B)
    where
        B: RenderBackend<Mesh = M>,
    {
        let coord = self.coord;
        self.opaque
            .upload(backend, &MeshStream::Opaque.label(coord));
        self.water.upload(backend, &MeshStream::Water.label(coord));
    }

    /// Releases both GPU mesh handles, keeping the CPU mesh data.
    ///
    /// # Returns
    /// The number of handles that were released.
    pub fn release_gpu_resources(&mut self) -> usize {
        let released = self.opaque.release() as usize + self.water.release() as usize;
        trace!(
            "Released {} mesh handles of chunk ({}, {})",
            released,
            self.coord.x,
            self.coord.y
        );
        released
    }

    /// Re-extracts both meshes from the voxel grid and uploads them again.
    ///
    /// The previous GPU resources are released before the new ones are created.
    pub fn rebuild_meshes<B>(&mut self, backend: &B)
    where
        B: RenderBackend<Mesh = M>,
    {
        self.release_gpu_resources();
        let origin = self.voxels.dimensions().world_origin(self.coord);
        let ChunkMeshes { opaque, water } = extract_chunk_meshes(&self.voxels, origin);
        self.opaque = ChunkMesh::new(opaque);
        self.water = ChunkMesh::new(water);
        self.create_gpu_resources(backend);
    }

    /// Records a draw of one mesh stream into `pass`.
    ///
    /// # Returns
    /// `true` if a draw was issued, `false` if the stream has no uploaded mesh.
    pub fn issue_draw<'p, B>(&self, backend: &B, pass: &mut B::Pass<'p>, stream: MeshStream) -> bool
    where
        B: RenderBackend<Mesh = M>,
    {
        self.mesh(stream).draw(backend, pass)
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn voxels(&self) -> &VoxelGrid {
        &self.voxels
    }

    pub fn mesh(&self, stream: MeshStream) -> &ChunkMesh<M> {
        match stream {
            MeshStream::Opaque => &self.opaque,
            MeshStream::Water => &self.water,
        }
    }

    pub fn opaque_mesh(&self) -> &MeshData {
        self.opaque.data()
    }

    pub fn water_mesh(&self) -> &MeshData {
        self.water.data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::headless::HeadlessBackend;

    fn dims() -> ChunkDimensions {
        ChunkDimensions::new(4, 6)
    }

    #[test]
    fn test_flat_index_layout() {
        let dims = dims();
        assert_eq!(dims.index(0, 0, 0), 0);
        assert_eq!(dims.index(1, 0, 0), 1);
        assert_eq!(dims.index(0, 0, 1), 4);
        assert_eq!(dims.index(0, 1, 0), 16);
        assert_eq!(dims.index(3, 5, 3), dims.volume() - 1);
    }

    #[test]
    fn test_from_fn_matches_get() {
        let grid = VoxelGrid::from_fn(dims(), |x, y, z| {
            if (x + y + z) % 2 == 0 {
                VoxelType::ROCK
            } else {
                VoxelType::AIR
            }
        });

        for y in 0..6 {
            for z in 0..4 {
                for x in 0..4 {
                    let expected = if (x + y + z) % 2 == 0 {
                        VoxelType::ROCK
                    } else {
                        VoxelType::AIR
                    };
                    assert_eq!(grid.get(x, y, z), Some(expected));
                }
            }
        }
        assert_eq!(grid.get(4, 0, 0), None);
        assert_eq!(grid.get(0, 6, 0), None);
        assert_eq!(grid.get(0, 0, 4), None);
    }

    #[test]
    fn test_neighbor_out_of_bounds() {
        let grid = VoxelGrid::filled(dims(), VoxelType::DIRT);
        let corner = Point3::new(0, 0, 0);

        assert_eq!(grid.neighbor(corner, VoxelSide::LEFT), None);
        assert_eq!(grid.neighbor(corner, VoxelSide::BOTTOM), None);
        assert_eq!(grid.neighbor(corner, VoxelSide::BACK), None);
        assert_eq!(grid.neighbor(corner, VoxelSide::RIGHT), Some(VoxelType::DIRT));
        assert_eq!(grid.neighbor(corner, VoxelSide::TOP), Some(VoxelType::DIRT));
        assert_eq!(grid.neighbor(corner, VoxelSide::FRONT), Some(VoxelType::DIRT));

        let far = Point3::new(3, 5, 3);
        assert_eq!(grid.neighbor(far, VoxelSide::RIGHT), None);
        assert_eq!(grid.neighbor(far, VoxelSide::TOP), None);
        assert_eq!(grid.neighbor(far, VoxelSide::FRONT), None);
    }

    #[test]
    fn test_world_origin() {
        let dims = ChunkDimensions::new(32, 100);
        assert_eq!(
            dims.world_origin(ChunkCoord::new(-1, 2)),
            Vector3::new(-32.0, 0.0, 64.0)
        );
    }

    #[test]
    fn test_upload_skips_empty_streams() {
        let backend = HeadlessBackend::new();
        let voxels = VoxelGrid::from_fn(dims(), |x, y, z| {
            if (x, y, z) == (1, 1, 1) {
                VoxelType::SAND
            } else {
                VoxelType::AIR
            }
        });
        let chunk = Chunk::upload(ChunkData::new(ChunkCoord::new(0, 0), voxels), &backend);

        assert!(chunk.mesh(MeshStream::Opaque).is_uploaded());
        assert!(!chunk.mesh(MeshStream::Water).is_uploaded());
        assert_eq!(chunk.opaque_mesh().face_count(), 6);
        assert!(chunk.water_mesh().is_empty());
        assert_eq!(backend.stats().created, 1);
    }

    #[test]
    fn test_release_and_rebuild() {
        let backend = HeadlessBackend::new();
        let voxels = VoxelGrid::from_fn(dims(), |_, y, _| {
            if y == 0 {
                VoxelType::DIRT
            } else if y < 3 {
                VoxelType::WATER
            } else {
                VoxelType::AIR
            }
        });
        let mut chunk = Chunk::upload(ChunkData::new(ChunkCoord::new(2, -3), voxels), &backend);
        assert_eq!(backend.stats().created, 2);

        assert_eq!(chunk.release_gpu_resources(), 2);
        assert_eq!(chunk.release_gpu_resources(), 0);
        assert_eq!(backend.stats().released, 2);

        let faces_before = chunk.opaque_mesh().face_count();
        chunk.rebuild_meshes(&backend);
        assert_eq!(chunk.opaque_mesh().face_count(), faces_before);
        assert_eq!(backend.stats().created, 4);
        assert_eq!(backend.stats().released, 2);

        drop(chunk);
        assert_eq!(backend.stats().released, 4);
    }

    #[test]
    fn test_issue_draw_per_stream() {
        let backend = HeadlessBackend::new();
        let voxels = VoxelGrid::filled(dims(), VoxelType::WATER);
        let chunk = Chunk::upload(ChunkData::new(ChunkCoord::new(0, 0), voxels), &backend);

        let mut pass = backend.begin_pass();
        assert!(!chunk.issue_draw(&backend, &mut pass, MeshStream::Opaque));
        assert!(chunk.issue_draw(&backend, &mut pass, MeshStream::Water));
        assert_eq!(pass.draws.len(), 1);
        assert_eq!(pass.draws[0].label, "chunk (0, 0) water");
    }
}
