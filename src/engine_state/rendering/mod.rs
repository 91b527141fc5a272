//! Rendering system for the voxel engine.
//!
//! The voxel world never talks to a graphics API directly. Chunks hand their
//! mesh data to a [`RenderBackend`], receive opaque mesh handles back, and ask
//! the backend to draw those handles into a pass. Two backends exist:
//!
//! * [`headless::HeadlessBackend`]: keeps counters and a draw log, no GPU needed
//! * [`wgpu_backend::WgpuBackend`]: real vertex/index buffers on a wgpu device
//!
//! [`pipeline_manager::OffscreenRenderer`] builds on the wgpu backend and
//! renders the active chunks into an offscreen target.
//!
//! ## Resource Ownership
//!
//! A mesh handle *is* the GPU resource: creating it uploads, dropping it
//! releases. Handles are move-only, so every upload is released exactly once,
//! whether the chunk is evicted, rebuilt, or the world is dropped.

use crate::engine_state::voxels::chunk::ChunkCoord;

pub mod camera;
pub mod headless;
pub mod meshing;
pub mod pipeline_manager;
pub mod texture;
mod vertex;
pub mod wgpu_backend;

// Re-export commonly used types
pub use meshing::MeshData;
pub use vertex::Vertex;

/// The protocol between chunks and the graphics collaborator.
pub trait RenderBackend {
    /// Uploaded mesh. Dropping it releases the GPU resources.
    type Mesh;
    /// The pass draws are recorded into.
    type Pass<'p>;

    /// Uploads vertex and index data and returns the owning handle.
    ///
    /// Never called with an empty mesh.
    fn create_gpu_resources(&self, label: &str, mesh: &MeshData) -> Self::Mesh;

    /// Records an indexed draw of an uploaded mesh.
    fn issue_draw<'p>(&self, mesh: &Self::Mesh, pass: &mut Self::Pass<'p>);
}

/// Which of a chunk's two meshes to address.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MeshStream {
    /// Terrain of every non-water material
    Opaque,
    /// Water, drawn after all opaque geometry
    Water,
}

impl MeshStream {
    pub const ALL: [MeshStream; 2] = [MeshStream::Opaque, MeshStream::Water];

    /// Debug label of this stream's GPU resources for the chunk at `coord`.
    pub fn label(self, coord: ChunkCoord) -> String {
        let stream = match self {
            MeshStream::Opaque => "opaque",
            MeshStream::Water => "water",
        };
        format!("chunk ({}, {}) {}", coord.x, coord.y, stream)
    }
}

/// CPU mesh data plus its GPU handle, if it was uploaded.
pub struct ChunkMesh<M> {
    data: MeshData,
    handle: Option<M>,
}

impl<M> ChunkMesh<M> {
    pub fn new(data: MeshData) -> Self {
        ChunkMesh { data, handle: None }
    }

    /// Uploads the mesh, replacing (and releasing) any previous handle.
    ///
    /// Empty meshes are never uploaded.
    pub fn upload<B>(&mut self, backend: &B, label: &str)
    where
        B: RenderBackend<Mesh = M>,
    {
        self.handle = None;
        if !self.data.is_empty() {
            self.handle = Some(backend.create_gpu_resources(label, &self.data));
        }
    }

    /// Drops the GPU handle.
    ///
    /// # Returns
    /// `true` if a handle was released.
    pub fn release(&mut self) -> bool {
        self.handle.take().is_some()
    }

    /// Draws the uploaded mesh, if any.
    pub fn draw<'p, B>(&self, backend: &B, pass: &mut B::Pass<'p>) -> bool
    where
        B: RenderBackend<Mesh = M>,
    {
        match &self.handle {
            Some(handle) => {
                backend.issue_draw(handle, pass);
                true
            }
            None => false,
        }
    }

    pub fn data(&self) -> &MeshData {
        &self.data
    }

    pub fn handle(&self) -> Option<&M> {
        self.handle.as_ref()
    }

    pub fn is_uploaded(&self) -> bool {
        self.handle.is_some()
    }
}
