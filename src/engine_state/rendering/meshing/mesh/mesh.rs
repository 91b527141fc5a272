//! Mesh data structures for voxel rendering.
//!
//! A [`MeshData`] is a CPU-side vertex/index buffer pair, ready to be uploaded
//! by a render backend. Quads are appended one face at a time: four vertices
//! and the six indices of the triangles `{0, 1, 2}` and `{0, 2, 3}`.

use cgmath::{Point3, Vector3};

use super::face::Face;
use crate::engine_state::{rendering::Vertex, voxels::block::UvRect};

/// Vertices per emitted quad.
pub const VERTICES_PER_FACE: usize = 4;
/// Indices per emitted quad.
pub const INDICES_PER_FACE: usize = 6;

/// Vertex and index data of one mesh stream.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of quads in the mesh.
    pub fn face_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_FACE
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Appends one quad.
    ///
    /// # Arguments
    /// * `face` - The face to emit, in chunk-local coordinates
    /// * `origin` - World-space offset of the chunk
    pub fn push_face(&mut self, face: &Face, origin: Vector3<f32>) {
        let faces_generated = self.face_count() as u32;
        self.vertices
            .extend(Self::generate_face_vertices(face, origin));
        self.indices
            .extend(Self::generate_face_indices(faces_generated));
    }

    /// Generates the four vertices of a face.
    ///
    /// # Returns
    /// Vertices in `[ll, lr, ur, ul]` order with the material's atlas
    /// rectangle mapped so the texture is upright on side faces.
    pub fn generate_face_vertices(face: &Face, origin: Vector3<f32>) -> [Vertex; 4] {
        let uv = UvRect::for_voxel(face.voxel_type);
        let normal = face.side.normal();
        let place = |p: Point3<usize>| {
            Point3::new(p.x as f32, p.y as f32, p.z as f32) + origin
        };

        [
            Vertex::new(place(face.ll), normal, uv.u_min, uv.v_max),
            Vertex::new(place(face.lr), normal, uv.u_max, uv.v_max),
            Vertex::new(place(face.ur), normal, uv.u_max, uv.v_min),
            Vertex::new(place(face.ul), normal, uv.u_min, uv.v_min),
        ]
    }

    /// Generates index data for a face, offset by the number of faces already
    /// in the mesh.
    pub fn generate_face_indices(num_faces_generated: u32) -> [u32; 6] {
        let base = num_faces_generated * VERTICES_PER_FACE as u32;
        [base, base + 1, base + 2, base, base + 2, base + 3]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::{block_side::VoxelSide, block_type::VoxelType};

    #[test]
    fn test_indices_offset_by_face_count() {
        let mut mesh = MeshData::new();
        let origin = Vector3::new(0.0, 0.0, 0.0);
        mesh.push_face(&Face::new(0, 0, 0, VoxelType::DIRT, VoxelSide::TOP), origin);
        mesh.push_face(&Face::new(1, 0, 0, VoxelType::DIRT, VoxelSide::TOP), origin);

        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.index_count(), 12);
        assert_eq!(&mesh.indices[..6], &[0, 1, 2, 0, 2, 3]);
        assert_eq!(&mesh.indices[6..], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn test_vertices_carry_normal_uv_and_origin() {
        let face = Face::new(0, 0, 0, VoxelType::WATER, VoxelSide::FRONT);
        let vertices = MeshData::generate_face_vertices(&face, Vector3::new(32.0, 0.0, -64.0));
        let uv = UvRect::for_voxel(VoxelType::WATER);

        assert_eq!(vertices[0].position, [32.0, 0.0, -63.0]);
        assert_eq!(vertices[2].position, [33.0, 1.0, -63.0]);
        for vertex in &vertices {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        }
        assert_eq!(vertices[0].tex_coords, [uv.u_min, uv.v_max]);
        assert_eq!(vertices[2].tex_coords, [uv.u_max, uv.v_min]);
    }
}
