use cgmath::Point3;

use crate::engine_state::voxels::block::{block_side::VoxelSide, block_type::VoxelType};

/// Represents a single quad face of a voxel in the mesh.
///
/// A face is defined by four corner points (lower-left, lower-right,
/// upper-right, upper-left) in chunk-local voxel coordinates. Seen from
/// outside the voxel, along the face normal, the corners run counter-clockwise
/// in that order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Lower-left corner of the face
    pub ll: Point3<usize>,
    /// Lower-right corner of the face
    pub lr: Point3<usize>,
    /// Upper-right corner of the face
    pub ur: Point3<usize>,
    /// Upper-left corner of the face
    pub ul: Point3<usize>,
    /// Material of the voxel the face belongs to
    pub voxel_type: VoxelType,
    /// Which side of the voxel this face represents
    pub side: VoxelSide,
}

impl Face {
    /// Creates the face on `side` of the voxel at `(i, j, k)`.
    pub fn new(i: usize, j: usize, k: usize, voxel_type: VoxelType, side: VoxelSide) -> Self {
        let (ll, lr, ur, ul) = match side {
            VoxelSide::FRONT => (
                Point3::new(i, j, k + 1),
                Point3::new(i + 1, j, k + 1),
                Point3::new(i + 1, j + 1, k + 1),
                Point3::new(i, j + 1, k + 1),
            ),
            VoxelSide::BACK => (
                Point3::new(i + 1, j, k),
                Point3::new(i, j, k),
                Point3::new(i, j + 1, k),
                Point3::new(i + 1, j + 1, k),
            ),
            VoxelSide::BOTTOM => (
                Point3::new(i, j, k),
                Point3::new(i + 1, j, k),
                Point3::new(i + 1, j, k + 1),
                Point3::new(i, j, k + 1),
            ),
            VoxelSide::TOP => (
                Point3::new(i, j + 1, k + 1),
                Point3::new(i + 1, j + 1, k + 1),
                Point3::new(i + 1, j + 1, k),
                Point3::new(i, j + 1, k),
            ),
            VoxelSide::LEFT => (
                Point3::new(i, j, k),
                Point3::new(i, j, k + 1),
                Point3::new(i, j + 1, k + 1),
                Point3::new(i, j + 1, k),
            ),
            VoxelSide::RIGHT => (
                Point3::new(i + 1, j, k + 1),
                Point3::new(i + 1, j, k),
                Point3::new(i + 1, j + 1, k),
                Point3::new(i + 1, j + 1, k + 1),
            ),
        };

        Face {
            ll,
            lr,
            ur,
            ul,
            voxel_type,
            side,
        }
    }

    /// Corners in vertex order: `[ll, lr, ur, ul]`.
    pub fn corners(&self) -> [Point3<usize>; 4] {
        [self.ll, self.lr, self.ur, self.ul]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{EuclideanSpace, InnerSpace, Vector3};

    fn as_f32(p: Point3<usize>) -> Vector3<f32> {
        Vector3::new(p.x as f32, p.y as f32, p.z as f32)
    }

    #[test]
    fn test_winding_faces_outward() {
        for side in VoxelSide::all() {
            let face = Face::new(2, 3, 4, VoxelType::DIRT, side);
            let [a, b, c, d] = face.corners().map(as_f32);

            // both triangles {0,1,2} and {0,2,3} are counter-clockwise seen from outside
            assert_eq!((b - a).cross(c - a), side.normal(), "{side:?}");
            assert_eq!((c - a).cross(d - a), side.normal(), "{side:?}");
        }
    }

    #[test]
    fn test_corners_lie_on_face_plane() {
        for side in VoxelSide::all() {
            let face = Face::new(1, 1, 1, VoxelType::ROCK, side);
            let center = Point3::new(1.5f32, 1.5, 1.5);
            for corner in face.corners() {
                let offset = as_f32(corner) - center.to_vec();
                assert_eq!(offset.dot(side.normal()), 0.5, "{side:?}");
            }
        }
    }
}
