//! # Voxel Type Module
//!
//! This module defines the closed set of materials a voxel can hold and the
//! visibility rules between them that the mesh extractor relies on.

use serde::{Deserialize, Serialize};

use super::VoxelTypeSize;

/// Enumerates all possible voxel materials in the world.
///
/// `AIR` is emptiness. Every other material is solid for face culling, except
/// that `WATER` is transparent to other water: two adjacent water voxels never
/// show a face to each other.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoxelType {
    /// Empty space; never meshed.
    #[default]
    AIR,

    /// Soil; the single material of the default terrain palette.
    DIRT,

    /// Deep terrain below the soil layer.
    ROCK,

    /// Beaches along the waterline.
    SAND,

    /// Terrain above the snow line.
    SNOW,

    /// Fills air below the water level; meshed into its own stream.
    WATER,
}

impl VoxelType {
    /// Every material, in discriminant order.
    pub const ALL: [VoxelType; 6] = [
        VoxelType::AIR,
        VoxelType::DIRT,
        VoxelType::ROCK,
        VoxelType::SAND,
        VoxelType::SNOW,
        VoxelType::WATER,
    ];

    /// Converts the compact storage form back into a material.
    ///
    /// Returns `None` for values that do not name a material.
    pub fn from_int(value: VoxelTypeSize) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    #[inline]
    pub fn is_air(self) -> bool {
        self == VoxelType::AIR
    }

    #[inline]
    pub fn is_water(self) -> bool {
        self == VoxelType::WATER
    }

    /// Whether this material belongs to the opaque terrain (neither air nor water).
    #[inline]
    pub fn is_solid(self) -> bool {
        !self.is_air() && !self.is_water()
    }

    /// Decides whether a face of a voxel of this type, touching a voxel of
    /// type `neighbor`, is visible and has to be meshed.
    ///
    /// # Arguments
    /// * `neighbor` - The material on the other side of the face
    ///
    /// # Returns
    /// `true` if the neighbor is air, or if this voxel is water and the
    /// neighbor is anything but water. Air itself never exposes faces.
    #[inline]
    pub fn exposes_face_to(self, neighbor: VoxelType) -> bool {
        if self.is_air() {
            return false;
        }
        neighbor.is_air() || (self.is_water() && !neighbor.is_water())
    }

    /// Picks a random terrain material (never air or water).
    pub fn random_solid(rng: &mut fastrand::Rng) -> Self {
        match rng.u8(0..4) {
            0 => VoxelType::DIRT,
            1 => VoxelType::ROCK,
            2 => VoxelType::SAND,
            _ => VoxelType::SNOW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_round_trip() {
        for voxel in VoxelType::ALL {
            assert_eq!(VoxelType::from_int(voxel as VoxelTypeSize), Some(voxel));
        }
        assert_eq!(VoxelType::from_int(6), None);
    }

    #[test]
    fn test_face_exposure_rules() {
        use VoxelType::*;

        assert!(DIRT.exposes_face_to(AIR));
        assert!(!DIRT.exposes_face_to(DIRT));
        assert!(!DIRT.exposes_face_to(ROCK));
        // solid terrain is hidden behind water
        assert!(!SAND.exposes_face_to(WATER));

        assert!(WATER.exposes_face_to(AIR));
        assert!(WATER.exposes_face_to(SAND));
        assert!(!WATER.exposes_face_to(WATER));

        for neighbor in VoxelType::ALL {
            assert!(!AIR.exposes_face_to(neighbor));
        }
    }

    #[test]
    fn test_random_solid_is_terrain() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..100 {
            assert!(VoxelType::random_solid(&mut rng).is_solid());
        }
    }

    #[test]
    fn test_serde_names_are_lowercase() {
        let json = serde_json::to_string(&VoxelType::WATER).unwrap();
        assert_eq!(json, "\"water\"");
        let parsed: VoxelType = serde_json::from_str("\"snow\"").unwrap();
        assert_eq!(parsed, VoxelType::SNOW);
    }
}
