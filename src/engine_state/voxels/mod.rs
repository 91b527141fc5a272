//! # Voxel World Core
//!
//! Representing, generating and streaming a chunked voxel world.
//!
//! ## Architecture
//!
//! * **Block**: voxel materials, face directions and the atlas layout
//! * **Chunk**: a fixed-size voxel grid with its opaque and water meshes
//! * **Noise**: deterministic fractal noise heightmaps, one per chunk
//! * **Terrain**: height thresholding of heightmaps into voxel grids
//! * **World**: the chunk map, streamed around an observer
//! * **Tasks**: chunk generation on background workers
//!
//! ## Data Flow
//!
//! 1. The world derives the required chunk window from the observer position
//! 2. Each missing chunk samples a heightmap and thresholds it into voxels
//! 3. The mesh extractor builds the opaque and water meshes
//! 4. The chunk uploads both meshes and joins the loaded set
//! 5. Chunks outside the window are dropped, releasing their GPU resources

pub mod block;
pub mod chunk;
pub mod noise;
pub mod tasks;
pub mod terrain;
pub mod world;
