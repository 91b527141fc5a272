//! # Voxel Task System
//!
//! Tasks related to voxel world generation. They run on the worker pool of
//! [`crate::engine_state::task_management::TaskManager`] when the world
//! streams in background mode.

pub mod chunk_generation_task;

pub use chunk_generation_task::{ChunkGenerationTask, GeneratedChunk};
