//! # Engine State Module
//!
//! Ties the voxel world to a moving observer and a renderer.
//!
//! ## Key Components
//!
//! * `EngineState` - The world plus the observer it streams around
//! * `Observer` - A wandering point the world streams chunks around
//! * `rendering` - Mesh extraction, render backends and the offscreen renderer
//! * `task_management` - Worker pool for background chunk generation
//! * `voxels` - Voxel data, chunks, terrain generation and streaming
//!
//! Each call to [`EngineState::tick`] streams the world around the observer's
//! current position and then moves the observer. Drawing is left to the
//! caller, who knows which backend it holds.

use std::time::Duration;

use cgmath::{Point3, Rad};
use log::info;
use web_time::Instant;

use crate::{config::WorldConfig, error::WorldError};

use rendering::{camera::Camera, RenderBackend};
use voxels::world::{StreamingUpdate, World, WorldStats};

pub mod rendering;
pub mod task_management;
pub mod voxels;

/// Largest heading change per step, in radians.
const MAX_TURN: f32 = 0.15;
/// Distance the observer covers per step, in voxels.
const OBSERVER_SPEED: f32 = 4.0;
/// Horizontal distance of the chase camera behind the observer.
const CHASE_DISTANCE: f32 = 24.0;
/// Height of the chase camera above the observer.
const CHASE_HEIGHT: f32 = 16.0;

/// A point wandering across the terrain with a randomly drifting heading.
#[derive(Clone, Debug)]
pub struct Observer {
    position: Point3<f32>,
    heading: Rad<f32>,
    speed: f32,
    rng: fastrand::Rng,
}

impl Observer {
    /// Creates an observer at `position`. The same `seed` yields the same path.
    pub fn new(position: Point3<f32>, speed: f32, seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let heading = Rad(rng.f32() * std::f32::consts::TAU);
        Observer {
            position,
            heading,
            speed,
            rng,
        }
    }

    /// Turns by a random amount and moves forward one step.
    pub fn step(&mut self) {
        let turn = (self.rng.f32() * 2.0 - 1.0) * MAX_TURN;
        self.heading = Rad(self.heading.0 + turn);
        let (sin, cos) = self.heading.0.sin_cos();
        self.position.x += cos * self.speed;
        self.position.z += sin * self.speed;
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn heading(&self) -> Rad<f32> {
        self.heading
    }
}

/// Outcome of a flyover.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FlyoverSummary {
    pub frames: u64,
    pub draws: usize,
    pub world: WorldStats,
    pub loaded: usize,
    pub elapsed: Duration,
}

/// The world and the observer it streams around.
pub struct EngineState<B: RenderBackend> {
    world: World<B>,
    observer: Observer,
    frames: u64,
}

impl<B: RenderBackend> EngineState<B> {
    /// Creates the world with the observer above the origin.
    ///
    /// # Errors
    /// Whatever [`World::new`] rejects.
    pub fn new(config: WorldConfig, backend: B, seed: u64) -> Result<Self, WorldError> {
        let altitude = config.chunk_height as f32 * 0.75;
        let world = World::new(config, backend)?;
        let observer = Observer::new(Point3::new(0.0, altitude, 0.0), OBSERVER_SPEED, seed);
        Ok(EngineState {
            world,
            observer,
            frames: 0,
        })
    }

    /// Streams the world around the observer, then moves the observer.
    pub fn tick(&mut self) -> StreamingUpdate {
        let update = self.world.update(self.observer.position());
        self.observer.step();
        self.frames += 1;
        update
    }

    /// Camera following the observer from behind and above.
    pub fn camera(&self) -> Camera {
        Camera::chase(
            self.observer.position(),
            self.observer.heading(),
            CHASE_DISTANCE,
            CHASE_HEIGHT,
        )
    }

    /// Ticks `frames` times, calling `draw` after each tick.
    ///
    /// # Arguments
    /// * `frames` - Number of frames to run
    /// * `draw` - Renders the current state and returns the number of draws issued
    pub fn run_flyover<F>(&mut self, frames: u64, mut draw: F) -> FlyoverSummary
    where
        F: FnMut(&Self) -> usize,
    {
        let start = Instant::now();
        let mut draws = 0;
        for _ in 0..frames {
            self.tick();
            draws += draw(self);
        }
        self.world.flush_pending();

        let summary = FlyoverSummary {
            frames,
            draws,
            world: self.world.stats(),
            loaded: self.world.loaded_count(),
            elapsed: start.elapsed(),
        };
        info!(
            "Flyover finished: {} frames in {:?}, {} chunks generated, {} completed in background, {} evicted, {} draws, {} loaded",
            summary.frames,
            summary.elapsed,
            summary.world.generated,
            summary.world.completed,
            summary.world.evicted,
            summary.draws,
            summary.loaded
        );
        summary
    }

    pub fn world(&self) -> &World<B> {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World<B> {
        &mut self.world
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
