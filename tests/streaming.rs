use std::io::Write;

use cgmath::Point3;
use voxel_world::engine_state::voxels::block::VoxelSide;
use voxel_world::{
    streaming_window, ChunkCoord, ConfigError, HeadlessBackend, MeshStream, NoiseConfig,
    StreamingMode, TerrainMaterials, VoxelGrid, VoxelType, World, WorldConfig, WorldError,
};

fn reference_config() -> WorldConfig {
    WorldConfig {
        chunk_size: 32,
        chunk_height: 100,
        streaming_radius: 1,
        water_level: 30,
        ..WorldConfig::default()
    }
}

fn loaded(world: &World<HeadlessBackend>) -> Vec<ChunkCoord> {
    let mut coords: Vec<ChunkCoord> = world.active_chunks().map(|chunk| chunk.coord()).collect();
    coords.sort_by_key(|coord| (coord.x, coord.y));
    coords
}

fn square(xs: std::ops::RangeInclusive<i32>, ys: std::ops::RangeInclusive<i32>) -> Vec<ChunkCoord> {
    let mut coords = Vec::new();
    for x in xs {
        for y in ys.clone() {
            coords.push(ChunkCoord::new(x, y));
        }
    }
    coords
}

/// Faces the culling rule allows, counted straight from the voxels.
fn expected_faces(grid: &VoxelGrid) -> (usize, usize) {
    let dims = grid.dimensions();
    let (mut opaque, mut water) = (0, 0);
    for y in 0..dims.height {
        for z in 0..dims.size {
            for x in 0..dims.size {
                let voxel = grid.get(x, y, z).unwrap();
                if voxel == VoxelType::AIR {
                    continue;
                }
                for side in VoxelSide::all() {
                    let visible = match grid.neighbor(Point3::new(x, y, z), side) {
                        None => true,
                        Some(VoxelType::AIR) => true,
                        Some(VoxelType::WATER) => false,
                        Some(_) => voxel == VoxelType::WATER,
                    };
                    if visible && voxel == VoxelType::WATER {
                        water += 1;
                    } else if visible {
                        opaque += 1;
                    }
                }
            }
        }
    }
    (opaque, water)
}

#[test]
fn origin_observer_loads_nine_chunks() {
    let mut world = World::new(reference_config(), HeadlessBackend::new()).unwrap();
    let update = world.update(Point3::new(0.0, 0.0, 0.0));

    assert_eq!(update.generated.len(), 9);
    assert_eq!(loaded(&world), square(-1..=1, -1..=1));
}

#[test]
fn moving_one_chunk_east_shifts_the_window() {
    let backend = HeadlessBackend::new();
    let mut world = World::new(reference_config(), backend.clone()).unwrap();
    world.update(Point3::new(0.0, 0.0, 0.0));

    let update = world.update(Point3::new(32.0, 0.0, 0.0));

    assert_eq!(update.evicted, square(-1..=-1, -1..=1));
    assert_eq!(update.generated, square(2..=2, -1..=1));
    assert_eq!(loaded(&world), square(0..=2, -1..=1));

    let live_handles: usize = world
        .active_chunks()
        .map(|chunk| {
            MeshStream::ALL
                .into_iter()
                .filter(|stream| chunk.mesh(*stream).is_uploaded())
                .count()
        })
        .sum();
    let stats = backend.stats();
    assert_eq!(stats.live, live_handles);
    assert_eq!(stats.created - stats.released, live_handles);
}

#[test]
fn repeated_updates_are_idle() {
    let backend = HeadlessBackend::new();
    let mut world = World::new(reference_config(), backend.clone()).unwrap();
    world.update(Point3::new(-5.0, 12.0, 40.0));
    let before = backend.stats();

    for _ in 0..3 {
        assert!(world.update(Point3::new(-5.0, 12.0, 40.0)).is_idle());
    }
    let after = backend.stats();
    assert_eq!(after.created, before.created);
    assert_eq!(after.released, before.released);
}

#[test]
fn far_away_observer_keeps_current_window() {
    let mut world = World::new(reference_config(), HeadlessBackend::new()).unwrap();
    world.update(Point3::new(0.0, 0.0, 0.0));

    let update = world.update(Point3::new(1.0e11, 0.0, 0.0));
    assert!(update.is_idle());
    assert_eq!(loaded(&world), square(-1..=1, -1..=1));
}

#[test]
fn loaded_set_always_matches_window() {
    let config = WorldConfig {
        chunk_size: 8,
        chunk_height: 16,
        streaming_radius: 2,
        water_level: 6,
        ..WorldConfig::default()
    };
    let mut world = World::new(config, HeadlessBackend::new()).unwrap();
    let mut rng = fastrand::Rng::with_seed(11);

    for _ in 0..25 {
        let observer = Point3::new(
            rng.f32() * 200.0 - 100.0,
            0.0,
            rng.f32() * 200.0 - 100.0,
        );
        let update = world.update(observer);
        let mut window = streaming_window(update.center, 2).unwrap();
        window.sort_by_key(|coord| (coord.x, coord.y));
        assert_eq!(loaded(&world), window);
        assert_eq!(world.loaded_count(), 25);
    }
}

#[test]
fn generated_terrain_follows_height_threshold() {
    let config = WorldConfig {
        chunk_size: 16,
        chunk_height: 48,
        streaming_radius: 1,
        water_level: 20,
        noise: NoiseConfig {
            seed: 1234,
            feature_size: 24.0,
            ..NoiseConfig::default()
        },
        terrain: TerrainMaterials::Layered {
            sand_margin: 2,
            soil_depth: 3,
            snow_line: 40,
        },
        ..WorldConfig::default()
    };
    let mut world = World::new(config, HeadlessBackend::new()).unwrap();
    world.update(Point3::new(0.0, 0.0, 0.0));

    for chunk in world.active_chunks() {
        let heightmap = world.noise().sample_chunk(chunk.coord());
        let grid = chunk.voxels();
        for z in 0..16 {
            for x in 0..16 {
                let sample = heightmap.get(x, z).unwrap();
                let normalized = ((sample + 1.0) / 2.0).clamp(0.0, 1.0);
                let surface = ((normalized * 47.0).floor() as usize).min(47);
                for y in 0..48 {
                    let voxel = grid.get(x, y, z).unwrap();
                    if y <= surface {
                        assert!(voxel.is_solid(), "{voxel:?} at ({x}, {y}, {z})");
                    } else if y < 20 {
                        assert_eq!(voxel, VoxelType::WATER);
                    } else {
                        assert_eq!(voxel, VoxelType::AIR);
                    }
                }
            }
        }
    }
}

#[test]
fn meshes_follow_culling_rule() {
    let config = WorldConfig {
        chunk_size: 16,
        chunk_height: 40,
        streaming_radius: 1,
        water_level: 22,
        noise: NoiseConfig {
            seed: 9,
            feature_size: 20.0,
            ..NoiseConfig::default()
        },
        ..WorldConfig::default()
    };
    let mut world = World::new(config, HeadlessBackend::new()).unwrap();
    world.update(Point3::new(0.0, 0.0, 0.0));

    for chunk in world.active_chunks() {
        let (opaque, water) = expected_faces(chunk.voxels());
        assert_eq!(chunk.opaque_mesh().face_count(), opaque);
        assert_eq!(chunk.water_mesh().face_count(), water);
        assert_eq!(chunk.opaque_mesh().indices.len(), opaque * 6);
        assert_eq!(chunk.water_mesh().vertices.len(), water * 4);
    }
}

#[test]
fn generation_is_deterministic_across_worlds() {
    let mut a = World::new(reference_config(), HeadlessBackend::new()).unwrap();
    let mut b = World::new(reference_config(), HeadlessBackend::new()).unwrap();
    let coord = ChunkCoord::new(-3, 5);

    let grid_a = a.generate_chunk_at(coord).unwrap().voxels().clone();
    let grid_b = b.generate_chunk_at(coord).unwrap().voxels().clone();
    assert_eq!(grid_a, grid_b);
    assert_eq!(
        a.noise().sample_chunk(coord).values(),
        b.noise().sample_chunk(coord).values()
    );
}

#[test]
fn background_streaming_converges_to_synchronous_result() {
    let base = WorldConfig {
        chunk_size: 16,
        chunk_height: 32,
        streaming_radius: 1,
        water_level: 12,
        ..WorldConfig::default()
    };
    let mut sync_world = World::new(base.clone(), HeadlessBackend::new()).unwrap();
    let mut bg_world = World::new(
        WorldConfig {
            streaming: StreamingMode::Background { workers: 3 },
            ..base
        },
        HeadlessBackend::new(),
    )
    .unwrap();

    let path = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(20.0, 0.0, 0.0),
        Point3::new(40.0, 0.0, -20.0),
        Point3::new(40.0, 0.0, -20.0),
    ];
    for observer in path {
        sync_world.update(observer);
        bg_world.update(observer);
    }
    bg_world.flush_pending();

    assert_eq!(loaded(&bg_world), loaded(&sync_world));
    for chunk in sync_world.active_chunks() {
        let other = bg_world.get_chunk(chunk.coord()).unwrap();
        assert_eq!(other.voxels(), chunk.voxels());
        assert_eq!(other.water_mesh(), chunk.water_mesh());
    }
}

#[test]
fn blind_lookup_fails_fast() {
    let world = World::new(reference_config(), HeadlessBackend::new()).unwrap();
    let err = world.get_chunk(ChunkCoord::new(0, 0)).err().unwrap();
    assert!(matches!(err, WorldError::ChunkNotFound(_)));
    assert_eq!(err.to_string(), "chunk (0, 0) is not loaded");
}

#[test]
fn invalid_config_is_rejected_before_generation() {
    let config = WorldConfig {
        chunk_size: 0,
        ..WorldConfig::default()
    };
    let result = World::new(config, HeadlessBackend::new());
    assert!(matches!(
        result,
        Err(WorldError::Config(ConfigError::ZeroChunkDimension { .. }))
    ));
}

#[test]
fn config_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "chunk_size": 16,
            "streaming_radius": 2,
            "noise": {{ "seed": 77, "feature_size": 64.0 }},
            "terrain": {{ "mode": "uniform", "material": "rock" }},
            "streaming": {{ "mode": "background", "workers": 2 }}
        }}"#
    )
    .unwrap();

    let config = WorldConfig::load(file.path()).unwrap();
    assert_eq!(config.chunk_size, 16);
    assert_eq!(config.chunk_height, 100);
    assert_eq!(config.streaming_radius, 2);
    assert_eq!(config.noise.seed, 77);
    assert_eq!(config.noise.octaves, NoiseConfig::default().octaves);
    assert_eq!(
        config.terrain,
        TerrainMaterials::Uniform {
            material: VoxelType::ROCK
        }
    );
    assert_eq!(config.streaming, StreamingMode::Background { workers: 2 });
}

#[test]
fn config_load_reports_missing_file_and_bad_values() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    assert!(matches!(
        WorldConfig::load(&missing),
        Err(ConfigError::Io { path, .. }) if path == missing
    ));

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, r#"{ "noise": { "feature_size": -1.0 } }"#).unwrap();
    assert!(matches!(
        WorldConfig::load(&bad),
        Err(ConfigError::InvalidFeatureSize(_))
    ));
}
