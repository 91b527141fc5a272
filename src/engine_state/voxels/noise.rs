//! # Noise Field Module
//!
//! Deterministic 2D fractal noise used as the terrain heightmap source.
//!
//! The generator sums `octaves` layers of Perlin noise (fractional Brownian
//! motion), each layer `lacunarity` times the frequency and `gain` times the
//! amplitude of the previous one. Identical parameters and chunk coordinates
//! always produce bit-identical heightmaps, which is what makes a world
//! reproducible from its seed.
//!
//! ## Sampling Grid
//!
//! A heightmap covers `width x height` grid cells. The region of chunk
//! `(cx, cy)` starts at cell
//!
//! ```text
//! (-width / 2 + cx * width, -height / 2 + cy * height)
//! ```
//!
//! so chunk `(0, 0)` straddles the origin of noise space. Cell `(i, j)` is
//! sampled at `(start_x + i, start_y + j) / feature_size`.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::config::{NoiseConfig, MAX_OCTAVES};

use super::chunk::ChunkCoord;

/// Smallest feature size used for sampling; smaller values are clamped.
pub const MIN_FEATURE_SIZE: f32 = 1e-4;

/// A `width x height` grid of raw noise samples, row-major (`i + j * width`).
#[derive(Clone, Debug, PartialEq)]
pub struct HeightMap {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl HeightMap {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Sample of cell `(i, j)`, or `None` outside the grid.
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i >= self.width || j >= self.height {
            return None;
        }
        Some(self.values[i + j * self.width])
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Smallest and largest sample, or `None` for an empty map.
    pub fn range(&self) -> Option<(f32, f32)> {
        let first = *self.values.first()?;
        Some(
            self.values
                .iter()
                .fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v))),
        )
    }
}

/// Fractal noise sampler shared by all chunk generations of a world.
pub struct NoiseGenerator {
    config: NoiseConfig,
    width: usize,
    height: usize,
    fbm: Fbm<Perlin>,
}

impl NoiseGenerator {
    /// Creates a generator producing `width x height` heightmaps.
    ///
    /// Out-of-range parameters are clamped rather than rejected; validate the
    /// configuration beforehand to catch them.
    pub fn new(config: NoiseConfig, width: usize, height: usize) -> Self {
        let fbm = Self::build_fbm(&config);
        NoiseGenerator {
            config,
            width,
            height,
            fbm,
        }
    }

    fn build_fbm(config: &NoiseConfig) -> Fbm<Perlin> {
        Fbm::<Perlin>::new(config.seed)
            .set_octaves(config.octaves.clamp(1, MAX_OCTAVES))
            .set_lacunarity(config.lacunarity as f64)
            .set_persistence(config.gain as f64)
            .set_frequency(1.0)
    }

    fn rebuild(&mut self) {
        self.fbm = Self::build_fbm(&self.config);
    }

    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Samples the heightmap of chunk `(chunk_x, chunk_y)` at the given feature size.
    ///
    /// # Arguments
    /// * `chunk_x`, `chunk_y` - The chunk coordinate
    /// * `feature_size` - Grid cells per noise unit; clamped to [`MIN_FEATURE_SIZE`]
    ///
    /// # Returns
    /// A heightmap of `width * height` samples, roughly in `[-1, 1]`.
    pub fn sample(&self, chunk_x: i32, chunk_y: i32, feature_size: f32) -> HeightMap {
        let frequency = 1.0 / feature_size.max(MIN_FEATURE_SIZE) as f64;
        let width = self.width as f64;
        let height = self.height as f64;
        let start_x = -width / 2.0 + chunk_x as f64 * width;
        let start_y = -height / 2.0 + chunk_y as f64 * height;

        let mut values = Vec::with_capacity(self.width * self.height);
        for j in 0..self.height {
            for i in 0..self.width {
                let x = (start_x + i as f64) * frequency;
                let y = (start_y + j as f64) * frequency;
                values.push(self.fbm.get([x, y]) as f32);
            }
        }

        HeightMap {
            width: self.width,
            height: self.height,
            values,
        }
    }

    /// Samples a chunk's heightmap with the configured feature size.
    pub fn sample_chunk(&self, coord: ChunkCoord) -> HeightMap {
        self.sample(coord.x, coord.y, self.config.feature_size)
    }

    pub fn set_octaves(&mut self, octaves: usize) {
        self.config.octaves = octaves.clamp(1, MAX_OCTAVES);
        self.rebuild();
    }

    pub fn set_lacunarity(&mut self, lacunarity: f32) {
        self.config.lacunarity = lacunarity;
        self.rebuild();
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.config.gain = gain;
        self.rebuild();
    }

    pub fn set_seed(&mut self, seed: u32) {
        self.config.seed = seed;
        self.rebuild();
    }

    /// Sets the feature size used by [`NoiseGenerator::sample_chunk`].
    pub fn set_feature_size(&mut self, feature_size: f32) {
        self.config.feature_size = feature_size.max(MIN_FEATURE_SIZE);
    }

    /// Sets the base frequency, the inverse of the feature size.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.set_feature_size(1.0 / frequency.max(MIN_FEATURE_SIZE));
    }

    pub fn set_dimensions(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(seed: u32) -> NoiseGenerator {
        NoiseGenerator::new(
            NoiseConfig {
                seed,
                ..NoiseConfig::default()
            },
            16,
            16,
        )
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let a = generator(7).sample(3, -2, 64.0);
        let b = generator(7).sample(3, -2, 64.0);
        assert_eq!(a.width(), 16);
        assert_eq!(a.values().len(), 256);
        for (x, y) in a.values().iter().zip(b.values()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn test_seed_changes_output() {
        let a = generator(1).sample(0, 0, 8.0);
        let b = generator(2).sample(0, 0, 8.0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_chunk_regions_tile_noise_space() {
        let generator = generator(0);
        let map = generator.sample(1, -1, 16.0);

        // chunk (1, -1) with a 16-cell edge starts at cell (8, -24)
        for j in 0..16 {
            for i in 0..16 {
                let x = (8 + i as i64) as f64 / 16.0;
                let y = (-24 + j as i64) as f64 / 16.0;
                assert_eq!(map.get(i, j), Some(generator.fbm.get([x, y]) as f32));
            }
        }
    }

    #[test]
    fn test_odd_chunk_size_starts_half_a_cell_off() {
        let generator = NoiseGenerator::new(NoiseConfig::default(), 5, 3);
        let map = generator.sample(2, -1, 4.0);

        // chunk (2, -1) with a 5x3 region starts at (7.5, -4.5)
        for j in 0..3 {
            for i in 0..5 {
                let x = (7.5 + i as f64) * 0.25;
                let y = (-4.5 + j as f64) * 0.25;
                assert_eq!(map.get(i, j), Some(generator.fbm.get([x, y]) as f32));
            }
        }
    }

    #[test]
    fn test_samples_match_recorded_values() {
        let generator = NoiseGenerator::new(
            NoiseConfig {
                octaves: 6,
                lacunarity: 2.0,
                gain: 0.5,
                seed: 42,
                feature_size: 64.0,
            },
            16,
            16,
        );
        let map = generator.sample(3, -2, 64.0);

        let recorded = [
            ((0, 0), 0x3e97_5770_u32),
            ((5, 9), 0x3ea7_3e27),
            ((15, 15), 0xbd1d_b7df),
            ((11, 2), 0x3dac_f9d9),
        ];
        for ((i, j), bits) in recorded {
            let value = map.get(i, j).unwrap();
            assert_eq!(value.to_bits(), bits, "sample ({i}, {j}) = {value}");
        }
    }

    #[test]
    fn test_feature_size_is_clamped() {
        let generator = generator(0);
        let clamped = generator.sample(0, 0, 0.0);
        let epsilon = generator.sample(0, 0, MIN_FEATURE_SIZE);
        assert_eq!(clamped, epsilon);
        assert!(clamped.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_setters_update_config() {
        let mut generator = generator(0);
        let before = generator.sample_chunk(ChunkCoord::new(0, 0));

        generator.set_seed(99);
        generator.set_octaves(100);
        generator.set_gain(0.25);
        generator.set_lacunarity(3.0);
        generator.set_frequency(0.5);

        let config = generator.config();
        assert_eq!(config.seed, 99);
        assert_eq!(config.octaves, MAX_OCTAVES);
        assert_eq!(config.gain, 0.25);
        assert_eq!(config.lacunarity, 3.0);
        assert_eq!(config.feature_size, 2.0);
        assert_ne!(generator.sample_chunk(ChunkCoord::new(0, 0)), before);
    }

    #[test]
    fn test_heightmap_range() {
        let map = generator(5).sample(0, 0, 4.0);
        let (lo, hi) = map.range().unwrap();
        assert!(lo <= hi);
        assert!(lo >= -2.0 && hi <= 2.0);
        assert_eq!(map.get(16, 0), None);
    }
}
