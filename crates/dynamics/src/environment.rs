//! Terrain and wind lookups consumed by the drag model and the landing checks.
//!
//! Positions use the `[horizontal, vertical, lateral]` convention; terrain height is a function
//! of the horizontal and lateral coordinates only.

use descent_core::vector::{self, Vector3};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

use crate::DynamicsError;

/// Narrow environment interface: terrain height and wind velocity at a position.
pub trait Environment: Send + Sync {
    /// Terrain elevation below `position` (m).
    fn terrain_height(&self, position: &Vector3) -> f64;

    /// Wind velocity at `position` (m/s).
    fn wind(&self, position: &Vector3) -> Vector3;

    /// Height of `position` above the terrain.
    fn altitude(&self, position: &Vector3) -> f64 {
        position[1] - self.terrain_height(position)
    }
}

/// Seeded 2D gradient (Perlin) noise with values roughly in [-1, 1].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradientNoise {
    seed: u64,
    perm: Vec<u8>,
}

impl GradientNoise {
    pub fn new(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(&mut rng);
        let perm = table.iter().chain(table.iter()).copied().collect();
        Self { seed, perm }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Noise value at `(x, y)`; zero on every integer lattice point.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let xf = x.floor();
        let yf = y.floor();
        let xi = (xf as i64).rem_euclid(256) as usize;
        let yi = (yf as i64).rem_euclid(256) as usize;
        let dx = x - xf;
        let dy = y - yf;
        let u = fade(dx);
        let v = fade(dy);

        let p = &self.perm;
        let a = p[xi] as usize + yi;
        let b = p[xi + 1] as usize + yi;
        let aa = p[a];
        let ab = p[a + 1];
        let ba = p[b];
        let bb = p[b + 1];

        let bottom = lerp(u, grad(aa, dx, dy), grad(ba, dx - 1.0, dy));
        let top = lerp(u, grad(ab, dx, dy - 1.0), grad(bb, dx - 1.0, dy - 1.0));
        lerp(v, bottom, top)
    }
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

fn grad(hash: u8, x: f64, y: f64) -> f64 {
    match hash & 7 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}

/// Terrain height field.
#[derive(Debug, Clone, PartialEq)]
pub enum TerrainModel {
    /// Level ground at a fixed elevation.
    Flat { height: f64 },
    /// Rolling synthetic terrain: `base + amplitude * noise(x / wavelength, z / wavelength)`.
    Noise {
        base_height: f64,
        amplitude: f64,
        wavelength: f64,
        noise: GradientNoise,
    },
}

impl TerrainModel {
    pub fn flat(height: f64) -> Self {
        TerrainModel::Flat { height }
    }

    pub fn noise(
        base_height: f64,
        amplitude: f64,
        wavelength: f64,
        seed: u64,
    ) -> Result<Self, DynamicsError> {
        if !(wavelength.is_finite() && wavelength > 0.0) {
            return Err(DynamicsError::InvalidWavelength(wavelength));
        }
        Ok(TerrainModel::Noise {
            base_height,
            amplitude,
            wavelength,
            noise: GradientNoise::new(seed),
        })
    }

    pub fn height(&self, position: &Vector3) -> f64 {
        match self {
            TerrainModel::Flat { height } => *height,
            TerrainModel::Noise {
                base_height,
                amplitude,
                wavelength,
                noise,
            } => {
                base_height
                    + amplitude * noise.sample(position[0] / wavelength, position[2] / wavelength)
            }
        }
    }
}

/// Wind velocity field.
#[derive(Debug, Clone, PartialEq)]
pub enum WindModel {
    Calm,
    Constant { velocity: Vector3 },
    /// Horizontal gusts around a mean wind; the vertical component is always the mean's.
    Noise {
        mean: Vector3,
        amplitude: f64,
        wavelength: f64,
        noise: GradientNoise,
    },
}

impl WindModel {
    pub fn constant(velocity: Vector3) -> Self {
        WindModel::Constant { velocity }
    }

    pub fn noise(
        mean: Vector3,
        amplitude: f64,
        wavelength: f64,
        seed: u64,
    ) -> Result<Self, DynamicsError> {
        if !(wavelength.is_finite() && wavelength > 0.0) {
            return Err(DynamicsError::InvalidWavelength(wavelength));
        }
        Ok(WindModel::Noise {
            mean,
            amplitude,
            wavelength,
            noise: GradientNoise::new(seed),
        })
    }

    pub fn velocity(&self, position: &Vector3) -> Vector3 {
        match self {
            WindModel::Calm => vector::ZERO,
            WindModel::Constant { velocity } => *velocity,
            WindModel::Noise {
                mean,
                amplitude,
                wavelength,
                noise,
            } => {
                let u = position[0] / wavelength;
                let w = position[2] / wavelength;
                // Offset the second sample so the two gust components are decorrelated.
                let gust = [
                    amplitude * noise.sample(u, w),
                    0.0,
                    amplitude * noise.sample(u + 31.7, w + 17.3),
                ];
                vector::add(mean, &gust)
            }
        }
    }
}

/// Environment assembled from a terrain model and a wind model.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticEnvironment {
    pub terrain: TerrainModel,
    pub wind: WindModel,
}

impl Default for SyntheticEnvironment {
    fn default() -> Self {
        Self::flat()
    }
}

impl SyntheticEnvironment {
    pub fn new(terrain: TerrainModel, wind: WindModel) -> Self {
        Self { terrain, wind }
    }

    /// Flat ground at zero elevation and no wind.
    pub fn flat() -> Self {
        Self::new(TerrainModel::flat(0.0), WindModel::Calm)
    }
}

impl Environment for SyntheticEnvironment {
    fn terrain_height(&self, position: &Vector3) -> f64 {
        self.terrain.height(position)
    }

    fn wind(&self, position: &Vector3) -> Vector3 {
        self.wind.velocity(position)
    }
}
