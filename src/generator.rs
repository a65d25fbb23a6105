use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::palette::Palette;

/// Cell value before generation assigns a real height.
pub const HEIGHT_NIL: i32 = 0;
pub const HEIGHT_MIN: i32 = 1;
pub const HEIGHT_MAX: i32 = 16;
pub const DEFAULT_MAP_SIZE: usize = 65;
pub const DEFAULT_ROUGHNESS: f64 = 16.0;

/// Perturbations never decay below this, so fine subdivision levels still vary.
const ROUGHNESS_FLOOR: f64 = 0.1;

pub type HeightMap = Vec<Vec<i32>>;

/// Inputs of one generation session. Immutable once generation starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Grid edge length; must be 2^k + 1 for some k >= 1.
    pub size: usize,
    pub height_min: i32,
    pub height_max: i32,
    pub roughness: f64,
    pub seed: u64,
    pub palette_name: String,
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams {
            size: DEFAULT_MAP_SIZE,
            height_min: HEIGHT_MIN,
            height_max: HEIGHT_MAX,
            roughness: DEFAULT_ROUGHNESS,
            seed: 111,
            palette_name: crate::palette::DEFAULT_PALETTE.to_string(),
        }
    }
}

impl GenerationParams {
    /// True when `size` has the 2^k + 1 shape the subdivision needs.
    pub fn size_is_valid(&self) -> bool {
        self.size >= 3 && (self.size - 1).is_power_of_two()
    }
}

/// Rounds with ties going up (2.5 -> 3, -0.5 -> 0), then clamps into the
/// height range. This exact rule is part of the generator's contract; banker's
/// rounding would change every seeded map.
pub fn round_and_clamp(value: f64, height_min: i32, height_max: i32) -> i32 {
    let d_floor = value - value.floor();
    let d_ceil = value.ceil() - value;
    let rounded = if d_ceil > d_floor {
        value.floor()
    } else {
        value.ceil()
    } as i32;
    rounded.clamp(height_min, height_max)
}

/// One diamond-square generation session. Owns its grid and its RNG exclusively;
/// two concurrent generations need two independent sessions.
pub struct DiamondSquare {
    params: GenerationParams,
    rng: ChaCha8Rng,
    height_map: HeightMap,
}

impl DiamondSquare {
    pub fn new(params: GenerationParams) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(params.seed);
        let height_map = vec![vec![HEIGHT_NIL; params.size]; params.size];
        DiamondSquare {
            params,
            rng,
            height_map,
        }
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn height_map(&self) -> &HeightMap {
        &self.height_map
    }

    /// Runs the full subdivision. Re-seeds the session RNG first, so repeated
    /// calls (and calls after unrelated RNG use) are reproducible. The palette
    /// capacity check runs before any grid mutation because generation is the
    /// expensive step for large grids.
    pub fn generate(&mut self, palette: &Palette) -> Result<&HeightMap, MapError> {
        if palette.len() < self.params.height_max as usize {
            return Err(MapError::PaletteCapacity {
                palette: palette.name.clone(),
                colors: palette.len(),
                height_max: self.params.height_max,
            });
        }

        self.rng = ChaCha8Rng::seed_from_u64(self.params.seed);
        for row in &mut self.height_map {
            row.fill(HEIGHT_NIL);
        }
        self.diamond_square();
        Ok(&self.height_map)
    }

    fn random_value(&mut self, roughness: f64) -> f64 {
        self.rng.gen_range(-1i32..=1) as f64 * roughness
    }

    fn draw_corner(&mut self) -> i32 {
        self.rng
            .gen_range(self.params.height_min..=self.params.height_max)
    }

    fn round_and_clamp(&self, value: f64) -> i32 {
        round_and_clamp(value, self.params.height_min, self.params.height_max)
    }

    fn diamond_square(&mut self) {
        let size = self.params.size;
        let mut random_scalar = self.params.roughness;

        // Corner draw order is fixed: top-left, top-right, bottom-left,
        // bottom-right. Changing it would change every seeded map.
        self.height_map[0][0] = self.draw_corner();
        self.height_map[0][size - 1] = self.draw_corner();
        self.height_map[size - 1][0] = self.draw_corner();
        self.height_map[size - 1][size - 1] = self.draw_corner();

        let mut chunk_size = size - 1;
        while chunk_size > 1 {
            let half = chunk_size / 2;

            // Diamond step: each chunk center gets the mean of its four corners
            // plus a perturbation.
            for y in (0..size - 1).step_by(chunk_size) {
                for x in (0..size - 1).step_by(chunk_size) {
                    let avg = (self.height_map[y][x]
                        + self.height_map[y][x + chunk_size]
                        + self.height_map[y + chunk_size][x]
                        + self.height_map[y + chunk_size][x + chunk_size])
                        as f64
                        / 4.0;
                    let perturbed = avg + self.random_value(random_scalar);
                    self.height_map[y + half][x + half] = self.round_and_clamp(perturbed);
                }
            }

            // Square step: edge midpoints average their axis-aligned neighbors
            // at distance `half`. The low-side test is strictly `> 0`, which
            // skips neighbors sitting on index 0; seeded maps depend on this
            // edge bias, so it must not be "fixed".
            for y in (0..size).step_by(half) {
                let first_x = (y + half) % chunk_size;
                for x in (first_x..size).step_by(chunk_size) {
                    let mut sum = 0i32;
                    let mut count = 0i32;
                    if x > half {
                        sum += self.height_map[y][x - half];
                        count += 1;
                    }
                    if x + half < size {
                        sum += self.height_map[y][x + half];
                        count += 1;
                    }
                    if y > half {
                        sum += self.height_map[y - half][x];
                        count += 1;
                    }
                    if y + half < size {
                        sum += self.height_map[y + half][x];
                        count += 1;
                    }
                    let avg = sum as f64 / count as f64;
                    let perturbed = avg + self.random_value(random_scalar);
                    self.height_map[y][x] = self.round_and_clamp(perturbed);
                }
            }

            chunk_size /= 2;
            random_scalar = (random_scalar / 2.0).max(ROUGHNESS_FLOOR);
        }
    }
}
