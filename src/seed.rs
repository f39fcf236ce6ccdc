use crate::grid::Grid;
use crate::noise::{GradientNoise, Noise2D};
use crate::symmetry::Symmetry;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PatternKind {
    #[default]
    Spots,
    Stripes,
    Maze,
    Waves,
    Fingerprints,
}

impl PatternKind {
    pub const ALL: [PatternKind; 5] = [
        PatternKind::Spots,
        PatternKind::Stripes,
        PatternKind::Maze,
        PatternKind::Waves,
        PatternKind::Fingerprints,
    ];

    /// Unknown names fall back to `Spots`.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        match self {
            PatternKind::Spots => "spots",
            PatternKind::Stripes => "stripes",
            PatternKind::Maze => "maze",
            PatternKind::Waves => "waves",
            PatternKind::Fingerprints => "fingerprints",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|&k| k == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What to seed and which mirror constraints to hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSpec {
    pub kind: PatternKind,
    pub complexity: u32,
    pub symmetry: Symmetry,
}

impl Default for PatternSpec {
    fn default() -> Self {
        Self {
            kind: PatternKind::Spots,
            complexity: 5,
            symmetry: Symmetry::default(),
        }
    }
}

/// Fills a grid with an initial layout. Owns the randomness used for spot
/// placement and the gradient noise used by `maze` and `fingerprints`.
pub struct Seeder<N: Noise2D = GradientNoise> {
    rng: StdRng,
    noise: N,
}

impl Seeder<GradientNoise> {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = GradientNoise::from_rng(&mut rng);
        Self { rng, noise }
    }

    /// Draws a fresh noise permutation so noise-based layouts change.
    pub fn reshuffle_noise(&mut self) {
        self.noise = GradientNoise::from_rng(&mut self.rng);
    }
}

impl<N: Noise2D> Seeder<N> {
    pub fn with_noise(seed: u64, noise: N) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            noise,
        }
    }

    pub fn seed(&mut self, grid: &mut Grid, kind: PatternKind, complexity: u32) {
        grid.prime();
        if grid.is_empty() {
            return;
        }
        let complexity = complexity.max(1);
        match kind {
            PatternKind::Spots => self.spots(grid, complexity),
            PatternKind::Stripes => self.waves(grid, complexity, 0.0),
            PatternKind::Waves => self.waves(grid, complexity, 0.1),
            PatternKind::Maze => self.maze(grid, complexity),
            PatternKind::Fingerprints => self.fingerprints(grid, complexity),
        }
    }

    fn spots(&mut self, grid: &mut Grid, complexity: u32) {
        let count = complexity as usize * 2;
        let radius = ((grid.cols() as f32 * 0.05).floor() as isize).max(2);
        for _ in 0..count {
            let cx = self.rng.gen_range(0..grid.cols());
            let cy = self.rng.gen_range(0..grid.rows());
            grid.stamp_disk(cx, cy, radius);
        }
    }

    /// `B = 0.5 sin(freq x + tilt y) + 0.5`; stripes are waves with no tilt.
    fn waves(&mut self, grid: &mut Grid, complexity: u32, tilt: f32) {
        let freq = 2.0 * PI * (complexity as f32 / 5.0) / grid.cols() as f32;
        for y in 0..grid.rows() {
            for x in 0..grid.cols() {
                let b = (freq * x as f32 + tilt * y as f32).sin() * 0.5 + 0.5;
                grid.set(x, y, 1.0 - b, b);
            }
        }
    }

    fn maze(&mut self, grid: &mut Grid, complexity: u32) {
        let scale = 0.1 * (complexity as f32 / 5.0);
        for y in 0..grid.rows() {
            for x in 0..grid.cols() {
                let n = self.noise.sample(x as f32 * scale, y as f32 * scale);
                if n > 0.0 {
                    grid.set(x, y, 1.0, 0.0);
                } else {
                    grid.set(x, y, 0.0, 1.0);
                }
            }
        }
    }

    fn fingerprints(&mut self, grid: &mut Grid, complexity: u32) {
        let scale = 0.05 * (complexity as f32 / 5.0);
        for y in 0..grid.rows() {
            for x in 0..grid.cols() {
                let n = self.noise.sample(x as f32 * scale, y as f32 * scale);
                let b = (n * 0.5 + 0.5).clamp(0.0, 1.0);
                grid.set(x, y, 1.0 - b, b);
            }
        }
    }
}
