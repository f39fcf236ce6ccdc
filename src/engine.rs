use crate::grid::{laplacian, Grid};
use crate::seed::{PatternKind, PatternSpec, Seeder};
use crate::symmetry::Symmetry;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Brush radius in grid cells for pointer stamps.
pub const BRUSH_RADIUS: isize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub feed: f32,
    pub kill: f32,
    pub diff_a: f32,
    pub diff_b: f32,
    pub time_step: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            feed: 0.0367,
            kill: 0.0649,
            diff_a: 1.0,
            diff_b: 0.5,
            time_step: 1.0,
        }
    }
}

impl SimulationParams {
    /// Feed and kill after excitation modulation.
    pub fn modulated(&self, excitation: Option<f32>) -> (f32, f32) {
        match excitation {
            Some(e) if e > 0.0 => (self.feed * (1.0 + 0.5 * e), self.kill * (1.0 + 0.3 * e)),
            _ => (self.feed, self.kill),
        }
    }
}

/// Per-step input from the driver. Pointer coordinates are display pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InteractionInput {
    pub pointer_x: f32,
    pub pointer_y: f32,
    pub pointer_active: bool,
    pub excitation: Option<f32>,
}

impl InteractionInput {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn pointer(x: f32, y: f32) -> Self {
        Self {
            pointer_x: x,
            pointer_y: y,
            pointer_active: true,
            excitation: None,
        }
    }

    pub fn with_excitation(mut self, e: Option<f32>) -> Self {
        self.excitation = e;
        self
    }

    /// Excitation clamped to `[0, 1]`; NaN counts as absent.
    pub fn excitation_level(&self) -> Option<f32> {
        self.excitation
            .filter(|e| !e.is_nan())
            .map(|e| e.clamp(0.0, 1.0))
    }
}

/// Mean of byte-valued frequency bins, normalized to `[0, 1]`.
pub fn excitation_from_spectrum(bins: &[u8]) -> Option<f32> {
    if bins.is_empty() {
        return None;
    }
    let sum: u64 = bins.iter().map(|&b| b as u64).sum();
    Some(sum as f32 / bins.len() as f32 / 255.0)
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldStats {
    pub min_b: f32,
    pub max_b: f32,
    pub mean_b: f32,
    pub steps: u64,
}

/// Gray-Scott integrator over a toroidal grid.
///
/// Owns two buffer pairs: the current grid and a scratch pair that receives
/// the next state before the roles are swapped.
pub struct Engine {
    width: usize,
    height: usize,
    grid: Grid,
    next_a: Vec<f32>,
    next_b: Vec<f32>,
    params: SimulationParams,
    pattern: PatternSpec,
    seeder: Seeder,
    input: InteractionInput,
    steps: u64,
}

impl Engine {
    pub fn new(
        width: usize,
        height: usize,
        params: SimulationParams,
        pattern: PatternSpec,
        seed: u64,
    ) -> Self {
        let (cols, rows) = Grid::dims_for_display(width, height);
        let mut engine = Self {
            width,
            height,
            grid: Grid::new(cols, rows),
            next_a: vec![0.0; cols * rows],
            next_b: vec![0.0; cols * rows],
            params,
            pattern,
            seeder: Seeder::new(seed),
            input: InteractionInput::idle(),
            steps: 0,
        };
        engine.reset();
        engine
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn pattern(&self) -> &PatternSpec {
        &self.pattern
    }

    pub fn input(&self) -> &InteractionInput {
        &self.input
    }

    /// Excitation supplied with the most recent step.
    pub fn excitation(&self) -> Option<f32> {
        self.input.excitation_level()
    }

    /// Takes effect on the next step.
    pub fn set_params(&mut self, params: SimulationParams) {
        self.params = params;
    }

    /// A new pattern kind reseeds; complexity and symmetry changes apply on the
    /// next reseed or brush stamp.
    pub fn set_pattern(&mut self, pattern: PatternSpec) {
        let kind_changed = pattern.kind != self.pattern.kind;
        self.pattern = pattern;
        if kind_changed {
            self.reset();
        }
    }

    pub fn set_symmetry(&mut self, symmetry: Symmetry) {
        self.pattern.symmetry = symmetry;
    }

    pub fn set_kind(&mut self, kind: PatternKind) {
        self.set_pattern(PatternSpec {
            kind,
            ..self.pattern
        });
    }

    pub fn reshuffle_noise(&mut self) {
        self.seeder.reshuffle_noise();
    }

    /// Reseeds at the current size with the current pattern.
    pub fn reset(&mut self) {
        debug!(
            pattern = %self.pattern.kind,
            complexity = self.pattern.complexity,
            cols = self.grid.cols(),
            rows = self.grid.rows(),
            "reseeding grid"
        );
        self.seeder
            .seed(&mut self.grid, self.pattern.kind, self.pattern.complexity);
        self.pattern.symmetry.apply(&mut self.grid);
        self.steps = 0;
    }

    /// Reallocates and reseeds only when the grid dimensions change.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let (cols, rows) = Grid::dims_for_display(width, height);
        if cols == self.grid.cols() && rows == self.grid.rows() {
            return;
        }
        debug!(cols, rows, "grid resized");
        self.grid = Grid::new(cols, rows);
        self.next_a = vec![0.0; cols * rows];
        self.next_b = vec![0.0; cols * rows];
        self.reset();
    }

    pub fn step(&mut self, input: InteractionInput) {
        self.input = input;
        if input.pointer_active {
            self.stamp(input.pointer_x, input.pointer_y);
        }
        self.integrate(input.excitation_level());
        self.steps += 1;
    }

    /// Off-grid pointers are ignored.
    fn stamp(&mut self, px: f32, py: f32) {
        let gx = (px / 2.0).floor();
        let gy = (py / 2.0).floor();
        if !(gx >= 0.0 && gy >= 0.0) {
            return;
        }
        let (gx, gy) = (gx as usize, gy as usize);
        if gx >= self.grid.cols() || gy >= self.grid.rows() {
            return;
        }
        self.grid.stamp_disk(gx, gy, BRUSH_RADIUS);
        self.pattern.symmetry.apply(&mut self.grid);
    }

    fn integrate(&mut self, excitation: Option<f32>) {
        let cols = self.grid.cols();
        let rows = self.grid.rows();
        if cols == 0 || rows == 0 {
            return;
        }

        let SimulationParams {
            diff_a,
            diff_b,
            time_step: dt,
            ..
        } = self.params;
        let (feed, kill) = self.params.modulated(excitation);

        let a_now = &self.grid.a;
        let b_now = &self.grid.b;
        for y in 0..rows {
            for x in 0..cols {
                let i = y * cols + x;
                let a = a_now[i];
                let b = b_now[i];
                let lap_a = laplacian(a_now, cols, rows, x, y);
                let lap_b = laplacian(b_now, cols, rows, x, y);
                let reaction = a * b * b;

                let na = a + dt * (diff_a * lap_a - reaction + feed * (1.0 - a));
                let nb = b + dt * (diff_b * lap_b + reaction - (kill + feed) * b);

                self.next_a[i] = na.clamp(0.0, 1.0);
                self.next_b[i] = nb.clamp(0.0, 1.0);
            }
        }

        std::mem::swap(&mut self.grid.a, &mut self.next_a);
        std::mem::swap(&mut self.grid.b, &mut self.next_b);
    }

    pub fn stats(&self) -> FieldStats {
        let b = &self.grid.b;
        if b.is_empty() {
            return FieldStats {
                steps: self.steps,
                ..Default::default()
            };
        }
        let mut min_b = f32::INFINITY;
        let mut max_b = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        for &v in b {
            min_b = min_b.min(v);
            max_b = max_b.max(v);
            sum += v as f64;
        }
        FieldStats {
            min_b,
            max_b,
            mean_b: (sum / b.len() as f64) as f32,
            steps: self.steps,
        }
    }
}
