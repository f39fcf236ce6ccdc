use clap::{Parser, ValueEnum};
use rdsketch::config::Settings;
use rdsketch::palette::{parse_hex, Harmony, Palette, Rgb};
use rdsketch::{PatternKind, VisualizationMode};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "rdsketch")]
#[command(about = "Gray-Scott reaction-diffusion in the terminal")]
pub(crate) struct Cli {
    /// Initial pattern: spots, stripes, maze, waves, fingerprints
    #[arg(long)]
    pub(crate) pattern: Option<String>,

    /// Visualization: chemical-b, gradient, heatmap, contour
    #[arg(long)]
    pub(crate) mode: Option<String>,

    /// Palette name (builtin or from settings.json)
    #[arg(long)]
    pub(crate) palette: Option<String>,

    /// Pattern complexity (>= 1)
    #[arg(long)]
    pub(crate) complexity: Option<u32>,

    #[arg(long)]
    pub(crate) feed: Option<f32>,

    #[arg(long)]
    pub(crate) kill: Option<f32>,

    #[arg(long)]
    pub(crate) time_step: Option<f32>,

    /// Mirror left half onto right half
    #[arg(long, default_value_t = false)]
    pub(crate) horizontal: bool,

    /// Mirror top half onto bottom half
    #[arg(long, default_value_t = false)]
    pub(crate) vertical: bool,

    /// 8-fold radial symmetry about the centre
    #[arg(long, default_value_t = false)]
    pub(crate) radial: bool,

    /// RNG seed for pattern synthesis
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Frame cap (10..=240)
    #[arg(long)]
    pub(crate) fps: Option<u32>,

    /// Simulation steps per rendered frame (1..=50)
    #[arg(long)]
    pub(crate) steps_per_frame: Option<u32>,

    /// Start with the synthetic pulse excitation running
    #[arg(long, default_value_t = false)]
    pub(crate) pulse: bool,

    /// Base color for a generated palette, e.g. "#3366cc"
    #[arg(long, value_parser = parse_color)]
    pub(crate) base_color: Option<Rgb>,

    /// Harmony used with --base-color
    #[arg(long, value_enum, default_value_t = HarmonyArg::Analogous)]
    pub(crate) harmony: HarmonyArg,

    /// Run without a terminal and write a PNG
    #[arg(long, default_value_t = false)]
    pub(crate) headless: bool,

    /// Headless display width in pixels
    #[arg(long, default_value_t = 256)]
    pub(crate) width: usize,

    /// Headless display height in pixels
    #[arg(long, default_value_t = 256)]
    pub(crate) height: usize,

    /// Headless frames to simulate before export
    #[arg(long, default_value_t = 500)]
    pub(crate) frames: u32,

    /// Headless output path (default: timestamped file in the current dir)
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HarmonyArg {
    Complementary,
    Triadic,
    Analogous,
}

impl From<HarmonyArg> for Harmony {
    fn from(h: HarmonyArg) -> Self {
        match h {
            HarmonyArg::Complementary => Harmony::Complementary,
            HarmonyArg::Triadic => Harmony::Triadic,
            HarmonyArg::Analogous => Harmony::Analogous,
        }
    }
}

fn parse_color(s: &str) -> Result<Rgb, String> {
    parse_hex(s).map_err(|e| e.to_string())
}

impl Cli {
    /// Session overrides on top of persisted settings.
    pub(crate) fn apply(&self, s: &mut Settings) {
        if let Some(p) = &self.pattern {
            s.pattern = PatternKind::from_name(p);
        }
        if let Some(m) = &self.mode {
            s.mode = VisualizationMode::from_name(m);
        }
        if let Some(p) = &self.palette {
            s.palette = p.clone();
        }
        if let Some(base) = self.base_color {
            let generated = Palette::from_harmony(base, self.harmony.into());
            s.custom_palettes
                .insert(generated.name.clone(), generated.to_hex());
            s.palette = generated.name;
        }
        if let Some(c) = self.complexity {
            s.complexity = c;
        }
        if let Some(v) = self.feed {
            s.feed = v;
        }
        if let Some(v) = self.kill {
            s.kill = v;
        }
        if let Some(v) = self.time_step {
            s.time_step = v;
        }
        s.symmetry.horizontal |= self.horizontal;
        s.symmetry.vertical |= self.vertical;
        s.symmetry.radial |= self.radial;
        if let Some(seed) = self.seed {
            s.seed = seed;
        }
        if let Some(fps) = self.fps {
            s.fps_cap = fps;
        }
        if let Some(n) = self.steps_per_frame {
            s.steps_per_frame = n;
        }
        *s = std::mem::take(s).normalized();
    }
}
