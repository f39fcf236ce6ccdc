//! Gray-Scott reaction-diffusion core: grid state, pattern seeding, symmetry,
//! the integrator and the color-mapped renderer. The terminal driver lives in
//! the `rdsketch` binary.

pub mod config;
pub mod engine;
pub mod export;
pub mod grid;
pub mod noise;
pub mod palette;
pub mod render;
pub mod seed;
pub mod symmetry;

pub use engine::{
    excitation_from_spectrum, Engine, FieldStats, InteractionInput, SimulationParams,
};
pub use grid::Grid;
pub use palette::{ColorMap, Harmony, Palette, PaletteError, Rgb};
pub use render::{FieldRenderer, VisualizationMode};
pub use seed::{PatternKind, PatternSpec, Seeder};
pub use symmetry::Symmetry;
