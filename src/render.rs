use crate::engine::Engine;
use crate::grid::Grid;
use crate::palette::{ColorMap, Palette, Rgb, DEFAULT_STEPS};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VisualizationMode {
    #[default]
    ChemicalB,
    Gradient,
    Heatmap,
    Contour,
}

impl VisualizationMode {
    pub const ALL: [VisualizationMode; 4] = [
        VisualizationMode::ChemicalB,
        VisualizationMode::Gradient,
        VisualizationMode::Heatmap,
        VisualizationMode::Contour,
    ];

    /// Unknown names render as `chemical-b`.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        match self {
            VisualizationMode::ChemicalB => "chemical-b",
            VisualizationMode::Gradient => "gradient",
            VisualizationMode::Heatmap => "heatmap",
            VisualizationMode::Contour => "contour",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|&m| m == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    /// Scalar shown for a cell before excitation and clamping.
    pub fn cell_value(self, a: f32, b: f32) -> f32 {
        match self {
            VisualizationMode::Gradient => a - b + 0.5,
            _ => b,
        }
    }
}

impl fmt::Display for VisualizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Black -> red -> yellow -> white over three equal bands.
pub fn heatmap_color(value: f32) -> Rgb {
    let ramp = |t: f32| (t * 3.0 * 255.0).floor().clamp(0.0, 255.0) as u8;
    if value < 0.33 {
        Rgb::new(ramp(value), 0, 0)
    } else if value < 0.66 {
        Rgb::new(255, ramp(value - 0.33), 0)
    } else {
        Rgb::new(255, 255, ramp(value - 0.66))
    }
}

/// True when `value` lies within 0.02 of the nearest multiple of 0.1.
pub fn on_contour(value: f32) -> bool {
    let nearest = (value * 10.0).round() / 10.0;
    (value - nearest).abs() < 0.02
}

/// Turns the concentration field into an RGBA buffer at display resolution.
///
/// The color map is cached and rebuilt only when the active palette changes.
pub struct FieldRenderer {
    palette: Palette,
    color_map: Option<ColorMap>,
    pixels: Vec<u8>,
    size: (usize, usize),
}

impl FieldRenderer {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            color_map: None,
            pixels: Vec::new(),
            size: (0, 0),
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        if palette != self.palette {
            self.palette = palette;
            self.color_map = None;
        }
    }

    pub fn color_map(&mut self) -> &ColorMap {
        let palette = &self.palette;
        self.color_map.get_or_insert_with(|| {
            debug!(palette = %palette.name, "building color map");
            ColorMap::build(palette, DEFAULT_STEPS)
        })
    }

    /// Last rendered buffer, `width * height * 4` bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// `(width, height)` of the last rendered buffer. May lag the engine after a resize.
    pub fn size(&self) -> (usize, usize) {
        self.size
    }

    pub fn render(&mut self, engine: &Engine, mode: VisualizationMode) -> &[u8] {
        self.render_grid(
            engine.grid(),
            engine.width(),
            engine.height(),
            mode,
            engine.excitation(),
        )
    }

    /// Each cell covers a 2x2 pixel block. A leftover column or row on odd
    /// display sizes repeats the nearest cell. Alpha is always 255.
    pub fn render_grid(
        &mut self,
        grid: &Grid,
        width: usize,
        height: usize,
        mode: VisualizationMode,
        excitation: Option<f32>,
    ) -> &[u8] {
        self.color_map();
        let map = self.color_map.take().unwrap_or_default();

        let mut colors = Vec::with_capacity(grid.len());
        for i in 0..grid.len() {
            let mut value = mode.cell_value(grid.a[i], grid.b[i]);
            if let Some(e) = excitation.filter(|&e| e > 0.0) {
                value *= 1.0 + 0.3 * e;
            }
            let value = if value.is_nan() {
                0.0
            } else {
                value.clamp(0.0, 1.0)
            };
            let color = match mode {
                VisualizationMode::Heatmap => heatmap_color(value),
                VisualizationMode::Contour if on_contour(value) => Rgb::WHITE,
                _ => map.sample_at(value),
            };
            colors.push(color);
        }
        self.color_map = Some(map);

        self.pixels.clear();
        self.pixels.resize(width * height * 4, 0);
        self.size = (width, height);
        let cols = grid.cols();
        let rows = grid.rows();
        for py in 0..height {
            let cy = (py / 2).min(rows.saturating_sub(1));
            for px in 0..width {
                let o = (py * width + px) * 4;
                let c = if cols == 0 || rows == 0 {
                    Rgb::BLACK
                } else {
                    colors[cy * cols + (px / 2).min(cols - 1)]
                };
                self.pixels[o] = c.r;
                self.pixels[o + 1] = c.g;
                self.pixels[o + 2] = c.b;
                self.pixels[o + 3] = 255;
            }
        }
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bw() -> Palette {
        Palette::custom("bw", &["#000000", "#ffffff"]).unwrap()
    }

    #[test]
    fn mode_names_and_fallback() {
        for m in VisualizationMode::ALL {
            assert_eq!(VisualizationMode::from_name(m.name()), m);
        }
        assert_eq!(
            VisualizationMode::from_name("sparkle"),
            VisualizationMode::ChemicalB
        );
        assert_eq!(
            VisualizationMode::Contour.next(),
            VisualizationMode::ChemicalB
        );
    }

    #[test]
    fn gradient_mode_uses_difference() {
        assert_eq!(VisualizationMode::Gradient.cell_value(0.75, 0.25), 1.0);
        assert_eq!(VisualizationMode::Heatmap.cell_value(0.75, 0.25), 0.25);
    }

    #[test]
    fn heatmap_bands() {
        assert_eq!(heatmap_color(0.0), Rgb::BLACK);
        assert_eq!(heatmap_color(0.2).g, 0);
        assert_eq!(heatmap_color(0.5).r, 255);
        assert_eq!(heatmap_color(0.5).b, 0);
        assert_eq!(heatmap_color(1.0), Rgb::WHITE);
    }

    #[test]
    fn contour_lines_near_tenths() {
        assert!(on_contour(0.3));
        assert!(on_contour(0.39));
        assert!(on_contour(0.415));
        assert!(!on_contour(0.45));
        assert!(on_contour(1.0));
    }

    #[test]
    fn renders_two_by_two_blocks() {
        let mut grid = Grid::new(2, 1);
        grid.b = vec![0.0, 1.0];
        let mut r = FieldRenderer::new(bw());
        let px = r
            .render_grid(&grid, 4, 2, VisualizationMode::ChemicalB, None)
            .to_vec();
        assert_eq!(px.len(), 4 * 2 * 4);
        let at = |x: usize, y: usize| &px[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
        for y in 0..2 {
            assert_eq!(at(0, y), &[0, 0, 0, 255]);
            assert_eq!(at(1, y), &[0, 0, 0, 255]);
            assert_eq!(at(2, y), &[255, 255, 255, 255]);
            assert_eq!(at(3, y), &[255, 255, 255, 255]);
        }
    }

    #[test]
    fn odd_display_is_fully_opaque() {
        let grid = Grid::new(2, 2);
        let mut r = FieldRenderer::new(bw());
        let px = r.render_grid(&grid, 5, 5, VisualizationMode::Gradient, None);
        assert_eq!(px.len(), 100);
        assert!(px.chunks(4).all(|p| p[3] == 255));
    }

    #[test]
    fn excitation_brightens() {
        let mut grid = Grid::new(1, 1);
        grid.b = vec![0.5];
        let mut r = FieldRenderer::new(bw());
        let calm = r
            .render_grid(&grid, 2, 2, VisualizationMode::ChemicalB, None)
            .to_vec();
        let loud = r
            .render_grid(&grid, 2, 2, VisualizationMode::ChemicalB, Some(1.0))
            .to_vec();
        assert!(loud[0] > calm[0]);
    }

    #[test]
    fn empty_grid_renders_black() {
        let grid = Grid::new(0, 0);
        let mut r = FieldRenderer::new(bw());
        let px = r.render_grid(&grid, 1, 1, VisualizationMode::ChemicalB, None);
        assert_eq!(px, &[0, 0, 0, 255]);
    }

    #[test]
    fn size_follows_the_last_render() {
        let mut r = FieldRenderer::new(bw());
        assert_eq!(r.size(), (0, 0));
        r.render_grid(&Grid::new(3, 2), 7, 5, VisualizationMode::ChemicalB, None);
        assert_eq!(r.size(), (7, 5));
        assert_eq!(r.pixels().len(), 7 * 5 * 4);
    }

    #[test]
    fn palette_change_invalidates_map() {
        let mut r = FieldRenderer::new(bw());
        assert_eq!(r.color_map().sample_at(1.0), Rgb::WHITE);
        r.set_palette(Palette::custom("red", &["#ff0000"]).unwrap());
        assert_eq!(r.color_map().sample_at(1.0), Rgb::new(255, 0, 0));
        assert_eq!(r.palette().name, "red");
    }
}
