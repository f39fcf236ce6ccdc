use crate::grid::Grid;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const RADIAL_SEGMENTS: usize = 8;

/// Independent mirror constraints. Applied horizontal, vertical, radial in that order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symmetry {
    #[serde(default)]
    pub horizontal: bool,
    #[serde(default)]
    pub vertical: bool,
    #[serde(default)]
    pub radial: bool,
}

impl Symmetry {
    pub fn any(&self) -> bool {
        self.horizontal || self.vertical || self.radial
    }

    pub fn apply(&self, grid: &mut Grid) {
        if grid.is_empty() {
            return;
        }
        if self.horizontal {
            mirror_horizontal(grid);
        }
        if self.vertical {
            mirror_vertical(grid);
        }
        if self.radial {
            mirror_radial(grid);
        }
    }

    pub fn label(&self) -> String {
        let mut s = String::new();
        if self.horizontal {
            s.push('H');
        }
        if self.vertical {
            s.push('V');
        }
        if self.radial {
            s.push('R');
        }
        if s.is_empty() {
            s.push('-');
        }
        s
    }
}

/// Left half is copied onto the right half.
fn mirror_horizontal(grid: &mut Grid) {
    let cols = grid.cols();
    for y in 0..grid.rows() {
        for x in 0..cols / 2 {
            let src = grid.idx(x, y);
            let dst = grid.idx(cols - 1 - x, y);
            grid.a[dst] = grid.a[src];
            grid.b[dst] = grid.b[src];
        }
    }
}

/// Top half is copied onto the bottom half.
fn mirror_vertical(grid: &mut Grid) {
    let rows = grid.rows();
    for x in 0..grid.cols() {
        for y in 0..rows / 2 {
            let src = grid.idx(x, y);
            let dst = grid.idx(x, rows - 1 - y);
            grid.a[dst] = grid.a[src];
            grid.b[dst] = grid.b[src];
        }
    }
}

/// 8-fold mirror about the grid centre.
///
/// Each cell takes the value of the cell at the same distance along the
/// midpoint angle of its segment. Cells are rewritten in scan order, so later
/// cells may read values copied earlier in the same pass. Reference points that
/// round outside the grid leave the target untouched. This is a nearest-index
/// approximation, not a continuous rotation.
fn mirror_radial(grid: &mut Grid) {
    let cols = grid.cols() as i64;
    let rows = grid.rows() as i64;
    let cx = cols / 2;
    let cy = rows / 2;
    let segment = 2.0 * PI / RADIAL_SEGMENTS as f64;

    for y in 0..rows {
        for x in 0..cols {
            let dx = (x - cx) as f64;
            let dy = (y - cy) as f64;
            if dx == 0.0 && dy == 0.0 {
                continue;
            }

            let angle = dy.atan2(dx);
            let dist = (dx * dx + dy * dy).sqrt();
            let index = (((angle + PI) % (2.0 * PI)) / segment).floor();
            let ref_angle = index * segment + segment / 2.0;

            let rx = (cx as f64 + dist * ref_angle.cos()).round() as i64;
            let ry = (cy as f64 + dist * ref_angle.sin()).round() as i64;
            if rx < 0 || rx >= cols || ry < 0 || ry >= rows {
                continue;
            }

            let src = grid.idx(rx as usize, ry as usize);
            let dst = grid.idx(x as usize, y as usize);
            grid.a[dst] = grid.a[src];
            grid.b[dst] = grid.b[src];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{PatternKind, Seeder};

    fn seeded(cols: usize, rows: usize, seed: u64) -> Grid {
        let mut g = Grid::new(cols, rows);
        Seeder::new(seed).seed(&mut g, PatternKind::Spots, 4);
        // break any accidental symmetry with a ramp in A
        for (i, a) in g.a.iter_mut().enumerate() {
            *a = (i % 97) as f32 / 97.0;
        }
        g
    }

    #[test]
    fn horizontal_mirrors_every_row() {
        for (cols, rows) in [(16, 9), (15, 8)] {
            let mut g = seeded(cols, rows, 3);
            Symmetry {
                horizontal: true,
                ..Default::default()
            }
            .apply(&mut g);
            for y in 0..rows {
                for x in 0..cols / 2 {
                    assert_eq!(g.get(x, y), g.get(cols - 1 - x, y));
                }
            }
        }
    }

    #[test]
    fn vertical_mirrors_every_column() {
        for (cols, rows) in [(12, 10), (12, 7)] {
            let mut g = seeded(cols, rows, 4);
            Symmetry {
                vertical: true,
                ..Default::default()
            }
            .apply(&mut g);
            for x in 0..cols {
                for y in 0..rows / 2 {
                    assert_eq!(g.get(x, y), g.get(x, rows - 1 - y));
                }
            }
        }
    }

    #[test]
    fn horizontal_then_vertical_gives_four_quadrants() {
        let mut g = seeded(20, 14, 8);
        Symmetry {
            horizontal: true,
            vertical: true,
            radial: false,
        }
        .apply(&mut g);
        for y in 0..7 {
            for x in 0..10 {
                let v = g.get(x, y);
                assert_eq!(v, g.get(19 - x, y));
                assert_eq!(v, g.get(x, 13 - y));
                assert_eq!(v, g.get(19 - x, 13 - y));
            }
        }
    }

    #[test]
    fn radial_on_uniform_grid_is_noop() {
        let mut g = Grid::new(21, 17);
        g.a.fill(0.0);
        Symmetry {
            radial: true,
            ..Default::default()
        }
        .apply(&mut g);
        assert!(g.a.iter().all(|&v| v == 0.0));
        assert!(g.b.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn radial_keeps_centre_and_copies_from_reference() {
        let mut g = seeded(17, 17, 11);
        let centre = g.get(8, 8);
        Symmetry {
            radial: true,
            ..Default::default()
        }
        .apply(&mut g);
        assert_eq!(g.get(8, 8), centre);
        // (16, 8) and (16, 9) both fall in segment 4 (reference angle 9*pi/8)
        // and both round to reference cell (1, 5).
        assert_eq!(g.get(16, 8), g.get(16, 9));
        assert!(g.in_range());
    }

    #[test]
    fn no_flags_leave_grid_untouched() {
        let mut g = seeded(10, 10, 2);
        let before = g.clone();
        Symmetry::default().apply(&mut g);
        assert_eq!(g, before);
        assert!(!Symmetry::default().any());
        assert_eq!(Symmetry::default().label(), "-");
    }
}
