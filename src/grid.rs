/// Pair of concentration fields over a `cols x rows` torus.
///
/// Both vectors always hold exactly `cols * rows` values, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    cols: usize,
    rows: usize,
    pub a: Vec<f32>,
    pub b: Vec<f32>,
}

impl Grid {
    /// Substrate-primed grid: A = 1, B = 0 everywhere.
    pub fn new(cols: usize, rows: usize) -> Self {
        let n = cols * rows;
        Self {
            cols,
            rows,
            a: vec![1.0; n],
            b: vec![0.0; n],
        }
    }

    /// Grid size for a display surface; the simulation runs at half resolution.
    pub fn dims_for_display(width: usize, height: usize) -> (usize, usize) {
        (width / 2, height / 2)
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.cols * self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn prime(&mut self) {
        self.a.fill(1.0);
        self.b.fill(0.0);
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.cols + x
    }

    /// Index with toroidal wrap on both axes.
    #[inline]
    pub fn wrap(&self, x: isize, y: isize) -> usize {
        let xx = x.rem_euclid(self.cols as isize) as usize;
        let yy = y.rem_euclid(self.rows as isize) as usize;
        self.idx(xx, yy)
    }

    pub fn get(&self, x: usize, y: usize) -> (f32, f32) {
        let i = self.idx(x, y);
        (self.a[i], self.b[i])
    }

    pub fn set(&mut self, x: usize, y: usize, a: f32, b: f32) {
        let i = self.idx(x, y);
        self.a[i] = a;
        self.b[i] = b;
    }

    /// Sets A = 0, B = 1 on every cell within `radius` of `(cx, cy)`, wrapping at the edges.
    pub fn stamp_disk(&mut self, cx: usize, cy: usize, radius: isize) {
        if self.is_empty() {
            return;
        }
        let (cx, cy) = (cx as isize, cy as isize);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                let i = self.wrap(cx + dx, cy + dy);
                self.a[i] = 0.0;
                self.b[i] = 1.0;
            }
        }
    }

    pub fn in_range(&self) -> bool {
        self.a
            .iter()
            .chain(self.b.iter())
            .all(|v| v.is_finite() && (0.0..=1.0).contains(v))
    }
}

/// Moore-neighbourhood Laplacian: sum of the 8 neighbours minus 8x the centre.
#[inline]
pub(crate) fn laplacian(field: &[f32], cols: usize, rows: usize, x: usize, y: usize) -> f32 {
    let xm = if x == 0 { cols - 1 } else { x - 1 };
    let xp = if x + 1 == cols { 0 } else { x + 1 };
    let ym = if y == 0 { rows - 1 } else { y - 1 };
    let yp = if y + 1 == rows { 0 } else { y + 1 };

    let idx = |xx: usize, yy: usize| -> usize { yy * cols + xx };

    field[idx(xm, ym)]
        + field[idx(x, ym)]
        + field[idx(xp, ym)]
        + field[idx(xm, y)]
        + field[idx(xp, y)]
        + field[idx(xm, yp)]
        + field[idx(x, yp)]
        + field[idx(xp, yp)]
        - 8.0 * field[idx(x, y)]
}
