use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Stdout, Write};

/// Text rows reserved above the field.
pub(crate) const HUD_ROWS: u16 = 2;

const UPPER_HALF: char = '▀';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Cell {
    fn blank() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::blank(); w as usize * h as usize],
        }
    }

    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        y as usize * self.w as usize + x as usize
    }

    pub(crate) fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = cell;
        }
    }
}

/// Display pixel size for a terminal: one column per pixel, two pixels per row.
pub(crate) fn field_pixels(cols: u16, rows: u16) -> (usize, usize) {
    (
        cols as usize,
        rows.saturating_sub(HUD_ROWS) as usize * 2,
    )
}

/// Writes an RGBA buffer into the field area as upper-half blocks:
/// foreground is the top pixel, background the bottom one.
pub(crate) fn pixels_to_cells(pixels: &[u8], width: usize, height: usize, out: &mut CellBuffer) {
    let px = |x: usize, y: usize| -> Color {
        let o = (y * width + x) * 4;
        match pixels.get(o..o + 3) {
            Some(p) => Color::Rgb {
                r: p[0],
                g: p[1],
                b: p[2],
            },
            None => Color::Black,
        }
    };
    let rows = height.div_ceil(2);
    for ty in 0..rows {
        let y = ty * 2;
        for x in 0..width {
            let bottom = if y + 1 < height {
                px(x, y + 1)
            } else {
                Color::Black
            };
            out.set(
                x as u16,
                HUD_ROWS + ty as u16,
                Cell {
                    ch: UPPER_HALF,
                    fg: px(x, y),
                    bg: bottom,
                },
            );
        }
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    let mut xx = x;
    for ch in s.chars() {
        if xx >= buf.w {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
        xx += 1;
    }
    // pad the rest of the line so stale text does not linger
    while xx < buf.w {
        buf.set(xx, y, Cell { ch: ' ', fg, bg });
        xx += 1;
    }
}

pub(crate) struct Terminal {
    out: Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    ended: bool,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            out,
            EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            DisableLineWrap,
            Clear(ClearType::All)
        )?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            ended: false,
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        if self.ended {
            return Ok(());
        }
        self.ended = true;
        queue!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            DisableMouseCapture,
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn field_pixels(&self) -> (usize, usize) {
        field_pixels(self.cols, self.rows)
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        queue!(self.out, ResetColor, Clear(ClearType::All))?;
        Ok(true)
    }

    /// Emits only cells that differ from the previous frame.
    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        let mut last_pos: Option<(u16, u16)> = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }

                // consecutive cells on a row need no cursor move
                if last_pos != Some((x.wrapping_sub(1), y)) {
                    queue!(self.out, cursor::MoveTo(x, y))?;
                }
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                queue!(self.out, Print(c.ch))?;
                last_pos = Some((x, y));
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        // restores the shell even when the loop bails out with an error
        let _ = self.end();
    }
}
