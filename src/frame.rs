// Copyright (c) 2026 rezky_nightky

use crate::cell::Cell;
use crate::field::VisibleCell;
use crate::palette::{Palette, Style};

/// Full-screen cell buffer, rebuilt from scratch every frame.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; width as usize * height as usize],
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    #[allow(dead_code)]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn row(&self, y: u16) -> &[Cell] {
        let w = self.width as usize;
        let start = (y as usize * w).min(self.cells.len());
        let end = (start + w).min(self.cells.len());
        &self.cells[start..end]
    }

    /// Writes outside the frame are dropped.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    pub fn compose<I>(&mut self, cells: I, palette: &Palette)
    where
        I: IntoIterator<Item = VisibleCell>,
    {
        self.clear();
        for c in cells {
            self.set(c.column, c.row, Cell::styled(c.glyph, palette.style(c.tier)));
        }
    }

    /// Clipped at the right edge; returns the number of cells written.
    pub fn put_str(&mut self, x: u16, y: u16, text: &str, style: Style) -> u16 {
        let mut written = 0u16;
        for (i, ch) in text.chars().enumerate() {
            let Ok(dx) = u16::try_from(i) else {
                break;
            };
            let cx = x.saturating_add(dx);
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::styled(ch, style));
            written += 1;
        }
        written
    }

    pub fn put_centered(&mut self, y: u16, text: &str, style: Style) {
        let len = text.chars().count();
        let x = (self.width as usize).saturating_sub(len) / 2;
        self.put_str(x as u16, y, text, style);
    }

    /// Centers `lines` as a block on screen, clipping whatever does not fit.
    pub fn put_panel(&mut self, lines: &[&str], style: Style) {
        let top = (self.height as usize).saturating_sub(lines.len()) / 2;
        for (i, line) in lines.iter().enumerate() {
            let Ok(y) = u16::try_from(top + i) else {
                break;
            };
            if y >= self.height {
                break;
            }
            if line.is_empty() {
                continue;
            }
            self.put_centered(y, line, style);
        }
    }

    /// Bottom row, padded with styled blanks to the full width.
    pub fn status_line(&mut self, text: &str, style: Style) {
        let y = self.height - 1;
        let written = self.put_str(0, y, text, style);
        for x in written..self.width {
            self.set(x, y, Cell::styled(' ', style));
        }
    }
}
