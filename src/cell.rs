// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::palette::Style;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bold: bool,
}

impl Cell {
    pub const BLANK: Cell = Cell {
        ch: ' ',
        fg: None,
        bold: false,
    };

    pub fn styled(ch: char, style: Style) -> Self {
        Self {
            ch,
            fg: style.fg,
            bold: style.bold,
        }
    }
}
