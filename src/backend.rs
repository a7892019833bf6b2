// Copyright (c) 2026 rezky_nightky

use std::fmt::Write as _;
use std::io::{Result, Write};

use crossterm::{
    cursor,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal, QueueableCommand,
};

use crate::cell::Cell;
use crate::frame::Frame;
use crate::palette::Style;

/// Output surface for the animation. Every `draw` is one full repaint and one write.
pub trait Backend {
    fn enter(&mut self) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
    fn draw(&mut self, frame: &Frame) -> Result<()>;
    /// Restores the cursor, clears the screen and prints `farewell`.
    fn leave(&mut self, farewell: &[(&str, Style)]) -> Result<()>;
}

pub struct CrosstermBackend<W: Write> {
    out: W,
    buf: Vec<u8>,
}

impl<W: Write> CrosstermBackend<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            buf: Vec::with_capacity(64 * 1024),
        }
    }

    fn flush_buf(&mut self) -> Result<()> {
        self.out.write_all(&self.buf)?;
        self.out.flush()?;
        self.buf.clear();
        Ok(())
    }

    fn queue_style(buf: &mut Vec<u8>, style: Style) -> Result<()> {
        buf.queue(SetForegroundColor(style.fg.unwrap_or(Color::Reset)))?;
        if style.bold {
            buf.queue(SetAttribute(Attribute::Bold))?;
        }
        Ok(())
    }
}

impl<W: Write> Backend for CrosstermBackend<W> {
    fn enter(&mut self) -> Result<()> {
        self.buf.clear();
        self.buf.queue(terminal::EnterAlternateScreen)?;
        self.buf.queue(cursor::Hide)?;
        self.buf.queue(terminal::DisableLineWrap)?;
        self.buf.queue(SetAttribute(Attribute::Reset))?;
        self.buf.queue(ResetColor)?;
        self.buf.queue(terminal::Clear(terminal::ClearType::All))?;
        self.flush_buf()
    }

    fn clear(&mut self) -> Result<()> {
        self.buf.clear();
        self.buf.queue(terminal::Clear(terminal::ClearType::All))?;
        self.flush_buf()
    }

    fn draw(&mut self, frame: &Frame) -> Result<()> {
        self.buf.clear();
        let mut cur_fg: Option<Color> = None;
        let mut cur_bold = false;

        self.buf.queue(terminal::BeginSynchronizedUpdate)?;
        self.buf.queue(SetAttribute(Attribute::Reset))?;
        self.buf.queue(ResetColor)?;

        for y in 0..frame.height {
            self.buf.queue(cursor::MoveTo(0, y))?;
            for cell in frame.row(y) {
                if cell.fg != cur_fg {
                    self.buf
                        .queue(SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
                    cur_fg = cell.fg;
                }
                if cell.bold != cur_bold {
                    self.buf.queue(SetAttribute(if cell.bold {
                        Attribute::Bold
                    } else {
                        Attribute::NormalIntensity
                    }))?;
                    cur_bold = cell.bold;
                }
                self.buf.queue(Print(cell.ch))?;
            }
        }

        self.buf.queue(SetAttribute(Attribute::Reset))?;
        self.buf.queue(ResetColor)?;
        self.buf.queue(terminal::EndSynchronizedUpdate)?;
        self.flush_buf()
    }

    fn leave(&mut self, farewell: &[(&str, Style)]) -> Result<()> {
        self.buf.clear();
        self.buf.queue(SetAttribute(Attribute::Reset))?;
        self.buf.queue(ResetColor)?;
        self.buf.queue(terminal::EnableLineWrap)?;
        self.buf.queue(cursor::Show)?;
        self.buf.queue(terminal::LeaveAlternateScreen)?;
        self.buf.queue(terminal::Clear(terminal::ClearType::All))?;
        self.buf.queue(cursor::MoveTo(0, 0))?;
        self.buf.queue(Print("\r\n"))?;
        for &(text, style) in farewell {
            Self::queue_style(&mut self.buf, style)?;
            self.buf.queue(Print(text))?;
            self.buf.queue(SetAttribute(Attribute::Reset))?;
            self.buf.queue(ResetColor)?;
            self.buf.queue(Print("\r\n"))?;
        }
        self.buf.queue(Print("\r\n"))?;
        self.flush_buf()
    }
}

const CSI_ENTER: &str = "\x1b[?1049h\x1b[?25l\x1b[?7l\x1b[0m\x1b[2J";
const CSI_CLEAR: &str = "\x1b[2J";
const CSI_LEAVE: &str = "\x1b[0m\x1b[?7h\x1b[?25h\x1b[?1049l\x1b[2J\x1b[H";
const SGR_RESET: &str = "\x1b[0m";

/// Hand-built escape sequences; needs nothing from the terminal beyond VT100 + SGR colors.
pub struct AnsiBackend<W: Write> {
    out: W,
    buf: String,
}

fn named_color_code(c: Color) -> u8 {
    match c {
        Color::Black => 30,
        Color::DarkRed => 31,
        Color::DarkGreen => 32,
        Color::DarkYellow => 33,
        Color::DarkBlue => 34,
        Color::DarkMagenta => 35,
        Color::DarkCyan => 36,
        Color::Grey => 37,
        Color::DarkGrey => 90,
        Color::Red => 91,
        Color::Green => 92,
        Color::Yellow => 93,
        Color::Blue => 94,
        Color::Magenta => 95,
        Color::Cyan => 96,
        Color::White => 97,
        _ => 39,
    }
}

fn push_fg(buf: &mut String, fg: Option<Color>) {
    let _ = match fg {
        Some(Color::Rgb { r, g, b }) => write!(buf, "\x1b[38;2;{r};{g};{b}m"),
        Some(Color::AnsiValue(v)) => write!(buf, "\x1b[38;5;{v}m"),
        Some(c) => write!(buf, "\x1b[{}m", named_color_code(c)),
        None => write!(buf, "\x1b[39m"),
    };
}

fn push_bold(buf: &mut String, bold: bool) {
    buf.push_str(if bold { "\x1b[1m" } else { "\x1b[22m" });
}

impl<W: Write> AnsiBackend<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            buf: String::with_capacity(64 * 1024),
        }
    }

    fn flush_buf(&mut self) -> Result<()> {
        self.out.write_all(self.buf.as_bytes())?;
        self.out.flush()?;
        self.buf.clear();
        Ok(())
    }

    fn push_row(&mut self, y: u16, row: &[Cell], cur: &mut (Option<Color>, bool)) {
        let _ = write!(self.buf, "\x1b[{};1H", y as u32 + 1);
        for cell in row {
            if cell.fg != cur.0 {
                push_fg(&mut self.buf, cell.fg);
                cur.0 = cell.fg;
            }
            if cell.bold != cur.1 {
                push_bold(&mut self.buf, cell.bold);
                cur.1 = cell.bold;
            }
            self.buf.push(cell.ch);
        }
    }
}

impl<W: Write> Backend for AnsiBackend<W> {
    fn enter(&mut self) -> Result<()> {
        self.buf.clear();
        self.buf.push_str(CSI_ENTER);
        self.flush_buf()
    }

    fn clear(&mut self) -> Result<()> {
        self.buf.clear();
        self.buf.push_str(CSI_CLEAR);
        self.flush_buf()
    }

    fn draw(&mut self, frame: &Frame) -> Result<()> {
        self.buf.clear();
        self.buf.push_str(SGR_RESET);
        let mut cur = (None, false);
        for y in 0..frame.height {
            self.push_row(y, frame.row(y), &mut cur);
        }
        self.buf.push_str(SGR_RESET);
        self.flush_buf()
    }

    fn leave(&mut self, farewell: &[(&str, Style)]) -> Result<()> {
        self.buf.clear();
        self.buf.push_str(CSI_LEAVE);
        self.buf.push_str("\r\n");
        for &(text, style) in farewell {
            push_fg(&mut self.buf, style.fg);
            if style.bold {
                push_bold(&mut self.buf, true);
            }
            self.buf.push_str(text);
            self.buf.push_str(SGR_RESET);
            self.buf.push_str("\r\n");
        }
        self.buf.push_str("\r\n");
        self.flush_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{build_palette, Tier};
    use crate::runtime::ColorMode;

    #[derive(Default)]
    struct CountingWriter {
        bytes: Vec<u8>,
        writes: usize,
        flushes: usize,
    }

    impl Write for CountingWriter {
        fn write(&mut self, buf: &[u8]) -> Result<usize> {
            self.writes += 1;
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    fn sample_frame() -> Frame {
        let palette = build_palette(ColorMode::Color256);
        let mut f = Frame::new(4, 2);
        f.set(0, 0, Cell::styled('A', palette.style(Tier::Head)));
        f.set(1, 0, Cell::styled('B', palette.style(Tier::Mid)));
        f.set(2, 0, Cell::styled('C', palette.style(Tier::Mid)));
        f
    }

    #[test]
    fn crossterm_draw_is_a_single_write() {
        let mut b = CrosstermBackend::new(CountingWriter::default());
        b.draw(&sample_frame()).unwrap();
        assert_eq!(b.out.writes, 1);
        assert_eq!(b.out.flushes, 1);
        let s = String::from_utf8(b.out.bytes.clone()).unwrap();
        assert!(s.contains("BC"));
        assert!(s.contains("\x1b[?2026h"));
        assert!(s.contains("\x1b[1;1H"));
        assert!(s.contains("\x1b[2;1H"));
    }

    #[test]
    fn ansi_draw_is_a_single_write() {
        let mut b = AnsiBackend::new(CountingWriter::default());
        b.draw(&sample_frame()).unwrap();
        assert_eq!(b.out.writes, 1);
        assert_eq!(b.out.flushes, 1);
    }

    #[test]
    fn ansi_draw_only_switches_color_on_change() {
        let palette = build_palette(ColorMode::Color256);
        let mid = match palette.style(Tier::Mid).fg {
            Some(Color::AnsiValue(v)) => v,
            other => panic!("unexpected {other:?}"),
        };
        let mut b = AnsiBackend::new(Vec::new());
        b.draw(&sample_frame()).unwrap();
        let s = String::from_utf8(b.out).unwrap();
        let mid_sgr = format!("\x1b[38;5;{mid}m");
        assert_eq!(s.matches(&mid_sgr).count(), 1);
        assert!(s.contains(&format!("{mid_sgr}\x1b[22mBC")));
        assert!(s.starts_with(SGR_RESET));
        assert!(s.ends_with(&format!("  {SGR_RESET}")));
    }

    #[test]
    fn ansi_truecolor_and_named_colors() {
        let mut s = String::new();
        push_fg(&mut s, Some(Color::Rgb { r: 1, g: 2, b: 3 }));
        push_fg(&mut s, Some(Color::DarkGreen));
        push_fg(&mut s, None);
        assert_eq!(s, "\x1b[38;2;1;2;3m\x1b[32m\x1b[39m");
    }

    #[test]
    fn leave_restores_cursor_then_prints_farewell() {
        let style = Style {
            fg: Some(Color::Green),
            bold: true,
        };
        for bytes in [
            {
                let mut b = CrosstermBackend::new(Vec::new());
                b.leave(&[("Goodbye, Neo.", style)]).unwrap();
                b.out
            },
            {
                let mut b = AnsiBackend::new(Vec::new());
                b.leave(&[("Goodbye, Neo.", style)]).unwrap();
                b.out
            },
        ] {
            let s = String::from_utf8(bytes).unwrap();
            let show = s.find("\x1b[?25h").unwrap();
            let clear = s.rfind("\x1b[2J").unwrap();
            let bye = s.find("Goodbye, Neo.").unwrap();
            assert!(show < clear && clear < bye);
        }
    }
}
