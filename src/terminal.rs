// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Write};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    style::{Attribute, ResetColor, SetAttribute},
    terminal, ExecutableCommand,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserEvent {
    /// `q`, `Q` or `Esc`.
    Quit,
    /// Ctrl-C while the terminal is in raw mode.
    Interrupt,
    /// Any other key press.
    Key,
    Resize(u16, u16),
}

/// Where the animation gets keys and terminal dimensions from.
pub trait EventSource {
    /// Waits up to `timeout` for one event. A zero timeout never blocks.
    fn next_event(&mut self, timeout: Duration) -> Result<Option<UserEvent>>;
    fn size(&self) -> Result<(u16, u16)>;
}

pub fn classify_key(k: KeyEvent) -> Option<UserEvent> {
    if k.kind != KeyEventKind::Press {
        return None;
    }
    Some(match (k.code, k.modifiers) {
        (KeyCode::Char('c'), m) | (KeyCode::Char('C'), m) if m.contains(KeyModifiers::CONTROL) => {
            UserEvent::Interrupt
        }
        (KeyCode::Esc, _) | (KeyCode::Char('q'), _) | (KeyCode::Char('Q'), _) => UserEvent::Quit,
        _ => UserEvent::Key,
    })
}

/// Clamps a reported size so a zero dimension still yields a 1x1 surface.
pub fn clamp_size((w, h): (u16, u16)) -> (u16, u16) {
    (w.max(1), h.max(1))
}

pub struct CrosstermEvents;

impl EventSource for CrosstermEvents {
    fn next_event(&mut self, timeout: Duration) -> Result<Option<UserEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        Ok(match event::read()? {
            Event::Key(k) => classify_key(k),
            Event::Resize(w, h) => Some(UserEvent::Resize(w, h)),
            _ => None,
        })
    }

    fn size(&self) -> Result<(u16, u16)> {
        terminal::size().map(clamp_size)
    }
}

/// Holds raw mode for the lifetime of the session and undoes everything on drop.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let mut out = stdout();
        let _ = out.execute(cursor::Show);
        let _ = out.flush();
    }
}

pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}
