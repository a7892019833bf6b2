// Copyright (c) 2026 rezky_nightky

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::charset::GlyphSource;
use crate::config::RainConfig;
use crate::droplet::DropletParams;
use crate::error::Result;
use crate::field::DropField;
use crate::frame::Frame;
use crate::palette::{build_palette, Palette, Tier};
use crate::runtime::{ExitReason, Phase};
use crate::signal::InterruptFlag;
use crate::terminal::{clamp_size, EventSource, UserEvent};

/// Droplet speeds are rows per reference tick; wall time is converted to these units.
const REFERENCE_TICK: Duration = Duration::from_millis(40);
/// Longest step a single update may take after a stall or suspend.
const MAX_DT_UNITS: f32 = 5.0;
const INTRO_POLL: Duration = Duration::from_millis(100);

const STATUS: &str = "Press 'q' or ESC to exit | Matrix Digital Rain";
const INTRO_STATUS: &str = "Press any key to continue | Ctrl-C to exit";

const INTRO: [&str; 11] = [
    "╔═══════════════════════════════════════╗",
    "║     M  A  T  R  I  X     R  A  I  N  ║",
    "╚═══════════════════════════════════════╝",
    "",
    "WAKE UP, NEO...",
    "",
    "THE MATRIX HAS YOU",
    "",
    "FOLLOW THE WHITE RABBIT",
    "",
    "Press any key to enter the Matrix...",
];

const BANNER: [&str; 3] = [
    "╔═══════════════════════════════════════╗",
    "║     M  A  T  R  I  X     R  A  I  N  ║",
    "╚═══════════════════════════════════════╝",
];

const FAREWELL: [(&str, Tier); 2] = [
    ("Disconnecting from the Matrix...", Tier::Glow),
    ("Goodbye, Neo.", Tier::Bright),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub reason: ExitReason,
    pub frames: u64,
    pub elapsed: Duration,
}

/// Rows left for the rain once the status line takes the bottom row.
fn field_rows(height: u16) -> u16 {
    height.saturating_sub(1).max(1)
}

fn dt_units(elapsed: Duration) -> f32 {
    (elapsed.as_secs_f32() / REFERENCE_TICK.as_secs_f32()).min(MAX_DT_UNITS)
}

pub struct Animation<B: Backend, E: EventSource> {
    backend: B,
    events: E,
    field: DropField,
    frame: Frame,
    palette: Palette,
    interrupt: InterruptFlag,
    phase: Phase,
    frames: u64,
    pending_resize: Option<(u16, u16)>,

    frame_budget: Duration,
    resize_every: u32,
    intro: bool,
    banner: Duration,
    duration: Option<Duration>,
    screensaver: bool,
}

impl<B: Backend, E: EventSource> Animation<B, E> {
    pub fn new(
        backend: B,
        events: E,
        config: &RainConfig,
        rng: StdRng,
        interrupt: InterruptFlag,
    ) -> Result<Self> {
        let (w, h) = clamp_size(events.size()?);
        let glyphs = GlyphSource::new(config.chars.clone())?;
        let params = DropletParams::new(config.speed)?;
        debug!(width = w, height = h, glyphs = glyphs.len(), "animation ready");
        let field = DropField::new(w, field_rows(h), glyphs, params, rng);

        Ok(Self {
            backend,
            events,
            field,
            frame: Frame::new(w, h),
            palette: build_palette(config.color_mode),
            interrupt,
            phase: if config.intro {
                Phase::Intro
            } else {
                Phase::Running
            },
            frames: 0,
            pending_resize: None,
            frame_budget: config.frame_budget,
            resize_every: config.resize_every.max(1),
            intro: config.intro,
            banner: config.banner,
            duration: config.duration,
            screensaver: config.screensaver,
        })
    }

    #[cfg(test)]
    fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    fn field(&self) -> &DropField {
        &self.field
    }

    /// Plays intro and rain until an exit condition, then always leaves the
    /// terminal with the farewell text, even when playback failed.
    pub fn run(&mut self) -> Result<Outcome> {
        let started = Instant::now();
        let played = match self.backend.enter() {
            Ok(()) => self.play(),
            Err(e) => Err(e.into()),
        };

        let farewell = FAREWELL.map(|(text, tier)| (text, self.palette.style(tier)));
        let left = self.backend.leave(&farewell);
        self.set_phase(Phase::Terminated);

        let reason = played?;
        left?;
        Ok(Outcome {
            reason,
            frames: self.frames,
            elapsed: started.elapsed(),
        })
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            info!(from = ?self.phase, to = ?phase, "phase changed");
        }
        self.phase = phase;
    }

    fn play(&mut self) -> Result<ExitReason> {
        if self.intro {
            self.set_phase(Phase::Intro);
            if let Some(reason) = self.run_intro()? {
                return Ok(reason);
            }
        }
        self.set_phase(Phase::Running);
        self.run_rain()
    }

    fn draw_intro(&mut self) -> Result<()> {
        self.frame.clear();
        self.frame.put_panel(&INTRO, self.palette.style(Tier::Glow));
        self.frame.status_line(INTRO_STATUS, self.palette.style(Tier::Faint));
        self.backend.draw(&self.frame)?;
        Ok(())
    }

    /// Returns `Some` when the session ends before the rain starts.
    fn run_intro(&mut self) -> Result<Option<ExitReason>> {
        self.draw_intro()?;
        loop {
            if self.interrupt.is_raised() {
                return Ok(Some(ExitReason::Interrupt));
            }
            match self.events.next_event(INTRO_POLL)? {
                Some(UserEvent::Interrupt) => return Ok(Some(ExitReason::Interrupt)),
                Some(UserEvent::Quit) | Some(UserEvent::Key) => return Ok(None),
                Some(UserEvent::Resize(w, h)) => {
                    self.apply_resize((w, h))?;
                    self.draw_intro()?;
                }
                None => {}
            }
        }
    }

    fn on_running_event(&mut self, ev: UserEvent) -> Option<ExitReason> {
        match ev {
            UserEvent::Quit => Some(ExitReason::ExitKey),
            UserEvent::Interrupt => Some(ExitReason::Interrupt),
            UserEvent::Key if self.screensaver => Some(ExitReason::Screensaver),
            UserEvent::Key => None,
            UserEvent::Resize(w, h) => {
                self.pending_resize = Some((w, h));
                None
            }
        }
    }

    fn apply_resize(&mut self, size: (u16, u16)) -> Result<()> {
        let (w, h) = clamp_size(size);
        if w == self.frame.width && h == self.frame.height {
            return Ok(());
        }
        info!(width = w, height = h, "terminal resized");
        self.field.resize(w, field_rows(h));
        self.frame = Frame::new(w, h);
        self.backend.clear()?;
        Ok(())
    }

    fn draw_rain(&mut self, show_banner: bool) -> Result<()> {
        self.frame.compose(self.field.visible_cells(), &self.palette);
        if show_banner {
            self.frame.put_panel(&BANNER, self.palette.style(Tier::Glow));
        }
        self.frame.status_line(STATUS, self.palette.style(Tier::Faint));
        self.backend.draw(&self.frame)?;
        Ok(())
    }

    fn run_rain(&mut self) -> Result<ExitReason> {
        let start = Instant::now();
        let end = self.duration.map(|d| start + d);
        let banner_until = start + self.banner;
        let mut last_tick = start;
        let mut next_frame = start;

        loop {
            while let Some(ev) = self.events.next_event(Duration::ZERO)? {
                if let Some(reason) = self.on_running_event(ev) {
                    return Ok(reason);
                }
            }
            if self.interrupt.is_raised() {
                return Ok(ExitReason::Interrupt);
            }
            if end.is_some_and(|end| Instant::now() >= end) {
                return Ok(ExitReason::Timeout);
            }

            if self.frames > 0 && self.frames % u64::from(self.resize_every) == 0 {
                let size = self.events.size()?;
                self.pending_resize = Some(size);
            }
            if let Some(size) = self.pending_resize.take() {
                self.apply_resize(size)?;
            }

            let now = Instant::now();
            let dt = dt_units(now - last_tick);
            last_tick = now;
            self.field.update(dt);
            self.draw_rain(now < banner_until)?;
            self.frames += 1;

            next_frame += self.frame_budget;
            let now = Instant::now();
            if now > next_frame {
                debug!(frame = self.frames, "frame over budget");
                next_frame = now;
            }

            if let Some(reason) = self.wait_until(next_frame, end)? {
                return Ok(reason);
            }
        }
    }

    /// Input poll for the rest of the frame budget; never waits a negative span.
    fn wait_until(
        &mut self,
        deadline: Instant,
        end: Option<Instant>,
    ) -> Result<Option<ExitReason>> {
        let until = end.map_or(deadline, |end| end.min(deadline));
        loop {
            if self.interrupt.is_raised() {
                return Ok(Some(ExitReason::Interrupt));
            }
            let now = Instant::now();
            if now >= until {
                return Ok(None);
            }
            if let Some(ev) = self.events.next_event(until - now)? {
                if let Some(reason) = self.on_running_event(ev) {
                    return Ok(Some(reason));
                }
                if self.pending_resize.is_some() {
                    return Ok(None);
                }
            }
        }
    }
}
