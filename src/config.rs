// Copyright (c) 2026 rezky_nightky

use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::charset::{build_chars, charset_from_str, parse_user_hex_chars};
use crate::error::{RainError, Result};
use crate::runtime::ColorMode;

pub fn color_enabled_stdout() -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Terminal commands through crossterm.
    #[value(name = "crossterm")]
    Crossterm,
    /// Hand-written ANSI escape sequences.
    #[value(name = "ansi")]
    Ansi,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "matrix-rain",
    version,
    disable_version_flag = true,
    about = "Matrix digital rain for the terminal"
)]
pub struct Args {
    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 25.0,
        help_heading = "PERFORMANCE",
        help = "Target FPS (min 1 max 240)"
    )]
    pub fps: f64,

    #[arg(
        short = 'S',
        long = "speed",
        default_value_t = 1.0,
        help_heading = "PERFORMANCE",
        help = "Fall speed multiplier (min 0.01 max 20)"
    )]
    pub speed: f32,

    #[arg(
        long = "resize-every",
        default_value_t = 50,
        help_heading = "PERFORMANCE",
        help = "Re-check terminal size every N frames (min 1 max 10000)"
    )]
    pub resize_every: u32,

    #[arg(
        long = "backend",
        default_value_t = BackendKind::Crossterm,
        value_enum,
        help_heading = "APPEARANCE",
        help = "Output backend (crossterm, ansi)"
    )]
    pub backend: BackendKind,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,8/256,24/32). Default: detected from COLORTERM/TERM"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "charset",
        default_value = "auto",
        help_heading = "CHARSET",
        help = "Charset preset (see --list-charsets)"
    )]
    pub charset: String,

    #[arg(
        long = "chars",
        help_heading = "CHARSET",
        help = "Extra code point ranges as hex pairs: LOW,HIGH[,LOW,HIGH...]"
    )]
    pub chars: Option<String>,

    #[arg(
        long = "no-intro",
        help_heading = "GENERAL",
        help = "Skip the welcome panel"
    )]
    pub no_intro: bool,

    #[arg(
        long = "banner-secs",
        default_value_t = 3.0,
        help_heading = "GENERAL",
        help = "Show the title banner over the rain for N seconds (min 0 max 60)"
    )]
    pub banner_secs: f32,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        short = 's',
        long = "screensaver",
        help_heading = "GENERAL",
        help = "Screensaver mode (exit on any keypress)"
    )]
    pub screensaver: bool,

    #[arg(long = "seed", help_heading = "GENERAL", help = "Seed for a repeatable rain")]
    pub seed: Option<u64>,

    #[arg(
        long = "log-file",
        help_heading = "GENERAL",
        help = "Write diagnostics to this file (filter with RUST_LOG)"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(
        long = "list-charsets",
        help_heading = "HELP",
        help = "List available charset presets and exit"
    )]
    pub list_charsets: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

/// Validated settings for one session.
#[derive(Clone, Debug)]
pub struct RainConfig {
    pub frame_budget: Duration,
    pub speed: f32,
    pub resize_every: u32,
    pub backend: BackendKind,
    pub color_mode: ColorMode,
    pub chars: Vec<char>,
    pub intro: bool,
    pub banner: Duration,
    pub duration: Option<Duration>,
    pub screensaver: bool,
    pub seed: Option<u64>,
}

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> Result<f64> {
    if !v.is_finite() {
        return Err(RainError::invalid(format!(
            "failed to apply {} {} (must be a finite number)",
            name, v
        )));
    }
    if v < min || v > max {
        return Err(RainError::invalid(format!(
            "failed to apply {} {} (min {} max {})",
            name, v, min, max
        )));
    }
    Ok(v)
}

fn require_u32_range(name: &str, v: u32, min: u32, max: u32) -> Result<u32> {
    if v < min || v > max {
        return Err(RainError::invalid(format!(
            "failed to apply {} {} (min {} max {})",
            name, v, min, max
        )));
    }
    Ok(v)
}

pub fn default_to_ascii() -> bool {
    let lang = env::var("LC_ALL")
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| env::var("LANG").ok())
        .unwrap_or_default();
    !lang.to_ascii_uppercase().contains("UTF")
}

pub fn detect_color_mode_auto() -> ColorMode {
    let colorterm = env::var("COLORTERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }

    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }
    if term.contains("256color") {
        return ColorMode::Color256;
    }

    ColorMode::Color16
}

pub fn color_mode_from_flag(v: Option<u16>) -> Result<ColorMode> {
    match v {
        None => Ok(detect_color_mode_auto()),
        Some(0) => Ok(ColorMode::Mono),
        Some(16) => Ok(ColorMode::Color16),
        Some(8) | Some(256) => Ok(ColorMode::Color256),
        Some(24) | Some(32) => Ok(ColorMode::TrueColor),
        Some(m) => Err(RainError::invalid(format!(
            "invalid --colormode: {} (allowed: 0,16,8,256,24,32)",
            m
        ))),
    }
}

impl RainConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        let fps = require_f64_range("--fps", args.fps, 1.0, 240.0)?;
        let speed = require_f64_range("--speed", f64::from(args.speed), 0.01, 20.0)? as f32;
        let resize_every = require_u32_range("--resize-every", args.resize_every, 1, 10_000)?;
        let banner = require_f64_range("--banner-secs", f64::from(args.banner_secs), 0.0, 60.0)?;

        let duration = match args.duration {
            Some(s) if !s.is_finite() => {
                return Err(RainError::invalid(format!(
                    "failed to apply --duration {} (must be a finite number)",
                    s
                )))
            }
            Some(s) if s > 0.0 => Some(Duration::from_secs_f64(require_f64_range(
                "--duration",
                s,
                0.1,
                86400.0,
            )?)),
            _ => None,
        };

        let mut user_ranges: Vec<(char, char)> = Vec::new();
        if let Some(spec) = &args.chars {
            let list = parse_user_hex_chars(spec)?;
            if list.len() % 2 != 0 {
                return Err(RainError::invalid(
                    "--chars: odd number of unicode chars given (must be even)",
                ));
            }
            for pair in list.chunks(2) {
                let (a, b) = (pair[0], pair[1]);
                if a > b {
                    return Err(RainError::invalid(format!(
                        "--chars: range {:X},{:X} is reversed",
                        a as u32, b as u32
                    )));
                }
                user_ranges.push((a, b));
            }
        }
        let charset = charset_from_str(&args.charset, default_to_ascii())?;

        Ok(Self {
            frame_budget: Duration::from_secs_f64(1.0 / fps),
            speed,
            resize_every,
            backend: args.backend,
            color_mode: color_mode_from_flag(args.colormode)?,
            chars: build_chars(charset, &user_ranges),
            intro: !args.no_intro,
            banner: Duration::from_secs_f64(banner),
            duration,
            screensaver: args.screensaver,
            seed: args.seed,
        })
    }
}
