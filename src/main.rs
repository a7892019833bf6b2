// Copyright (c) 2026 rezky_nightky

mod animation;
mod backend;
mod cell;
mod charset;
mod config;
mod droplet;
mod error;
mod field;
mod frame;
mod palette;
mod runtime;
mod signal;
mod terminal;

use std::env;
use std::fs::File;
use std::io::stdout;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::animation::{Animation, Outcome};
use crate::backend::{AnsiBackend, Backend, CrosstermBackend};
use crate::charset::print_list_charsets;
use crate::config::{
    color_enabled_stdout, color_mode_from_flag, detect_color_mode_auto, Args, BackendKind,
    RainConfig,
};
use crate::error::Result;
use crate::signal::InterruptFlag;
use crate::terminal::{restore_terminal_best_effort, CrosstermEvents, TerminalGuard};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

fn build_info() -> &'static str {
    env!("MATRIX_RAIN_BUILD")
}

fn git_sha() -> &'static str {
    env!("MATRIX_RAIN_GIT_SHA")
}

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn parse_args() -> Args {
    let mut cmd = Args::command().styles(clap_styles());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();

    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }

    let matches = cmd.get_matches();
    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

/// Stdout belongs to the animation, so diagnostics only go to a file when asked.
fn init_tracing(path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn print_check_bitcolor(args: &Args) -> Result<()> {
    let colorterm = env::var("COLORTERM").unwrap_or_default();
    let term = env::var("TERM").unwrap_or_default();
    let auto = detect_color_mode_auto();
    let effective = color_mode_from_flag(args.colormode)?;

    println!("BITCOLOR CHECK:");
    println!(
        "  COLORTERM: {}",
        if colorterm.is_empty() {
            "(unset)"
        } else {
            &colorterm
        }
    );
    println!(
        "  TERM: {}",
        if term.is_empty() { "(unset)" } else { &term }
    );
    println!("  auto_detected: {}", auto.label());
    if args.colormode.is_some() {
        println!("  forced: {}", effective.label());
    }
    println!("  effective: {}", effective.label());
    Ok(())
}

fn print_info() {
    println!("Version: v{}", env!("CARGO_PKG_VERSION"));
    if git_sha().is_empty() {
        println!("Build: {}", build_info());
    } else {
        println!("Build: {} ({})", build_info(), git_sha());
    }
    println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
    println!("License: {}", env!("CARGO_PKG_LICENSE"));
    println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
}

fn play<B: Backend>(backend: B, config: &RainConfig, interrupt: InterruptFlag) -> Result<Outcome> {
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let _guard = TerminalGuard::new()?;
    let mut animation = Animation::new(backend, CrosstermEvents, config, rng, interrupt)?;
    animation.run()
}

fn run(args: &Args) -> Result<()> {
    let config = RainConfig::from_args(args)?;
    if let Some(path) = &args.log_file {
        init_tracing(path)?;
    }

    let interrupt = InterruptFlag::new();
    interrupt.install()?;

    info!(
        fps = 1.0 / config.frame_budget.as_secs_f64(),
        backend = ?config.backend,
        color_mode = config.color_mode.label(),
        glyphs = config.chars.len(),
        seed = ?config.seed,
        "starting rain"
    );

    let outcome = match config.backend {
        BackendKind::Crossterm => play(CrosstermBackend::new(stdout()), &config, interrupt),
        BackendKind::Ansi => play(AnsiBackend::new(stdout()), &config, interrupt),
    }?;

    info!(
        reason = ?outcome.reason,
        frames = outcome.frames,
        elapsed_s = outcome.elapsed.as_secs_f64(),
        "rain stopped"
    );
    Ok(())
}

fn main() -> ExitCode {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    let args = parse_args();

    if args.list_charsets {
        print_list_charsets();
        return ExitCode::SUCCESS;
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    if args.info {
        print_info();
        return ExitCode::SUCCESS;
    }

    let result = if args.check_bitcolor {
        print_check_bitcolor(&args)
    } else {
        run(&args)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "matrix-rain failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
