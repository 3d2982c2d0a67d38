//! elnutris: minimal falling-block puzzle game in the terminal.

mod app;
mod game;
mod input;
mod palette;
mod piece;
mod terminal;
mod theme;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use terminal::TerminalHost;
use theme::Theme;

/// Options derived from CLI that affect game behaviour.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Ticks per second normally.
    pub tick_rate: f64,
    /// Ticks per second while fast-forward is held.
    pub fast_tick_rate: f64,
    /// Fixed seed for the piece sequence; OS entropy when `None`.
    pub seed: Option<u64>,
    pub show_ghost: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate: 8.0,
            fast_tick_rate: 16.0,
            seed: None,
            show_ghost: true,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref(), args.log_level)?;

    let theme = match args.theme.as_deref() {
        Some(path) => Theme::load(path)?,
        None => Theme::default(),
    };
    let config = GameConfig {
        tick_rate: args.tick_rate,
        fast_tick_rate: args.fast_tick_rate,
        seed: args.seed,
        show_ghost: !args.no_ghost,
    };

    let host = TerminalHost::new(theme, !args.no_animation)?;
    let mut app = App::new(host, config);
    app.run()
}

/// File logging only: the game owns the terminal.
fn init_logging(path: Option<&std::path::Path>, level: tracing::Level) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn parse_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|_| format!("not a number: {s}"))?;
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(format!("rate must be positive, got {s}"))
    }
}

/// Minimal falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "elnutris",
    version,
    about = "Minimal falling-block puzzle game in the terminal.",
    long_about = "elnutris drops one piece at a time onto a 20x20 board. Pieces lock where they land \
        and a new one spawns at the top. There is no line clearing and no score.\n\n\
        CONTROLS:\n  Left/Right or h/l  Move        Up or k        Rotate\n  \
        Down or j          Fast-forward  Space/Enter  Hard drop\n  q / Esc / Ctrl-C   Quit\n\n\
        Keys act every tick while held."
)]
pub struct Args {
    /// Game ticks per second (gravity, input).
    #[arg(long, default_value = "8.0", value_name = "RATE", value_parser = parse_rate)]
    pub tick_rate: f64,

    /// Ticks per second while fast-forward is held.
    #[arg(long, default_value = "16.0", value_name = "RATE", value_parser = parse_rate)]
    pub fast_tick_rate: f64,

    /// Seed for the piece sequence (same seed, same pieces).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]="value") for background, border and title.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Hide the hard-drop ghost.
    #[arg(long)]
    pub no_ghost: bool,

    /// Disable the lock flash.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: tracing::Level,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_match_game_config() {
        let args = Args::try_parse_from(["elnutris"]).unwrap();
        let d = GameConfig::default();
        assert_eq!(args.tick_rate, d.tick_rate);
        assert_eq!(args.fast_tick_rate, d.fast_tick_rate);
        assert!(!args.no_ghost);
        assert_eq!(args.log_level, tracing::Level::INFO);
    }

    #[test]
    fn rejects_non_positive_rates() {
        assert!(Args::try_parse_from(["elnutris", "--tick-rate", "0"]).is_err());
        assert!(Args::try_parse_from(["elnutris", "--fast-tick-rate", "-3"]).is_err());
        let args = Args::try_parse_from(["elnutris", "--tick-rate", "4", "--seed", "9"]).unwrap();
        assert_eq!(args.tick_rate, 4.0);
        assert_eq!(args.seed, Some(9));
    }
}
