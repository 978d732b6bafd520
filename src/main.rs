//! chiptui — match-3 chip puzzle with bombs and cascades in the terminal.

mod anim;
mod app;
mod audio;
mod cascade;
mod counters;
mod error;
mod explosion;
mod game;
mod gesture;
mod grid;
mod highscores;
mod input;
mod logging;
mod matcher;
mod scene;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};

/// Options derived from CLI that affect the engine (board size, colours, timing, seed).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    pub colors: u8,
    /// Logic ticks per second; animation steps and beats are counted in ticks.
    pub tick_rate: f64,
    pub seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref(), args.verbose)?;
    let theme = match theme::Theme::load(args.theme.as_deref(), args.palette) {
        Ok(t) => t,
        Err(e) => {
            log::warn!("theme not loaded, using defaults: {e}");
            let mut t = theme::Theme::default();
            t.apply_palette(args.palette);
            t
        }
    };
    let config = GameConfig {
        width: args.width as usize,
        height: args.height as usize,
        colors: args.colors,
        tick_rate: args.tick_rate,
        seed: args.seed,
    };
    let mut app = App::new(args, config, theme);
    app.run()?;
    Ok(())
}

/// Match-3 chip puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "chiptui",
    version,
    about = "Match-3 chip puzzle in the terminal. Swap neighbours to line up three; four in a row leaves a bomb.",
    long_about = "chiptui is a terminal match-3 game.\n\n\
        Drag a chip onto a neighbour to swap them. Lines of three or more identical chips \
        disappear and the chips above fall into place. A line of exactly four leaves a bomb \
        behind; tap it (or swap it) to clear the 3x3 area around it.\n\n\
        Each level gives you 25 moves to destroy enough chips of the objective colour \
        (blue, or the last colour when playing with fewer than six).\n\n\
        CONTROLS:\n  Mouse        Drag to swap, click a bomb to detonate\n  \
        Arrows/hjkl  Move cursor; while holding, push the chip\n  \
        Space/Enter  Grab / release     P  Pause     R  Restart     Q / Esc  Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Board width in chips.
    #[arg(long, default_value = "8", value_name = "COLS", value_parser = clap::value_parser!(u16).range(3..=16))]
    pub width: u16,

    /// Board height in chips.
    #[arg(long, default_value = "8", value_name = "ROWS", value_parser = clap::value_parser!(u16).range(3..=16))]
    pub height: u16,

    /// Number of chip colours.
    #[arg(short, long, default_value = "6", value_name = "N", value_parser = clap::value_parser!(u8).range(3..=6))]
    pub colors: u8,

    /// Game logic ticks per second (animation speed), 1 to 1000.
    #[arg(long, default_value = "60.0", value_name = "RATE", value_parser = parse_tick_rate)]
    pub tick_rate: f64,

    /// Seed for the board generator (random if not set).
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// No terminal bell on bombs.
    #[arg(long)]
    pub mute: bool,

    /// Disable the board fade-in at the start of each level.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file (nothing is logged otherwise).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<std::path::PathBuf>,

    /// Log debug messages too.
    #[arg(short, long)]
    pub verbose: bool,
}

const TICK_RATE_RANGE: std::ops::RangeInclusive<f64> = 1.0..=1000.0;

fn parse_tick_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if TICK_RATE_RANGE.contains(&rate) {
        Ok(rate)
    } else {
        Err(format!(
            "{rate} is not in {}..={}",
            TICK_RATE_RANGE.start(),
            TICK_RATE_RANGE.end()
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
