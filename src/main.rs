//! floodtui — flood-control pipe puzzle in the terminal.

mod anim;
mod app;
mod board;
mod game;
mod input;
mod pipe;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};

/// Options derived from CLI that affect game behaviour.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub flood_rate: f32,
    pub flood_accel: f32,
    pub seed: Option<u64>,
    pub tick_rate: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = GameConfig {
        flood_rate: args.flood_rate,
        flood_accel: args.flood_accel,
        seed: args.seed,
        tick_rate: args.tick_rate,
    };
    let mut app = App::new(&args, config, theme);
    app.run()?;
    Ok(())
}

/// Flood-control pipe puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "floodtui",
    version,
    about = "Flood-control pipe puzzle: rotate pipes so water crosses each row before the flood rises.",
    long_about = "Floodtui is a terminal pipe puzzle. Water enters every row from the left each \
        simulation pass; rotate pipe segments so a connected chain leaves the right edge of a row. \
        Completed chains score, drain the flood meter and fade away; new pipes drop in from above. \
        The flood meter rises every second and rises faster each level — the game ends when it \
        passes 100.\n\n\
        CONTROLS:\n  Arrows/hjkl  Move cursor   Z          Rotate CCW   X       Rotate CW\n  \
        Mouse left   Rotate CCW    Mouse right Rotate CW   P       Pause   Q/Esc  Quit"
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]="value"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// RNG seed for board generation (random if not set).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Simulation ticks per second (animations, water passes).
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Flood meter increase per second at level 1.
    #[arg(long, default_value = "1.0", value_name = "RATE")]
    pub flood_rate: f32,

    /// Flood rate increase per level.
    #[arg(long, default_value = "0.5", value_name = "RATE")]
    pub flood_accel: f32,

    /// Skip main menu and start game immediately.
    #[arg(long)]
    pub no_menu: bool,
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
