// Entry point for the Minesweeper TUI application
// Parses the command line, loads configuration, sets up logging, and launches the UI

use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use tracing::{info, warn};

// Module declarations
mod xtm_app; // Application context shared by the UI and game setup
mod xtm_board; // Board model: mines, adjacency, reveal and flag transitions
mod xtm_color; // Terminal color depth detection and palette
mod xtm_config; // TOML configuration
mod xtm_error; // Error types
mod xtm_game; // Game session: timer, outcome, tiles
mod xtm_lang; // Multi-language string resources
mod xtm_log; // Log file setup
mod xtm_ui; // Terminal UI rendering and event handling

use xtm_app::AppContext;
use xtm_color::Palette;
use xtm_config::{Config, config_path, load_or_create_config, log_path};
use xtm_ui::run as run_ui;

#[derive(Debug, Parser)]
#[command(name = "xtmines", version, about = "A terminal-based Minesweeper game")]
struct Cli {
    /// Board width in cells
    #[arg(long)]
    width: Option<usize>,

    /// Board height in cells
    #[arg(long)]
    height: Option<usize>,

    /// Independent chance of each cell holding a mine (0.0 to 1.0)
    #[arg(short = 'p', long)]
    mine_probability: Option<f64>,

    /// Seed for reproducible boards
    #[arg(long)]
    seed: Option<u64>,

    /// Configuration file to use instead of the per-user one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use ASCII fallback icons
    #[arg(long)]
    ascii: bool,

    /// Interface language ("en" or "zh")
    #[arg(long)]
    lang: Option<String>,

    /// Write the log here instead of the local data directory
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Command-line values win over the config file; they are never written back
    fn apply(&self, cfg: &mut Config) {
        if let Some(w) = self.width {
            cfg.width = w;
        }
        if let Some(h) = self.height {
            cfg.height = h;
        }
        if let Some(p) = self.mine_probability {
            cfg.mine_probability = p;
        }
        if self.ascii {
            cfg.ascii_icons = true;
        }
        if let Some(lang) = &self.lang {
            cfg.language = lang.clone();
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // Load or create user configuration; a broken file falls back to defaults
    let (mut cfg, cfg_err) = match cli.config.clone().or_else(config_path) {
        Some(path) => match load_or_create_config(&path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Config::default(), Some(e)),
        },
        None => (Config::default(), None),
    };
    cli.apply(&mut cfg);

    if let Some(path) = cli.log_file.clone().or_else(log_path) {
        if let Err(e) = xtm_log::init(&path, cfg.log_level()) {
            eprintln!("warning: {}; logging disabled", e);
        }
    }
    if let Some(e) = cfg_err {
        let cause = std::error::Error::source(&e).map(|s| s.to_string()).unwrap_or_default();
        warn!(error = %e, %cause, "using default configuration");
    }

    // Reject bad board parameters before the terminal switches to raw mode
    cfg.board_params().validate()?;

    let ctx = AppContext::new(cfg, cli.seed, Palette::detect());
    info!(
        lang = %ctx.lang.current_lang,
        seed = ?ctx.seed,
        board = ?ctx.config.board_params(),
        "starting"
    );
    run_ui(&ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_overrides_config() {
        let cli = Cli::try_parse_from([
            "xtmines",
            "--width",
            "16",
            "-p",
            "0.25",
            "--ascii",
            "--lang",
            "zh",
            "--seed",
            "9",
        ])
        .unwrap();
        let mut cfg = Config::default();
        cli.apply(&mut cfg);

        assert_eq!(cfg.width, 16);
        assert_eq!(cfg.height, 10);
        assert_eq!(cfg.mine_probability, 0.25);
        assert!(cfg.ascii_icons);
        assert_eq!(cfg.language, "zh");
        assert_eq!(cli.seed, Some(9));
    }

    #[test]
    fn untouched_options_keep_config_values() {
        let cli = Cli::try_parse_from(["xtmines"]).unwrap();
        let mut cfg = Config::default();
        cfg.ascii_icons = true;
        let before = cfg.clone();
        cli.apply(&mut cfg);
        assert_eq!(cfg, before);
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        assert!(Cli::try_parse_from(["xtmines", "--width", "wide"]).is_err());
    }
}
