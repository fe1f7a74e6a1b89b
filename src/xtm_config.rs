// Configuration management
// Board parameters and preferences persisted as TOML in the per-user config directory

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

use crate::xtm_board::BoardParams;
use crate::xtm_error::{Error, Result};

pub const APP_NAME: &str = "xtmines";

/// User configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Board setup
    pub width: usize,
    pub height: usize,
    pub mine_probability: f64, // independent chance per cell

    // Preferences
    pub ascii_icons: bool, // Use ASCII fallback icons
    pub language: String,  // Language code ("en" or "zh")
    pub tick_ms: u64,      // Timer label refresh interval
    pub log_level: String, // trace, debug, info, warn or error
}

impl Default for Config {
    fn default() -> Self {
        let board = BoardParams::default();
        Config {
            width: board.width,
            height: board.height,
            mine_probability: board.mine_probability,
            ascii_icons: false,
            language: system_language(),
            tick_ms: 100,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn board_params(&self) -> BoardParams {
        BoardParams {
            width: self.width,
            height: self.height,
            mine_probability: self.mine_probability,
        }
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(10))
    }

    /// Parsed log level; unknown names fall back to info
    pub fn log_level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }
}

/// Pick "zh" for Chinese locales, "en" for everything else
fn system_language() -> String {
    let system_lang = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    if system_lang.to_lowercase().starts_with("zh") {
        "zh".to_string()
    } else {
        "en".to_string()
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", APP_NAME, APP_NAME)
}

/// Get the configuration file path
/// e.g. ~/.config/xtmines/xtmines.toml on Linux, falling back to the current directory
pub fn config_path() -> Option<PathBuf> {
    let file = format!("{}.toml", APP_NAME);
    if let Some(proj) = project_dirs() {
        return Some(proj.config_dir().join(file));
    }
    env::current_dir().ok().map(|dir| dir.join(file))
}

/// Default log file location under the local data directory
pub fn log_path() -> Option<PathBuf> {
    let file = format!("{}.log", APP_NAME);
    if let Some(proj) = project_dirs() {
        return Some(proj.data_local_dir().join(file));
    }
    env::current_dir().ok().map(|dir| dir.join(file))
}

/// Load configuration from `path`, writing the defaults there if the file does not exist yet
pub fn load_or_create_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let s = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        return toml::from_str(&s).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        });
    }
    let cfg = Config::default();
    save_config(&cfg, path)?;
    Ok(cfg)
}

/// Save configuration to disk as TOML
pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    let s = toml::to_string(cfg)?;
    let write_err = |source| Error::ConfigWrite {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, s).map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("{}-{}-{}", APP_NAME, name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = scratch_dir("create");
        let path = dir.join("nested").join("xtmines.toml");

        let cfg = load_or_create_config(&path).unwrap();
        assert_eq!(cfg.board_params(), BoardParams::default());
        assert!(path.exists());
        assert_eq!(load_or_create_config(&path).unwrap(), cfg);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = scratch_dir("partial");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("xtmines.toml");
        fs::write(&path, "width = 16\nmine_probability = 0.2\nascii_icons = true\n").unwrap();

        let cfg = load_or_create_config(&path).unwrap();
        assert_eq!(cfg.width, 16);
        assert_eq!(cfg.height, 10);
        assert_eq!(cfg.mine_probability, 0.2);
        assert!(cfg.ascii_icons);
        assert_eq!(cfg.tick_rate(), Duration::from_millis(100));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = scratch_dir("malformed");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("xtmines.toml");
        fs::write(&path, "width = \"wide\"\n").unwrap();

        assert!(matches!(
            load_or_create_config(&path),
            Err(Error::ConfigParse { .. })
        ));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn log_level_and_tick_fallbacks() {
        let mut cfg = Config::default();
        cfg.log_level = "DEBUG".to_string();
        assert_eq!(cfg.log_level(), Level::DEBUG);
        cfg.log_level = "chatty".to_string();
        assert_eq!(cfg.log_level(), Level::INFO);
        cfg.tick_ms = 0;
        assert_eq!(cfg.tick_rate(), Duration::from_millis(10));
    }
}
