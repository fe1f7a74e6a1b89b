// Error types shared by board setup, configuration and logging

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("board must have at least one row and one column (got {width}x{height})")]
    EmptyBoard { width: usize, height: usize },

    #[error("board is {width}x{height}; neither side may exceed {max} cells")]
    BoardTooLarge {
        width: usize,
        height: usize,
        max: usize,
    },

    #[error("mine probability must be within 0.0..=1.0 (got {0})")]
    MineProbability(f64),

    #[error("failed to read config file {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write config file {}", path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize config")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("failed to open log file {}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
