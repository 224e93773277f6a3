use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to get config path: no user configuration directory")]
    NoConfigDirectory,
    #[error("Config [{}]: {source}", path.display())]
    Io {
        path: PathBuf,
        source: io::Error
    },
    #[error("Invalid config file [{}]. Failed to parse file: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error
    }
}
