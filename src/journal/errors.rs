use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Journal [{}] does not exist", path.display())]
    NotFound {
        path: PathBuf
    },
    #[error("Journal [{}]: {source}", path.display())]
    Io {
        path: PathBuf,
        source: io::Error
    },
    #[error("File not found for year {year}. Initialize year first")]
    NoJournalForYear {
        year: i32
    },
    #[error("No ledger file specified. Use --file flag or set LEDGER_FILE environment variable.")]
    Unconfigured
}

impl JournalError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }
}
