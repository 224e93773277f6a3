mod errors;
mod locator;

use std::fs::{self, OpenOptions};
use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::providers::ProviderError;

pub use errors::JournalError;
pub use locator::JournalLocator;

/// Checks a journal after it has been written.
pub trait Validator: Send + Sync {
    fn check(&self, path: &Path) -> impl Future<Output = Result<(), ProviderError>> + Send;
}

/// Where the journal ended before an append, used to undo it.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Receipt {
    pub previous_len: u64
}

#[derive(Debug)]
pub enum Commit {
    Accepted,
    /// The text was written but the validator refused the journal. The
    /// receipt can be handed to `Journal::revert`.
    Rejected {
        receipt: Receipt,
        report: ProviderError
    }
}

/// An existing journal file that transactions are appended to.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `text` verbatim. The journal must already exist.
    pub fn append(&self, text: &str) -> Result<Receipt, JournalError> {
        let metadata = fs::metadata(&self.path).map_err(|_| JournalError::NotFound { path: self.path.clone() })?;
        let receipt = Receipt { previous_len: metadata.len() };

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|error| JournalError::io(&self.path, error))?;

        write_or_rollback(&mut file, text, |file| file.set_len(receipt.previous_len))
            .map_err(|error| JournalError::io(&self.path, error))?;

        info!("Appended {} bytes to [{}]", text.len(), self.path.display());

        Ok(receipt)
    }

    /// Truncates the journal back to its length before the append of `receipt`.
    pub fn revert(&self, receipt: Receipt) -> Result<(), JournalError> {
        let file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|error| JournalError::io(&self.path, error))?;

        file.set_len(receipt.previous_len).map_err(|error| JournalError::io(&self.path, error))?;

        info!("Reverted [{}] to {} bytes", self.path.display(), receipt.previous_len);

        Ok(())
    }

    /// Appends `text` and validates the result.
    pub async fn commit<V: Validator>(&self, text: &str, validator: &V) -> Result<Commit, JournalError> {
        let receipt = self.append(text)?;

        match validator.check(&self.path).await {
            Ok(()) => Ok(Commit::Accepted),
            Err(report) => {
                warn!("Validation of [{}] failed", self.path.display());
                Ok(Commit::Rejected { receipt, report })
            }
        }
    }
}

/// Writes `text` in full or hands the writer to `rollback` so a failed write
/// leaves no partial transaction behind. The write error is returned either way.
fn write_or_rollback<W: Write>(
    writer: &mut W,
    text: &str,
    rollback: impl FnOnce(&mut W) -> io::Result<()>
) -> io::Result<()> {
    let written = writer.write_all(text.as_bytes()).and_then(|()| writer.flush());

    if let Err(error) = written {
        if let Err(rollback_error) = rollback(writer) {
            warn!("Could not roll back partial write: {rollback_error}");
        }
        return Err(error);
    }

    Ok(())
}
