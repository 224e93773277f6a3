use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};

use crate::journal::JournalError;

const MAIN_JOURNAL: &str = "main.journal";

/// Decides which journal file a transaction dated on a given day belongs to.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum JournalLocator {
    /// Every transaction goes to one file.
    Fixed(PathBuf),
    /// Journals are split per period under `root/<year>/`.
    Sharded {
        root: PathBuf
    }
}

impl JournalLocator {
    /// The finest existing period file wins: month, then quarter, then half,
    /// then the whole year.
    pub fn locate(&self, date: NaiveDate) -> Result<PathBuf, JournalError> {
        match self {
            JournalLocator::Fixed(path) => Ok(path.clone()),
            JournalLocator::Sharded { root } => locate_shard(root, date)
        }
    }

    /// The file that includes every journal, used for whole-ledger queries.
    pub fn main_file(&self) -> PathBuf {
        match self {
            JournalLocator::Fixed(path) => path.clone(),
            JournalLocator::Sharded { root } => root.join(MAIN_JOURNAL)
        }
    }
}

fn locate_shard(root: &Path, date: NaiveDate) -> Result<PathBuf, JournalError> {
    let year = date.year();
    let month = date.month();
    let quarter = (month - 1) / 3 + 1;
    let half = if month > 6 { 2 } else { 1 };
    let year_directory = root.join(year.to_string());

    let candidates = [
        format!("{year}M{month}.journal"),
        format!("{year}Q{quarter}.journal"),
        format!("{year}H{half}.journal"),
        format!("{year}.journal"),
    ];

    candidates.iter()
        .map(|name| year_directory.join(name))
        .find(|path| path.is_file())
        .ok_or(JournalError::NoJournalForYear { year })
}
