mod errors;
mod hledger;
mod report;

use std::future::Future;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::models::BalanceSnapshot;

pub use errors::ProviderError;
pub use hledger::Hledger;

/// What to ask a balance provider for.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BalanceQuery {
    pub account: String,
    /// Postings dated after this day are ignored.
    pub as_of: NaiveDate,
    pub file_scope: Option<PathBuf>,
    /// Commodity whose quantity is wanted.
    pub commodity: String,
    /// Currency the holding is valued in, at cost.
    pub valuation: String
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum RecordKind {
    Accounts,
    Notes
}

impl RecordKind {
    pub fn command(self) -> &'static str {
        match self {
            RecordKind::Accounts => "accounts",
            RecordKind::Notes => "notes"
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            RecordKind::Accounts => "account",
            RecordKind::Notes => "note"
        }
    }
}

pub trait BalanceProvider: Send + Sync {
    /// Returns `Ok(None)` when the account holds nothing in `query.commodity`.
    fn balance(&self, query: &BalanceQuery) -> impl Future<Output = Result<Option<BalanceSnapshot>, ProviderError>> + Send;
}

pub trait RecordSearch: Send + Sync {
    fn search(&self, kind: RecordKind, term: &str) -> impl Future<Output = Result<Vec<String>, ProviderError>> + Send;
}
