use thiserror::Error;

use crate::engine::{BalanceError, ConversionError};
use crate::journal::JournalError;
use crate::providers::{ProviderError, RecordKind};
use crate::types::{AmountError, DateError};

/// Why an input line was not accepted. The session stays where it was.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Amount(#[from] AmountError),
    #[error(transparent)]
    Date(#[from] DateError),
    #[error("Error balancing transaction: {0}")]
    Balance(#[from] BalanceError),
    #[error("Can not convert currencies: {0}")]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Journal(#[from] JournalError),
    #[error("Error searching {}: {source}", kind.command())]
    Search {
        kind: RecordKind,
        source: ProviderError
    },
    #[error("No {} found.", kind.command())]
    NoRecords {
        kind: RecordKind
    },
    #[error("Amount must be specified. Use . to balance the transaction")]
    AmountRequired,
    #[error("Local account must be specified when converting currencies.")]
    LocalAccountRequired
}

impl SessionError {
    pub fn search(kind: RecordKind, source: ProviderError) -> Self {
        Self::Search { kind, source }
    }
}
