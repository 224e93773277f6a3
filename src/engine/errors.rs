use crate::models::Posting;
use crate::providers::ProviderError;
use crate::types::AmountError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("Can not balance if postings are missing amount: [{account}] has none")]
    MissingAmount {
        account: String
    },
    #[error("Mixed currencies not supported for auto-balance: expected [{expected}], found [{found}]")]
    MixedCurrencies {
        expected: String,
        found: String
    },
    #[error("No amounts to balance")]
    NothingToBalance,
    #[error("Numeric overflow while summing [{currency}] postings")]
    Overflow {
        currency: String
    }
}

impl BalanceError {
    pub fn missing_amount(posting: &Posting) -> Self {
        Self::MissingAmount { account: posting.account.clone() }
    }

    pub fn mixed_currencies(expected: &str, found: &str) -> Self {
        Self::MixedCurrencies {
            expected: expected.to_string(),
            found: found.to_string()
        }
    }
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error(transparent)]
    InvalidAmountFormat(#[from] AmountError),
    #[error("Can not calculate gain from zero balance: [{account}] has no [{currency}] holdings")]
    ZeroOrMissingBalance {
        account: String,
        currency: String
    },
    #[error(transparent)]
    BalanceLookupFailed(#[from] ProviderError),
    #[error("Transaction has no date yet, can not look up the balance of [{account}]")]
    MissingDate {
        account: String
    },
    #[error("Local leg [{amount}] from [{account}] must be negative when buying foreign currency")]
    LocalLegNotNegative {
        account: String,
        amount: String
    },
    #[error("Both legs of the conversion are in [{currency}]")]
    SameCurrency {
        currency: String
    },
    #[error("Numeric overflow while valuing [{account}]")]
    Overflow {
        account: String
    }
}
