use rust_decimal::Error as DecimalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AmountError {
    #[error("Invalid amount format [{input}]: {reason}. Only acceptable format is 1000.00 CUR")]
    InvalidFormat {
        input: String,
        reason: &'static str
    },
    #[error("Invalid number in amount [{input}]: {source}")]
    InvalidQuantity {
        input: String,
        source: DecimalError
    },
    #[error("Amount [{input}] must not carry a total cost annotation here")]
    UnexpectedCost {
        input: String
    }
}

impl AmountError {
    pub fn invalid_format(input: &str, reason: &'static str) -> Self {
        Self::InvalidFormat { input: input.to_string(), reason }
    }

    pub fn invalid_quantity(input: &str, source: DecimalError) -> Self {
        Self::InvalidQuantity { input: input.to_string(), source }
    }

    pub fn unexpected_cost(input: &str) -> Self {
        Self::UnexpectedCost { input: input.to_string() }
    }
}

#[derive(Debug, Error)]
pub enum DateError {
    #[error("Invalid date format [{input}], please use YYYY-MM-DD or . for today, .y for yesterday, .t for tomorrow")]
    InvalidFormat {
        input: String
    },
    #[error("Date [{input}] is out of range")]
    OutOfRange {
        input: String
    }
}
