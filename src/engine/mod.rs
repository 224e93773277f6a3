mod auto_balance;
mod conversion;
mod errors;

pub use auto_balance::compute_balancing_amount;
pub use conversion::{Conversion, ConversionAccounts, ConversionRequest, CurrencyConverter};
pub use errors::{BalanceError, ConversionError};
