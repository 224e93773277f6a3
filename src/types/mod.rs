mod amount;
mod date;
mod errors;

pub use amount::{negate, Amount, TotalCost};
pub use date::{parse_date, DATE_FORMAT};
pub use errors::{AmountError, DateError};

pub type AccountName = String;
