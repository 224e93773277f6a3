mod balance;
mod line;
mod transaction;

pub use balance::BalanceSnapshot;
pub use line::{Comment, Header, Line, Posting};
pub use transaction::Transaction;
