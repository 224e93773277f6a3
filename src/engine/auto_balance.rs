use rust_decimal::Decimal;

use crate::engine::errors::BalanceError;
use crate::models::Transaction;
use crate::types::{negate, Amount};

/// Computes the amount that brings the postings of `transaction` to zero.
///
/// Only single-currency transactions can be balanced. A trailing posting
/// without an amount is the one being resolved and is skipped; any other
/// posting without an amount is an error.
///
/// # Errors
/// - `MissingAmount` if a non-trailing posting has no amount.
/// - `MixedCurrencies` if postings use more than one currency.
/// - `NothingToBalance` if no posting has an amount yet.
pub fn compute_balancing_amount(transaction: &Transaction) -> Result<Amount, BalanceError> {
    let last = transaction.postings().count().saturating_sub(1);
    let mut running: Option<(&str, Decimal)> = None;

    for (index, posting) in transaction.postings().enumerate() {
        let Some(amount) = &posting.amount else {
            if index == last {
                continue;
            }
            return Err(BalanceError::missing_amount(posting));
        };

        let (currency, total) = running.get_or_insert((amount.currency.as_str(), Decimal::ZERO));

        if *currency != amount.currency {
            return Err(BalanceError::mixed_currencies(currency, &amount.currency));
        }

        *total = total.checked_add(amount.quantity)
            .ok_or_else(|| BalanceError::Overflow { currency: amount.currency.clone() })?;
    }

    let (currency, total) = running.ok_or(BalanceError::NothingToBalance)?;

    Ok(Amount::new(negate(total), currency))
}
