use std::path::Path;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::engine::errors::ConversionError;
use crate::models::{BalanceSnapshot, Posting, Transaction};
use crate::providers::{BalanceProvider, BalanceQuery};
use crate::types::{negate, Amount, TotalCost};

const MINIMUM_VALUE_SCALE: u32 = 2;

/// Accounts the synthesized postings are routed to.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ConversionAccounts {
    /// Clearing account that carries both currency legs of a conversion.
    pub conversion: String,
    pub fx_gain: String,
    pub fx_loss: String
}

/// User input for a conversion. Amounts are raw `<quantity> <currency>` text.
#[derive(Debug, Clone, Copy)]
pub struct ConversionRequest<'a> {
    pub foreign_account: &'a str,
    pub foreign_amount: &'a str,
    pub local_account: &'a str,
    pub local_amount: &'a str,
    /// Journal the balance of the foreign account is read from.
    pub file_scope: Option<&'a Path>
}

/// How a disposed lot was valued and where the difference went.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Disposal {
    pub disposed_value: Decimal,
    pub gain_loss: Decimal,
    pub gain_loss_account: String,
    /// The whole position was disposed, so the tracked cost was used as is.
    pub full: bool
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Conversion {
    Acquisition,
    Disposal(Disposal)
}

/// Builds the postings of a currency conversion, realizing FX gain or loss
/// against the weighted-average cost of the holding when foreign currency is
/// disposed of.
#[derive(Debug, Clone)]
pub struct CurrencyConverter {
    accounts: ConversionAccounts
}

impl CurrencyConverter {
    pub fn new(accounts: ConversionAccounts) -> Self {
        Self { accounts }
    }

    /// Appends the conversion postings to `transaction`.
    ///
    /// Acquisitions (non-negative foreign quantity) need no lookup. Disposals
    /// query `provider` for the holding as of the transaction date. Nothing is
    /// appended unless every posting could be computed.
    ///
    /// # Errors
    /// - `InvalidAmountFormat` if either amount does not parse.
    /// - `SameCurrency` if both legs use one currency.
    /// - `LocalLegNotNegative` if an acquisition does not take money out of
    ///   the local account.
    /// - `MissingDate` if a disposal is requested before the header exists.
    /// - `BalanceLookupFailed` with the provider's error, unmodified.
    /// - `ZeroOrMissingBalance` if the holding is empty or unknown.
    pub async fn convert<P: BalanceProvider>(
        &self,
        transaction: &mut Transaction,
        request: &ConversionRequest<'_>,
        provider: &P
    ) -> Result<Conversion, ConversionError> {
        let foreign = Amount::parse_plain(request.foreign_amount)?;
        let local = Amount::parse_plain(request.local_amount)?;

        if foreign.currency == local.currency {
            return Err(ConversionError::SameCurrency { currency: foreign.currency });
        }

        if !foreign.is_negative() {
            if !local.is_negative() {
                return Err(ConversionError::LocalLegNotNegative {
                    account: request.local_account.to_string(),
                    amount: local.to_string()
                });
            }

            transaction.extend(self.acquisition_postings(request, &foreign, &local));
            return Ok(Conversion::Acquisition);
        }

        let as_of = transaction.date()
            .ok_or_else(|| ConversionError::MissingDate { account: request.foreign_account.to_string() })?;

        let query = BalanceQuery {
            account: request.foreign_account.to_string(),
            as_of,
            file_scope: request.file_scope.map(Path::to_path_buf),
            commodity: foreign.currency.clone(),
            valuation: local.currency.clone()
        };

        let snapshot = provider.balance(&query).await?
            .filter(|snapshot| !snapshot.quantity.is_zero())
            .ok_or_else(|| ConversionError::ZeroOrMissingBalance {
                account: request.foreign_account.to_string(),
                currency: foreign.currency.clone()
            })?;

        let disposal = self.dispose(request.foreign_account, &foreign, &local, &snapshot)?;
        transaction.extend(self.disposal_postings(request, &foreign, &local, &disposal));

        Ok(Conversion::Disposal(disposal))
    }

    /// Values the disposed foreign quantity and routes the difference to the
    /// realized local amount.
    pub fn dispose(&self, account: &str, foreign: &Amount, local: &Amount, snapshot: &BalanceSnapshot) -> Result<Disposal, ConversionError> {
        let overflow = || ConversionError::Overflow { account: account.to_string() };
        let disposed_quantity = negate(foreign.quantity);
        let scale = local.quantity.scale()
            .max(snapshot.value_at_cost.scale())
            .max(MINIMUM_VALUE_SCALE);

        let full = disposed_quantity == snapshot.quantity;
        let disposed_value = if full {
            snapshot.value_at_cost
        } else {
            weighted_average_value(disposed_quantity, snapshot, scale).ok_or_else(overflow)?
        };

        let gain_loss = local.quantity.checked_sub(disposed_value).ok_or_else(overflow)?;
        let gain_loss_account = if gain_loss >= Decimal::ZERO {
            self.accounts.fx_gain.clone()
        } else {
            self.accounts.fx_loss.clone()
        };

        Ok(Disposal {
            disposed_value,
            gain_loss,
            gain_loss_account,
            full
        })
    }

    fn acquisition_postings(&self, request: &ConversionRequest<'_>, foreign: &Amount, local: &Amount) -> Vec<Posting> {
        let cost = TotalCost::new(negate(local.quantity), local.currency.clone());

        vec![
            Posting::new(request.foreign_account, foreign.clone().with_total_cost(cost)),
            Posting::new(request.local_account, local.clone()),
            Posting::new(self.accounts.conversion.as_str(), foreign.negated()),
            Posting::new(self.accounts.conversion.as_str(), local.negated()),
        ]
    }

    fn disposal_postings(&self, request: &ConversionRequest<'_>, foreign: &Amount, local: &Amount, disposal: &Disposal) -> Vec<Posting> {
        let cost = TotalCost::new(disposal.disposed_value, local.currency.clone());

        vec![
            Posting::new(request.foreign_account, foreign.clone().with_total_cost(cost)),
            Posting::new(request.local_account, local.clone()),
            Posting::new(disposal.gain_loss_account.as_str(), Amount::new(negate(disposal.gain_loss), local.currency.clone())),
            Posting::new(self.accounts.conversion.as_str(), Amount::new(negate(disposal.disposed_value), local.currency.clone())),
            Posting::new(self.accounts.conversion.as_str(), foreign.negated()),
        ]
    }
}

/// Values `quantity` units at the holding's average cost per unit, rounded to
/// `scale` decimal places. Returns `None` on overflow or an empty holding.
pub fn weighted_average_value(quantity: Decimal, snapshot: &BalanceSnapshot, scale: u32) -> Option<Decimal> {
    let average_cost = snapshot.value_at_cost.checked_div(snapshot.quantity)?;
    let value = quantity.checked_mul(average_cost)?;

    Some(value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero))
}
