use crate::types::errors::AmountError;
use rust_decimal::Decimal;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const TOTAL_COST_MARKER: &str = "@@";

/// The aggregate price paid for a lot, rendered as `@@ <quantity> <currency>`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TotalCost {
    pub quantity: Decimal,
    pub currency: String
}

impl TotalCost {
    pub fn new(quantity: Decimal, currency: impl Into<String>) -> Self {
        Self {
            quantity,
            currency: currency.into()
        }
    }
}

/// A decimal quantity of one commodity, optionally annotated with the total
/// cost of the lot in another commodity.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Amount {
    pub quantity: Decimal,
    pub currency: String,
    pub total_cost: Option<TotalCost>
}

impl Amount {
    pub fn new(quantity: Decimal, currency: impl Into<String>) -> Self {
        Self {
            quantity,
            currency: currency.into(),
            total_cost: None
        }
    }

    pub fn with_total_cost(mut self, cost: TotalCost) -> Self {
        self.total_cost = Some(cost);
        self
    }

    pub fn is_negative(&self) -> bool {
        self.quantity.is_sign_negative() && !self.quantity.is_zero()
    }

    /// Returns the same commodity with the opposite sign and no cost annotation.
    pub fn negated(&self) -> Self {
        Self::new(negate(self.quantity), self.currency.clone())
    }

    /// Parses an amount that must not carry a `@@` annotation.
    pub fn parse_plain(value: &str) -> Result<Self, AmountError> {
        let amount = Amount::from_str(value)?;

        if amount.total_cost.is_some() {
            return Err(AmountError::unexpected_cost(value));
        }

        Ok(amount)
    }
}

/// Negation that never yields a signed zero, so `0` renders as `0` rather than `-0`.
pub fn negate(value: Decimal) -> Decimal {
    let mut negated = -value;

    if negated.is_zero() {
        negated.set_sign_positive(true);
    }

    negated
}

impl Display for Amount {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} {}", self.quantity, self.currency)?;

        if let Some(cost) = &self.total_cost {
            write!(formatter, " {} {} {}", TOTAL_COST_MARKER, cost.quantity, cost.currency)?;
        }

        Ok(())
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = value.split_whitespace().collect();

        if tokens.len() < 2 {
            return Err(AmountError::invalid_format(value, "expected `<quantity> <currency>`"));
        }

        let quantity = parse_quantity(value, tokens[0])?;
        let amount = Amount::new(quantity, tokens[1]);

        match tokens.as_slice() {
            [_, _] => Ok(amount),
            [_, _, marker, cost_quantity, cost_currency] if *marker == TOTAL_COST_MARKER => {
                let cost_quantity = parse_quantity(value, cost_quantity)?;
                Ok(amount.with_total_cost(TotalCost::new(cost_quantity, *cost_currency)))
            }
            _ => Err(AmountError::invalid_format(value, "unexpected trailing tokens"))
        }
    }
}

fn parse_quantity(input: &str, token: &str) -> Result<Decimal, AmountError> {
    Decimal::from_str(token).map_err(|error| AmountError::invalid_quantity(input, error))
}
