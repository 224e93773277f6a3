use rust_decimal::Decimal;

/// Holdings of one account as of one date: the quantity of the commodity and
/// what it cost in the valuation currency.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct BalanceSnapshot {
    pub quantity: Decimal,
    pub value_at_cost: Decimal
}

impl BalanceSnapshot {
    pub fn new(quantity: Decimal, value_at_cost: Decimal) -> Self {
        Self { quantity, value_at_cost }
    }
}
