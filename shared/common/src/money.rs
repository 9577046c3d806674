use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Tuition amounts are whole Colombian pesos. Discounted prices round to
/// the nearest peso, half away from zero.
pub fn round_to_peso(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// The hosted checkout expects amounts in centavos.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::from(100)).to_i64()
}
