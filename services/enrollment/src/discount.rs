use kairos_common::round_to_peso;
use rust_decimal::Decimal;

/// One batch member for the sibling discount rule.
#[derive(Debug, Clone)]
pub struct DiscountInput {
    pub last_name: String,
    pub base_price: Decimal,
}

/// Sibling discount: every student in the batch gets the same percentage
/// off their modality base price when the batch reaches the threshold and
/// all first last-name tokens match (case-insensitive, trimmed). The
/// last-name heuristic stands in for sibling verification on purpose;
/// there is no cross-check against the guardian relationship.
///
/// Returns one discount amount per input, rounded to the nearest peso.
/// All-or-nothing: a mixed batch gets zero discount for everyone.
pub fn family_discount(
    batch: &[DiscountInput],
    threshold: usize,
    percentage: Decimal,
) -> Vec<Decimal> {
    let zero = vec![Decimal::ZERO; batch.len()];

    if batch.len() < threshold || percentage <= Decimal::ZERO {
        return zero;
    }

    let mut tokens = batch.iter().map(|input| {
        input
            .last_name
            .trim()
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_lowercase()
    });

    let first = match tokens.next() {
        Some(token) if !token.is_empty() => token,
        _ => return zero,
    };

    if !tokens.all(|token| token == first) {
        return zero;
    }

    batch
        .iter()
        .map(|input| round_to_peso(input.base_price * percentage / Decimal::from(100)))
        .collect()
}
