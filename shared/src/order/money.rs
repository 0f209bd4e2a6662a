//! Money calculation utilities using rust_decimal for precision
//!
//! Prices are exact decimals end to end. Rounding happens once, when the
//! taxed total is derived from the subtotal.

use rust_decimal::prelude::*;

/// Rounding precision for monetary values
const DECIMAL_PLACES: u32 = 2;

/// Fixed tax rate applied to every order (10%)
pub const TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Round to 2 decimal places, half away from zero
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Unit price × quantity
#[inline]
pub fn line_total(price: Decimal, quantity: u32) -> Decimal {
    price * Decimal::from(quantity)
}

/// Subtotal × (1 + tax rate), rounded
pub fn total_with_tax(subtotal: Decimal) -> Decimal {
    round_money(subtotal * (Decimal::ONE + TAX_RATE))
}

/// Tax portion of a total computed by [`total_with_tax`]
pub fn tax_amount(subtotal: Decimal) -> Decimal {
    total_with_tax(subtotal) - subtotal
}
