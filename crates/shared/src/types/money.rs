//! Cent rounding for decimal amounts.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` end to end; rounding only trims
//! drift introduced by storage backends that keep amounts as `REAL`.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places surfaced for any amount.
pub const CURRENCY_SCALE: u32 = 2;

/// Rounds an amount to whole cents, half away from zero.
#[must_use]
pub fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
#[path = "money_tests.rs"]
mod tests;
