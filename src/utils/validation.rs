//! Validation and money-scale helpers

use bigdecimal::{BigDecimal, RoundingMode};

use crate::types::{WalletError, WalletResult};

/// Validate that an amount is positive. Runs before any storage access or
/// external call, so a violation never leaves partial state.
pub fn validate_positive_amount(amount: &BigDecimal) -> WalletResult<()> {
    if *amount <= BigDecimal::from(0) {
        return Err(WalletError::InvalidAmount(amount.clone()));
    }
    Ok(())
}

/// Normalize a monetary value to scale 2, rounding half-up. Keeps every
/// persisted amount and balance at a fixed two decimal places.
pub fn money_scale(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}
