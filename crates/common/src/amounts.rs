//! Conversion between human-readable decimal amounts and on-chain base units.

use alloy_primitives::U256;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AmountError {
    #[error("amount {0} is negative")]
    Negative(Decimal),

    #[error("amount {amount} has more precision than {decimals} decimals")]
    TooPrecise { amount: Decimal, decimals: u8 },

    #[error("amount {amount} overflows at {decimals} decimals")]
    Overflow { amount: Decimal, decimals: u8 },
}

/// Scales `amount` by `10^decimals`, rejecting fractional base units.
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<U256, AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative(amount));
    }
    let overflow = || AmountError::Overflow { amount, decimals };

    let factor = 10u128
        .checked_pow(u32::from(decimals))
        .and_then(Decimal::from_u128)
        .ok_or_else(overflow)?;
    let scaled = amount.checked_mul(factor).ok_or_else(overflow)?;
    if !scaled.fract().is_zero() {
        return Err(AmountError::TooPrecise { amount, decimals });
    }
    let units = scaled.trunc().to_u128().ok_or_else(overflow)?;
    Ok(U256::from(units))
}

/// Formats base units as a decimal amount, for logs and reports.
pub fn from_base_units(units: U256, decimals: u8) -> String {
    let digits = units.to_string();
    let decimals = usize::from(decimals);
    if decimals == 0 {
        return digits;
    }
    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (whole, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac)
    }
}
