//! Token Amount Conversion
//!
//! Decimal token amounts ("0.5") to integer base units and back, using
//! exact decimal arithmetic.

use crate::error::{PermitError, PermitResult};
use ethers_core::types::U256;
use ethers_core::utils::format_units;

/// Scale a decimal amount by `10^decimals`.
///
/// Rejects negative amounts and amounts with more fractional digits than
/// the token carries, since either would need rounding.
pub fn parse_amount(amount: &str, decimals: u32) -> PermitResult<U256> {
    let amount = amount.trim();

    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };

    let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(PermitError::invalid_input(format!("invalid token amount: {:?}", amount)));
    }

    if fraction.len() > decimals as usize {
        return Err(PermitError::invalid_input(format!(
            "amount {} has more than {} decimal places",
            amount, decimals
        )));
    }

    let overflow = || {
        PermitError::invalid_input(format!(
            "amount {} with {} decimals does not fit in uint256",
            amount, decimals
        ))
    };

    // Oversized amounts must be errors, not arithmetic panics
    let scale = U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .ok_or_else(overflow)?;
    let whole = match whole {
        "" => U256::zero(),
        digits => U256::from_dec_str(digits).map_err(|_| overflow())?,
    };
    let fraction = match fraction {
        "" => U256::zero(),
        digits => {
            let padded = format!("{:0<width$}", digits, width = decimals as usize);
            U256::from_dec_str(&padded).map_err(|_| overflow())?
        }
    };

    whole
        .checked_mul(scale)
        .and_then(|units| units.checked_add(fraction))
        .ok_or_else(overflow)
}

/// Render base units as a decimal amount
pub fn format_amount(value: U256, decimals: u32) -> PermitResult<String> {
    let formatted = format_units(value, decimals)
        .map_err(|e| PermitError::invalid_input(format!("cannot format amount: {}", e)))?;

    // "0.500000000000000000" -> "0.5"
    if formatted.contains('.') {
        let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
        return Ok(trimmed.to_string());
    }
    Ok(formatted)
}
