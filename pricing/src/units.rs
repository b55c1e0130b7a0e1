use crate::errors::PricingError;

/// Ledger amounts are fixed-point with eight decimals.
pub const E8S_PER_UNIT: u64 = 100_000_000;

/// Converts a user-entered unit amount (e.g. `0.5` ICP) into e8s, rounding down.
pub fn units_to_e8s(units: f64) -> Result<u64, PricingError> {
    if !units.is_finite() || units <= 0.0 {
        return Err(PricingError::InvalidInput("amount must be a positive number"));
    }

    let e8s = (units * E8S_PER_UNIT as f64).floor();
    if e8s < 1.0 {
        return Err(PricingError::InvalidInput("amount is below one e8"));
    }
    if e8s >= u64::MAX as f64 {
        return Err(PricingError::InvalidInput("amount is too large"));
    }

    Ok(e8s as u64)
}

/// Renders an e8s amount in whole units with `decimals` fractional digits.
/// Zero renders as `"0"`.
pub fn format_e8s(value: u128, decimals: usize) -> String {
    if value == 0 {
        return "0".to_string();
    }
    format!("{:.*}", decimals, value as f64 / E8S_PER_UNIT as f64)
}
