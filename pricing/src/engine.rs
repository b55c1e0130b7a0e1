use crate::errors::PricingError;
use crate::types::{PoolSnapshot, PriceQuote, TradeDirection};

/// Spot price of one quote unit in base units.
pub fn current_price(reserve_base: u128, reserve_quote: u128) -> Result<f64, PricingError> {
    if reserve_quote == 0 {
        return Err(PricingError::DivideByZero);
    }
    Ok(reserve_base as f64 / reserve_quote as f64)
}

/// Percentage price impact of trading `trade_amount` base units against the pool.
///
/// The post-trade price comes from a linear shift of the base reserve
/// (`base ± amount`) with the quote reserve held fixed. This is not the
/// constant-product swap output (`x * y = k`); the backend's displayed impact
/// uses the linear shift and this must stay in step with it.
pub fn price_impact(
    reserve_base: u128,
    reserve_quote: u128,
    trade_amount: u128,
    direction: TradeDirection,
) -> Result<f64, PricingError> {
    Ok(quote_inner(reserve_base, reserve_quote, trade_amount, direction)?.impact_pct)
}

/// Current price, post-trade price and impact in one call.
pub fn quote(
    pool: &PoolSnapshot,
    trade_amount: u128,
    direction: TradeDirection,
) -> Result<PriceQuote, PricingError> {
    quote_inner(pool.reserve_base, pool.reserve_quote, trade_amount, direction)
}

fn quote_inner(
    reserve_base: u128,
    reserve_quote: u128,
    trade_amount: u128,
    direction: TradeDirection,
) -> Result<PriceQuote, PricingError> {
    if trade_amount == 0 {
        return Err(PricingError::InvalidInput("trade amount must be positive"));
    }
    if reserve_base == 0 {
        return Err(PricingError::InvalidInput("base reserve must be positive"));
    }

    let current = current_price(reserve_base, reserve_quote)?;
    let base = reserve_base as f64;
    let amount = trade_amount as f64;
    let quote_reserve = reserve_quote as f64;

    let (post_trade_price, impact_pct) = match direction {
        TradeDirection::Buy => {
            let new_price = (base + amount) / quote_reserve;
            (new_price, (new_price - current) / current * 100.0)
        }
        TradeDirection::Sell => {
            // May go negative when the amount exceeds the reserve; kept as-is.
            let new_price = (base - amount) / quote_reserve;
            (new_price, (current - new_price) / current * 100.0)
        }
    };

    Ok(PriceQuote {
        direction,
        current_price: current,
        post_trade_price,
        impact_pct,
    })
}
