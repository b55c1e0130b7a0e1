use serde::{Deserialize, Serialize};

/// Immutable reserves of a two-asset pool, read fresh from the backend for
/// every pricing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Reserve of the asset prices are denominated in (ICP, in e8s).
    #[serde(alias = "reserve_icp")]
    pub reserve_base: u128,

    /// Reserve of the listed asset (token, in e8s).
    #[serde(alias = "reserve_token")]
    pub reserve_quote: u128,
}

impl PoolSnapshot {
    pub fn new(reserve_base: u128, reserve_quote: u128) -> Self {
        Self {
            reserve_base,
            reserve_quote,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    /// Spend base (ICP) to acquire the listed token.
    Buy,
    /// Give the listed token back for base.
    Sell,
}

/// Result of pricing a proposed trade against a pool snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub direction: TradeDirection,
    pub current_price: f64,
    pub post_trade_price: f64,
    /// Percentage impact. Sign shows which way the price moved for the
    /// chosen direction; callers usually look at the magnitude.
    pub impact_pct: f64,
}
