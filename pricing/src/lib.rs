//! Pure pricing math for two-asset constant-product pools.
//!
//! Prices are always expressed as **base per quote**
//! (`reserve_base / reserve_quote`). On the launchpad the base asset is ICP,
//! the asset spent when buying, and the quote asset is the listed token, so a
//! price reads as "ICP per token". All amounts are in e8s.
//!
//! Nothing here performs I/O or keeps state; every call takes a fresh
//! [`PoolSnapshot`].

pub mod engine;
pub mod errors;
pub mod types;
pub mod units;

pub use engine::{current_price, price_impact, quote};
pub use errors::PricingError;
pub use types::{PoolSnapshot, PriceQuote, TradeDirection};
pub use units::{E8S_PER_UNIT, format_e8s, units_to_e8s};
