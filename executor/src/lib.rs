//! Auto-buy: rules that purchase every newly listed token as soon as the
//! issue watcher reports it.

pub mod auto_buy;
pub mod errors;
pub mod types;

pub use auto_buy::AutoBuyManager;
pub use errors::AutoBuyError;
pub use types::{ActiveAutoBuy, AutoBuyId, AutoBuyRule, BuyDecision, Purchase};
