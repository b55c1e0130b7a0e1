use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use chrono::{DateTime, Utc};
use session::TokenId;
use uuid::Uuid;
use watcher::ObserverToken;

pub type AutoBuyId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoBuyRule {
    /// ICP to spend on each new token, in e8s.
    pub amount_e8s: u64,

    /// Skip tokens whose pool would move more than this percentage.
    pub max_impact_pct: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ActiveAutoBuy {
    pub id: AutoBuyId,
    pub rule: AutoBuyRule,
    pub created_at: DateTime<Utc>,
    pub(crate) observer: ObserverToken,
    pub(crate) cancelled: Arc<AtomicBool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub auto_buy: AutoBuyId,
    pub token_id: TokenId,
    /// Resolved through the metadata cache; `None` if the lookup failed.
    pub ticker: Option<String>,
    pub amount_e8s: u64,
    pub received: u128,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuyDecision {
    Bought(Purchase),
    Skipped { reason: String },
}
