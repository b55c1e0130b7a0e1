use std::fmt;

use pricing::PoolSnapshot;
use serde::{Deserialize, Serialize};

pub type TokenId = u64;

/// Textual principal of the authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(v: impl Into<String>) -> Self {
        Self(v.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchpadMetadata {
    /// Id the next created token will receive.
    pub next_token_id: TokenId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub token_id: TokenId,
    pub name: String,
    pub ticker: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, alias = "maybe_website")]
    pub website: Option<String>,
    #[serde(default, alias = "maybe_twitter")]
    pub twitter: Option<String>,
    #[serde(default, alias = "maybe_telegram")]
    pub telegram: Option<String>,
    /// Creation time in nanoseconds since the epoch.
    #[serde(default)]
    pub created_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bucket start in nanoseconds since the epoch.
    pub time: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenData {
    pub token_id: TokenId,
    #[serde(default)]
    pub liquidity_pool: Option<PoolSnapshot>,
    #[serde(default)]
    pub candles: Vec<Candle>,
}

/// One row of the token list: metadata plus its pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenListing {
    pub info: TokenInfo,
    pub liquidity_pool: PoolSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenOrder {
    /// Newest first.
    #[default]
    CreatedAt,
    /// Deepest ICP reserve first.
    ReserveIcp,
    /// Newest first, skipping `batch_count` pages of `limit` tokens each.
    CreatedAtSkipBatches { batch_count: u64 },
}

impl TokenOrder {
    /// Newest-first listing starting at page `page` (0 is the latest).
    pub fn page(page: u64) -> Self {
        TokenOrder::CreatedAtSkipBatches { batch_count: page }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenOrder::CreatedAt => "created_at",
            TokenOrder::ReserveIcp => "reserve_icp",
            TokenOrder::CreatedAtSkipBatches { .. } => "created_at_skip_batches",
        }
    }

    /// Query string of the token listing route.
    pub fn query(&self, limit: u32) -> String {
        match self {
            TokenOrder::CreatedAtSkipBatches { batch_count } => format!(
                "order={}&batch_count={}&limit={}",
                self.as_str(),
                batch_count,
                limit
            ),
            _ => format!("order={}&limit={}", self.as_str(), limit),
        }
    }
}

/// Holding of one launchpad token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub token_id: TokenId,
    /// In e8s.
    pub balance: u128,
}

/// Most recent order placed by a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastOrder {
    /// Nanoseconds since the epoch.
    pub ts: u64,
    pub token_id: TokenId,
    /// ICP spent, in e8s.
    pub amount_e8s: u64,
    pub ticker: String,
}

/// Outgoing ledger transfer the backend has queued but not yet settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransfer {
    pub id: u64,
    /// `None` for ICP, otherwise the launchpad token being moved.
    #[serde(default)]
    pub token_id: Option<TokenId>,
    pub to: Principal,
    pub amount_e8s: u128,
    /// Nanoseconds since the epoch.
    #[serde(default)]
    pub created_at: Option<u64>,
}

/// Ledger fee charged on an ICP approval: 0.0001 ICP.
pub const ICP_APPROVE_FEE_E8S: u64 = 10_000;

/// Grants `spender` an ICP allowance drawn from `owner`'s account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveRequest {
    pub owner: Principal,
    pub spender: Principal,
    pub amount_e8s: u128,
    pub fee_e8s: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerError {
    pub message: String,
    pub error_code: u64,
}

/// Ledger verdict on an approval: the block index, or the ledger's error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApproveOutcome {
    Ok(u128),
    Err(LedgerError),
}

/// Backend verdict on a trade: `{"Ok": amount}` or `{"Err": reason}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeOutcome {
    /// Amount of the received asset, in e8s.
    Ok(u128),
    Err(String),
}

/// Arguments for listing a new token.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateTokenArg {
    pub ticker: String,
    pub name: String,
    pub description: String,
    pub image: String,
    #[serde(rename = "maybe_website")]
    pub website: Option<String>,
    #[serde(rename = "maybe_twitter")]
    pub twitter: Option<String>,
    #[serde(rename = "maybe_telegram")]
    pub telegram: Option<String>,
}

impl CreateTokenArg {
    pub const MAX_TICKER_LEN: usize = 10;
    pub const MAX_NAME_LEN: usize = 50;
    pub const MAX_DESCRIPTION_LEN: usize = 500;

    /// Returns the first problem found, mirroring what the launchpad enforces.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.ticker.is_empty() {
            return Err("ticker is required");
        }
        if self.name.is_empty() {
            return Err("name is required");
        }
        if self.description.is_empty() {
            return Err("description is required");
        }
        if self.image.is_empty() {
            return Err("image url is required");
        }
        if self.ticker.chars().count() > Self::MAX_TICKER_LEN {
            return Err("ticker must be 10 characters or less");
        }
        if self.name.chars().count() > Self::MAX_NAME_LEN {
            return Err("name must be 50 characters or less");
        }
        if self.description.chars().count() > Self::MAX_DESCRIPTION_LEN {
            return Err("description must be 500 characters or less");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_arg() -> CreateTokenArg {
        CreateTokenArg {
            ticker: "BOB".into(),
            name: "Bob".into(),
            description: "a token".into(),
            image: "https://img/bob.png".into(),
            ..Default::default()
        }
    }

    #[test]
    fn create_token_validation_reports_first_problem() {
        assert_eq!(valid_arg().validate(), Ok(()));

        let mut arg = valid_arg();
        arg.ticker.clear();
        arg.name.clear();
        assert_eq!(arg.validate(), Err("ticker is required"));

        let mut arg = valid_arg();
        arg.ticker = "ABCDEFGHIJK".into();
        assert_eq!(arg.validate(), Err("ticker must be 10 characters or less"));

        let mut arg = valid_arg();
        arg.description = "x".repeat(501);
        assert_eq!(
            arg.validate(),
            Err("description must be 500 characters or less")
        );
    }

    #[test]
    fn trade_outcome_uses_result_style_tags() {
        let ok: TradeOutcome = serde_json::from_str(r#"{"Ok": 4200}"#).unwrap();
        let err: TradeOutcome = serde_json::from_str(r#"{"Err": "insufficient funds"}"#).unwrap();

        assert_eq!(ok, TradeOutcome::Ok(4_200));
        assert_eq!(err, TradeOutcome::Err("insufficient funds".into()));
    }

    #[test]
    fn listing_order_query_strings() {
        assert_eq!(TokenOrder::CreatedAt.query(20), "order=created_at&limit=20");
        assert_eq!(TokenOrder::ReserveIcp.query(5), "order=reserve_icp&limit=5");
        assert_eq!(
            TokenOrder::page(3).query(20),
            "order=created_at_skip_batches&batch_count=3&limit=20"
        );
    }

    #[test]
    fn approve_outcome_carries_ledger_error() {
        let out: ApproveOutcome =
            serde_json::from_str(r#"{"Err": {"message": "insufficient funds", "error_code": 1}}"#)
                .unwrap();

        assert_eq!(
            out,
            ApproveOutcome::Err(LedgerError {
                message: "insufficient funds".into(),
                error_code: 1,
            })
        );
    }

    #[test]
    fn token_info_accepts_optional_link_fields() {
        let info: TokenInfo = serde_json::from_str(
            r#"{"token_id": 7, "name": "Bob", "ticker": "BOB", "maybe_twitter": "bob"}"#,
        )
        .unwrap();

        assert_eq!(info.twitter.as_deref(), Some("bob"));
        assert_eq!(info.website, None);
        assert!(info.description.is_empty());
    }
}
