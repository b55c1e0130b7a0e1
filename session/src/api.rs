use async_trait::async_trait;

use crate::errors::ClientError;
use crate::model::{
    ApproveOutcome, ApproveRequest, CreateTokenArg, LastOrder, LaunchpadMetadata, PendingTransfer,
    Principal, TokenBalance, TokenData, TokenId, TokenInfo, TokenListing, TokenOrder, TradeOutcome,
};

/// Remote launchpad operations. Transport details live in the implementation.
#[async_trait]
pub trait LaunchpadApi: Send + Sync + 'static {
    async fn get_metadata(&self) -> Result<LaunchpadMetadata, ClientError>;

    async fn get_tokens(
        &self,
        order: TokenOrder,
        limit: u32,
    ) -> Result<Vec<TokenListing>, ClientError>;

    /// `None` when the backend does not know the token.
    async fn get_token_info(&self, token_id: TokenId) -> Result<Option<TokenInfo>, ClientError>;

    async fn get_token_data(&self, token_id: TokenId) -> Result<TokenData, ClientError>;

    async fn get_token_balance(
        &self,
        token_id: TokenId,
        principal: &Principal,
    ) -> Result<u128, ClientError>;

    /// Every launchpad token `principal` holds.
    async fn get_token_balances(
        &self,
        principal: &Principal,
    ) -> Result<Vec<TokenBalance>, ClientError>;

    /// ICP ledger balance of `principal`, in e8s.
    async fn get_icp_balance(&self, principal: &Principal) -> Result<u128, ClientError>;

    /// `None` if `principal` has never traded.
    async fn get_last_order(
        &self,
        principal: &Principal,
    ) -> Result<Option<LastOrder>, ClientError>;

    async fn get_pending_transfers(&self) -> Result<Vec<PendingTransfer>, ClientError>;

    /// ICRC-2 approval on the ICP ledger.
    async fn approve_spender(&self, req: &ApproveRequest) -> Result<ApproveOutcome, ClientError>;

    /// Spend `amount_e8s` ICP on `token_id`.
    async fn buy(&self, token_id: TokenId, amount_e8s: u64) -> Result<TradeOutcome, ClientError>;

    /// Sell `amount_e8s` of `token_id`.
    async fn sell(&self, token_id: TokenId, amount_e8s: u64) -> Result<TradeOutcome, ClientError>;

    async fn create_token(&self, arg: &CreateTokenArg) -> Result<TokenId, ClientError>;
}
