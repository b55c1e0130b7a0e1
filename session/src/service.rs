use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};
use watcher::{SequenceId, SequenceSource};

use crate::api::LaunchpadApi;
use crate::cache::TokenInfoCache;
use crate::errors::ClientError;
use crate::model::{
    ApproveOutcome, ApproveRequest, CreateTokenArg, ICP_APPROVE_FEE_E8S, LastOrder,
    LaunchpadMetadata, PendingTransfer, Principal, TokenBalance, TokenData, TokenId, TokenInfo,
    TokenListing, TokenOrder, TradeOutcome,
};

/// Launchpad API plus the injected token metadata cache.
///
/// Token metadata reads go through the cache; everything else (pools,
/// balances, trades) is always read fresh.
#[derive(Clone)]
pub struct LaunchpadService {
    api: Arc<dyn LaunchpadApi>,
    cache: Arc<TokenInfoCache>,
}

impl LaunchpadService {
    pub fn new(api: Arc<dyn LaunchpadApi>, cache: Arc<TokenInfoCache>) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &Arc<TokenInfoCache> {
        &self.cache
    }

    pub async fn metadata(&self) -> Result<LaunchpadMetadata, ClientError> {
        self.api.get_metadata().await
    }

    /// Lists tokens and caches the metadata of any listing not yet cached.
    #[instrument(skip(self), level = "debug")]
    pub async fn tokens(
        &self,
        order: TokenOrder,
        limit: u32,
    ) -> Result<Vec<TokenListing>, ClientError> {
        let listings = self.api.get_tokens(order, limit).await?;

        let mut cached = 0usize;
        for listing in &listings {
            if !self.cache.contains(listing.info.token_id) {
                self.cache.insert(listing.info.clone());
                cached += 1;
            }
        }
        debug!(listed = listings.len(), newly_cached = cached, "token list fetched");

        Ok(listings)
    }

    /// Page `page` of the newest-first listing, `batch_size` tokens per page.
    pub async fn recent_tokens(
        &self,
        page: u64,
        batch_size: u32,
    ) -> Result<Vec<TokenListing>, ClientError> {
        self.tokens(TokenOrder::page(page), batch_size).await
    }

    pub fn cached_token_info(&self, token_id: TokenId) -> Option<TokenInfo> {
        self.cache.get(token_id)
    }

    /// Cache-through metadata lookup.
    pub async fn token_info(&self, token_id: TokenId) -> Result<Option<TokenInfo>, ClientError> {
        if let Some(info) = self.cache.get(token_id) {
            return Ok(Some(info));
        }

        let info = self.api.get_token_info(token_id).await?;
        if let Some(info) = &info {
            self.cache.insert(info.clone());
        }
        Ok(info)
    }

    /// Fresh pool/candle data. Also warms the metadata cache; a failure to do
    /// so is logged and does not fail the call.
    pub async fn token_data(&self, token_id: TokenId) -> Result<TokenData, ClientError> {
        let data = self.api.get_token_data(token_id).await?;

        if !self.cache.contains(token_id) {
            if let Err(e) = self.token_info(token_id).await {
                warn!(token_id, error = %e, "failed to warm token info cache");
            }
        }

        Ok(data)
    }

    pub async fn token_balance(
        &self,
        token_id: TokenId,
        principal: &Principal,
    ) -> Result<u128, ClientError> {
        self.api.get_token_balance(token_id, principal).await
    }

    pub async fn token_balances(
        &self,
        principal: &Principal,
    ) -> Result<Vec<TokenBalance>, ClientError> {
        self.api.get_token_balances(principal).await
    }

    pub async fn icp_balance(&self, principal: &Principal) -> Result<u128, ClientError> {
        self.api.get_icp_balance(principal).await
    }

    pub async fn last_order(
        &self,
        principal: &Principal,
    ) -> Result<Option<LastOrder>, ClientError> {
        self.api.get_last_order(principal).await
    }

    pub async fn pending_transfers(&self) -> Result<Vec<PendingTransfer>, ClientError> {
        let transfers = self.api.get_pending_transfers().await?;
        debug!(pending = transfers.len(), "pending transfers fetched");
        Ok(transfers)
    }

    /// Lets `spender` draw up to `amount_e8s` ICP from `owner`. Returns the
    /// ledger block index of the approval.
    #[instrument(skip(self, owner, spender), fields(spender = %spender))]
    pub async fn approve_spender(
        &self,
        owner: &Principal,
        spender: &Principal,
        amount_e8s: u128,
    ) -> Result<u128, ClientError> {
        if owner == spender {
            return Err(ClientError::InvalidRequest("self-approval is not allowed"));
        }
        if amount_e8s == 0 {
            return Err(ClientError::InvalidRequest("approval amount must be positive"));
        }

        let req = ApproveRequest {
            owner: owner.clone(),
            spender: spender.clone(),
            amount_e8s,
            fee_e8s: ICP_APPROVE_FEE_E8S,
        };

        match self.api.approve_spender(&req).await? {
            ApproveOutcome::Ok(block) => {
                info!(block, "approval granted");
                Ok(block)
            }
            ApproveOutcome::Err(e) => {
                warn!(error_code = e.error_code, message = %e.message, "approval refused");
                Err(ClientError::Rejected(e.message))
            }
        }
    }

    /// Buys `token_id` for `amount_e8s` ICP. Returns the amount of tokens received.
    #[instrument(skip(self), level = "info")]
    pub async fn buy(&self, token_id: TokenId, amount_e8s: u64) -> Result<u128, ClientError> {
        if amount_e8s == 0 {
            return Err(ClientError::InvalidRequest("trade amount must be positive"));
        }

        let received = settle(self.api.buy(token_id, amount_e8s).await?)?;
        info!(received, "buy settled");
        Ok(received)
    }

    /// Sells `amount_e8s` of `token_id`. Returns the ICP received in e8s.
    #[instrument(skip(self), level = "info")]
    pub async fn sell(&self, token_id: TokenId, amount_e8s: u64) -> Result<u128, ClientError> {
        if amount_e8s == 0 {
            return Err(ClientError::InvalidRequest("trade amount must be positive"));
        }

        let received = settle(self.api.sell(token_id, amount_e8s).await?)?;
        info!(received, "sell settled");
        Ok(received)
    }

    #[instrument(skip(self, arg), fields(ticker = %arg.ticker))]
    pub async fn create_token(&self, arg: &CreateTokenArg) -> Result<TokenId, ClientError> {
        arg.validate().map_err(ClientError::InvalidRequest)?;

        let token_id = self.api.create_token(arg).await?;
        info!(token_id, "token created");
        Ok(token_id)
    }
}

fn settle(outcome: TradeOutcome) -> Result<u128, ClientError> {
    match outcome {
        TradeOutcome::Ok(received) => Ok(received),
        TradeOutcome::Err(reason) => Err(ClientError::Rejected(reason)),
    }
}

/// Exposes the launchpad's `next_token_id` to the issue watcher.
#[derive(Clone)]
pub struct MetadataSequence {
    service: LaunchpadService,
}

impl MetadataSequence {
    pub fn new(service: LaunchpadService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl SequenceSource for MetadataSequence {
    async fn fetch_next_sequence_id(&self) -> anyhow::Result<SequenceId> {
        Ok(self.service.metadata().await?.next_token_id)
    }
}
