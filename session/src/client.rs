use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::api::LaunchpadApi;
use crate::errors::ClientError;
use crate::model::{
    ApproveOutcome, ApproveRequest, CreateTokenArg, LastOrder, LaunchpadMetadata, PendingTransfer,
    Principal, TokenBalance, TokenData, TokenId, TokenInfo, TokenListing, TokenOrder, TradeOutcome,
};

/// JSON-over-HTTP gateway to the launchpad backend.
#[derive(Clone)]
pub struct HttpLaunchpadClient {
    http: Client,
    url: String,
}

#[derive(Serialize)]
struct TradeRequest {
    amount_e8s: u64,
}

impl HttpLaunchpadClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        let url = url.into().trim_end_matches('/').to_string();
        Ok(Self { http, url })
    }

    pub fn endpoint(&self) -> &str {
        &self.url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.url, path);
        let resp = self.http.get(&url).send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.url, path);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl LaunchpadApi for HttpLaunchpadClient {
    #[instrument(skip(self), level = "debug")]
    async fn get_metadata(&self) -> Result<LaunchpadMetadata, ClientError> {
        let metadata: LaunchpadMetadata = self.get_json("/metadata").await?;
        debug!(next_token_id = metadata.next_token_id, "launchpad metadata fetched");
        Ok(metadata)
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_tokens(
        &self,
        order: TokenOrder,
        limit: u32,
    ) -> Result<Vec<TokenListing>, ClientError> {
        self.get_json(&format!("/tokens?{}", order.query(limit)))
            .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_token_info(&self, token_id: TokenId) -> Result<Option<TokenInfo>, ClientError> {
        let url = format!("{}/tokens/{}/info", self.url, token_id);
        let resp = self.http.get(&url).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let info: TokenInfo = resp.error_for_status()?.json().await?;
        if info.token_id != token_id {
            return Err(ClientError::InvalidResponse(format!(
                "asked for token {} but got {}",
                token_id, info.token_id
            )));
        }
        Ok(Some(info))
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_token_data(&self, token_id: TokenId) -> Result<TokenData, ClientError> {
        let url = format!("{}/tokens/{}/data", self.url, token_id);
        let resp = self.http.get(&url).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::TokenNotFound(token_id));
        }

        Ok(resp.error_for_status()?.json().await?)
    }

    #[instrument(skip(self, principal), fields(principal = %principal), level = "debug")]
    async fn get_token_balance(
        &self,
        token_id: TokenId,
        principal: &Principal,
    ) -> Result<u128, ClientError> {
        self.get_json(&format!("/tokens/{}/balance/{}", token_id, principal))
            .await
    }

    #[instrument(skip(self, principal), fields(principal = %principal), level = "debug")]
    async fn get_token_balances(
        &self,
        principal: &Principal,
    ) -> Result<Vec<TokenBalance>, ClientError> {
        self.get_json(&format!("/balances/{}", principal)).await
    }

    #[instrument(skip(self, principal), fields(principal = %principal), level = "debug")]
    async fn get_icp_balance(&self, principal: &Principal) -> Result<u128, ClientError> {
        self.get_json(&format!("/icp/balance/{}", principal)).await
    }

    #[instrument(skip(self, principal), fields(principal = %principal), level = "debug")]
    async fn get_last_order(
        &self,
        principal: &Principal,
    ) -> Result<Option<LastOrder>, ClientError> {
        // JSON `null` when the principal has no orders.
        self.get_json(&format!("/orders/last/{}", principal)).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_pending_transfers(&self) -> Result<Vec<PendingTransfer>, ClientError> {
        self.get_json("/transfers/pending").await
    }

    #[instrument(
        skip(self, req),
        fields(spender = %req.spender, amount_e8s = %req.amount_e8s),
        level = "debug"
    )]
    async fn approve_spender(&self, req: &ApproveRequest) -> Result<ApproveOutcome, ClientError> {
        self.post_json("/icp/approve", req).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn buy(&self, token_id: TokenId, amount_e8s: u64) -> Result<TradeOutcome, ClientError> {
        self.post_json(
            &format!("/tokens/{}/buy", token_id),
            &TradeRequest { amount_e8s },
        )
        .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn sell(&self, token_id: TokenId, amount_e8s: u64) -> Result<TradeOutcome, ClientError> {
        self.post_json(
            &format!("/tokens/{}/sell", token_id),
            &TradeRequest { amount_e8s },
        )
        .await
    }

    #[instrument(skip(self, arg), fields(ticker = %arg.ticker), level = "debug")]
    async fn create_token(&self, arg: &CreateTokenArg) -> Result<TokenId, ClientError> {
        self.post_json("/tokens", arg).await
    }
}
