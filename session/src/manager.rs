use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use watcher::{IssueWatcher, WatcherConfig, WatcherError};

use crate::errors::ClientError;
use crate::model::{LastOrder, Principal, TokenBalance, TokenId};
use crate::service::{LaunchpadService, MetadataSequence};

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// How often the launchpad is polled for newly listed tokens.
    pub poll_interval: Duration,

    /// Bound on a single observer call; `None` means ten poll intervals.
    pub observer_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            observer_timeout: None,
        }
    }
}

/// One authenticated session: owns the new-token watcher and the metadata
/// cache for as long as the user stays logged in.
pub struct LaunchSession {
    service: LaunchpadService,
    principal: Option<Principal>,
    watcher: Arc<IssueWatcher<MetadataSequence>>,
}

impl LaunchSession {
    /// Creates the session and starts watching for new tokens.
    /// Must be called inside a Tokio runtime. Fails on a zero poll interval
    /// or observer timeout.
    pub fn open(
        service: LaunchpadService,
        principal: Option<Principal>,
        config: SessionConfig,
    ) -> Result<Self, WatcherError> {
        let watcher = Arc::new(IssueWatcher::with_config(
            MetadataSequence::new(service.clone()),
            WatcherConfig {
                poll_interval: config.poll_interval,
                observer_timeout: config.observer_timeout,
            },
        ));
        watcher.start(config.poll_interval)?;

        info!(
            principal = principal.as_ref().map(Principal::as_str).unwrap_or("anonymous"),
            poll_ms = config.poll_interval.as_millis() as u64,
            "launch session opened"
        );

        Ok(Self {
            service,
            principal,
            watcher,
        })
    }

    pub fn service(&self) -> &LaunchpadService {
        &self.service
    }

    pub fn watcher(&self) -> &Arc<IssueWatcher<MetadataSequence>> {
        &self.watcher
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    fn require_principal(&self) -> Result<&Principal, ClientError> {
        self.principal
            .as_ref()
            .ok_or(ClientError::InvalidRequest("session has no principal"))
    }

    /// Balance of `token_id` held by the session's principal.
    pub async fn my_token_balance(&self, token_id: TokenId) -> Result<u128, ClientError> {
        let principal = self.require_principal()?;
        self.service.token_balance(token_id, principal).await
    }

    pub async fn my_token_balances(&self) -> Result<Vec<TokenBalance>, ClientError> {
        let principal = self.require_principal()?;
        self.service.token_balances(principal).await
    }

    /// ICP held by the session's principal, in e8s.
    pub async fn my_icp_balance(&self) -> Result<u128, ClientError> {
        let principal = self.require_principal()?;
        self.service.icp_balance(principal).await
    }

    pub async fn my_last_order(&self) -> Result<Option<LastOrder>, ClientError> {
        let principal = self.require_principal()?;
        self.service.last_order(principal).await
    }

    /// Approves `spender` to draw ICP from the session's principal.
    pub async fn approve_spender(
        &self,
        spender: &Principal,
        amount_e8s: u128,
    ) -> Result<u128, ClientError> {
        let principal = self.require_principal()?;
        self.service
            .approve_spender(principal, spender, amount_e8s)
            .await
    }

    /// Logout: stop polling, drop every observer and the cached metadata.
    pub fn close(&self) {
        self.watcher.shutdown();
        self.service.cache().clear();
        info!("launch session closed");
    }
}
