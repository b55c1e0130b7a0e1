use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use pricing::TradeDirection;
use session::{LaunchSession, LaunchpadService, TokenId};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::errors::AutoBuyError;
use crate::types::{ActiveAutoBuy, AutoBuyId, AutoBuyRule, BuyDecision, Purchase};

const MAX_PURCHASE_HISTORY: usize = 100;

type PurchaseLog = Arc<Mutex<VecDeque<Purchase>>>;

/// Owns the auto-buy rules of one session and the log of what they bought.
///
/// Each rule is one observer on the session's issue watcher, so rules fire
/// one after another in setup order and never race each other for the same
/// token.
pub struct AutoBuyManager {
    session: Arc<LaunchSession>,
    rules: Mutex<HashMap<AutoBuyId, ActiveAutoBuy>>,
    purchases: PurchaseLog,
}

impl AutoBuyManager {
    pub fn new(session: Arc<LaunchSession>) -> Self {
        Self {
            session,
            rules: Mutex::new(HashMap::new()),
            purchases: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Registers a rule. It fires for tokens detected by ticks that start
    /// after this call.
    pub fn setup(&self, rule: AutoBuyRule) -> Result<AutoBuyId, AutoBuyError> {
        if rule.amount_e8s == 0 {
            return Err(AutoBuyError::InvalidRule("amount must be positive"));
        }
        if let Some(max) = rule.max_impact_pct {
            if !max.is_finite() || max < 0.0 {
                return Err(AutoBuyError::InvalidRule(
                    "max impact must be a non-negative percentage",
                ));
            }
        }

        let id = Uuid::new_v4();
        let cancelled = Arc::new(AtomicBool::new(false));
        let executor = Arc::new(RuleExecutor {
            id,
            rule,
            cancelled: Arc::clone(&cancelled),
            service: self.session.service().clone(),
            purchases: Arc::clone(&self.purchases),
        });

        let observer = self.session.watcher().register(move |token_id| {
            let executor = Arc::clone(&executor);
            async move {
                executor
                    .on_new_token(token_id)
                    .await
                    .map(|_| ())
                    .map_err(anyhow::Error::from)
            }
        });

        self.rules.lock().insert(
            id,
            ActiveAutoBuy {
                id,
                rule,
                created_at: Utc::now(),
                observer,
                cancelled,
            },
        );

        info!(
            auto_buy = %id,
            amount_e8s = rule.amount_e8s,
            max_impact_pct = ?rule.max_impact_pct,
            "auto-buy set up"
        );
        Ok(id)
    }

    /// Cancels a rule. Once this returns the rule starts no new purchase; a
    /// call already in flight stops before buying if it has not bought yet.
    pub fn cancel(&self, id: AutoBuyId) -> bool {
        let Some(active) = self.rules.lock().remove(&id) else {
            return false;
        };

        active.cancelled.store(true, Ordering::Release);
        self.session.watcher().unregister(active.observer);
        info!(auto_buy = %id, "auto-buy cancelled");
        true
    }

    pub fn cancel_all(&self) {
        let drained: Vec<ActiveAutoBuy> = self.rules.lock().drain().map(|(_, a)| a).collect();
        for active in &drained {
            active.cancelled.store(true, Ordering::Release);
            self.session.watcher().unregister(active.observer);
        }
        info!(count = drained.len(), "all auto-buys cancelled");
    }

    /// Active rules, oldest first.
    pub fn active(&self) -> Vec<ActiveAutoBuy> {
        let mut rules: Vec<_> = self.rules.lock().values().cloned().collect();
        rules.sort_by_key(|a| a.created_at);
        rules
    }

    /// Most recent purchase first.
    pub fn recent_purchases(&self) -> Vec<Purchase> {
        self.purchases.lock().iter().cloned().collect()
    }
}

struct RuleExecutor {
    id: AutoBuyId,
    rule: AutoBuyRule,
    cancelled: Arc<AtomicBool>,
    service: LaunchpadService,
    purchases: PurchaseLog,
}

impl RuleExecutor {
    #[instrument(skip(self), fields(auto_buy = %self.id))]
    async fn on_new_token(&self, token_id: TokenId) -> Result<BuyDecision, AutoBuyError> {
        let amount = self.rule.amount_e8s;
        let data = self.service.token_data(token_id).await?;

        match (data.liquidity_pool, self.rule.max_impact_pct) {
            (Some(pool), max_impact) => {
                let quote = pricing::quote(&pool, amount as u128, TradeDirection::Buy)?;
                debug!(
                    price = quote.current_price,
                    impact_pct = quote.impact_pct,
                    "priced new token"
                );

                if let Some(max) = max_impact {
                    if quote.impact_pct > max {
                        info!(
                            impact_pct = quote.impact_pct,
                            max_impact_pct = max,
                            "price impact too high; skipping"
                        );
                        return Ok(BuyDecision::Skipped {
                            reason: format!("impact {:.2}% exceeds {:.2}%", quote.impact_pct, max),
                        });
                    }
                }
            }
            (None, Some(_)) => {
                warn!("no liquidity pool to price against; skipping");
                return Ok(BuyDecision::Skipped {
                    reason: "no liquidity pool".to_string(),
                });
            }
            (None, None) => {}
        }

        // Pricing may have taken a while; the rule could be gone by now.
        if self.cancelled.load(Ordering::Acquire) {
            info!("auto-buy cancelled before buying");
            return Ok(BuyDecision::Skipped {
                reason: "rule cancelled".to_string(),
            });
        }

        let received = self.service.buy(token_id, amount).await?;

        let ticker = match self.service.token_info(token_id).await {
            Ok(info) => info.map(|i| i.ticker),
            Err(e) => {
                warn!(error = %e, "bought but could not resolve ticker");
                None
            }
        };

        let purchase = Purchase {
            auto_buy: self.id,
            token_id,
            ticker,
            amount_e8s: amount,
            received,
            at: Utc::now(),
        };

        {
            let mut log = self.purchases.lock();
            log.push_front(purchase.clone());
            log.truncate(MAX_PURCHASE_HISTORY);
        }

        info!(received, ticker = ?purchase.ticker, "auto-buy executed");
        Ok(BuyDecision::Bought(purchase))
    }
}

