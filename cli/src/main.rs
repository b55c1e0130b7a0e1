pub mod cli;
pub mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use common::logger::init_tracing;
use executor::{AutoBuyManager, AutoBuyRule};
use pricing::{PoolSnapshot, format_e8s, units_to_e8s};
use session::{
    HttpLaunchpadClient, LaunchSession, LaunchpadService, Principal, SessionConfig, TokenInfoCache,
};

use cli::{Cli, Command, QuoteArgs, RunArgs};
use config::AppConfig;

fn quote(args: QuoteArgs) -> anyhow::Result<()> {
    let pool = PoolSnapshot::new(args.reserve_base, args.reserve_quote);
    let q = pricing::quote(&pool, args.amount, args.direction.into())?;

    println!("direction:        {:?}", q.direction);
    println!("current price:    {:.8} ICP per token", q.current_price);
    println!("post-trade price: {:.8} ICP per token", q.post_trade_price);
    println!("price impact:     {:.2}%", q.impact_pct);

    Ok(())
}

async fn run(cfg: AppConfig, args: RunArgs) -> anyhow::Result<()> {
    let endpoint = args.endpoint.unwrap_or(cfg.endpoint);
    let poll_interval = args
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or(cfg.poll_interval);

    let client = HttpLaunchpadClient::new(endpoint.clone(), cfg.http_timeout)
        .context("failed to build launchpad client")?;
    let service = LaunchpadService::new(Arc::new(client), Arc::new(TokenInfoCache::new()));

    let session = Arc::new(
        LaunchSession::open(
            service,
            cfg.principal.map(Principal::new),
            SessionConfig {
                poll_interval,
                observer_timeout: cfg.observer_timeout,
            },
        )
        .context("failed to open launch session")?,
    );

    if let Some(principal) = session.principal() {
        match session.my_icp_balance().await {
            Ok(balance) => tracing::info!(%principal, icp = %format_e8s(balance, 8), "ICP balance"),
            Err(e) => tracing::warn!(%principal, error = %e, "ICP balance unavailable"),
        }
        if let Ok(Some(order)) = session.my_last_order().await {
            tracing::info!(
                token_id = order.token_id,
                ticker = %order.ticker,
                spent = %format_e8s(order.amount_e8s as u128, 8),
                "last order"
            );
        }
    }

    let auto_buys = AutoBuyManager::new(session.clone());
    for icp in &args.auto_buy {
        let amount_e8s =
            units_to_e8s(*icp).with_context(|| format!("invalid auto-buy amount {icp}"))?;
        let id = auto_buys.setup(AutoBuyRule {
            amount_e8s,
            max_impact_pct: args.max_impact_pct,
        })?;
        tracing::info!(auto_buy = %id, icp = %format_e8s(amount_e8s as u128, 8), "auto-buy armed");
    }

    tracing::info!(endpoint = %endpoint, rules = args.auto_buy.len(), "watching for new tokens");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    auto_buys.cancel_all();
    for p in auto_buys.recent_purchases() {
        tracing::info!(
            token_id = p.token_id,
            ticker = ?p.ticker,
            spent = %format_e8s(p.amount_e8s as u128, 8),
            received = %format_e8s(p.received, 4),
            "purchase"
        );
    }
    session.close();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::from_env()?;

    init_tracing("launchwatch", cfg.log_format);

    match cli.command {
        Command::Quote(args) => quote(args),
        Command::Run(args) => run(cfg, args).await,
    }
}
