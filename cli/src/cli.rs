use clap::{Args, Parser, Subcommand, ValueEnum};
use pricing::TradeDirection;

#[derive(Debug, Parser)]
#[clap(name = "launchwatch", version)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch the launchpad for new tokens, optionally auto-buying them
    Run(RunArgs),
    /// Price a trade against a pool snapshot
    Quote(QuoteArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Launchpad gateway URL (overrides LAUNCHPAD_ENDPOINT)
    #[clap(long)]
    pub endpoint: Option<String>,

    /// Poll interval in milliseconds (overrides POLL_INTERVAL_MS)
    #[clap(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: Option<u64>,

    /// ICP to spend on every new token; repeat for several rules
    #[clap(long = "auto-buy", value_name = "ICP")]
    pub auto_buy: Vec<f64>,

    /// Skip new tokens whose buy would move the price more than this
    #[clap(long)]
    pub max_impact_pct: Option<f64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DirectionCli {
    Buy,
    Sell,
}

impl From<DirectionCli> for TradeDirection {
    fn from(d: DirectionCli) -> Self {
        match d {
            DirectionCli::Buy => TradeDirection::Buy,
            DirectionCli::Sell => TradeDirection::Sell,
        }
    }
}

#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// ICP reserve of the pool, in e8s
    #[clap(long)]
    pub reserve_base: u128,

    /// Token reserve of the pool, in e8s
    #[clap(long)]
    pub reserve_quote: u128,

    /// Trade size in e8s
    #[clap(long)]
    pub amount: u128,

    #[clap(long, value_enum, default_value = "buy")]
    pub direction: DirectionCli,
}
