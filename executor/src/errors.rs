use pricing::PricingError;
use session::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutoBuyError {
    #[error("invalid auto-buy rule: {0}")]
    InvalidRule(&'static str),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("pricing failed: {0}")]
    Pricing(#[from] PricingError),
}
