use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("division by zero: quote reserve is empty")]
    DivideByZero,

    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}
