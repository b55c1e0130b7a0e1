use thiserror::Error;

use crate::model::TokenId;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from launchpad: {0}")]
    InvalidResponse(String),

    #[error("token {0} not found")]
    TokenNotFound(TokenId),

    #[error("trade rejected by launchpad: {0}")]
    Rejected(String),

    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),
}
