use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimCraftError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),
}

pub type Result<T> = std::result::Result<T, ClaimCraftError>;
