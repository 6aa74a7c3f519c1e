use thiserror::Error;

use claimcraft_core::Address;
use claimcraft_merkle::MerkleError;
use claimcraft_store::StoreError;

#[derive(Error, Debug)]
pub enum ClaimError {
    #[error("A claim by {account} on {distribution} is already in progress")]
    InProgress { account: Address, distribution: Address },

    #[error("Cannot {action} while {from}")]
    InvalidTransition { from: &'static str, action: &'static str },

    #[error("Distribution construction failed: {0}")]
    Build(#[from] MerkleError),

    #[error("Proof store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ClaimError>;
