//! ClaimCraft Chain
//!
//! Boundary to the EVM contracts the entitlement engine talks to:
//!
//! - **Reputation registry**: activation, trust score, KYC level and
//!   blacklist status per account.
//! - **Distribution contract**: Merkle root, claim thresholds, claim
//!   window, per-account claimed flag, and the `claim` entry point.
//!
//! Live transports (JSON-RPC, wallet signing) implement [`ChainReader`]
//! and [`ChainWriter`] outside this workspace. [`MockChain`] implements
//! both in memory with the same contract rules, for development and
//! tests.

mod abi;
mod mock;
mod traits;

pub use abi::{signatures, CallArg, ContractCall};
pub use mock::{AccountFacts, DistributionParams, MockChain};
pub use traits::{ChainReader, ChainWriter, TxHandle, TxReceipt};

pub use primitive_types::U256;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Transaction reverted: {0}")]
    Reverted(String),

    #[error("Unexpected return data: {0}")]
    Decode(String),

    #[error("Unknown transaction: {0}")]
    UnknownTransaction(String),
}

pub type Result<T> = std::result::Result<T, ChainError>;
