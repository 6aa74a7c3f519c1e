//! Collaborator traits for chain access.

use std::fmt;

use async_trait::async_trait;
use primitive_types::U256;

use claimcraft_core::{hex_encode, Address, Hash};

use crate::{ContractCall, Result};

/// Handle of a broadcast transaction (its hash)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHandle(pub Hash);

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex_encode(self.0))
    }
}

impl fmt::Debug for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHandle({})", hex_encode(self.0))
    }
}

/// Successful inclusion of a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx: TxHandle,
    pub block_number: u64,
}

/// Read-only contract calls.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn read_bool(&self, call: &ContractCall) -> Result<bool>;

    async fn read_uint(&self, call: &ContractCall) -> Result<U256>;

    async fn read_address(&self, call: &ContractCall) -> Result<Address>;

    async fn read_bytes32(&self, call: &ContractCall) -> Result<Hash>;

    /// Timestamp of the latest block, unix seconds.
    async fn block_timestamp(&self) -> Result<u64>;
}

/// Transaction submission on behalf of the connected wallet.
///
/// Dropping a pending `await_confirmation` future only stops waiting;
/// a broadcast transaction cannot be recalled.
#[async_trait]
pub trait ChainWriter: Send + Sync {
    async fn submit(&self, call: &ContractCall) -> Result<TxHandle>;

    /// Wait for inclusion. A revert surfaces as `ChainError::Reverted`.
    async fn await_confirmation(&self, tx: &TxHandle) -> Result<TxReceipt>;
}
