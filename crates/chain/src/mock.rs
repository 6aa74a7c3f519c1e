//! In-memory chain for development and tests.
//!
//! Holds reputation registry facts and distribution contract parameters,
//! and applies the same checks the distribution contract's `claim` does
//! (window, prior claim, reputation, Merkle proof). Reads can be made to
//! fail per function, submissions can be made to fail once, and
//! confirmation can be delayed to exercise timeouts.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use primitive_types::U256;
use tracing::{debug, info};

use claimcraft_core::{Address, Hash, Recipient, TokenAmount};
use claimcraft_merkle::{encode_leaf, keccak256, verify_proof};

use crate::signatures as sig;
use crate::{ChainError, ChainReader, ChainWriter, ContractCall, Result, TxHandle, TxReceipt};

/// Reputation registry facts for one account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountFacts {
    pub activated: bool,
    pub trust_score: u64,
    pub kyc_level: u64,
    pub blacklisted: bool,
}

impl AccountFacts {
    /// Activated, not blacklisted, with the given scores.
    pub fn verified(trust_score: u64, kyc_level: u64) -> Self {
        Self {
            activated: true,
            trust_score,
            kyc_level,
            blacklisted: false,
        }
    }
}

/// Parameters of one deployed distribution contract
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DistributionParams {
    /// Zero means claims need no proof
    pub merkle_root: Hash,
    pub required_trust_score: u64,
    pub required_kyc_level: u64,
    /// Zero means no lower bound
    pub start_time: u64,
    /// Zero means no upper bound
    pub end_time: u64,
}

impl DistributionParams {
    pub fn with_root(merkle_root: Hash) -> Self {
        Self { merkle_root, ..Default::default() }
    }
}

enum Value {
    Bool(bool),
    Uint(U256),
    Address(Address),
    Bytes32(Hash),
}

#[derive(Debug, Clone)]
struct MinedTx {
    outcome: std::result::Result<(), String>,
    block_number: u64,
}

#[derive(Debug, Default)]
struct MockState {
    accounts: HashMap<Address, AccountFacts>,
    distributions: HashMap<Address, DistributionParams>,
    /// (distribution, account)
    claimed: HashSet<(Address, Address)>,
    failing_reads: HashSet<&'static str>,
    submit_failure: Option<String>,
    transactions: HashMap<TxHandle, MinedTx>,
    submissions: Vec<ContractCall>,
    tx_counter: u64,
    block_number: u64,
    timestamp: Option<u64>,
    confirmation_delay: Duration,
}

/// In-memory implementation of [`ChainReader`] and [`ChainWriter`]
#[derive(Clone)]
pub struct MockChain {
    registry: Address,
    state: Arc<RwLock<MockState>>,
}

impl MockChain {
    /// New chain with a reputation registry deployed at `registry`.
    pub fn new(registry: Address) -> Self {
        Self {
            registry,
            state: Arc::new(RwLock::new(MockState::default())),
        }
    }

    pub fn registry(&self) -> Address {
        self.registry
    }

    pub fn set_account(&self, account: Address, facts: AccountFacts) {
        self.state.write().accounts.insert(account, facts);
    }

    pub fn deploy_distribution(&self, contract: Address, params: DistributionParams) {
        self.state.write().distributions.insert(contract, params);
    }

    pub fn mark_claimed(&self, contract: Address, account: Address) {
        self.state.write().claimed.insert((contract, account));
    }

    pub fn has_claimed(&self, contract: &Address, account: &Address) -> bool {
        self.state.read().claimed.contains(&(*contract, *account))
    }

    /// Make every read of `signature` fail with an RPC error.
    pub fn fail_reads(&self, signature: &'static str) {
        self.state.write().failing_reads.insert(signature);
    }

    pub fn clear_read_failures(&self) {
        self.state.write().failing_reads.clear();
    }

    /// Make the next `submit` fail before broadcast.
    pub fn fail_next_submit(&self, reason: impl Into<String>) {
        self.state.write().submit_failure = Some(reason.into());
    }

    pub fn set_confirmation_delay(&self, delay: Duration) {
        self.state.write().confirmation_delay = delay;
    }

    /// Pin the block timestamp instead of following the wall clock.
    pub fn set_timestamp(&self, timestamp: u64) {
        self.state.write().timestamp = Some(timestamp);
    }

    /// Every call passed to `submit`, in order.
    pub fn submissions(&self) -> Vec<ContractCall> {
        self.state.read().submissions.clone()
    }

    fn now(state: &MockState) -> u64 {
        state.timestamp.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        })
    }

    fn read(&self, call: &ContractCall) -> Result<Value> {
        let state = self.state.read();

        if state.failing_reads.contains(call.signature) {
            return Err(ChainError::Rpc(format!("injected read failure: {}", call)));
        }

        if call.contract == self.registry {
            let account = call
                .address_arg(0)
                .ok_or_else(|| ChainError::Rpc(format!("missing account argument: {}", call)))?;
            let facts = state.accounts.get(&account).copied().unwrap_or_default();
            return match call.signature {
                sig::IS_ACTIVATED => Ok(Value::Bool(facts.activated)),
                sig::GET_TRUST_SCORE => Ok(Value::Uint(U256::from(facts.trust_score))),
                sig::GET_KYC_LEVEL => Ok(Value::Uint(U256::from(facts.kyc_level))),
                sig::IS_BLACKLISTED => Ok(Value::Bool(facts.blacklisted)),
                _ => Err(ChainError::Rpc(format!("execution reverted: {}", call))),
            };
        }

        let params = state
            .distributions
            .get(&call.contract)
            .ok_or_else(|| ChainError::Rpc(format!("no contract at {}", call.contract)))?;

        match call.signature {
            sig::HAS_CLAIMED => {
                let account = call
                    .address_arg(0)
                    .ok_or_else(|| ChainError::Rpc(format!("missing account argument: {}", call)))?;
                Ok(Value::Bool(state.claimed.contains(&(call.contract, account))))
            }
            sig::MERKLE_ROOT => Ok(Value::Bytes32(params.merkle_root)),
            sig::REQUIRED_TRUST_SCORE => Ok(Value::Uint(U256::from(params.required_trust_score))),
            sig::REQUIRED_KYC_LEVEL => Ok(Value::Uint(U256::from(params.required_kyc_level))),
            sig::START_TIME => Ok(Value::Uint(U256::from(params.start_time))),
            sig::END_TIME => Ok(Value::Uint(U256::from(params.end_time))),
            sig::REPUTATION_REGISTRY => Ok(Value::Address(self.registry)),
            _ => Err(ChainError::Rpc(format!("execution reverted: {}", call))),
        }
    }

    /// Apply a claim the way the contract would; `Err` carries the revert reason.
    fn execute_claim(state: &mut MockState, call: &ContractCall) -> std::result::Result<(), String> {
        if call.signature != sig::CLAIM {
            return Err(format!("unsupported function {}", call.signature));
        }
        let params = *state
            .distributions
            .get(&call.contract)
            .ok_or_else(|| "no distribution contract".to_string())?;
        let account = call.address_arg(0).ok_or("bad account argument")?;
        let amount = call.uint_arg(1).ok_or("bad amount argument")?;
        let proof = call.bytes32_array_arg(2).ok_or("bad proof argument")?;

        let now = Self::now(state);
        if (params.start_time != 0 && now < params.start_time)
            || (params.end_time != 0 && now > params.end_time)
        {
            return Err("ClaimWindowClosed".to_string());
        }
        if state.claimed.contains(&(call.contract, account)) {
            return Err("AlreadyClaimed".to_string());
        }

        let facts = state.accounts.get(&account).copied().unwrap_or_default();
        if !facts.activated {
            return Err("NotActivated".to_string());
        }
        if facts.blacklisted {
            return Err("Blacklisted".to_string());
        }
        if facts.kyc_level < params.required_kyc_level {
            return Err("KycTooLow".to_string());
        }
        if facts.trust_score < params.required_trust_score {
            return Err("TrustScoreTooLow".to_string());
        }

        if params.merkle_root != [0u8; 32] {
            let leaf = encode_leaf(&Recipient { address: account, amount: TokenAmount::new(amount) });
            if !verify_proof(&leaf, proof, &params.merkle_root) {
                return Err("InvalidProof".to_string());
            }
        }

        state.claimed.insert((call.contract, account));
        Ok(())
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn read_bool(&self, call: &ContractCall) -> Result<bool> {
        match self.read(call)? {
            Value::Bool(v) => Ok(v),
            _ => Err(ChainError::Decode(format!("{} is not a bool", call))),
        }
    }

    async fn read_uint(&self, call: &ContractCall) -> Result<U256> {
        match self.read(call)? {
            Value::Uint(v) => Ok(v),
            _ => Err(ChainError::Decode(format!("{} is not a uint", call))),
        }
    }

    async fn read_address(&self, call: &ContractCall) -> Result<Address> {
        match self.read(call)? {
            Value::Address(v) => Ok(v),
            _ => Err(ChainError::Decode(format!("{} is not an address", call))),
        }
    }

    async fn read_bytes32(&self, call: &ContractCall) -> Result<Hash> {
        match self.read(call)? {
            Value::Bytes32(v) => Ok(v),
            _ => Err(ChainError::Decode(format!("{} is not bytes32", call))),
        }
    }

    async fn block_timestamp(&self) -> Result<u64> {
        Ok(Self::now(&self.state.read()))
    }
}

#[async_trait]
impl ChainWriter for MockChain {
    async fn submit(&self, call: &ContractCall) -> Result<TxHandle> {
        let mut state = self.state.write();

        if let Some(reason) = state.submit_failure.take() {
            return Err(ChainError::Rpc(reason));
        }

        state.submissions.push(call.clone());
        state.tx_counter += 1;
        state.block_number += 1;

        let mut seed = call.encode();
        seed.extend_from_slice(&state.tx_counter.to_be_bytes());
        let tx = TxHandle(keccak256(&seed));

        let outcome = Self::execute_claim(&mut state, call);
        debug!("Mock tx {} for {}: {:?}", tx, call, outcome);

        let block_number = state.block_number;
        state.transactions.insert(tx, MinedTx { outcome, block_number });

        info!("Mock submitted {} as {}", call, tx);
        Ok(tx)
    }

    async fn await_confirmation(&self, tx: &TxHandle) -> Result<TxReceipt> {
        let (mined, delay) = {
            let state = self.state.read();
            let mined = state
                .transactions
                .get(tx)
                .cloned()
                .ok_or_else(|| ChainError::UnknownTransaction(tx.to_string()))?;
            (mined, state.confirmation_delay)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match mined.outcome {
            Ok(()) => Ok(TxReceipt { tx: *tx, block_number: mined.block_number }),
            Err(reason) => Err(ChainError::Reverted(reason)),
        }
    }
}
