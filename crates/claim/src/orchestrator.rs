//! Claim state machine.
//!
//! ```text
//! Idle -> CheckingEligibility -> Blocked*
//!                             -> AwaitingManualProof <-> (parse error)
//!                             -> ReadyToSubmit -> Submitted -> Claimed*
//!                                                           -> Failed*
//! ```
//!
//! A session holds an in-flight slot for its (distribution, account) pair
//! from the moment it leaves `Idle` until it reaches a terminal state, is
//! reset, or is dropped, so one pair never has two submissions pending at
//! once. Only `Submitted` refuses a reset: the transaction is out.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use claimcraft_chain::{
    signatures as sig, CallArg, ChainError, ChainReader, ChainWriter, ContractCall, TxHandle,
    TxReceipt,
};
use claimcraft_core::{short_hex, Address, Hash, Recipient, TokenAmount};
use claimcraft_merkle::{encode_leaf, parse_manual_proof, verify_proof, Proof};
use claimcraft_store::{DistributionKey, ProofStore};

use crate::{ClaimError, EligibilityEvaluator, EligibilityVerdict, Result};

/// Why a submitted claim did not land
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimFailure {
    /// The contract rejected the claim; raw revert reason
    Reverted(String),
    /// No confirmation in time; the transaction may still be pending
    Timeout { tx: TxHandle },
    /// Transport failure while submitting or waiting
    Network(String),
}

impl fmt::Display for ClaimFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimFailure::Reverted(reason) => write!(f, "claim reverted: {}", reason),
            ClaimFailure::Timeout { tx } => {
                write!(f, "timed out waiting for {}, transaction may still be pending", tx)
            }
            ClaimFailure::Network(reason) => write!(f, "network error: {}", reason),
        }
    }
}

/// Claim session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimState {
    Idle,
    CheckingEligibility,
    Blocked { verdict: EligibilityVerdict },
    AwaitingManualProof { error: Option<String> },
    ReadyToSubmit { amount: TokenAmount, proof: Proof },
    Submitted { tx: TxHandle },
    Claimed { receipt: TxReceipt },
    Failed { failure: ClaimFailure },
}

impl ClaimState {
    pub fn name(&self) -> &'static str {
        match self {
            ClaimState::Idle => "Idle",
            ClaimState::CheckingEligibility => "CheckingEligibility",
            ClaimState::Blocked { .. } => "Blocked",
            ClaimState::AwaitingManualProof { .. } => "AwaitingManualProof",
            ClaimState::ReadyToSubmit { .. } => "ReadyToSubmit",
            ClaimState::Submitted { .. } => "Submitted",
            ClaimState::Claimed { .. } => "Claimed",
            ClaimState::Failed { .. } => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ClaimState::Blocked { .. } | ClaimState::Claimed { .. } | ClaimState::Failed { .. }
        )
    }
}

type PairKey = (Address, Address);

/// Registry of (distribution, account) pairs with a session in flight
#[derive(Clone, Default)]
pub struct InFlight {
    pairs: Arc<Mutex<HashSet<PairKey>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire(&self, distribution: Address, account: Address) -> Result<InFlightGuard> {
        let key = (distribution, account);
        if !self.pairs.lock().insert(key) {
            return Err(ClaimError::InProgress { account, distribution });
        }
        Ok(InFlightGuard { pairs: self.pairs.clone(), key })
    }

    pub fn is_in_flight(&self, distribution: &Address, account: &Address) -> bool {
        self.pairs.lock().contains(&(*distribution, *account))
    }
}

/// Releases its pair when dropped
struct InFlightGuard {
    pairs: Arc<Mutex<HashSet<PairKey>>>,
    key: PairKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.pairs.lock().remove(&self.key);
    }
}

/// Shared collaborators for claim sessions
pub struct Orchestrator {
    reader: Arc<dyn ChainReader>,
    writer: Arc<dyn ChainWriter>,
    store: Arc<ProofStore>,
    evaluator: EligibilityEvaluator,
    in_flight: InFlight,
    confirmation_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        writer: Arc<dyn ChainWriter>,
        store: Arc<ProofStore>,
        fallback_registry: Option<Address>,
        confirmation_timeout: Duration,
    ) -> Self {
        Self {
            evaluator: EligibilityEvaluator::new(reader.clone(), fallback_registry),
            reader,
            writer,
            store,
            in_flight: InFlight::new(),
            confirmation_timeout,
        }
    }

    pub fn evaluator(&self) -> &EligibilityEvaluator {
        &self.evaluator
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// New idle session for `account` claiming from `distribution`.
    pub fn session(self: &Arc<Self>, account: Address, distribution: Address) -> ClaimSession {
        ClaimSession {
            orchestrator: self.clone(),
            account,
            distribution,
            state: ClaimState::Idle,
            onchain_root: None,
            guard: None,
        }
    }
}

/// One account's attempt to claim from one distribution
pub struct ClaimSession {
    orchestrator: Arc<Orchestrator>,
    account: Address,
    distribution: Address,
    state: ClaimState,
    /// `None` until read, or when the read failed
    onchain_root: Option<Hash>,
    guard: Option<InFlightGuard>,
}

impl ClaimSession {
    pub fn state(&self) -> &ClaimState {
        &self.state
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn distribution(&self) -> Address {
        self.distribution
    }

    /// Check eligibility and locate a proof.
    pub async fn begin(&mut self) -> Result<&ClaimState> {
        self.expect_state(matches!(self.state, ClaimState::Idle), "begin")?;

        let guard = self.orchestrator.in_flight.acquire(self.distribution, self.account)?;
        self.guard = Some(guard);
        self.transition(ClaimState::CheckingEligibility);

        let verdict = self
            .orchestrator
            .evaluator
            .evaluate(self.account, self.distribution)
            .await;
        if !verdict.is_eligible {
            info!(
                "Claim by {} on {} blocked: {}",
                self.account, self.distribution, verdict.reason
            );
            self.transition(ClaimState::Blocked { verdict });
            return Ok(&self.state);
        }

        let next = self.locate_proof().await;
        self.transition(next);
        Ok(&self.state)
    }

    async fn locate_proof(&mut self) -> ClaimState {
        let root_call = ContractCall::getter(self.distribution, sig::MERKLE_ROOT);
        let root_read = self.orchestrator.reader.read_bytes32(&root_call).await;
        self.onchain_root = match root_read {
            Ok(root) => Some(root),
            Err(e) => {
                warn!("Could not read on-chain root for {}: {}", self.distribution, e);
                None
            }
        };

        let store = &self.orchestrator.store;
        let stored = store
            .lookup(&DistributionKey::Contract(self.distribution), &self.account)
            .or_else(|| {
                self.onchain_root
                    .and_then(|root| store.lookup(&DistributionKey::Root(root), &self.account))
            });

        match (stored, self.onchain_root) {
            (Some(entitlement), Some(root)) if root == [0u8; 32] => ClaimState::ReadyToSubmit {
                amount: entitlement.amount,
                proof: Vec::new(),
            },
            (Some(entitlement), Some(root)) => {
                if self.proof_matches(&root, entitlement.amount, &entitlement.proof) {
                    ClaimState::ReadyToSubmit {
                        amount: entitlement.amount,
                        proof: entitlement.proof,
                    }
                } else {
                    warn!(
                        "Stored proof for {} does not match on-chain root {}",
                        self.account,
                        short_hex(&root)
                    );
                    ClaimState::AwaitingManualProof {
                        error: Some("stored proof does not match the on-chain root".to_string()),
                    }
                }
            }
            // Root unknown: the contract is still the final check
            (Some(entitlement), None) => ClaimState::ReadyToSubmit {
                amount: entitlement.amount,
                proof: entitlement.proof,
            },
            (None, _) => {
                debug!("No stored proof for {} on {}", self.account, self.distribution);
                ClaimState::AwaitingManualProof { error: None }
            }
        }
    }

    fn proof_matches(&self, root: &Hash, amount: TokenAmount, proof: &[Hash]) -> bool {
        let leaf = encode_leaf(&Recipient { address: self.account, amount });
        verify_proof(&leaf, proof, root)
    }

    /// Supply a pasted proof and the amount it was issued for.
    ///
    /// Parse or verification problems keep the session waiting with an
    /// error message so the user can retry.
    pub fn provide_manual_proof(&mut self, text: &str, amount: TokenAmount) -> Result<&ClaimState> {
        self.expect_state(
            matches!(self.state, ClaimState::AwaitingManualProof { .. }),
            "provide a manual proof",
        )?;

        let no_proof_needed = self.onchain_root == Some([0u8; 32]);
        let proof = match parse_manual_proof(text) {
            Ok(proof) => proof,
            Err(_) if no_proof_needed => Vec::new(),
            Err(e) => {
                self.transition(ClaimState::AwaitingManualProof { error: Some(e.to_string()) });
                return Ok(&self.state);
            }
        };

        if let Some(root) = self.onchain_root.filter(|r| *r != [0u8; 32]) {
            if !self.proof_matches(&root, amount, &proof) {
                self.transition(ClaimState::AwaitingManualProof {
                    error: Some(format!(
                        "proof does not verify for amount {} against the on-chain root",
                        amount
                    )),
                });
                return Ok(&self.state);
            }
        }

        self.transition(ClaimState::ReadyToSubmit { amount, proof });
        Ok(&self.state)
    }

    /// Broadcast the claim and wait for confirmation.
    pub async fn submit(&mut self) -> Result<&ClaimState> {
        let (amount, proof) = match &self.state {
            ClaimState::ReadyToSubmit { amount, proof } => (*amount, proof.clone()),
            _ => return Err(self.invalid("submit")),
        };

        let call = ContractCall::new(
            self.distribution,
            sig::CLAIM,
            vec![
                CallArg::Address(self.account),
                CallArg::Uint(amount.as_u256()),
                CallArg::Bytes32Array(proof),
            ],
        );

        let submitted = self.orchestrator.writer.submit(&call).await;
        let tx = match submitted {
            Ok(tx) => tx,
            Err(e) => {
                self.finish(ClaimState::Failed { failure: failure_from(e) });
                return Ok(&self.state);
            }
        };
        info!("Claim by {} on {} submitted as {}", self.account, self.distribution, tx);
        self.transition(ClaimState::Submitted { tx });

        let waited = tokio::time::timeout(
            self.orchestrator.confirmation_timeout,
            self.orchestrator.writer.await_confirmation(&tx),
        )
        .await;

        let next = match waited {
            Ok(Ok(receipt)) => {
                info!(
                    "Claim by {} on {} confirmed in block {}",
                    self.account, self.distribution, receipt.block_number
                );
                ClaimState::Claimed { receipt }
            }
            Ok(Err(e)) => ClaimState::Failed { failure: failure_from(e) },
            Err(_) => {
                warn!("Confirmation of {} timed out after {:?}", tx, self.orchestrator.confirmation_timeout);
                ClaimState::Failed { failure: ClaimFailure::Timeout { tx } }
            }
        };
        self.finish(next);
        Ok(&self.state)
    }

    /// Return to `Idle`, giving up the in-flight slot.
    ///
    /// Allowed from terminal states and from every state before `Submitted`,
    /// which covers a `begin` future dropped mid-await.
    pub fn reset(&mut self) -> Result<()> {
        let resettable = !matches!(self.state, ClaimState::Idle | ClaimState::Submitted { .. });
        self.expect_state(resettable, "reset")?;
        self.onchain_root = None;
        self.guard = None;
        self.transition(ClaimState::Idle);
        Ok(())
    }

    fn transition(&mut self, next: ClaimState) {
        debug!("Claim {} on {}: {} -> {}", self.account, self.distribution, self.state.name(), next.name());
        self.state = next;
        if self.state.is_terminal() {
            self.guard = None;
        }
    }

    fn finish(&mut self, terminal: ClaimState) {
        if let ClaimState::Failed { failure } = &terminal {
            warn!("Claim by {} on {} failed: {}", self.account, self.distribution, failure);
        }
        self.transition(terminal);
    }

    fn expect_state(&self, ok: bool, action: &'static str) -> Result<()> {
        if ok {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> ClaimError {
        ClaimError::InvalidTransition { from: self.state.name(), action }
    }
}

fn failure_from(e: ChainError) -> ClaimFailure {
    match e {
        ChainError::Reverted(reason) => ClaimFailure::Reverted(reason),
        other => ClaimFailure::Network(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimcraft_chain::{AccountFacts, DistributionParams, MockChain};
    use claimcraft_merkle::MerkleTree;
    use claimcraft_store::{DistributionRecord, MemoryKvStore};

    use crate::EligibilityReason;

    const DIST: u8 = 0xD0;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    struct Fixture {
        chain: Arc<MockChain>,
        store: Arc<ProofStore>,
        tree: MerkleTree,
        orchestrator: Arc<Orchestrator>,
    }

    fn fixture(timeout: Duration) -> Fixture {
        claimcraft_logging::init_for_tests();

        let tree = MerkleTree::build(&[
            Recipient::new(addr(0xAA), 1000u64),
            Recipient::new(addr(0xBB), 500u64),
            Recipient::new(addr(0xCC), 250u64),
        ])
        .unwrap();

        let chain = Arc::new(MockChain::new(addr(0x01)));
        chain.deploy_distribution(addr(DIST), DistributionParams::with_root(tree.root()));
        for a in [0xAA, 0xBB, 0xCC] {
            chain.set_account(addr(a), AccountFacts::verified(50, 2));
        }

        let store = Arc::new(ProofStore::open(Arc::new(MemoryKvStore::new())).unwrap());
        store.save(DistributionRecord::from_tree(&tree)).unwrap();
        store.attach_distribution_address(&tree.root(), addr(DIST)).unwrap();

        let orchestrator = Arc::new(Orchestrator::new(
            chain.clone(),
            chain.clone(),
            store.clone(),
            None,
            timeout,
        ));
        Fixture { chain, store, tree, orchestrator }
    }

    #[tokio::test]
    async fn test_happy_path_with_stored_proof() {
        let f = fixture(Duration::from_secs(5));
        let mut session = f.orchestrator.session(addr(0xAA), addr(DIST));

        let state = session.begin().await.unwrap().clone();
        assert!(matches!(state, ClaimState::ReadyToSubmit { .. }));

        let state = session.submit().await.unwrap().clone();
        assert!(matches!(state, ClaimState::Claimed { .. }));
        assert!(f.chain.has_claimed(&addr(DIST), &addr(0xAA)));
        assert!(!f.orchestrator.in_flight().is_in_flight(&addr(DIST), &addr(0xAA)));
    }

    #[tokio::test]
    async fn test_blocked_when_already_claimed() {
        let f = fixture(Duration::from_secs(5));
        f.chain.mark_claimed(addr(DIST), addr(0xAA));
        let mut session = f.orchestrator.session(addr(0xAA), addr(DIST));

        match session.begin().await.unwrap() {
            ClaimState::Blocked { verdict } => assert_eq!(verdict.reason, EligibilityReason::AlreadyClaimed),
            other => panic!("unexpected state {:?}", other),
        }
        assert!(session.submit().await.is_err());
        assert!(!f.orchestrator.in_flight().is_in_flight(&addr(DIST), &addr(0xAA)));
    }

    #[tokio::test]
    async fn test_manual_proof_path() {
        let f = fixture(Duration::from_secs(5));
        // Unknown contract in the store: deploy a second contract with the same root
        f.chain.deploy_distribution(addr(0xD1), DistributionParams::with_root(f.tree.root()));
        let store_miss = Arc::new(ProofStore::open(Arc::new(MemoryKvStore::new())).unwrap());
        let orchestrator = Arc::new(Orchestrator::new(
            f.chain.clone(),
            f.chain.clone(),
            store_miss,
            None,
            Duration::from_secs(5),
        ));
        let mut session = orchestrator.session(addr(0xBB), addr(0xD1));

        assert_eq!(
            session.begin().await.unwrap(),
            &ClaimState::AwaitingManualProof { error: None }
        );

        // Garbage keeps us waiting with an error
        let state = session.provide_manual_proof("not-a-hash", TokenAmount::from(500u64)).unwrap();
        assert!(matches!(state, ClaimState::AwaitingManualProof { error: Some(_) }));

        // Right proof, wrong amount
        let proof = f.tree.proof_of(&addr(0xBB)).unwrap();
        let text = proof.iter().map(claimcraft_core::hex_encode).collect::<Vec<_>>().join(",");
        let state = session.provide_manual_proof(&text, TokenAmount::from(501u64)).unwrap();
        assert!(matches!(state, ClaimState::AwaitingManualProof { error: Some(_) }));

        let state = session.provide_manual_proof(&text, TokenAmount::from(500u64)).unwrap();
        assert!(matches!(state, ClaimState::ReadyToSubmit { .. }));

        assert!(matches!(session.submit().await.unwrap(), ClaimState::Claimed { .. }));
    }

    #[tokio::test]
    async fn test_stale_stored_proof_requires_manual() {
        let f = fixture(Duration::from_secs(5));
        // Contract now points at a different root than the stored record
        f.chain.deploy_distribution(addr(DIST), DistributionParams::with_root([0x42; 32]));
        let mut session = f.orchestrator.session(addr(0xAA), addr(DIST));

        match session.begin().await.unwrap() {
            ClaimState::AwaitingManualProof { error } => assert!(error.is_some()),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_root_needs_no_proof() {
        let f = fixture(Duration::from_secs(5));
        f.chain.deploy_distribution(addr(DIST), DistributionParams::default());
        let mut session = f.orchestrator.session(addr(0xCC), addr(DIST));

        match session.begin().await.unwrap() {
            ClaimState::ReadyToSubmit { amount, proof } => {
                assert_eq!(*amount, TokenAmount::from(250u64));
                assert!(proof.is_empty());
            }
            other => panic!("unexpected state {:?}", other),
        }
        assert!(matches!(session.submit().await.unwrap(), ClaimState::Claimed { .. }));
    }

    #[tokio::test]
    async fn test_revert_is_failed_reverted() {
        let f = fixture(Duration::from_secs(5));
        let mut session = f.orchestrator.session(addr(0xAA), addr(DIST));
        session.begin().await.unwrap();
        // Claimed elsewhere between the check and the submission
        f.chain.mark_claimed(addr(DIST), addr(0xAA));

        assert_eq!(
            session.submit().await.unwrap(),
            &ClaimState::Failed { failure: ClaimFailure::Reverted("AlreadyClaimed".to_string()) }
        );
    }

    #[tokio::test]
    async fn test_timeout_is_distinct_from_revert() {
        let f = fixture(Duration::from_millis(20));
        f.chain.set_confirmation_delay(Duration::from_millis(500));
        let mut session = f.orchestrator.session(addr(0xAA), addr(DIST));
        session.begin().await.unwrap();

        match session.submit().await.unwrap() {
            ClaimState::Failed { failure: ClaimFailure::Timeout { tx } } => {
                assert!(ClaimFailure::Timeout { tx: *tx }.to_string().contains("may still be pending"));
            }
            other => panic!("unexpected state {:?}", other),
        }
        assert!(!f.orchestrator.in_flight().is_in_flight(&addr(DIST), &addr(0xAA)));
    }

    #[tokio::test]
    async fn test_network_failure_on_submit() {
        let f = fixture(Duration::from_secs(5));
        f.chain.fail_next_submit("connection refused");
        let mut session = f.orchestrator.session(addr(0xAA), addr(DIST));
        session.begin().await.unwrap();

        assert!(matches!(
            session.submit().await.unwrap(),
            ClaimState::Failed { failure: ClaimFailure::Network(_) }
        ));

        // Restart from Idle and succeed
        session.reset().unwrap();
        assert_eq!(session.state(), &ClaimState::Idle);
        session.begin().await.unwrap();
        assert!(matches!(session.submit().await.unwrap(), ClaimState::Claimed { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_session_rejected() {
        let f = fixture(Duration::from_secs(5));
        let mut first = f.orchestrator.session(addr(0xAA), addr(DIST));
        let mut second = f.orchestrator.session(addr(0xAA), addr(DIST));

        first.begin().await.unwrap();
        assert!(matches!(second.begin().await, Err(ClaimError::InProgress { .. })));

        // Another account is unaffected
        let mut other = f.orchestrator.session(addr(0xBB), addr(DIST));
        assert!(other.begin().await.is_ok());

        drop(first);
        assert!(second.begin().await.is_ok());
        assert_eq!(f.chain.submissions().len(), 0);
    }

    /// Reader whose calls never complete
    struct StalledReader;

    #[async_trait::async_trait]
    impl ChainReader for StalledReader {
        async fn read_bool(&self, _call: &ContractCall) -> claimcraft_chain::Result<bool> {
            std::future::pending().await
        }
        async fn read_uint(&self, _call: &ContractCall) -> claimcraft_chain::Result<claimcraft_chain::U256> {
            std::future::pending().await
        }
        async fn read_address(&self, _call: &ContractCall) -> claimcraft_chain::Result<Address> {
            std::future::pending().await
        }
        async fn read_bytes32(&self, _call: &ContractCall) -> claimcraft_chain::Result<Hash> {
            std::future::pending().await
        }
        async fn block_timestamp(&self) -> claimcraft_chain::Result<u64> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_cancelled_begin_can_be_reset() {
        let f = fixture(Duration::from_secs(5));
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(StalledReader),
            f.chain.clone(),
            f.store.clone(),
            None,
            Duration::from_secs(5),
        ));
        let mut session = orchestrator.session(addr(0xAA), addr(DIST));

        let cancelled = tokio::time::timeout(Duration::from_millis(20), session.begin()).await;
        assert!(cancelled.is_err());
        assert_eq!(session.state(), &ClaimState::CheckingEligibility);

        let mut second = orchestrator.session(addr(0xAA), addr(DIST));
        assert!(matches!(second.begin().await, Err(ClaimError::InProgress { .. })));

        session.reset().unwrap();
        assert_eq!(session.state(), &ClaimState::Idle);
        assert!(!orchestrator.in_flight().is_in_flight(&addr(DIST), &addr(0xAA)));

        // the slot is free again: the next begin stalls on the reader instead of failing
        let retry = tokio::time::timeout(Duration::from_millis(20), second.begin()).await;
        assert!(retry.is_err());
    }

    #[tokio::test]
    async fn test_reset_abandons_waiting_session() {
        let f = fixture(Duration::from_secs(5));
        let mut session = f.orchestrator.session(addr(0xAA), addr(DIST));
        session.begin().await.unwrap();
        assert!(matches!(session.state(), ClaimState::ReadyToSubmit { .. }));

        session.reset().unwrap();
        assert!(!f.orchestrator.in_flight().is_in_flight(&addr(DIST), &addr(0xAA)));
        assert!(f.chain.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_submitted_session_cannot_reset() {
        let f = fixture(Duration::from_secs(5));
        f.chain.set_confirmation_delay(Duration::from_secs(5));
        let mut session = f.orchestrator.session(addr(0xAA), addr(DIST));
        session.begin().await.unwrap();

        let waiting = tokio::time::timeout(Duration::from_millis(50), session.submit()).await;
        assert!(waiting.is_err());
        assert!(matches!(session.state(), ClaimState::Submitted { .. }));

        assert!(matches!(
            session.reset(),
            Err(ClaimError::InvalidTransition { from: "Submitted", .. })
        ));
        assert!(f.orchestrator.in_flight().is_in_flight(&addr(DIST), &addr(0xAA)));
    }

    #[tokio::test]
    async fn test_invalid_transitions() {
        let f = fixture(Duration::from_secs(5));
        let mut session = f.orchestrator.session(addr(0xAA), addr(DIST));

        assert!(matches!(session.submit().await, Err(ClaimError::InvalidTransition { from: "Idle", .. })));
        assert!(session.reset().is_err());
        assert!(session.provide_manual_proof("", TokenAmount::ZERO).is_err());

        session.begin().await.unwrap();
        assert!(matches!(
            session.begin().await,
            Err(ClaimError::InvalidTransition { from: "ReadyToSubmit", .. })
        ));
    }

    #[tokio::test]
    async fn test_store_untouched_by_claims() {
        let f = fixture(Duration::from_secs(5));
        let before = f.store.roots();
        let mut session = f.orchestrator.session(addr(0xAA), addr(DIST));
        session.begin().await.unwrap();
        session.submit().await.unwrap();
        assert_eq!(f.store.roots(), before);
    }
}
