//! Entry points for the presentation layer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use claimcraft_chain::{ChainReader, ChainWriter, TxReceipt};
use claimcraft_core::{hex_encode, Address, Hash, Recipient, TokenAmount};
use claimcraft_merkle::{MerkleTree, Proof};
use claimcraft_store::{DistributionKey, DistributionRecord, ProofStore};

use crate::{
    ClaimError, ClaimFailure, ClaimSession, ClaimState, EligibilityVerdict, Orchestrator, Result,
};

/// Default wait for a claim transaction to be mined
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Engine tuning
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Registry to use when a distribution contract does not report one
    pub reputation_registry: Option<Address>,
    pub confirmation_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reputation_registry: None,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }
}

/// Result of building a distribution
#[derive(Debug, Clone)]
pub struct BuiltDistribution {
    pub root: Hash,
    pub proofs: HashMap<Address, Proof>,
}

/// Proof pasted by the user together with the amount it covers
#[derive(Debug, Clone)]
pub struct ManualProof {
    pub amount: TokenAmount,
    pub proof_text: String,
}

/// Where `submit_claim` left the claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed { amount: TokenAmount, receipt: TxReceipt },
    Blocked { verdict: EligibilityVerdict },
    /// No usable proof; `error` explains a rejected one
    ProofRequired { error: Option<String> },
    Failed { failure: ClaimFailure },
}

/// The entitlement engine
pub struct ClaimEngine {
    store: Arc<ProofStore>,
    orchestrator: Arc<Orchestrator>,
}

impl ClaimEngine {
    pub fn new(
        store: Arc<ProofStore>,
        reader: Arc<dyn ChainReader>,
        writer: Arc<dyn ChainWriter>,
        config: EngineConfig,
    ) -> Self {
        let orchestrator = Arc::new(Orchestrator::new(
            reader,
            writer,
            store.clone(),
            config.reputation_registry,
            config.confirmation_timeout,
        ));
        Self { store, orchestrator }
    }

    pub fn store(&self) -> &Arc<ProofStore> {
        &self.store
    }

    /// Build the tree, persist the record and hand back root and proofs.
    pub fn build_distribution(&self, recipients: &[Recipient]) -> Result<BuiltDistribution> {
        let tree = MerkleTree::build(recipients)?;
        self.store.save(DistributionRecord::from_tree(&tree))?;
        info!(
            "Built distribution {} with {} recipients",
            hex_encode(tree.root()),
            tree.len()
        );
        Ok(BuiltDistribution {
            root: tree.root(),
            proofs: tree.proofs(),
        })
    }

    /// Record the deployed contract for a built distribution.
    pub fn attach_distribution_address(&self, root: &Hash, contract: Address) -> Result<()> {
        Ok(self.store.attach_distribution_address(root, contract)?)
    }

    /// Fresh eligibility verdict; never cached.
    pub async fn get_eligibility(&self, account: Address, distribution: Address) -> EligibilityVerdict {
        self.orchestrator.evaluator().evaluate(account, distribution).await
    }

    /// Locally stored proof, if any.
    pub fn get_proof(&self, account: &Address, key: &DistributionKey) -> Option<Proof> {
        self.store.lookup(key, account).map(|e| e.proof)
    }

    /// Idle session for driving a claim step by step.
    pub fn session(&self, account: Address, distribution: Address) -> ClaimSession {
        self.orchestrator.session(account, distribution)
    }

    /// Run a claim as far as it can go without more user input.
    pub async fn submit_claim(
        &self,
        account: Address,
        distribution: Address,
        manual: Option<ManualProof>,
    ) -> Result<ClaimOutcome> {
        let mut session = self.session(account, distribution);
        session.begin().await?;

        if let Some(manual) = &manual {
            if matches!(session.state(), ClaimState::AwaitingManualProof { .. }) {
                session.provide_manual_proof(&manual.proof_text, manual.amount)?;
            }
        }

        let amount = match session.state() {
            ClaimState::ReadyToSubmit { amount, .. } => *amount,
            ClaimState::AwaitingManualProof { error } => {
                return Ok(ClaimOutcome::ProofRequired { error: error.clone() });
            }
            ClaimState::Blocked { verdict } => {
                return Ok(ClaimOutcome::Blocked { verdict: verdict.clone() });
            }
            other => {
                return Err(ClaimError::InvalidTransition { from: other.name(), action: "submit" });
            }
        };

        let outcome = match session.submit().await? {
            ClaimState::Claimed { receipt } => ClaimOutcome::Claimed { amount, receipt: receipt.clone() },
            ClaimState::Failed { failure } => ClaimOutcome::Failed { failure: failure.clone() },
            other => {
                return Err(ClaimError::InvalidTransition { from: other.name(), action: "finish" });
            }
        };
        Ok(outcome)
    }

    /// Serialized record for `root`.
    pub fn export_distribution(&self, root: &Hash) -> Result<String> {
        Ok(self.store.export(root)?)
    }

    /// Validate and store an exported record, returning its root.
    pub fn import_distribution(&self, text: &str) -> Result<Hash> {
        Ok(self.store.import(text)?.root)
    }
}
