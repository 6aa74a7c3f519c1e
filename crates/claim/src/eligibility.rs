//! Eligibility evaluation.
//!
//! Every check re-reads the chain. A fact whose read failed is `None`,
//! never `false` or zero, so a flaky RPC cannot pass for a low score.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use claimcraft_chain::{signatures as sig, ChainReader, ContractCall, Result as ChainResult, U256};
use claimcraft_core::Address;

/// Why a claim is or is not allowed, in reporting priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EligibilityReason {
    Eligible,
    NotActivated,
    Blacklisted,
    AlreadyClaimed,
    KycTooLow,
    TrustScoreTooLow,
    /// Claim window not open
    Ineligible,
    UnknownDueToReadFailure,
}

impl EligibilityReason {
    /// User-facing explanation with the next step to take.
    pub fn message(&self) -> &'static str {
        match self {
            EligibilityReason::Eligible => "You are eligible to claim this airdrop.",
            EligibilityReason::NotActivated => {
                "Your account is not activated. Activate it in the reputation registry, then try again."
            }
            EligibilityReason::Blacklisted => {
                "This account is blacklisted and cannot claim. Contact support if you believe this is a mistake."
            }
            EligibilityReason::AlreadyClaimed => "You have already claimed from this distribution.",
            EligibilityReason::KycTooLow => {
                "Your KYC level is below what this distribution requires. Complete additional verification to qualify."
            }
            EligibilityReason::TrustScoreTooLow => {
                "Your trust score is below what this distribution requires. Build reputation and check back later."
            }
            EligibilityReason::Ineligible => "This distribution is not open for claims right now.",
            EligibilityReason::UnknownDueToReadFailure => {
                "Eligibility could not be confirmed because some on-chain data was unavailable. Please retry."
            }
        }
    }
}

impl fmt::Display for EligibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Raw on-chain facts; `None` means the read failed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EligibilityFacts {
    pub is_activated: Option<bool>,
    pub trust_score: Option<U256>,
    pub kyc_level: Option<U256>,
    pub is_blacklisted: Option<bool>,
    pub has_claimed: Option<bool>,
    pub required_trust_score: Option<U256>,
    pub required_kyc_level: Option<U256>,
    pub within_window: Option<bool>,
}

/// Combined judgment for one account and distribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityVerdict {
    pub is_activated: Option<bool>,
    pub trust_score: Option<U256>,
    pub kyc_level: Option<U256>,
    pub is_blacklisted: Option<bool>,
    pub has_claimed: Option<bool>,
    pub is_eligible: bool,
    pub reason: EligibilityReason,
}

impl EligibilityVerdict {
    /// Apply the decision rule to a set of facts.
    ///
    /// The first definitely-failing check in priority order wins. Only
    /// when nothing definitely fails does a missing fact turn into
    /// `UnknownDueToReadFailure`.
    pub fn decide(facts: &EligibilityFacts) -> Self {
        let below = |value: Option<U256>, required: Option<U256>| match (value, required) {
            (Some(v), Some(r)) => Some(v < r),
            _ => None,
        };

        let checks = [
            (facts.is_activated.map(|v| !v), EligibilityReason::NotActivated),
            (facts.is_blacklisted, EligibilityReason::Blacklisted),
            (facts.has_claimed, EligibilityReason::AlreadyClaimed),
            (below(facts.kyc_level, facts.required_kyc_level), EligibilityReason::KycTooLow),
            (below(facts.trust_score, facts.required_trust_score), EligibilityReason::TrustScoreTooLow),
            (facts.within_window.map(|v| !v), EligibilityReason::Ineligible),
        ];

        let reason = checks
            .iter()
            .find(|(failed, _)| *failed == Some(true))
            .map(|(_, reason)| *reason)
            .unwrap_or_else(|| {
                if checks.iter().any(|(failed, _)| failed.is_none()) {
                    EligibilityReason::UnknownDueToReadFailure
                } else {
                    EligibilityReason::Eligible
                }
            });

        Self {
            is_activated: facts.is_activated,
            trust_score: facts.trust_score,
            kyc_level: facts.kyc_level,
            is_blacklisted: facts.is_blacklisted,
            has_claimed: facts.has_claimed,
            is_eligible: reason == EligibilityReason::Eligible,
            reason,
        }
    }
}

/// Reads eligibility facts from the registry and distribution contracts
pub struct EligibilityEvaluator {
    chain: Arc<dyn ChainReader>,
    /// Used when the distribution contract does not report its registry
    fallback_registry: Option<Address>,
}

impl EligibilityEvaluator {
    pub fn new(chain: Arc<dyn ChainReader>, fallback_registry: Option<Address>) -> Self {
        Self { chain, fallback_registry }
    }

    /// Fetch all facts for `account` on `distribution`.
    pub async fn facts(&self, account: Address, distribution: Address) -> EligibilityFacts {
        let chain = self.chain.as_ref();

        let registry_call = ContractCall::getter(distribution, sig::REPUTATION_REGISTRY);
        let registry = observe(chain.read_address(&registry_call).await, &registry_call)
            .or(self.fallback_registry);

        let claimed_call = ContractCall::for_account(distribution, sig::HAS_CLAIMED, account);
        let req_trust_call = ContractCall::getter(distribution, sig::REQUIRED_TRUST_SCORE);
        let req_kyc_call = ContractCall::getter(distribution, sig::REQUIRED_KYC_LEVEL);
        let start_call = ContractCall::getter(distribution, sig::START_TIME);
        let end_call = ContractCall::getter(distribution, sig::END_TIME);

        let (has_claimed, required_trust, required_kyc, start, end, now) = tokio::join!(
            chain.read_bool(&claimed_call),
            chain.read_uint(&req_trust_call),
            chain.read_uint(&req_kyc_call),
            chain.read_uint(&start_call),
            chain.read_uint(&end_call),
            chain.block_timestamp(),
        );

        let start = observe(start, &start_call);
        let end = observe(end, &end_call);
        let now = now
            .map_err(|e| warn!("Block timestamp read failed: {}", e))
            .ok()
            .map(U256::from);
        let within_window = match (start, end, now) {
            (Some(start), Some(end), Some(now)) => {
                Some((start.is_zero() || now >= start) && (end.is_zero() || now <= end))
            }
            _ => None,
        };

        let mut facts = EligibilityFacts {
            has_claimed: observe(has_claimed, &claimed_call),
            required_trust_score: observe(required_trust, &req_trust_call),
            required_kyc_level: observe(required_kyc, &req_kyc_call),
            within_window,
            ..Default::default()
        };

        match registry {
            Some(registry) => {
                let activated_call = ContractCall::for_account(registry, sig::IS_ACTIVATED, account);
                let trust_call = ContractCall::for_account(registry, sig::GET_TRUST_SCORE, account);
                let kyc_call = ContractCall::for_account(registry, sig::GET_KYC_LEVEL, account);
                let blacklist_call = ContractCall::for_account(registry, sig::IS_BLACKLISTED, account);

                let (activated, trust, kyc, blacklisted) = tokio::join!(
                    chain.read_bool(&activated_call),
                    chain.read_uint(&trust_call),
                    chain.read_uint(&kyc_call),
                    chain.read_bool(&blacklist_call),
                );

                facts.is_activated = observe(activated, &activated_call);
                facts.trust_score = observe(trust, &trust_call);
                facts.kyc_level = observe(kyc, &kyc_call);
                facts.is_blacklisted = observe(blacklisted, &blacklist_call);
            }
            None => warn!("No reputation registry known for {}", distribution),
        }

        facts
    }

    /// Fresh verdict for `account` on `distribution`.
    pub async fn evaluate(&self, account: Address, distribution: Address) -> EligibilityVerdict {
        let facts = self.facts(account, distribution).await;
        let verdict = EligibilityVerdict::decide(&facts);
        debug!(
            "Eligibility for {} on {}: {} ({:?})",
            account, distribution, verdict.reason, facts
        );
        verdict
    }
}

fn observe<T>(result: ChainResult<T>, call: &ContractCall) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Read {} failed: {}", call, e);
            None
        }
    }
}
