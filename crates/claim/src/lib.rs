//! ClaimCraft Claim
//!
//! Eligibility evaluation and the claim state machine, plus the
//! [`ClaimEngine`] facade that ties tree building, the proof store and
//! the chain together for the presentation layer.

mod engine;
mod error;
mod eligibility;
mod orchestrator;

pub use engine::{
    BuiltDistribution, ClaimEngine, ClaimOutcome, EngineConfig, ManualProof,
    DEFAULT_CONFIRMATION_TIMEOUT,
};
pub use error::{ClaimError, Result};
pub use eligibility::{EligibilityEvaluator, EligibilityFacts, EligibilityReason, EligibilityVerdict};
pub use orchestrator::{ClaimFailure, ClaimSession, ClaimState, InFlight, Orchestrator};
