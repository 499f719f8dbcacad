//! Reproducibility-proof validation for simulation work.
//!
//! Payment is for reproducible outcomes of declared rules: every proof
//! must name the law set, container, and initial state needed to re-run
//! the work, and then satisfy its method's own evidence requirement.
//! References are opaque content-addressed identifiers, treated here as
//! strings.

use serde::{Deserialize, Serialize};

use strata_core::constants::CONSENSUS_MIN_ATTESTATIONS;
use strata_core::types::Timestamp;

/// How a reproducibility claim is backed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofMethod {
    /// The provider attests to its own execution.
    SelfAttestation,
    /// Independent executors re-ran the recipe and must agree.
    ConsensusExecution,
    /// A trusted-execution-environment quote covers the run.
    TeeAttestation,
    /// A cryptographic proof object covers the run.
    CryptographicProof,
    /// The recipe is published for later spot re-execution.
    SpotCheck,
}

/// Everything needed to re-run the work: law set, container image, and
/// initial state, all by reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReproductionRecipe {
    pub law_set: String,
    pub container: String,
    pub initial_state: String,
}

impl ReproductionRecipe {
    /// True when every reference is present.
    pub fn is_complete(&self) -> bool {
        !self.law_set.is_empty() && !self.container.is_empty() && !self.initial_state.is_empty()
    }
}

/// One executor's signed statement of the final state it computed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionAttestation {
    pub executor: String,
    pub final_state: String,
    pub attested_at: Timestamp,
}

/// An opaque TEE quote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeeQuote {
    pub platform: String,
    pub quote: String,
}

/// A reproducibility proof attached to a simulation result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReproducibilityProof {
    pub method: ProofMethod,
    pub recipe: Option<ReproductionRecipe>,
    #[serde(default)]
    pub attestations: Vec<ExecutionAttestation>,
    #[serde(default)]
    pub tee_attestation: Option<TeeQuote>,
    /// Opaque proof object for [`ProofMethod::CryptographicProof`].
    #[serde(default)]
    pub proof_object: Option<serde_json::Value>,
}

/// Outcome of validation: valid, or a reason it is not.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProofVerdict {
    pub valid: bool,
    pub reason: Option<String>,
}

impl ProofVerdict {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Validate a reproducibility proof against its method's requirements.
pub fn verify_reproducibility(proof: &ReproducibilityProof) -> ProofVerdict {
    match &proof.recipe {
        None => return ProofVerdict::rejected("missing reproduction recipe"),
        Some(recipe) if !recipe.is_complete() => {
            return ProofVerdict::rejected(
                "reproduction recipe must reference a law set, container, and initial state",
            )
        }
        Some(_) => {}
    }

    match proof.method {
        ProofMethod::SelfAttestation => {
            if proof.attestations.is_empty() {
                return ProofVerdict::rejected("self-attestation carries no attestation");
            }
        }
        ProofMethod::ConsensusExecution => {
            if proof.attestations.len() < CONSENSUS_MIN_ATTESTATIONS {
                return ProofVerdict::rejected(format!(
                    "consensus execution needs at least {} attestations, got {}",
                    CONSENSUS_MIN_ATTESTATIONS,
                    proof.attestations.len()
                ));
            }
            let first = &proof.attestations[0].final_state;
            if proof.attestations.iter().any(|a| &a.final_state != first) {
                return ProofVerdict::rejected("executors disagree on the final state");
            }
        }
        ProofMethod::TeeAttestation => {
            if proof.tee_attestation.is_none() {
                return ProofVerdict::rejected("no TEE attestation present");
            }
        }
        ProofMethod::CryptographicProof => {
            if proof.proof_object.is_none() {
                return ProofVerdict::rejected("no proof object present");
            }
        }
        ProofMethod::SpotCheck => {
            if proof.attestations.is_empty() {
                return ProofVerdict::rejected("spot check needs at least one attestation");
            }
        }
    }

    ProofVerdict::ok()
}
