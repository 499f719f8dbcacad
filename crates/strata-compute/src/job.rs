use std::fmt;

use serde::{Deserialize, Serialize};

use strata_core::types::{CommunityId, JobId, Magnitude, PurposeId, Timestamp, WalletId};

use crate::verify::{ExecutionAttestation, ReproducibilityProof, TeeQuote};

/// Lifecycle state of a compute job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Claimed,
    Completed,
    Failed,
    Expired,
    Cancelled,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "Pending",
            JobStatus::Claimed => "Claimed",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
            JobStatus::Expired => "Expired",
            JobStatus::Cancelled => "Cancelled",
        };
        write!(f, "{s}")
    }
}

/// What the requestor wants computed. The payload is an opaque blob the
/// pool never interprets — only `kind` and `estimated_compute` matter here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub estimated_compute: f64,
    #[serde(default)]
    pub description: Option<String>,
}

/// How a submitted result is verified before the reward mints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationMode {
    /// Provider attestation, accepted unconditionally.
    Attestation,
    /// Requires a TEE quote.
    Tee,
    /// Requires at least two attestations agreeing on the final state.
    Redundant,
    /// Accepted once its challenge window is the collaborator's problem.
    Challenge,
}

/// Evidence accompanying a result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkProof {
    pub mode: VerificationMode,
    #[serde(default)]
    pub attestations: Vec<ExecutionAttestation>,
    #[serde(default)]
    pub tee_attestation: Option<TeeQuote>,
    /// Simulation results also carry a reproducibility proof.
    #[serde(default)]
    pub reproducibility: Option<ReproducibilityProof>,
}

/// A provider's submitted result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(default)]
    pub output: serde_json::Value,
    pub actual_compute: f64,
    pub proof: Option<WorkProof>,
}

/// One job in the pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComputeJob {
    pub id: JobId,
    pub requestor: WalletId,
    pub spec: JobSpec,
    /// External payment that bought this job.
    pub payment: Magnitude,
    /// Supply minted to the provider on verified completion.
    pub reward: Magnitude,
    /// Tag applied to the reward unit, when the purpose exists.
    pub purpose: Option<PurposeId>,
    /// Community applied to the reward unit, when it exists.
    pub locality: Option<CommunityId>,
    pub status: JobStatus,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub claimed_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub provider: Option<WalletId>,
    pub result: Option<JobResult>,
    pub failure_reason: Option<String>,
}

impl ComputeJob {
    /// True when the job is Pending and its expiry has not passed.
    pub fn is_claimable(&self, now: Timestamp) -> bool {
        self.status == JobStatus::Pending && now <= self.expires_at
    }

    /// True when no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Expired | JobStatus::Cancelled
        )
    }
}
