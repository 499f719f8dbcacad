use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use strata_core::constants::{
    DEFAULT_REWARD_MULTIPLIER, JOB_DEFAULT_EXPIRES_MS, JOB_MAX_CLAIM_MS,
    REDUNDANT_MIN_ATTESTATIONS,
};
use strata_core::error::LedgerError;
use strata_core::types::{CommunityId, JobId, Magnitude, PurposeId, Timestamp, UnitId, WalletId};

use crate::job::{ComputeJob, JobResult, JobSpec, JobStatus, VerificationMode, WorkProof};
use crate::verify::verify_reproducibility;

/// Per-job overrides accepted at submission.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOptions {
    /// Reward = payment × multiplier. Defaults to 1.0.
    pub reward_multiplier: Option<f64>,
    /// Expiry window from submission. Defaults to 24 hours.
    pub expires_in_ms: Option<Timestamp>,
    /// Purpose tag for the reward unit.
    pub purpose: Option<PurposeId>,
    /// Community for the reward unit.
    pub locality: Option<CommunityId>,
}

/// The capability through which a verified result mints its reward.
///
/// Injected per call by the ledger, never stored — the pool holds no
/// back-reference. Implementations must be synchronous and must not
/// re-enter the compute pool.
pub trait RewardMinter {
    /// Mint `amount` to `wallet`, optionally tagged. Returns the new unit
    /// id, or `None` when minting failed.
    fn mint_reward(
        &mut self,
        amount: Magnitude,
        wallet: &WalletId,
        purpose: Option<&PurposeId>,
        locality: Option<&CommunityId>,
        note: Option<&str>,
    ) -> Option<UnitId>;
}

/// What happened to the reward mint after a result verified. A failed
/// mint leaves the job Completed; only the reward accounting is withheld.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MintOutcome {
    pub success: bool,
    pub unit_id: Option<UnitId>,
    pub error: Option<String>,
}

/// Aggregate view of the pool.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputeStats {
    pub total_jobs: usize,
    pub pending_jobs: usize,
    pub claimed_jobs: usize,
    pub completed_jobs: usize,
    pub failed_jobs: usize,
    pub expired_jobs: usize,
    pub cancelled_jobs: usize,
    pub total_payment_received: Magnitude,
    pub total_rewards_minted: Magnitude,
}

/// Serializable state of the compute pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComputePoolState {
    pub jobs: Vec<ComputeJob>,
    pub total_payment_received: Magnitude,
    pub total_rewards_minted: Magnitude,
}

/// The job market: submissions, claims, results, and the bridge from
/// verified work to minted supply.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComputePool {
    jobs: BTreeMap<JobId, ComputeJob>,
    total_payment_received: Magnitude,
    total_rewards_minted: Magnitude,
}

impl ComputePool {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Submission ───────────────────────────────────────────────────────────

    /// Post a job. Requires positive payment and positive estimated
    /// compute; the reward is fixed at submission time.
    pub fn submit_job(
        &mut self,
        requestor: WalletId,
        spec: JobSpec,
        payment: Magnitude,
        opts: JobOptions,
        now: Timestamp,
    ) -> Result<ComputeJob, LedgerError> {
        if payment <= 0.0 {
            return Err(LedgerError::JobSpecInvalid(format!(
                "payment must be positive (got {payment})"
            )));
        }
        if spec.estimated_compute <= 0.0 {
            return Err(LedgerError::JobSpecInvalid(format!(
                "estimated compute must be positive (got {})",
                spec.estimated_compute
            )));
        }

        let multiplier = opts.reward_multiplier.unwrap_or(DEFAULT_REWARD_MULTIPLIER);
        let expires_in = opts.expires_in_ms.unwrap_or(JOB_DEFAULT_EXPIRES_MS);
        let job = ComputeJob {
            id: JobId::generate(),
            requestor,
            spec,
            payment,
            reward: payment * multiplier,
            purpose: opts.purpose,
            locality: opts.locality,
            status: JobStatus::Pending,
            created_at: now,
            expires_at: now + expires_in,
            claimed_at: None,
            completed_at: None,
            provider: None,
            result: None,
            failure_reason: None,
        };
        self.total_payment_received += payment;
        info!(job = %job.id, payment, reward = job.reward, "compute job submitted");
        self.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    // ── Claiming ─────────────────────────────────────────────────────────────

    /// Take a Pending, unexpired job.
    pub fn claim_job(
        &mut self,
        id: &JobId,
        provider: WalletId,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        let job = self.job_mut(id)?;
        match job.status {
            JobStatus::Pending => {}
            JobStatus::Claimed => return Err(LedgerError::JobAlreadyClaimed),
            other => {
                return Err(LedgerError::JobNotClaimable {
                    status: other.to_string(),
                })
            }
        }
        if now > job.expires_at {
            return Err(LedgerError::JobExpired);
        }
        job.status = JobStatus::Claimed;
        job.provider = Some(provider);
        job.claimed_at = Some(now);
        info!(job = %id, "compute job claimed");
        Ok(())
    }

    /// Release a claim, returning the job to Pending.
    pub fn abandon_job(&mut self, id: &JobId, provider: &WalletId) -> Result<(), LedgerError> {
        let job = self.job_mut(id)?;
        if job.status != JobStatus::Claimed {
            return Err(LedgerError::JobNotClaimable {
                status: job.status.to_string(),
            });
        }
        if job.provider.as_ref() != Some(provider) {
            return Err(LedgerError::JobNotOwnedByProvider);
        }
        job.status = JobStatus::Pending;
        job.provider = None;
        job.claimed_at = None;
        info!(job = %id, "compute job abandoned");
        Ok(())
    }

    /// Withdraw a Pending job. Only the requestor may cancel.
    pub fn cancel_job(&mut self, id: &JobId, requestor: &WalletId) -> Result<(), LedgerError> {
        let job = self.job_mut(id)?;
        if job.status != JobStatus::Pending {
            return Err(LedgerError::JobNotClaimable {
                status: job.status.to_string(),
            });
        }
        if &job.requestor != requestor {
            return Err(LedgerError::JobNotOwnedByProvider);
        }
        job.status = JobStatus::Cancelled;
        info!(job = %id, "compute job cancelled");
        Ok(())
    }

    // ── Results ──────────────────────────────────────────────────────────────

    /// Submit a result for a job this provider holds. Verification
    /// failures mark the job Failed and surface as errors; on success the
    /// job completes and the reward mints through `minter`. A minter that
    /// returns `None` leaves the job Completed but withholds the reward
    /// accounting.
    pub fn submit_result(
        &mut self,
        id: &JobId,
        provider: &WalletId,
        result: JobResult,
        now: Timestamp,
        minter: &mut dyn RewardMinter,
    ) -> Result<MintOutcome, LedgerError> {
        let job = self.job_mut(id)?;
        if job.status != JobStatus::Claimed {
            return Err(LedgerError::JobNotClaimable {
                status: job.status.to_string(),
            });
        }
        if job.provider.as_ref() != Some(provider) {
            return Err(LedgerError::JobNotOwnedByProvider);
        }

        if let Err(err) = Self::verify_result(&result) {
            job.status = JobStatus::Failed;
            job.failure_reason = Some(err.to_string());
            warn!(job = %id, reason = %err, "compute result rejected");
            return Err(err);
        }

        job.status = JobStatus::Completed;
        job.completed_at = Some(now);
        job.result = Some(result);

        let reward = job.reward;
        let purpose = job.purpose.clone();
        let locality = job.locality.clone();
        let note = format!("compute reward for job {}", job.id);
        let minted = minter.mint_reward(
            reward,
            provider,
            purpose.as_ref(),
            locality.as_ref(),
            Some(&note),
        );
        match minted {
            Some(unit_id) => {
                self.total_rewards_minted += reward;
                info!(job = %id, reward, unit = %unit_id, "compute reward minted");
                Ok(MintOutcome {
                    success: true,
                    unit_id: Some(unit_id),
                    error: None,
                })
            }
            None => {
                warn!(job = %id, reward, "reward mint failed; job stays completed");
                Ok(MintOutcome {
                    success: false,
                    unit_id: None,
                    error: Some("Minting failed".into()),
                })
            }
        }
    }

    fn verify_result(result: &JobResult) -> Result<(), LedgerError> {
        let proof: &WorkProof = result.proof.as_ref().ok_or(LedgerError::ProofMissing)?;
        if result.actual_compute <= 0.0 {
            return Err(LedgerError::ProofInvalid(
                "actual compute must be positive".into(),
            ));
        }

        match proof.mode {
            VerificationMode::Attestation => {}
            VerificationMode::Tee => {
                if proof.tee_attestation.is_none() {
                    return Err(LedgerError::ProofInvalid("no TEE attestation present".into()));
                }
            }
            VerificationMode::Redundant => {
                if proof.attestations.len() < REDUNDANT_MIN_ATTESTATIONS {
                    return Err(LedgerError::ProofInvalid(format!(
                        "redundant verification needs at least {} attestations",
                        REDUNDANT_MIN_ATTESTATIONS
                    )));
                }
                let first = &proof.attestations[0].final_state;
                if proof.attestations.iter().any(|a| &a.final_state != first) {
                    return Err(LedgerError::ProofInvalid(
                        "redundant attestations disagree on the final state".into(),
                    ));
                }
            }
            // Window enforcement belongs to the challenge collaborator;
            // by submission time the window is treated as elapsed.
            VerificationMode::Challenge => {}
        }

        if let Some(repro) = &proof.reproducibility {
            let verdict = verify_reproducibility(repro);
            if !verdict.valid {
                return Err(LedgerError::ProofInvalid(
                    verdict.reason.unwrap_or_else(|| "reproducibility proof rejected".into()),
                ));
            }
        }

        Ok(())
    }

    // ── Expiry sweep ─────────────────────────────────────────────────────────

    /// Sweep Pending jobs past their expiry and Claimed jobs past the
    /// claim window to Expired. Returns how many were swept.
    pub fn expire_stale(&mut self, now: Timestamp) -> usize {
        let mut swept = 0;
        for job in self.jobs.values_mut() {
            match job.status {
                JobStatus::Pending if now > job.expires_at => {
                    job.status = JobStatus::Expired;
                    job.failure_reason = Some("Expired before claim".into());
                    swept += 1;
                }
                JobStatus::Claimed => {
                    let claimed_at = job.claimed_at.unwrap_or(job.created_at);
                    if claimed_at + JOB_MAX_CLAIM_MS < now {
                        job.status = JobStatus::Expired;
                        job.provider = None;
                        job.failure_reason = Some("Claim timeout".into());
                        swept += 1;
                    }
                }
                _ => {}
            }
        }
        if swept > 0 {
            info!(swept, "expired stale compute jobs");
        }
        swept
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn get(&self, id: &JobId) -> Option<&ComputeJob> {
        self.jobs.get(id)
    }

    pub fn require(&self, id: &JobId) -> Result<&ComputeJob, LedgerError> {
        self.jobs
            .get(id)
            .ok_or_else(|| LedgerError::JobNotFound(id.to_string()))
    }

    fn job_mut(&mut self, id: &JobId) -> Result<&mut ComputeJob, LedgerError> {
        self.jobs
            .get_mut(id)
            .ok_or_else(|| LedgerError::JobNotFound(id.to_string()))
    }

    /// Pending jobs still open for claiming at `now`.
    pub fn available_jobs(&self, now: Timestamp) -> Vec<&ComputeJob> {
        self.jobs.values().filter(|j| j.is_claimable(now)).collect()
    }

    pub fn jobs_for_requestor(&self, requestor: &WalletId) -> Vec<&ComputeJob> {
        self.jobs
            .values()
            .filter(|j| &j.requestor == requestor)
            .collect()
    }

    pub fn jobs_for_provider(&self, provider: &WalletId) -> Vec<&ComputeJob> {
        self.jobs
            .values()
            .filter(|j| j.provider.as_ref() == Some(provider))
            .collect()
    }

    pub fn stats(&self) -> ComputeStats {
        let mut stats = ComputeStats {
            total_jobs: self.jobs.len(),
            total_payment_received: self.total_payment_received,
            total_rewards_minted: self.total_rewards_minted,
            ..ComputeStats::default()
        };
        for job in self.jobs.values() {
            match job.status {
                JobStatus::Pending => stats.pending_jobs += 1,
                JobStatus::Claimed => stats.claimed_jobs += 1,
                JobStatus::Completed => stats.completed_jobs += 1,
                JobStatus::Failed => stats.failed_jobs += 1,
                JobStatus::Expired => stats.expired_jobs += 1,
                JobStatus::Cancelled => stats.cancelled_jobs += 1,
            }
        }
        stats
    }

    // ── Export / import ──────────────────────────────────────────────────────

    pub fn export(&self) -> ComputePoolState {
        ComputePoolState {
            jobs: self.jobs.values().cloned().collect(),
            total_payment_received: self.total_payment_received,
            total_rewards_minted: self.total_rewards_minted,
        }
    }

    pub fn import(state: ComputePoolState) -> Self {
        Self {
            jobs: state.jobs.into_iter().map(|j| (j.id.clone(), j)).collect(),
            total_payment_received: state.total_payment_received,
            total_rewards_minted: state.total_rewards_minted,
        }
    }
}
