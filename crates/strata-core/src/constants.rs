//! ─── Strata Protocol Constants ──────────────────────────────────────────────
//!
//! "A ledger for value that remembers where it has been and knows what
//! time it is."
//!
//! Magnitudes are continuous reals; rates are per-year fractions applied
//! with the natural exponential. The clock is milliseconds since epoch.

use crate::types::{Magnitude, Timestamp};

// ── Clock ────────────────────────────────────────────────────────────────────

/// Milliseconds per year: 365 × 24 × 3600 × 1000.
pub const MS_PER_YEAR: Timestamp = 31_536_000_000;

/// Milliseconds per day. `tick(days)` advances the clock in these steps.
pub const MS_PER_DAY: Timestamp = 86_400_000;

// ── Temporal strata rates (per year, continuous) ─────────────────────────────

/// T0 demurrage rate: magnitude decays as `m · exp(−rate · Δy)`.
pub const T0_DEMURRAGE_RATE: f64 = 0.02;

/// T2 dividend rate: magnitude grows as `m · exp(+rate · Δy)`, funded
/// from the dividend pool.
pub const T2_DIVIDEND_RATE: f64 = 0.03;

/// TInf dividend rate.
pub const TINF_DIVIDEND_RATE: f64 = 0.015;

/// Demurrage or dividend deltas below this are treated as zero (the
/// tick still advances `last_tick_at`).
pub const MIN_EFFECTIVE_DELTA: Magnitude = 1e-4;

// ── Lockups ──────────────────────────────────────────────────────────────────

/// T1 units are locked for one year after creation.
pub const T1_LOCKUP_MS: Timestamp = MS_PER_YEAR;

/// T2 units are locked for twenty years after creation.
pub const T2_LOCKUP_MS: Timestamp = 20 * MS_PER_YEAR;

// ── Conversion fees ──────────────────────────────────────────────────────────

/// Fee for joining a community: 1% of the running magnitude per community.
/// Entry fees are burned, never routed.
pub const LOCALITY_ENTRY_FEE_RATE: f64 = 0.01;

/// Fee for replacing the provenance chain with a single fresh entry.
pub const REPUTATION_STRIP_FEE_RATE: f64 = 0.05;

/// Default conversion discount for a newly created purpose channel.
pub const DEFAULT_CONVERSION_DISCOUNT: f64 = 0.03;

// ── Pool accounting ──────────────────────────────────────────────────────────

/// Most recent deposit/withdrawal records retained by the dividend pool.
pub const DIVIDEND_HISTORY_LIMIT: usize = 1000;

/// Most recent records retained per community fund.
pub const FUND_HISTORY_LIMIT: usize = 500;

/// Tolerance for the supply-conservation check, scaled by
/// `max(total_minted, 1)`.
pub const SUPPLY_EPSILON: f64 = 1e-6;

/// Residual below which a floating-point fee difference is treated as zero
/// (entry fees are recovered by subtracting routed exit fees from the
/// locality total).
pub const FEE_RESIDUAL_EPSILON: f64 = 1e-9;

// ── Compute pool ─────────────────────────────────────────────────────────────

/// Default job expiration window: 24 hours.
pub const JOB_DEFAULT_EXPIRES_MS: Timestamp = 86_400_000;

/// A claimed job not completed within this window is swept to Expired.
pub const JOB_MAX_CLAIM_MS: Timestamp = 14_400_000;

/// Default reward multiplier: reward = payment × multiplier.
pub const DEFAULT_REWARD_MULTIPLIER: f64 = 1.0;

/// Redundant verification needs at least this many agreeing attestations.
pub const REDUNDANT_MIN_ATTESTATIONS: usize = 2;

/// Consensus-execution reproducibility proofs need at least this many
/// attestations.
pub const CONSENSUS_MIN_ATTESTATIONS: usize = 2;

// ── Standard purpose channels ────────────────────────────────────────────────

/// Purposes pre-registered at registry construction: (name, discount).
pub const STANDARD_PURPOSES: &[(&str, f64)] = &[
    ("health", 0.03),
    ("education", 0.03),
    ("carbon-negative", 0.05),
    ("creator", 0.02),
    ("local-business", 0.03),
    ("food", 0.02),
    ("housing", 0.04),
    ("charity", 0.01),
];
