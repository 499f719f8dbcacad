use thiserror::Error;

/// Every failure surfaced by the ledger or its components. Flat, not
/// hierarchical: callers match on the variant, not on a nested source.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ── Lookup failures ──────────────────────────────────────────────────────
    #[error("unknown unit: {0}")]
    UnitNotFound(String),

    #[error("unknown wallet: {0}")]
    WalletNotFound(String),

    #[error("unknown community: {0}")]
    CommunityNotFound(String),

    #[error("unknown purpose: {0}")]
    PurposeNotFound(String),

    // ── Transfer failures ────────────────────────────────────────────────────
    #[error("recipient wallet {wallet} is not registered for purpose {purpose}")]
    PurposeGateFailed { purpose: String, wallet: String },

    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: f64, have: f64 },

    // ── Supply accounting ────────────────────────────────────────────────────
    #[error("mint amount must be greater than zero (got {amount})")]
    MintNonPositive { amount: f64 },

    #[error("burn of {amount} exceeds current supply {supply}")]
    BurnExceedsSupply { amount: f64, supply: f64 },

    // ── Unit algebra ─────────────────────────────────────────────────────────
    #[error("split amount {amount} must be positive and below the unit magnitude {magnitude}")]
    SplitAmountInvalid { amount: f64, magnitude: f64 },

    #[error("merge requires at least two units (got {got})")]
    MergeRequiresMultiple { got: usize },

    #[error("merge sources differ in {0}")]
    MergeIncompatibleDimension(String),

    // ── Conversion ───────────────────────────────────────────────────────────
    #[error("conversion fees {fees} would exceed the unit magnitude {magnitude}")]
    FeesExceedValue { fees: f64, magnitude: f64 },

    #[error("conversion invalid: {0}")]
    ConversionInvalid(String),

    // ── Registry validation ──────────────────────────────────────────────────
    #[error("{what} must lie in [0, 1] (got {value})")]
    RateOutOfRange { what: &'static str, value: f64 },

    // ── Compute pool ─────────────────────────────────────────────────────────
    #[error("unknown compute job: {0}")]
    JobNotFound(String),

    #[error("job specification rejected: {0}")]
    JobSpecInvalid(String),

    #[error("job is not claimable in status {status}")]
    JobNotClaimable { status: String },

    #[error("job is not held by this provider")]
    JobNotOwnedByProvider,

    #[error("job is already claimed")]
    JobAlreadyClaimed,

    #[error("job has expired")]
    JobExpired,

    #[error("result carries no proof of work performed")]
    ProofMissing,

    #[error("proof rejected: {0}")]
    ProofInvalid(String),

    // ── Snapshots ────────────────────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),
}
