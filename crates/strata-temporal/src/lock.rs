//! Lockup rules per stratum.
//!
//! Locking gates external spendability decisions only — the temporal
//! formulas apply to locked and unlocked units alike, and a conversion
//! out of a locked stratum pays the unlock fee instead of waiting.

use strata_core::constants::{T1_LOCKUP_MS, T2_LOCKUP_MS};
use strata_core::types::Timestamp;
use strata_core::unit::{Temporality, Unit};

/// True while the unit's stratum lockup holds at `now`.
///
/// T0 is never locked; T1 for one year and T2 for twenty years after
/// `created_at`; TInf is locked forever.
pub fn is_locked(unit: &Unit, now: Timestamp) -> bool {
    match unit.temporality {
        Temporality::T0 => false,
        Temporality::T1 => now < unit.created_at + T1_LOCKUP_MS,
        Temporality::T2 => now < unit.created_at + T2_LOCKUP_MS,
        Temporality::TInf => true,
    }
}

/// The instant the unit becomes spendable. `None` for TInf, which never
/// unlocks; T0 reports its own creation time.
pub fn unlocks_at(unit: &Unit) -> Option<Timestamp> {
    match unit.temporality {
        Temporality::T0 => Some(unit.created_at),
        Temporality::T1 => Some(unit.created_at + T1_LOCKUP_MS),
        Temporality::T2 => Some(unit.created_at + T2_LOCKUP_MS),
        Temporality::TInf => None,
    }
}
