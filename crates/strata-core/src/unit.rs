//! The value unit and its provenance algebra.
//!
//! A [`Unit`] is the indivisible value-carrying object: a magnitude plus
//! four qualitative dimensions (temporal stratum, community memberships,
//! purpose tags, history). Units are created by mint, split, merge, and
//! conversion; they never change owner or dimensions in place — every
//! dimensional change produces a successor with a fresh id.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::{CommunityId, Magnitude, PurposeId, Timestamp, TxId, UnitId, WalletId};

// ── Temporality ──────────────────────────────────────────────────────────────

/// The temporal stratum of a unit: how its magnitude behaves as the ledger
/// clock advances, and how long the unit is locked after creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Temporality {
    /// Demurrage stratum: decays 2%/year into the dividend pool. Never locked.
    T0,
    /// Stable stratum: no decay, no growth. Locked one year after creation.
    T1,
    /// Growth stratum: gains 3%/year from the dividend pool. Locked twenty years.
    T2,
    /// Perpetual stratum: gains 1.5%/year. Always locked.
    TInf,
}

impl fmt::Display for Temporality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Temporality::T0 => "T0",
            Temporality::T1 => "T1",
            Temporality::T2 => "T2",
            Temporality::TInf => "TInf",
        };
        write!(f, "{s}")
    }
}

// ── Provenance ───────────────────────────────────────────────────────────────

/// How a unit (or a predecessor of it) came to exist or change hands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvenanceKind {
    Minted,
    Earned,
    Gifted,
    Invested,
    Inherited,
    Converted,
    Merged,
    Split,
}

/// One entry in a unit's history. Entries are appended, never mutated;
/// the strip-reputation conversion replaces the whole chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub timestamp: Timestamp,
    pub kind: ProvenanceKind,
    pub from_wallet: Option<WalletId>,
    pub to_wallet: Option<WalletId>,
    /// Magnitude snapshot at the time of the event.
    pub amount: Magnitude,
    pub note: Option<String>,
    pub tx_id: Option<TxId>,
}

// ── Unit ─────────────────────────────────────────────────────────────────────

/// The value object. Owned by exactly one wallet at any instant; moving a
/// unit between wallets is a remove-then-add on the wallet index.
///
/// Dimension sets are ordered (`BTreeSet`) so that iteration and
/// serialization are deterministic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    /// Non-negative by invariant.
    pub magnitude: Magnitude,
    pub temporality: Temporality,
    /// Community memberships. Empty ⇒ "global".
    pub locality: BTreeSet<CommunityId>,
    /// Purpose tags. Empty ⇒ "unrestricted".
    pub purpose: BTreeSet<PurposeId>,
    /// History, oldest first. Timestamps are non-decreasing.
    pub provenance: Vec<ProvenanceEntry>,
    pub created_at: Timestamp,
    /// Last time the temporal laws were applied to this unit.
    pub last_tick_at: Timestamp,
    pub wallet_id: WalletId,
}

impl Unit {
    /// A freshly minted unit: default stratum T0, global, unrestricted,
    /// a single `Minted` provenance entry stamped with the pool clock.
    pub fn minted(
        magnitude: Magnitude,
        wallet_id: WalletId,
        now: Timestamp,
        note: Option<String>,
        tx_id: Option<TxId>,
    ) -> Self {
        let id = UnitId::generate();
        Self {
            id,
            magnitude,
            temporality: Temporality::T0,
            locality: BTreeSet::new(),
            purpose: BTreeSet::new(),
            provenance: vec![ProvenanceEntry {
                timestamp: now,
                kind: ProvenanceKind::Minted,
                from_wallet: None,
                to_wallet: Some(wallet_id.clone()),
                amount: magnitude,
                note,
                tx_id,
            }],
            created_at: now,
            last_tick_at: now,
            wallet_id,
        }
    }

    /// True when the unit belongs to no community.
    pub fn is_global(&self) -> bool {
        self.locality.is_empty()
    }

    /// True when the unit carries no purpose tags.
    pub fn is_unrestricted(&self) -> bool {
        self.purpose.is_empty()
    }

    /// Append a history entry.
    pub fn push_provenance(&mut self, entry: ProvenanceEntry) {
        self.provenance.push(entry);
    }

    /// True when provenance timestamps are non-decreasing, oldest first.
    pub fn provenance_is_monotonic(&self) -> bool {
        self.provenance
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp)
    }

    // ── Split ────────────────────────────────────────────────────────────────

    /// Split this unit into two successors: one of `amount`, one carrying
    /// the remainder. Both inherit every dimension and the full history,
    /// plus a `Split` entry snapshotting their own magnitude. Clock fields
    /// are inherited so decay/growth accounting is unaffected.
    pub fn split(&self, amount: Magnitude, now: Timestamp) -> Result<(Unit, Unit), LedgerError> {
        if amount <= 0.0 || amount >= self.magnitude {
            return Err(LedgerError::SplitAmountInvalid {
                amount,
                magnitude: self.magnitude,
            });
        }

        let carved = self.child_with(amount, now);
        let remainder = self.child_with(self.magnitude - amount, now);
        Ok((carved, remainder))
    }

    fn child_with(&self, magnitude: Magnitude, now: Timestamp) -> Unit {
        let mut child = Unit {
            id: UnitId::generate(),
            magnitude,
            temporality: self.temporality,
            locality: self.locality.clone(),
            purpose: self.purpose.clone(),
            provenance: self.provenance.clone(),
            created_at: self.created_at,
            last_tick_at: self.last_tick_at,
            wallet_id: self.wallet_id.clone(),
        };
        child.push_provenance(ProvenanceEntry {
            timestamp: now,
            kind: ProvenanceKind::Split,
            from_wallet: Some(self.wallet_id.clone()),
            to_wallet: Some(self.wallet_id.clone()),
            amount: magnitude,
            note: None,
            tx_id: None,
        });
        child
    }

    // ── Merge ────────────────────────────────────────────────────────────────

    /// Merge two or more units into one. Sources must agree on temporality,
    /// locality, purpose, and owning wallet. The merged history is the
    /// timestamp-ordered interleave of every source chain plus one `Merged`
    /// entry; `created_at` is the latest of the sources (the conservative
    /// lock start) and `last_tick_at` is `now` — the caller settles each
    /// source against the dividend pool first.
    pub fn merge(sources: &[Unit], now: Timestamp) -> Result<Unit, LedgerError> {
        if sources.len() < 2 {
            return Err(LedgerError::MergeRequiresMultiple { got: sources.len() });
        }

        let first = &sources[0];
        for other in &sources[1..] {
            if other.temporality != first.temporality {
                return Err(LedgerError::MergeIncompatibleDimension("temporality".into()));
            }
            if other.locality != first.locality {
                return Err(LedgerError::MergeIncompatibleDimension("locality".into()));
            }
            if other.purpose != first.purpose {
                return Err(LedgerError::MergeIncompatibleDimension("purpose".into()));
            }
            if other.wallet_id != first.wallet_id {
                return Err(LedgerError::MergeIncompatibleDimension("owning wallet".into()));
            }
        }

        let total: Magnitude = sources.iter().map(|u| u.magnitude).sum();

        let mut provenance: Vec<ProvenanceEntry> = sources
            .iter()
            .flat_map(|u| u.provenance.iter().cloned())
            .collect();
        provenance.sort_by_key(|e| e.timestamp);

        let mut merged = Unit {
            id: UnitId::generate(),
            magnitude: total,
            temporality: first.temporality,
            locality: first.locality.clone(),
            purpose: first.purpose.clone(),
            provenance,
            created_at: sources.iter().map(|u| u.created_at).max().unwrap_or(now),
            last_tick_at: now,
            wallet_id: first.wallet_id.clone(),
        };
        merged.push_provenance(ProvenanceEntry {
            timestamp: now,
            kind: ProvenanceKind::Merged,
            from_wallet: Some(first.wallet_id.clone()),
            to_wallet: Some(first.wallet_id.clone()),
            amount: total,
            note: Some(format!("merged {} units", sources.len())),
            tx_id: None,
        });
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(magnitude: Magnitude) -> Unit {
        Unit::minted(magnitude, WalletId::generate(), 1_000, None, None)
    }

    #[test]
    fn minted_unit_defaults() {
        let u = unit(100.0);
        assert_eq!(u.temporality, Temporality::T0);
        assert!(u.is_global());
        assert!(u.is_unrestricted());
        assert_eq!(u.provenance.len(), 1);
        assert_eq!(u.provenance[0].kind, ProvenanceKind::Minted);
        assert_eq!(u.provenance[0].timestamp, 1_000);
    }

    #[test]
    fn split_conserves_magnitude() {
        let u = unit(100.0);
        let (a, b) = u.split(30.0, 2_000).expect("valid split");
        assert_eq!(a.magnitude + b.magnitude, 100.0);
        assert_ne!(a.id, b.id);
        assert_ne!(a.id, u.id);
        assert_eq!(a.provenance.last().unwrap().kind, ProvenanceKind::Split);
        assert!(a.provenance_is_monotonic());
    }

    #[test]
    fn split_rejects_zero_and_full_amounts() {
        let u = unit(100.0);
        assert!(matches!(
            u.split(0.0, 2_000),
            Err(LedgerError::SplitAmountInvalid { .. })
        ));
        assert!(matches!(
            u.split(100.0, 2_000),
            Err(LedgerError::SplitAmountInvalid { .. })
        ));
        assert!(matches!(
            u.split(-5.0, 2_000),
            Err(LedgerError::SplitAmountInvalid { .. })
        ));
    }

    #[test]
    fn merge_sums_magnitudes_and_interleaves_history() {
        let wallet = WalletId::generate();
        let a = Unit::minted(40.0, wallet.clone(), 1_000, None, None);
        let b = Unit::minted(60.0, wallet.clone(), 1_500, None, None);
        let merged = Unit::merge(&[a, b], 2_000).expect("compatible merge");
        assert_eq!(merged.magnitude, 100.0);
        assert_eq!(merged.provenance.last().unwrap().kind, ProvenanceKind::Merged);
        assert!(merged.provenance_is_monotonic());
        assert_eq!(merged.created_at, 1_500, "latest source creation wins");
        assert_eq!(merged.last_tick_at, 2_000);
    }

    #[test]
    fn merge_requires_two_sources() {
        let a = unit(40.0);
        assert!(matches!(
            Unit::merge(&[a], 2_000),
            Err(LedgerError::MergeRequiresMultiple { got: 1 })
        ));
    }

    #[test]
    fn merge_rejects_mixed_dimensions() {
        let wallet = WalletId::generate();
        let a = Unit::minted(40.0, wallet.clone(), 1_000, None, None);
        let mut b = Unit::minted(60.0, wallet.clone(), 1_000, None, None);
        b.temporality = Temporality::T2;
        assert!(matches!(
            Unit::merge(&[a.clone(), b], 2_000),
            Err(LedgerError::MergeIncompatibleDimension(d)) if d == "temporality"
        ));

        let mut c = Unit::minted(10.0, wallet, 1_000, None, None);
        c.locality.insert(CommunityId::generate());
        assert!(matches!(
            Unit::merge(&[a, c], 2_000),
            Err(LedgerError::MergeIncompatibleDimension(d)) if d == "locality"
        ));
    }

    #[test]
    fn merge_rejects_mixed_wallets() {
        let a = unit(40.0);
        let b = unit(60.0);
        assert!(matches!(
            Unit::merge(&[a, b], 2_000),
            Err(LedgerError::MergeIncompatibleDimension(d)) if d == "owning wallet"
        ));
    }
}
