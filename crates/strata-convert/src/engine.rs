use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use strata_core::community::Community;
use strata_core::constants::{LOCALITY_ENTRY_FEE_RATE, REPUTATION_STRIP_FEE_RATE};
use strata_core::error::LedgerError;
use strata_core::purpose::PurposeChannel;
use strata_core::types::{CommunityId, Magnitude, PurposeId, Timestamp, UnitId};
use strata_core::unit::{ProvenanceEntry, ProvenanceKind, Temporality, Unit};

use crate::request::{ConversionFees, ConversionRequest};

/// Fee rate for moving between temporal strata.
///
/// | from → to | rate |
/// |---|---|
/// | same stratum | 0 |
/// | any locking move (toward a longer stratum) | 0 |
/// | T1→T0 | 2% |
/// | T2→T1 | 3% |
/// | T2→T0 | 5% |
/// | TInf→T2 | 5% |
/// | TInf→T1 | 8% |
/// | TInf→T0 | 10% |
pub fn temporal_conversion_fee(from: Temporality, to: Temporality) -> f64 {
    use Temporality::*;
    match (from, to) {
        (T0, T0) | (T1, T1) | (T2, T2) | (TInf, TInf) => 0.0,
        (T0, T1) | (T0, T2) | (T0, TInf) | (T1, T2) | (T1, TInf) | (T2, TInf) => 0.0,
        (T1, T0) => 0.02,
        (T2, T1) => 0.03,
        (T2, T0) => 0.05,
        (TInf, T2) => 0.05,
        (TInf, T1) => 0.08,
        (TInf, T0) => 0.10,
    }
}

/// Read-only view of the registries and the clock at conversion time.
pub struct ConversionContext<'a> {
    pub communities: &'a BTreeMap<CommunityId, Community>,
    pub purposes: &'a BTreeMap<PurposeId, PurposeChannel>,
    pub current_time: Timestamp,
}

/// A successful conversion: the successor unit, the fee bill, and the
/// per-community exit fees the ledger must route to community funds.
#[derive(Clone, Debug, PartialEq)]
pub struct Conversion {
    pub unit: Unit,
    pub fees: ConversionFees,
    pub exit_fees: BTreeMap<CommunityId, Magnitude>,
}

/// The numbers a conversion would produce, without building the successor.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionPreview {
    pub new_magnitude: Magnitude,
    pub fees: ConversionFees,
    pub exit_fees: BTreeMap<CommunityId, Magnitude>,
}

/// Outcome of the pure fee computation shared by convert and preview.
struct Computed {
    running: Magnitude,
    fees: ConversionFees,
    exit_fees: BTreeMap<CommunityId, Magnitude>,
    temporality: Temporality,
    locality: BTreeSet<CommunityId>,
    purpose: BTreeSet<PurposeId>,
}

/// Computes and applies dimensional conversions. Stateless — every call
/// reads the world through a [`ConversionContext`].
#[derive(Clone, Debug, Default)]
pub struct ConversionEngine;

impl ConversionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Fees compound sequentially on the running magnitude, in this fixed
    /// order: temporal → locality add → locality remove → purpose add →
    /// purpose remove → reputation strip. Alternate orders change the
    /// compounded outcome and are not equivalent.
    fn compute(
        &self,
        unit: &Unit,
        request: &ConversionRequest,
        ctx: &ConversionContext<'_>,
    ) -> Result<Computed, LedgerError> {
        let original = unit.magnitude;
        let mut running = unit.magnitude;
        let mut fees = ConversionFees::default();
        let mut exit_fees: BTreeMap<CommunityId, Magnitude> = BTreeMap::new();

        // ── 1. Temporal ──────────────────────────────────────────────────────
        let temporality = request.target_temporality.unwrap_or(unit.temporality);
        let temporal_rate = temporal_conversion_fee(unit.temporality, temporality);
        let temporal_fee = running * temporal_rate;
        fees.temporal = temporal_fee;
        running -= temporal_fee;

        let mut locality = unit.locality.clone();
        if let Some(change) = &request.target_locality {
            // ── 2. Locality add: flat entry fee per new community, burned ────
            for community in &change.add {
                if locality.contains(community) {
                    continue;
                }
                if !ctx.communities.contains_key(community) {
                    return Err(LedgerError::CommunityNotFound(community.to_string()));
                }
                let fee = running * LOCALITY_ENTRY_FEE_RATE;
                fees.locality += fee;
                running -= fee;
                locality.insert(community.clone());
            }

            // ── 3. Locality remove: boundary fee per community, routed ───────
            for community in &change.remove {
                if !locality.contains(community) {
                    continue;
                }
                let record = ctx
                    .communities
                    .get(community)
                    .ok_or_else(|| LedgerError::CommunityNotFound(community.to_string()))?;
                let fee = running * record.boundary_fee;
                fees.locality += fee;
                *exit_fees.entry(community.clone()).or_default() += fee;
                running -= fee;
                locality.remove(community);
            }
        }

        let mut purpose = unit.purpose.clone();
        if let Some(change) = &request.target_purpose {
            // ── 4. Purpose add: no fee, must resolve ─────────────────────────
            for tag in &change.add {
                if !ctx.purposes.contains_key(tag) {
                    return Err(LedgerError::PurposeNotFound(tag.to_string()));
                }
                purpose.insert(tag.clone());
            }

            // ── 5. Purpose remove: the channel's discount on the running ─────
            for tag in &change.remove {
                if !purpose.contains(tag) {
                    continue;
                }
                let channel = ctx
                    .purposes
                    .get(tag)
                    .ok_or_else(|| LedgerError::PurposeNotFound(tag.to_string()))?;
                let fee = running * channel.conversion_discount;
                fees.purpose += fee;
                running -= fee;
                purpose.remove(tag);
            }
        }

        // ── 6. Reputation strip ──────────────────────────────────────────────
        if request.strip_reputation {
            let fee = running * REPUTATION_STRIP_FEE_RATE;
            fees.reputation = fee;
            running -= fee;
        }

        fees.total = fees.temporal + fees.locality + fees.purpose + fees.reputation;
        if running < 0.0 || fees.total > original {
            return Err(LedgerError::FeesExceedValue {
                fees: fees.total,
                magnitude: original,
            });
        }

        Ok(Computed {
            running,
            fees,
            exit_fees,
            temporality,
            locality,
            purpose,
        })
    }

    /// Apply a conversion, producing the successor unit. The successor has
    /// a fresh id, the same owning wallet, `created_at = last_tick_at =
    /// context.current_time` (lock periods restart), and the old history
    /// plus one `Converted` entry — unless the reputation was stripped, in
    /// which case that entry is the whole chain.
    pub fn convert(
        &self,
        unit: &Unit,
        request: &ConversionRequest,
        ctx: &ConversionContext<'_>,
    ) -> Result<Conversion, LedgerError> {
        let computed = self.compute(unit, request, ctx)?;

        let note = if request.strip_reputation {
            format!("{} → {}, provenance stripped", unit.temporality, computed.temporality)
        } else {
            format!("{} → {}", unit.temporality, computed.temporality)
        };
        let converted_entry = ProvenanceEntry {
            timestamp: ctx.current_time,
            kind: ProvenanceKind::Converted,
            from_wallet: Some(unit.wallet_id.clone()),
            to_wallet: Some(unit.wallet_id.clone()),
            amount: computed.running,
            note: Some(note),
            tx_id: None,
        };
        let provenance = if request.strip_reputation {
            vec![converted_entry]
        } else {
            let mut chain = unit.provenance.clone();
            chain.push(converted_entry);
            chain
        };

        let successor = Unit {
            id: UnitId::generate(),
            magnitude: computed.running,
            temporality: computed.temporality,
            locality: computed.locality,
            purpose: computed.purpose,
            provenance,
            created_at: ctx.current_time,
            last_tick_at: ctx.current_time,
            wallet_id: unit.wallet_id.clone(),
        };
        debug!(
            from = %unit.id,
            to = %successor.id,
            fees = computed.fees.total,
            magnitude = successor.magnitude,
            "conversion applied"
        );

        Ok(Conversion {
            unit: successor,
            fees: computed.fees,
            exit_fees: computed.exit_fees,
        })
    }

    /// The same numerics as [`ConversionEngine::convert`], with no
    /// successor built and nothing mutated.
    pub fn preview(
        &self,
        unit: &Unit,
        request: &ConversionRequest,
        ctx: &ConversionContext<'_>,
    ) -> Result<ConversionPreview, LedgerError> {
        let computed = self.compute(unit, request, ctx)?;
        Ok(ConversionPreview {
            new_magnitude: computed.running,
            fees: computed.fees,
            exit_fees: computed.exit_fees,
        })
    }

    /// Validity check: Ok when the conversion would succeed.
    pub fn validate(
        &self,
        unit: &Unit,
        request: &ConversionRequest,
        ctx: &ConversionContext<'_>,
    ) -> Result<(), LedgerError> {
        self.compute(unit, request, ctx).map(|_| ())
    }
}
