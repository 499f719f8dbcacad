//! Aggregate reporting and human-readable summaries.

use serde::{Deserialize, Serialize};

use strata_compute::ComputeStats;
use strata_core::constants::SUPPLY_EPSILON;
use strata_core::error::LedgerError;
use strata_core::types::{format_timestamp, Magnitude, Timestamp, UnitId};
use strata_temporal::{is_locked, unlocks_at};

use crate::ledger::Ledger;

/// A point-in-time report across every component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerStatus {
    pub current_time: Timestamp,
    pub total_minted: Magnitude,
    pub total_burned: Magnitude,
    pub current_supply: Magnitude,
    /// Sum of every unit magnitude in wallets.
    pub circulating: Magnitude,
    pub wallet_count: usize,
    pub unit_count: usize,
    pub community_count: usize,
    pub purpose_count: usize,
    pub dividend_pool_balance: Magnitude,
    pub dividend_funding_ratio: f64,
    pub community_fund_total: Magnitude,
    pub transaction_count: usize,
    pub compute: ComputeStats,
}

impl Ledger {
    pub fn status(&self) -> LedgerStatus {
        LedgerStatus {
            current_time: self.pool.now(),
            total_minted: self.pool.total_minted(),
            total_burned: self.pool.total_burned(),
            current_supply: self.pool.current_supply(),
            circulating: self.wallets.total_magnitude(),
            wallet_count: self.wallets.wallet_count(),
            unit_count: self.wallets.unit_count(),
            community_count: self.communities.len(),
            purpose_count: self.purposes.len(),
            dividend_pool_balance: self.dividend.balance(),
            dividend_funding_ratio: self.dividend.funding_ratio(),
            community_fund_total: self.funds.total_balance(),
            transaction_count: self.transactions.len(),
            compute: self.compute.stats(),
        }
    }

    /// Supply equality: everything minted and not burned is either held
    /// in units, pooled as undistributed demurrage, or parked in a
    /// community fund. Checked to a tolerance scaled by total mintage —
    /// decay and growth go through the exponential, so the two sides can
    /// drift by accumulated rounding.
    pub fn supply_identity_holds(&self) -> bool {
        let accounted =
            self.wallets.total_magnitude() + self.dividend.balance() + self.funds.total_balance();
        let tolerance = SUPPLY_EPSILON * self.pool.total_minted().max(1.0);
        (self.pool.current_supply() - accounted).abs() <= tolerance
    }

    /// One-line summary of a unit's state.
    pub fn describe_unit(&self, id: &UnitId) -> Result<String, LedgerError> {
        let unit = self.wallets.require_unit(id)?;
        let now = self.pool.now();

        let lock = if is_locked(unit, now) {
            match unlocks_at(unit) {
                Some(at) => format!("locked until {}", format_timestamp(at)),
                None => "locked forever".to_string(),
            }
        } else {
            "unlocked".to_string()
        };
        let locality = if unit.is_global() {
            "global".to_string()
        } else {
            format!("{} communities", unit.locality.len())
        };
        let purpose = if unit.is_unrestricted() {
            "unrestricted".to_string()
        } else {
            format!("{} purposes", unit.purpose.len())
        };

        Ok(format!(
            "Unit {} | {:.4} {} | {} | {} | {} | {} provenance entries",
            &id.to_hex()[..16],
            unit.magnitude,
            unit.temporality,
            lock,
            locality,
            purpose,
            unit.provenance.len()
        ))
    }
}
