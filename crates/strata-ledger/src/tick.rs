//! The pool-aware time step.
//!
//! One unit, one step: apply the stratum formula, deposit T0 losses into
//! the dividend pool, and fund T2/TInf growth from whatever the pool
//! holds at that moment. Dividends are bounded by demurrage supply, so a
//! batch tick may underfund later units — the funding ratio reports it.

use serde::{Deserialize, Serialize};

use strata_core::types::{Magnitude, Timestamp};
use strata_core::unit::{Temporality, Unit};
use strata_pool::DividendPool;
use strata_temporal::project_tick;

/// What one unit's step did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UnitTick {
    pub updated: bool,
    pub demurrage: Magnitude,
    pub dividend_requested: Magnitude,
    pub dividend_funded: Magnitude,
}

/// Aggregate outcome of a whole-ledger tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickStats {
    pub units_updated: usize,
    pub demurrage_collected: Magnitude,
    pub dividend_requested: Magnitude,
    pub dividend_distributed: Magnitude,
    /// Units whose dividend request was met in full this batch.
    pub fully_funded_units: usize,
    /// This batch's distributed / requested, or 1.0 with no requests.
    pub funding_ratio: f64,
    /// Dividend pool balance after the batch.
    pub pool_balance: Magnitude,
}

impl TickStats {
    pub fn absorb(&mut self, step: &UnitTick) {
        if !step.updated {
            return;
        }
        self.units_updated += 1;
        self.demurrage_collected += step.demurrage;
        self.dividend_requested += step.dividend_requested;
        self.dividend_distributed += step.dividend_funded;
        if step.dividend_requested > 0.0 && step.dividend_funded >= step.dividend_requested {
            self.fully_funded_units += 1;
        }
    }

    pub fn finish(&mut self, pool: &DividendPool) {
        self.funding_ratio = if self.dividend_requested <= 0.0 {
            1.0
        } else {
            self.dividend_distributed / self.dividend_requested
        };
        self.pool_balance = pool.balance();
    }
}

/// Step one unit at `now`. T0 losses go into the pool; T2/TInf gains come
/// out of it, capped at the pool balance, so the unit may grow less than
/// the formula's ideal. `last_tick_at` advances whenever `now` is ahead,
/// even when the delta was below the effective minimum.
pub fn pool_aware_tick(unit: &mut Unit, pool: &mut DividendPool, now: Timestamp) -> UnitTick {
    let projection = project_tick(unit, now);
    if !projection.advances {
        return UnitTick::default();
    }

    let mut step = UnitTick {
        updated: true,
        ..UnitTick::default()
    };

    match unit.temporality {
        Temporality::T0 => {
            if projection.demurrage > 0.0 {
                pool.deposit_demurrage(projection.demurrage, &unit.id, now);
                unit.magnitude = projection.new_magnitude;
                step.demurrage = projection.demurrage;
            }
        }
        Temporality::T1 => {}
        Temporality::T2 | Temporality::TInf => {
            if projection.dividend_request > 0.0 {
                let funded = pool.withdraw_dividend(projection.dividend_request, &unit.id, now);
                unit.magnitude += funded;
                step.dividend_requested = projection.dividend_request;
                step.dividend_funded = funded;
            }
        }
    }

    unit.last_tick_at = now;
    step
}
