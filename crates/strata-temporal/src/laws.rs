//! Continuous-rate decay and growth.
//!
//! Let `Δy = (now − last_tick_at) / ms_per_year`. Per stratum:
//!
//!   T0:   m′ = m · exp(−0.02 · Δy)   (the loss is demurrage)
//!   T1:   m′ = m
//!   T2:   m′ = m · exp(+0.03 · Δy)   (the gain is a dividend request)
//!   TInf: m′ = m · exp(+0.015 · Δy)
//!
//! Deltas below `MIN_EFFECTIVE_DELTA` are treated as zero but the tick
//! still advances `last_tick_at`. A non-positive Δy is a no-op — the
//! unit clock never regresses.

use serde::{Deserialize, Serialize};

use strata_core::constants::{
    MIN_EFFECTIVE_DELTA, MS_PER_YEAR, T0_DEMURRAGE_RATE, T2_DIVIDEND_RATE, TINF_DIVIDEND_RATE,
};
use strata_core::types::{Magnitude, Timestamp};
use strata_core::unit::{Temporality, Unit};

/// Signed per-year continuous rate for a stratum. Negative decays.
pub fn continuous_rate(temporality: Temporality) -> f64 {
    match temporality {
        Temporality::T0 => -T0_DEMURRAGE_RATE,
        Temporality::T1 => 0.0,
        Temporality::T2 => T2_DIVIDEND_RATE,
        Temporality::TInf => TINF_DIVIDEND_RATE,
    }
}

/// What a tick at `now` would do to a unit. Purely computed; the caller
/// applies it (and, for growth strata, settles the request against the
/// dividend pool first).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TickProjection {
    /// False when `now` is not after `last_tick_at`; nothing may change.
    pub advances: bool,
    /// Magnitude after the full formula (before any pool underfunding).
    pub new_magnitude: Magnitude,
    /// T0 loss to deposit into the dividend pool. Zero for other strata.
    pub demurrage: Magnitude,
    /// T2/TInf desired gain to request from the dividend pool.
    pub dividend_request: Magnitude,
    /// Elapsed time in years used by the formula.
    pub elapsed_years: f64,
}

/// Apply the stratum formula to a unit's magnitude at `now`.
pub fn project_tick(unit: &Unit, now: Timestamp) -> TickProjection {
    let elapsed_years = (now - unit.last_tick_at) as f64 / MS_PER_YEAR as f64;
    if elapsed_years <= 0.0 {
        return TickProjection {
            advances: false,
            new_magnitude: unit.magnitude,
            demurrage: 0.0,
            dividend_request: 0.0,
            elapsed_years,
        };
    }

    let m = unit.magnitude;
    let mut projection = TickProjection {
        advances: true,
        new_magnitude: m,
        demurrage: 0.0,
        dividend_request: 0.0,
        elapsed_years,
    };

    match unit.temporality {
        Temporality::T0 => {
            let decayed = m * (-T0_DEMURRAGE_RATE * elapsed_years).exp();
            let demurrage = m - decayed;
            if demurrage >= MIN_EFFECTIVE_DELTA {
                projection.new_magnitude = decayed;
                projection.demurrage = demurrage;
            }
        }
        Temporality::T1 => {}
        Temporality::T2 | Temporality::TInf => {
            let rate = continuous_rate(unit.temporality);
            let grown = m * (rate * elapsed_years).exp();
            let request = grown - m;
            if request >= MIN_EFFECTIVE_DELTA {
                projection.new_magnitude = grown;
                projection.dividend_request = request;
            }
        }
    }

    projection
}
