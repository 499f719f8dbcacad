//! strata-temporal
//!
//! The temporal laws: continuous demurrage and dividend formulas per
//! stratum, and the lockup rules that govern spendability. Everything here
//! is pure — the pool-aware composition (deposit demurrage, draw dividends)
//! lives in the ledger.

pub mod laws;
pub mod lock;

pub use laws::{continuous_rate, project_tick, TickProjection};
pub use lock::{is_locked, unlocks_at};
