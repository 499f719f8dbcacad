//! strata-pool
//!
//! The three money pools:
//!
//! - [`CommonsPool`] — supply accounting (mint, burn, fee collection) and
//!   the explicit ledger clock. Holds counters, never units.
//! - [`DividendPool`] — routes T0 demurrage to T2/TInf dividends; a pooled
//!   zero-sum market whose funding ratio measures underfunding.
//! - [`CommunityFundManager`] — per-community treasuries of exit fees.

pub mod commons;
pub mod dividend;
pub mod fund;

pub use commons::{CommonsPool, PoolState};
pub use dividend::{DividendPool, DividendPoolState};
pub use fund::{CommunityFund, CommunityFundManager};
