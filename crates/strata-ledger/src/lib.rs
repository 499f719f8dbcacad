//! strata-ledger
//!
//! The orchestrator. A [`Ledger`] exclusively owns the commons pool, the
//! dividend pool, the community funds, the registries, the wallet manager,
//! and the compute pool, and mediates every state change between them:
//! mint, transfer, split, merge, dimensional conversion with fee routing,
//! the pool-aware time step, and the compute bootstrap that turns external
//! payment into verified work into minted supply.
//!
//! The core is a single-threaded cooperative state machine: one logical
//! writer per instance, every operation synchronous and atomic — it
//! commits fully or leaves state unchanged, including the transaction log.

pub mod ledger;
pub mod query;
pub mod snapshot;
pub mod status;
pub mod tick;

pub use ledger::{Ledger, TransferOutcome};
pub use query::LedgerQuery;
pub use snapshot::Snapshot;
pub use status::LedgerStatus;
pub use tick::TickStats;
