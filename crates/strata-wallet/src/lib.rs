//! strata-wallet
//!
//! The wallet manager: wallet records, the unit inventory, and the
//! wallet → units index. Every unit is owned by exactly one wallet at any
//! instant; moving a unit is a remove-then-add against the index.

pub mod balance;
pub mod manager;

pub use balance::Balance;
pub use manager::{WalletManager, WalletManagerState};
