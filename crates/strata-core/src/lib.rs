pub mod community;
pub mod constants;
pub mod error;
pub mod purpose;
pub mod transaction;
pub mod types;
pub mod unit;
pub mod wallet;

pub use community::Community;
pub use constants::*;
pub use error::LedgerError;
pub use purpose::PurposeChannel;
pub use transaction::{Transaction, TxKind};
pub use types::*;
pub use unit::{ProvenanceEntry, ProvenanceKind, Temporality, Unit};
pub use wallet::Wallet;
