use serde::{Deserialize, Serialize};

use crate::types::{Magnitude, Timestamp, TxId, UnitId, WalletId};

/// The kind of a transaction-log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxKind {
    Mint,
    Transfer,
    Convert,
}

/// One entry in the ledger's append-only transaction log. Records which
/// units went in, which came out, and the total fees taken along the way.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub kind: TxKind,
    pub timestamp: Timestamp,
    pub input_units: Vec<UnitId>,
    pub output_units: Vec<UnitId>,
    pub total_fees: Magnitude,
    pub description: String,
    /// Wallet the value came from, when the operation has one.
    pub from_wallet: Option<WalletId>,
    /// Wallet the value went to, when the operation has one.
    pub to_wallet: Option<WalletId>,
}

impl Transaction {
    pub fn new(kind: TxKind, timestamp: Timestamp, description: impl Into<String>) -> Self {
        Self {
            id: TxId::generate(),
            kind,
            timestamp,
            input_units: Vec::new(),
            output_units: Vec::new(),
            total_fees: 0.0,
            description: description.into(),
            from_wallet: None,
            to_wallet: None,
        }
    }

    /// True when `wallet` appears on either end of this transaction.
    pub fn touches(&self, wallet: &WalletId) -> bool {
        self.from_wallet.as_ref() == Some(wallet) || self.to_wallet.as_ref() == Some(wallet)
    }
}
