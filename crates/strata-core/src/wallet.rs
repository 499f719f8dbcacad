use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{CommunityId, PurposeId, Timestamp, WalletId};

/// A wallet record. The units a wallet owns are indexed by the wallet
/// manager, not stored here; this record carries only the wallet's own
/// memberships and recognitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub name: String,
    pub created_at: Timestamp,
    /// Communities this wallet has joined.
    pub communities: BTreeSet<CommunityId>,
    /// Purposes this wallet is registered to receive.
    pub purposes: BTreeSet<PurposeId>,
}

impl Wallet {
    pub fn new(name: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            id: WalletId::generate(),
            name: name.into(),
            created_at,
            communities: BTreeSet::new(),
            purposes: BTreeSet::new(),
        }
    }
}
