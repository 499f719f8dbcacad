use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{PurposeId, Timestamp, WalletId};

/// A purpose channel: a tag restricting who may receive tagged units.
/// The recipient whitelist holds wallet ids only — the channel never
/// points back into wallet state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurposeChannel {
    pub id: PurposeId,
    pub name: String,
    pub description: Option<String>,
    /// Wallets registered to receive units tagged with this purpose.
    pub recipients: BTreeSet<WalletId>,
    /// Rate in [0, 1] charged when this purpose is removed in a conversion.
    pub conversion_discount: f64,
    pub created_at: Timestamp,
}

impl PurposeChannel {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        conversion_discount: f64,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: PurposeId::generate(),
            name: name.into(),
            description,
            recipients: BTreeSet::new(),
            conversion_discount,
            created_at,
        }
    }

    /// True when `wallet` may receive units tagged with this purpose.
    pub fn accepts(&self, wallet: &WalletId) -> bool {
        self.recipients.contains(wallet)
    }
}
