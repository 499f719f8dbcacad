use std::collections::BTreeMap;

use tracing::info;

use strata_core::constants::{DEFAULT_CONVERSION_DISCOUNT, STANDARD_PURPOSES};
use strata_core::error::LedgerError;
use strata_core::purpose::PurposeChannel;
use strata_core::types::{PurposeId, Timestamp, WalletId};

/// The purpose-channel registry. Holds the recipient whitelists consulted
/// by the transfer gate; recipients are wallet ids only, never references
/// into wallet state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PurposeRegistry {
    purposes: BTreeMap<PurposeId, PurposeChannel>,
}

impl PurposeRegistry {
    /// An empty registry with no channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with the standard purpose channels.
    pub fn with_standard_purposes(now: Timestamp) -> Self {
        let mut registry = Self::new();
        for (name, discount) in STANDARD_PURPOSES {
            registry
                .create(*name, None, Some(*discount), now)
                .expect("standard purpose discounts are valid rates");
        }
        registry
    }

    /// Register a purpose channel. The conversion discount defaults to 3%
    /// and must lie in [0, 1].
    pub fn create(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
        conversion_discount: Option<f64>,
        now: Timestamp,
    ) -> Result<PurposeChannel, LedgerError> {
        let discount = conversion_discount.unwrap_or(DEFAULT_CONVERSION_DISCOUNT);
        if !(0.0..=1.0).contains(&discount) {
            return Err(LedgerError::RateOutOfRange {
                what: "conversion discount",
                value: discount,
            });
        }
        let channel = PurposeChannel::new(name, description, discount, now);
        info!(purpose = %channel.id, name = %channel.name, discount, "purpose channel created");
        self.purposes.insert(channel.id.clone(), channel.clone());
        Ok(channel)
    }

    pub fn get(&self, id: &PurposeId) -> Option<&PurposeChannel> {
        self.purposes.get(id)
    }

    pub fn require(&self, id: &PurposeId) -> Result<&PurposeChannel, LedgerError> {
        self.purposes
            .get(id)
            .ok_or_else(|| LedgerError::PurposeNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &PurposeId) -> bool {
        self.purposes.contains_key(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&PurposeChannel> {
        self.purposes.values().find(|p| p.name == name)
    }

    pub fn all(&self) -> impl Iterator<Item = &PurposeChannel> {
        self.purposes.values()
    }

    pub fn len(&self) -> usize {
        self.purposes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.purposes.is_empty()
    }

    /// The raw map, for conversion contexts.
    pub fn map(&self) -> &BTreeMap<PurposeId, PurposeChannel> {
        &self.purposes
    }

    /// Whitelist `wallet` as a recipient for the channel.
    pub fn register_recipient(
        &mut self,
        id: &PurposeId,
        wallet: WalletId,
    ) -> Result<(), LedgerError> {
        let channel = self
            .purposes
            .get_mut(id)
            .ok_or_else(|| LedgerError::PurposeNotFound(id.to_string()))?;
        channel.recipients.insert(wallet);
        Ok(())
    }

    /// True when `wallet` may receive units tagged with `id`. Unknown
    /// purposes accept nobody.
    pub fn accepts(&self, id: &PurposeId, wallet: &WalletId) -> bool {
        self.purposes.get(id).is_some_and(|p| p.accepts(wallet))
    }

    // ── Export / import ──────────────────────────────────────────────────────

    pub fn export(&self) -> Vec<PurposeChannel> {
        self.purposes.values().cloned().collect()
    }

    pub fn import(records: Vec<PurposeChannel>) -> Self {
        Self {
            purposes: records.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }
}
