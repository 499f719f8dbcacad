use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use strata_core::error::LedgerError;
use strata_core::types::{CommunityId, PurposeId, Timestamp, UnitId, WalletId};
use strata_core::unit::Unit;
use strata_core::wallet::Wallet;

use crate::balance::Balance;

/// Serializable inventory of the manager's state. The wallet → units index
/// is derivable and rebuilt on import.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalletManagerState {
    pub wallets: Vec<Wallet>,
    pub units: Vec<Unit>,
}

/// Wallet records plus the unit inventory and its ownership index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WalletManager {
    wallets: BTreeMap<WalletId, Wallet>,
    units: BTreeMap<UnitId, Unit>,
    wallet_units: BTreeMap<WalletId, BTreeSet<UnitId>>,
}

impl WalletManager {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Wallets ──────────────────────────────────────────────────────────────

    pub fn create_wallet(&mut self, name: impl Into<String>, now: Timestamp) -> Wallet {
        let wallet = Wallet::new(name, now);
        info!(wallet = %wallet.id, name = %wallet.name, "wallet created");
        self.wallets.insert(wallet.id.clone(), wallet.clone());
        self.wallet_units.insert(wallet.id.clone(), BTreeSet::new());
        wallet
    }

    pub fn get_wallet(&self, id: &WalletId) -> Option<&Wallet> {
        self.wallets.get(id)
    }

    pub fn require_wallet(&self, id: &WalletId) -> Result<&Wallet, LedgerError> {
        self.wallets
            .get(id)
            .ok_or_else(|| LedgerError::WalletNotFound(id.to_string()))
    }

    pub fn contains_wallet(&self, id: &WalletId) -> bool {
        self.wallets.contains_key(id)
    }

    pub fn wallets(&self) -> impl Iterator<Item = &Wallet> {
        self.wallets.values()
    }

    pub fn wallet_count(&self) -> usize {
        self.wallets.len()
    }

    /// Add a community to a wallet's joined set. Returns false when the
    /// wallet had already joined.
    pub fn join_community(
        &mut self,
        wallet_id: &WalletId,
        community: CommunityId,
    ) -> Result<bool, LedgerError> {
        let wallet = self
            .wallets
            .get_mut(wallet_id)
            .ok_or_else(|| LedgerError::WalletNotFound(wallet_id.to_string()))?;
        Ok(wallet.communities.insert(community))
    }

    /// Add a purpose to a wallet's recognized set. Returns false when the
    /// wallet had already registered it.
    pub fn register_purpose(
        &mut self,
        wallet_id: &WalletId,
        purpose: PurposeId,
    ) -> Result<bool, LedgerError> {
        let wallet = self
            .wallets
            .get_mut(wallet_id)
            .ok_or_else(|| LedgerError::WalletNotFound(wallet_id.to_string()))?;
        Ok(wallet.purposes.insert(purpose))
    }

    // ── Units ────────────────────────────────────────────────────────────────

    /// Insert a unit and index it under its owning wallet.
    pub fn add_unit(&mut self, unit: Unit) -> Result<(), LedgerError> {
        if !self.wallets.contains_key(&unit.wallet_id) {
            return Err(LedgerError::WalletNotFound(unit.wallet_id.to_string()));
        }
        debug!(unit = %unit.id, wallet = %unit.wallet_id, magnitude = unit.magnitude, "unit indexed");
        self.wallet_units
            .entry(unit.wallet_id.clone())
            .or_default()
            .insert(unit.id.clone());
        self.units.insert(unit.id.clone(), unit);
        Ok(())
    }

    /// Remove a unit and deindex it.
    pub fn remove_unit(&mut self, id: &UnitId) -> Result<Unit, LedgerError> {
        let unit = self
            .units
            .remove(id)
            .ok_or_else(|| LedgerError::UnitNotFound(id.to_string()))?;
        if let Some(owned) = self.wallet_units.get_mut(&unit.wallet_id) {
            owned.remove(id);
        }
        Ok(unit)
    }

    /// Replace a unit record, re-indexing if its owning wallet changed.
    pub fn update_unit(&mut self, unit: Unit) -> Result<(), LedgerError> {
        let previous = self
            .units
            .get(&unit.id)
            .ok_or_else(|| LedgerError::UnitNotFound(unit.id.to_string()))?;
        if previous.wallet_id != unit.wallet_id {
            if !self.wallets.contains_key(&unit.wallet_id) {
                return Err(LedgerError::WalletNotFound(unit.wallet_id.to_string()));
            }
            if let Some(owned) = self.wallet_units.get_mut(&previous.wallet_id) {
                owned.remove(&unit.id);
            }
            self.wallet_units
                .entry(unit.wallet_id.clone())
                .or_default()
                .insert(unit.id.clone());
        }
        self.units.insert(unit.id.clone(), unit);
        Ok(())
    }

    pub fn get_unit(&self, id: &UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    pub fn require_unit(&self, id: &UnitId) -> Result<&Unit, LedgerError> {
        self.units
            .get(id)
            .ok_or_else(|| LedgerError::UnitNotFound(id.to_string()))
    }

    /// In-place access for clock and magnitude updates during a tick.
    /// Ownership changes must go through `update_unit` so the index holds.
    pub fn unit_mut(&mut self, id: &UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// All unit ids in deterministic (sorted) order.
    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.units.keys().cloned().collect()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn units_of(&self, wallet_id: &WalletId) -> Vec<&Unit> {
        self.wallet_units
            .get(wallet_id)
            .map(|owned| owned.iter().filter_map(|id| self.units.get(id)).collect())
            .unwrap_or_default()
    }

    /// Total plus per-dimension breakdowns for one wallet's holdings.
    pub fn balance(&self, wallet_id: &WalletId) -> Result<Balance, LedgerError> {
        self.require_wallet(wallet_id)?;
        let mut balance = Balance::default();
        for unit in self.units_of(wallet_id) {
            balance.absorb(unit);
        }
        Ok(balance)
    }

    /// Sum of every unit magnitude in the inventory.
    pub fn total_magnitude(&self) -> f64 {
        self.units.values().map(|u| u.magnitude).sum()
    }

    /// True when every indexed unit id resolves to a unit owned by that
    /// wallet. The invariant checked by tests after mutation sequences.
    pub fn index_is_consistent(&self) -> bool {
        self.wallet_units.iter().all(|(wallet, owned)| {
            owned
                .iter()
                .all(|id| self.units.get(id).is_some_and(|u| &u.wallet_id == wallet))
        }) && self.units.values().all(|u| {
            self.wallet_units
                .get(&u.wallet_id)
                .is_some_and(|owned| owned.contains(&u.id))
        })
    }

    // ── Export / import ──────────────────────────────────────────────────────

    pub fn export(&self) -> WalletManagerState {
        WalletManagerState {
            wallets: self.wallets.values().cloned().collect(),
            units: self.units.values().cloned().collect(),
        }
    }

    pub fn import(state: WalletManagerState) -> Result<Self, LedgerError> {
        let mut manager = Self::new();
        for wallet in state.wallets {
            manager.wallet_units.insert(wallet.id.clone(), BTreeSet::new());
            manager.wallets.insert(wallet.id.clone(), wallet);
        }
        for unit in state.units {
            manager.add_unit(unit)?;
        }
        Ok(manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::unit::Temporality;

    fn manager_with_wallet() -> (WalletManager, WalletId) {
        let mut m = WalletManager::new();
        let w = m.create_wallet("alice", 0);
        (m, w.id)
    }

    #[test]
    fn add_unit_requires_known_wallet() {
        let mut m = WalletManager::new();
        let unit = Unit::minted(10.0, WalletId::generate(), 0, None, None);
        assert!(matches!(
            m.add_unit(unit),
            Err(LedgerError::WalletNotFound(_))
        ));
    }

    #[test]
    fn add_remove_round_trip() {
        let (mut m, wallet) = manager_with_wallet();
        let unit = Unit::minted(10.0, wallet.clone(), 0, None, None);
        let id = unit.id.clone();
        m.add_unit(unit).unwrap();
        assert_eq!(m.units_of(&wallet).len(), 1);
        assert!(m.index_is_consistent());

        let removed = m.remove_unit(&id).unwrap();
        assert_eq!(removed.id, id);
        assert!(m.units_of(&wallet).is_empty());
        assert!(m.index_is_consistent());
    }

    #[test]
    fn update_unit_reindexes_on_ownership_change() {
        let (mut m, alice) = manager_with_wallet();
        let bob = m.create_wallet("bob", 0).id;

        let unit = Unit::minted(10.0, alice.clone(), 0, None, None);
        let id = unit.id.clone();
        m.add_unit(unit).unwrap();

        let mut moved = m.get_unit(&id).unwrap().clone();
        moved.wallet_id = bob.clone();
        m.update_unit(moved).unwrap();

        assert!(m.units_of(&alice).is_empty());
        assert_eq!(m.units_of(&bob).len(), 1);
        assert!(m.index_is_consistent());
    }

    #[test]
    fn balance_breaks_down_dimensions() {
        let (mut m, wallet) = manager_with_wallet();
        let community = CommunityId::generate();
        let purpose = PurposeId::generate();

        let plain = Unit::minted(100.0, wallet.clone(), 0, None, None);
        let mut scoped = Unit::minted(50.0, wallet.clone(), 0, None, None);
        scoped.temporality = Temporality::T2;
        scoped.locality.insert(community.clone());
        scoped.purpose.insert(purpose.clone());

        m.add_unit(plain).unwrap();
        m.add_unit(scoped).unwrap();

        let balance = m.balance(&wallet).unwrap();
        assert_eq!(balance.total, 150.0);
        assert_eq!(balance.global, 100.0);
        assert_eq!(balance.unrestricted, 100.0);
        assert_eq!(balance.by_temporality[&Temporality::T0], 100.0);
        assert_eq!(balance.by_temporality[&Temporality::T2], 50.0);
        assert_eq!(balance.by_locality[&community], 50.0);
        assert_eq!(balance.by_purpose[&purpose], 50.0);
    }

    #[test]
    fn balance_for_unknown_wallet_fails() {
        let m = WalletManager::new();
        assert!(matches!(
            m.balance(&WalletId::generate()),
            Err(LedgerError::WalletNotFound(_))
        ));
    }

    #[test]
    fn join_and_register_mutate_wallet_sets() {
        let (mut m, wallet) = manager_with_wallet();
        let community = CommunityId::generate();
        let purpose = PurposeId::generate();

        assert!(m.join_community(&wallet, community.clone()).unwrap());
        assert!(!m.join_community(&wallet, community.clone()).unwrap());
        assert!(m.register_purpose(&wallet, purpose.clone()).unwrap());

        let record = m.get_wallet(&wallet).unwrap();
        assert!(record.communities.contains(&community));
        assert!(record.purposes.contains(&purpose));

        assert!(matches!(
            m.join_community(&WalletId::generate(), community),
            Err(LedgerError::WalletNotFound(_))
        ));
    }

    #[test]
    fn export_import_round_trips() {
        let (mut m, wallet) = manager_with_wallet();
        m.add_unit(Unit::minted(10.0, wallet.clone(), 0, None, None)).unwrap();
        m.add_unit(Unit::minted(20.0, wallet, 5, None, None)).unwrap();
        let restored = WalletManager::import(m.export()).unwrap();
        assert_eq!(m, restored);
        assert!(restored.index_is_consistent());
    }
}
