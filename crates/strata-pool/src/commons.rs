use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use strata_core::error::LedgerError;
use strata_core::types::{Magnitude, Timestamp, UnitId, WalletId};
use strata_core::unit::Unit;

/// Serializable scalar state of the commons pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolState {
    pub total_minted: Magnitude,
    pub total_burned: Magnitude,
    pub current_supply: Magnitude,
    pub clock_ms: Timestamp,
}

/// Supply accounting and the ledger clock. `current_supply` equals
/// `total_minted − total_burned` at all times; the clock advances only
/// through [`CommonsPool::advance_time`] and [`CommonsPool::set_time`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommonsPool {
    total_minted: Magnitude,
    total_burned: Magnitude,
    current_supply: Magnitude,
    clock_ms: Timestamp,
}

impl CommonsPool {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Clock ────────────────────────────────────────────────────────────────

    pub fn now(&self) -> Timestamp {
        self.clock_ms
    }

    /// Move the clock forward. A non-positive delta is ignored — the pool
    /// clock never regresses through this path.
    pub fn advance_time(&mut self, delta_ms: Timestamp) {
        if delta_ms <= 0 {
            warn!(delta_ms, "ignoring non-positive clock advance");
            return;
        }
        self.clock_ms += delta_ms;
    }

    /// Set the clock directly (restore and testing). Clamped at zero; may
    /// move backward.
    pub fn set_time(&mut self, t: Timestamp) {
        if t < 0 {
            warn!(t, "clamping clock set to zero");
            self.clock_ms = 0;
            return;
        }
        self.clock_ms = t;
    }

    // ── Supply ───────────────────────────────────────────────────────────────

    pub fn total_minted(&self) -> Magnitude {
        self.total_minted
    }

    pub fn total_burned(&self) -> Magnitude {
        self.total_burned
    }

    pub fn current_supply(&self) -> Magnitude {
        self.current_supply
    }

    /// Create supply and emit the unit carrying it: stratum T0, global,
    /// unrestricted, one `Minted` provenance entry stamped with the pool
    /// clock.
    pub fn mint(
        &mut self,
        amount: Magnitude,
        wallet_id: WalletId,
        note: Option<String>,
    ) -> Result<Unit, LedgerError> {
        if amount <= 0.0 {
            return Err(LedgerError::MintNonPositive { amount });
        }
        self.total_minted += amount;
        self.current_supply += amount;
        let unit = Unit::minted(amount, wallet_id, self.clock_ms, note, None);
        info!(unit = %unit.id, amount, supply = self.current_supply, "minted");
        Ok(unit)
    }

    /// Destroy supply. Non-positive amounts are ignored.
    pub fn burn(
        &mut self,
        amount: Magnitude,
        source_unit: &UnitId,
        reason: &str,
    ) -> Result<(), LedgerError> {
        if amount <= 0.0 {
            return Ok(());
        }
        if amount > self.current_supply {
            return Err(LedgerError::BurnExceedsSupply {
                amount,
                supply: self.current_supply,
            });
        }
        self.total_burned += amount;
        self.current_supply -= amount;
        debug!(unit = %source_unit, amount, reason, supply = self.current_supply, "burned");
        Ok(())
    }

    /// Burn a fee taken from a unit during conversion or transfer.
    pub fn collect_fee(&mut self, source_unit: &UnitId, amount: Magnitude) -> Result<(), LedgerError> {
        self.burn(amount, source_unit, "fee")
    }

    // ── Export / import ──────────────────────────────────────────────────────

    pub fn export(&self) -> PoolState {
        PoolState {
            total_minted: self.total_minted,
            total_burned: self.total_burned,
            current_supply: self.current_supply,
            clock_ms: self.clock_ms,
        }
    }

    pub fn import(state: PoolState) -> Self {
        Self {
            total_minted: state.total_minted,
            total_burned: state.total_burned,
            current_supply: state.current_supply,
            clock_ms: state.clock_ms.max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_increments_supply_and_emits_a_unit() {
        let mut pool = CommonsPool::new();
        pool.set_time(5_000);
        let wallet = WalletId::generate();
        let unit = pool.mint(100.0, wallet.clone(), Some("genesis".into())).unwrap();
        assert_eq!(pool.total_minted(), 100.0);
        assert_eq!(pool.current_supply(), 100.0);
        assert_eq!(unit.magnitude, 100.0);
        assert_eq!(unit.wallet_id, wallet);
        assert_eq!(unit.created_at, 5_000);
        assert_eq!(unit.provenance[0].timestamp, 5_000);
    }

    #[test]
    fn mint_rejects_non_positive_amounts() {
        let mut pool = CommonsPool::new();
        assert!(matches!(
            pool.mint(0.0, WalletId::generate(), None),
            Err(LedgerError::MintNonPositive { .. })
        ));
        assert!(matches!(
            pool.mint(-1.0, WalletId::generate(), None),
            Err(LedgerError::MintNonPositive { .. })
        ));
    }

    #[test]
    fn burn_keeps_supply_identity() {
        let mut pool = CommonsPool::new();
        let unit = pool.mint(100.0, WalletId::generate(), None).unwrap();
        pool.burn(30.0, &unit.id, "test").unwrap();
        assert_eq!(pool.current_supply(), pool.total_minted() - pool.total_burned());
        assert_eq!(pool.current_supply(), 70.0);
    }

    #[test]
    fn burn_beyond_supply_fails() {
        let mut pool = CommonsPool::new();
        let unit = pool.mint(10.0, WalletId::generate(), None).unwrap();
        assert!(matches!(
            pool.burn(11.0, &unit.id, "test"),
            Err(LedgerError::BurnExceedsSupply { .. })
        ));
    }

    #[test]
    fn clock_only_advances_forward() {
        let mut pool = CommonsPool::new();
        pool.advance_time(1_000);
        pool.advance_time(-500);
        assert_eq!(pool.now(), 1_000);
        pool.set_time(200);
        assert_eq!(pool.now(), 200, "set_time may move backward");
        pool.set_time(-5);
        assert_eq!(pool.now(), 0, "set_time clamps at zero");
    }

    #[test]
    fn export_import_round_trips() {
        let mut pool = CommonsPool::new();
        let unit = pool.mint(100.0, WalletId::generate(), None).unwrap();
        pool.burn(25.0, &unit.id, "test").unwrap();
        pool.advance_time(42);
        let restored = CommonsPool::import(pool.export());
        assert_eq!(pool, restored);
    }
}
