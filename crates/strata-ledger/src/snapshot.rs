//! Whole-ledger snapshots for the persistence collaborator.
//!
//! A snapshot is the full serializable inventory: pool scalars, dividend
//! and fund state, the compute pool, wallets and units, registries, and
//! the transaction log. Restoring rebuilds each component through its own
//! import path, so a round-trip reproduces deep-equal state.

use serde::{Deserialize, Serialize};

use strata_compute::{ComputePool, ComputePoolState};
use strata_core::community::Community;
use strata_core::error::LedgerError;
use strata_core::purpose::PurposeChannel;
use strata_core::transaction::Transaction;
use strata_pool::{CommonsPool, CommunityFund, CommunityFundManager, DividendPool, DividendPoolState, PoolState};
use strata_registry::{CommunityRegistry, PurposeRegistry};
use strata_wallet::{WalletManager, WalletManagerState};

use crate::ledger::Ledger;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub pool: PoolState,
    pub dividend_pool: DividendPoolState,
    pub community_funds: Vec<CommunityFund>,
    pub compute: ComputePoolState,
    pub wallets: WalletManagerState,
    pub communities: Vec<Community>,
    pub purposes: Vec<PurposeChannel>,
    pub transactions: Vec<Transaction>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, LedgerError> {
        serde_json::to_string_pretty(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(json).map_err(|e| LedgerError::Serialization(e.to_string()))
    }
}

impl Ledger {
    /// Capture the whole ledger. Must be taken between operations — there
    /// is no partially-applied state to observe in a single-writer core.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pool: self.pool.export(),
            dividend_pool: self.dividend.export(),
            community_funds: self.funds.export(),
            compute: self.compute.export(),
            wallets: self.wallets.export(),
            communities: self.communities.export(),
            purposes: self.purposes.export(),
            transactions: self.transactions.clone(),
        }
    }

    /// Rebuild a ledger from a snapshot.
    pub fn restore(snapshot: Snapshot) -> Result<Self, LedgerError> {
        Ok(Self {
            pool: CommonsPool::import(snapshot.pool),
            dividend: DividendPool::import(snapshot.dividend_pool),
            funds: CommunityFundManager::import(snapshot.community_funds),
            compute: ComputePool::import(snapshot.compute),
            wallets: WalletManager::import(snapshot.wallets)?,
            communities: CommunityRegistry::import(snapshot.communities),
            purposes: PurposeRegistry::import(snapshot.purposes),
            engine: Default::default(),
            transactions: snapshot.transactions,
        })
    }
}
