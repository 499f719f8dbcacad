use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use strata_core::constants::FUND_HISTORY_LIMIT;
use strata_core::error::LedgerError;
use strata_core::types::{CommunityId, Magnitude, Timestamp, UnitId, WalletId};

/// One exit fee routed into a community fund.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FundDeposit {
    pub timestamp: Timestamp,
    pub amount: Magnitude,
    pub unit_id: UnitId,
    pub from_wallet: WalletId,
}

/// One disbursement out of a community fund.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FundDisbursement {
    pub timestamp: Timestamp,
    pub amount: Magnitude,
    pub to_wallet: WalletId,
    pub note: Option<String>,
}

/// A single community's treasury of exit fees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommunityFund {
    pub community_id: CommunityId,
    pub community_name: String,
    pub balance: Magnitude,
    pub total_collected: Magnitude,
    pub total_disbursed: Magnitude,
    pub deposit_count: u64,
    pub disbursement_count: u64,
    pub deposits: VecDeque<FundDeposit>,
    pub disbursements: VecDeque<FundDisbursement>,
}

impl CommunityFund {
    fn new(community_id: CommunityId, community_name: String) -> Self {
        Self {
            community_id,
            community_name,
            balance: 0.0,
            total_collected: 0.0,
            total_disbursed: 0.0,
            deposit_count: 0,
            disbursement_count: 0,
            deposits: VecDeque::new(),
            disbursements: VecDeque::new(),
        }
    }
}

/// All community funds, keyed by community. Funds are created lazily on
/// first deposit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommunityFundManager {
    funds: BTreeMap<CommunityId, CommunityFund>,
}

impl CommunityFundManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fund(&self, community: &CommunityId) -> Option<&CommunityFund> {
        self.funds.get(community)
    }

    pub fn balance(&self, community: &CommunityId) -> Magnitude {
        self.funds.get(community).map_or(0.0, |f| f.balance)
    }

    /// Sum of every fund balance.
    pub fn total_balance(&self) -> Magnitude {
        self.funds.values().map(|f| f.balance).sum()
    }

    pub fn funds(&self) -> impl Iterator<Item = &CommunityFund> {
        self.funds.values()
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }

    /// Route an exit fee into a community's fund. Non-positive amounts
    /// are ignored.
    pub fn deposit_exit_fee(
        &mut self,
        community: &CommunityId,
        amount: Magnitude,
        unit_id: &UnitId,
        from_wallet: &WalletId,
        now: Timestamp,
        community_name: &str,
    ) {
        if amount <= 0.0 {
            return;
        }
        let fund = self
            .funds
            .entry(community.clone())
            .or_insert_with(|| CommunityFund::new(community.clone(), community_name.to_string()));
        fund.balance += amount;
        fund.total_collected += amount;
        fund.deposit_count += 1;
        fund.deposits.push_back(FundDeposit {
            timestamp: now,
            amount,
            unit_id: unit_id.clone(),
            from_wallet: from_wallet.clone(),
        });
        if fund.deposits.len() > FUND_HISTORY_LIMIT {
            fund.deposits.pop_front();
        }
        debug!(community = %community, amount, balance = fund.balance, "exit fee deposited");
    }

    /// Draw a fund down toward a recipient. Fails when the fund does not
    /// cover the amount.
    pub fn disburse(
        &mut self,
        community: &CommunityId,
        amount: Magnitude,
        to_wallet: &WalletId,
        now: Timestamp,
        note: Option<String>,
    ) -> Result<(), LedgerError> {
        let fund = match self.funds.get_mut(community) {
            Some(fund) if amount > 0.0 && amount <= fund.balance => fund,
            other => {
                return Err(LedgerError::InsufficientBalance {
                    need: amount,
                    have: other.map_or(0.0, |f| f.balance),
                })
            }
        };
        fund.balance -= amount;
        fund.total_disbursed += amount;
        fund.disbursement_count += 1;
        fund.disbursements.push_back(FundDisbursement {
            timestamp: now,
            amount,
            to_wallet: to_wallet.clone(),
            note,
        });
        if fund.disbursements.len() > FUND_HISTORY_LIMIT {
            fund.disbursements.pop_front();
        }
        debug!(community = %community, amount, balance = fund.balance, "fund disbursed");
        Ok(())
    }

    // ── Export / import ──────────────────────────────────────────────────────

    pub fn export(&self) -> Vec<CommunityFund> {
        self.funds.values().cloned().collect()
    }

    pub fn import(records: Vec<CommunityFund>) -> Self {
        Self {
            funds: records
                .into_iter()
                .map(|f| (f.community_id.clone(), f))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (CommunityId, UnitId, WalletId) {
        (CommunityId::generate(), UnitId::generate(), WalletId::generate())
    }

    #[test]
    fn deposit_creates_the_fund_lazily() {
        let mut funds = CommunityFundManager::new();
        let (community, unit, wallet) = ids();
        assert!(funds.fund(&community).is_none());

        funds.deposit_exit_fee(&community, 4.95, &unit, &wallet, 100, "riverside");
        let fund = funds.fund(&community).unwrap();
        assert_eq!(fund.balance, 4.95);
        assert_eq!(fund.total_collected, 4.95);
        assert_eq!(fund.deposit_count, 1);
        assert_eq!(fund.community_name, "riverside");
    }

    #[test]
    fn non_positive_deposits_are_ignored() {
        let mut funds = CommunityFundManager::new();
        let (community, unit, wallet) = ids();
        funds.deposit_exit_fee(&community, 0.0, &unit, &wallet, 100, "x");
        funds.deposit_exit_fee(&community, -1.0, &unit, &wallet, 100, "x");
        assert!(funds.is_empty());
    }

    #[test]
    fn disburse_draws_down_and_rejects_overdraw() {
        let mut funds = CommunityFundManager::new();
        let (community, unit, wallet) = ids();
        funds.deposit_exit_fee(&community, 10.0, &unit, &wallet, 100, "x");

        funds.disburse(&community, 4.0, &wallet, 200, Some("grant".into())).unwrap();
        assert_eq!(funds.balance(&community), 6.0);
        assert_eq!(funds.fund(&community).unwrap().total_disbursed, 4.0);

        assert!(matches!(
            funds.disburse(&community, 7.0, &wallet, 300, None),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert!(matches!(
            funds.disburse(&CommunityId::generate(), 1.0, &wallet, 300, None),
            Err(LedgerError::InsufficientBalance { have, .. }) if have == 0.0
        ));
    }

    #[test]
    fn history_is_bounded_per_fund() {
        let mut funds = CommunityFundManager::new();
        let (community, unit, wallet) = ids();
        for i in 0..(FUND_HISTORY_LIMIT + 5) {
            funds.deposit_exit_fee(&community, 1.0, &unit, &wallet, i as Timestamp, "x");
        }
        let fund = funds.fund(&community).unwrap();
        assert_eq!(fund.deposits.len(), FUND_HISTORY_LIMIT);
        assert_eq!(fund.deposit_count, (FUND_HISTORY_LIMIT + 5) as u64);
    }

    #[test]
    fn total_balance_sums_every_fund() {
        let mut funds = CommunityFundManager::new();
        let (a, unit, wallet) = ids();
        let b = CommunityId::generate();
        funds.deposit_exit_fee(&a, 3.0, &unit, &wallet, 100, "a");
        funds.deposit_exit_fee(&b, 7.0, &unit, &wallet, 100, "b");
        assert_eq!(funds.total_balance(), 10.0);
    }

    #[test]
    fn export_import_round_trips() {
        let mut funds = CommunityFundManager::new();
        let (community, unit, wallet) = ids();
        funds.deposit_exit_fee(&community, 10.0, &unit, &wallet, 100, "x");
        funds.disburse(&community, 2.0, &wallet, 200, None).unwrap();
        let restored = CommunityFundManager::import(funds.export());
        assert_eq!(funds, restored);
    }
}
