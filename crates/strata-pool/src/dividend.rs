use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use strata_core::constants::DIVIDEND_HISTORY_LIMIT;
use strata_core::types::{Magnitude, Timestamp, UnitId};

/// One demurrage deposit into the pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub timestamp: Timestamp,
    pub amount: Magnitude,
    pub unit_id: UnitId,
}

/// One dividend withdrawal. `actual` may fall short of `requested` when
/// the pool cannot cover the full growth.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRecord {
    pub timestamp: Timestamp,
    pub requested: Magnitude,
    pub actual: Magnitude,
    pub unit_id: UnitId,
    pub fully_funded: bool,
}

/// Serializable state of the dividend pool, histories included.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DividendPoolState {
    pub balance: Magnitude,
    pub total_collected: Magnitude,
    pub total_requested: Magnitude,
    pub total_distributed: Magnitude,
    pub deposit_count: u64,
    pub withdrawal_count: u64,
    pub deposits: Vec<DepositRecord>,
    pub withdrawals: Vec<WithdrawalRecord>,
}

/// Pure accounting for the demurrage → dividend flow. Demurrage deposits
/// fill the balance; dividend withdrawals drain it, capped at what is
/// there. The funding ratio (`total_distributed / total_requested`)
/// measures how much of the ideal growth the pool has actually paid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DividendPool {
    balance: Magnitude,
    total_collected: Magnitude,
    total_requested: Magnitude,
    total_distributed: Magnitude,
    deposit_count: u64,
    withdrawal_count: u64,
    deposits: VecDeque<DepositRecord>,
    withdrawals: VecDeque<WithdrawalRecord>,
}

impl DividendPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self) -> Magnitude {
        self.balance
    }

    pub fn total_collected(&self) -> Magnitude {
        self.total_collected
    }

    pub fn total_requested(&self) -> Magnitude {
        self.total_requested
    }

    pub fn total_distributed(&self) -> Magnitude {
        self.total_distributed
    }

    pub fn deposit_count(&self) -> u64 {
        self.deposit_count
    }

    pub fn withdrawal_count(&self) -> u64 {
        self.withdrawal_count
    }

    pub fn deposits(&self) -> impl Iterator<Item = &DepositRecord> {
        self.deposits.iter()
    }

    pub fn withdrawals(&self) -> impl Iterator<Item = &WithdrawalRecord> {
        self.withdrawals.iter()
    }

    /// Record demurrage flowing in. Non-positive amounts are ignored.
    pub fn deposit_demurrage(&mut self, amount: Magnitude, unit_id: &UnitId, now: Timestamp) {
        if amount <= 0.0 {
            return;
        }
        self.balance += amount;
        self.total_collected += amount;
        self.deposit_count += 1;
        self.deposits.push_back(DepositRecord {
            timestamp: now,
            amount,
            unit_id: unit_id.clone(),
        });
        if self.deposits.len() > DIVIDEND_HISTORY_LIMIT {
            self.deposits.pop_front();
        }
        debug!(unit = %unit_id, amount, balance = self.balance, "demurrage deposited");
    }

    /// Fund a dividend request. Returns the amount actually paid:
    /// `min(requested, balance)`. The request is counted in full either
    /// way — the gap is what the funding ratio reports.
    pub fn withdraw_dividend(
        &mut self,
        requested: Magnitude,
        unit_id: &UnitId,
        now: Timestamp,
    ) -> Magnitude {
        if requested <= 0.0 {
            return 0.0;
        }
        self.total_requested += requested;
        let actual = requested.min(self.balance);
        if actual > 0.0 {
            self.balance -= actual;
            self.total_distributed += actual;
            self.withdrawal_count += 1;
            self.withdrawals.push_back(WithdrawalRecord {
                timestamp: now,
                requested,
                actual,
                unit_id: unit_id.clone(),
                fully_funded: actual >= requested,
            });
            if self.withdrawals.len() > DIVIDEND_HISTORY_LIMIT {
                self.withdrawals.pop_front();
            }
        }
        debug!(unit = %unit_id, requested, actual, balance = self.balance, "dividend withdrawn");
        actual
    }

    /// `total_distributed / total_requested`, or 1.0 before any request.
    pub fn funding_ratio(&self) -> f64 {
        if self.total_requested <= 0.0 {
            1.0
        } else {
            self.total_distributed / self.total_requested
        }
    }

    // ── Export / import ──────────────────────────────────────────────────────

    pub fn export(&self) -> DividendPoolState {
        DividendPoolState {
            balance: self.balance,
            total_collected: self.total_collected,
            total_requested: self.total_requested,
            total_distributed: self.total_distributed,
            deposit_count: self.deposit_count,
            withdrawal_count: self.withdrawal_count,
            deposits: self.deposits.iter().cloned().collect(),
            withdrawals: self.withdrawals.iter().cloned().collect(),
        }
    }

    pub fn import(state: DividendPoolState) -> Self {
        Self {
            balance: state.balance,
            total_collected: state.total_collected,
            total_requested: state.total_requested,
            total_distributed: state.total_distributed,
            deposit_count: state.deposit_count,
            withdrawal_count: state.withdrawal_count,
            deposits: state.deposits.into(),
            withdrawals: state.withdrawals.into(),
        }
    }
}
