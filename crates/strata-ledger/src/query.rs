//! Read-only query helpers over a ledger.
//!
//! Everything here renders or filters state the components already hold;
//! nothing mutates. The command surface lives on [`Ledger`] itself.

use strata_core::error::LedgerError;
use strata_core::transaction::Transaction;
use strata_core::types::{format_timestamp, CommunityId, JobId, UnitId, WalletId};
use strata_core::unit::ProvenanceKind;

use crate::ledger::Ledger;

/// Borrowing view for queries.
pub struct LedgerQuery<'a> {
    ledger: &'a Ledger,
}

impl Ledger {
    pub fn query(&self) -> LedgerQuery<'_> {
        LedgerQuery { ledger: self }
    }
}

impl LedgerQuery<'_> {
    /// A unit's history, one rendered line per provenance entry, oldest
    /// first.
    pub fn unit_history(&self, id: &UnitId) -> Result<Vec<String>, LedgerError> {
        let unit = self.ledger.wallets().require_unit(id)?;
        Ok(unit
            .provenance
            .iter()
            .map(|entry| {
                let kind = match entry.kind {
                    ProvenanceKind::Minted => "minted",
                    ProvenanceKind::Earned => "earned",
                    ProvenanceKind::Gifted => "gifted",
                    ProvenanceKind::Invested => "invested",
                    ProvenanceKind::Inherited => "inherited",
                    ProvenanceKind::Converted => "converted",
                    ProvenanceKind::Merged => "merged",
                    ProvenanceKind::Split => "split",
                };
                let note = entry
                    .note
                    .as_deref()
                    .map(|n| format!(" — {n}"))
                    .unwrap_or_default();
                format!(
                    "{} | {} {:.4}{}",
                    format_timestamp(entry.timestamp),
                    kind,
                    entry.amount,
                    note
                )
            })
            .collect())
    }

    /// One-line wallet summary: holdings and memberships.
    pub fn describe_wallet(&self, id: &WalletId) -> Result<String, LedgerError> {
        let wallet = self.ledger.wallets().require_wallet(id)?;
        let balance = self.ledger.wallets().balance(id)?;
        Ok(format!(
            "Wallet {} ({}) | {:.4} total across {} units | {} communities | {} purposes",
            &id.to_b58()[..8],
            wallet.name,
            balance.total,
            self.ledger.wallets().units_of(id).len(),
            wallet.communities.len(),
            wallet.purposes.len()
        ))
    }

    /// One-line community fund summary.
    pub fn describe_fund(&self, community: &CommunityId) -> Result<String, LedgerError> {
        let record = self.ledger.communities().require(community)?;
        match self.ledger.community_funds().fund(community) {
            Some(fund) => Ok(format!(
                "Fund for {} | balance {:.4} | collected {:.4} over {} deposits | disbursed {:.4} over {} grants",
                record.name,
                fund.balance,
                fund.total_collected,
                fund.deposit_count,
                fund.total_disbursed,
                fund.disbursement_count
            )),
            None => Ok(format!("Fund for {} | no exit fees collected yet", record.name)),
        }
    }

    /// One-line compute job summary.
    pub fn describe_job(&self, id: &JobId) -> Result<String, LedgerError> {
        let job = self.ledger.compute().require(id)?;
        let provider = job
            .provider
            .as_ref()
            .map(|p| format!(" | provider {}", &p.to_b58()[..8]))
            .unwrap_or_default();
        let failure = job
            .failure_reason
            .as_deref()
            .map(|r| format!(" | {r}"))
            .unwrap_or_default();
        Ok(format!(
            "Job {} | {} | payment {:.4} → reward {:.4} | {}{}{}",
            &id.to_hex()[..16],
            job.spec.kind,
            job.payment,
            job.reward,
            job.status,
            provider,
            failure
        ))
    }

    /// The most recent `limit` transactions, newest first.
    pub fn recent_transactions(&self, limit: usize) -> Vec<&Transaction> {
        self.ledger.transactions().iter().rev().take(limit).collect()
    }
}
