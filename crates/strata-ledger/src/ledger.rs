use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use strata_compute::{ComputeJob, ComputePool, ComputeStats, JobOptions, JobResult, JobSpec, MintOutcome, RewardMinter};
use strata_convert::{Conversion, ConversionContext, ConversionEngine, ConversionRequest};
use strata_core::community::Community;
use strata_core::constants::{FEE_RESIDUAL_EPSILON, MS_PER_DAY};
use strata_core::error::LedgerError;
use strata_core::purpose::PurposeChannel;
use strata_core::transaction::{Transaction, TxKind};
use strata_core::types::{CommunityId, JobId, Magnitude, PurposeId, Timestamp, TxId, UnitId, WalletId};
use strata_core::unit::{ProvenanceEntry, ProvenanceKind, Temporality, Unit};
use strata_core::wallet::Wallet;
use strata_pool::{CommonsPool, CommunityFundManager, DividendPool};
use strata_registry::{CommunityRegistry, PurposeRegistry};
use strata_wallet::{Balance, WalletManager};

use crate::tick::{pool_aware_tick, TickStats};

/// What a transfer produced: the unit now held by the recipient, the
/// change unit left with the sender on a partial transfer, and the log
/// entry recording it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub transaction_id: TxId,
    pub unit: Unit,
    pub change_unit: Option<Unit>,
}

/// The orchestrator. Owns every component exclusively; components never
/// hold references back into the ledger — the compute pool's mint
/// capability is handed in per call.
#[derive(Debug, Default)]
pub struct Ledger {
    pub(crate) pool: CommonsPool,
    pub(crate) dividend: DividendPool,
    pub(crate) funds: CommunityFundManager,
    pub(crate) wallets: WalletManager,
    pub(crate) communities: CommunityRegistry,
    pub(crate) purposes: PurposeRegistry,
    pub(crate) engine: ConversionEngine,
    pub(crate) compute: ComputePool,
    pub(crate) transactions: Vec<Transaction>,
}

impl Ledger {
    /// A fresh ledger at time zero with the standard purpose channels
    /// pre-registered.
    pub fn new() -> Self {
        Self {
            purposes: PurposeRegistry::with_standard_purposes(0),
            ..Self::default()
        }
    }

    // ── Read access ──────────────────────────────────────────────────────────

    pub fn pool(&self) -> &CommonsPool {
        &self.pool
    }

    pub fn dividend_pool(&self) -> &DividendPool {
        &self.dividend
    }

    pub fn community_funds(&self) -> &CommunityFundManager {
        &self.funds
    }

    pub fn wallets(&self) -> &WalletManager {
        &self.wallets
    }

    pub fn communities(&self) -> &CommunityRegistry {
        &self.communities
    }

    pub fn purposes(&self) -> &PurposeRegistry {
        &self.purposes
    }

    pub fn compute(&self) -> &ComputePool {
        &self.compute
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn transactions_for_wallet(&self, wallet: &WalletId) -> Vec<&Transaction> {
        self.transactions.iter().filter(|t| t.touches(wallet)).collect()
    }

    // ── Clock ────────────────────────────────────────────────────────────────

    pub fn current_time(&self) -> Timestamp {
        self.pool.now()
    }

    pub fn set_time(&mut self, t: Timestamp) {
        self.pool.set_time(t);
    }

    pub fn advance_time(&mut self, delta_ms: Timestamp) {
        self.pool.advance_time(delta_ms);
    }

    // ── Wallets and registries ───────────────────────────────────────────────

    pub fn create_wallet(&mut self, name: impl Into<String>) -> Wallet {
        self.wallets.create_wallet(name, self.pool.now())
    }

    pub fn create_community(
        &mut self,
        name: impl Into<String>,
        boundary_fee: f64,
    ) -> Result<Community, LedgerError> {
        self.communities.create(name, boundary_fee, self.pool.now())
    }

    pub fn create_purpose(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
        conversion_discount: Option<f64>,
    ) -> Result<PurposeChannel, LedgerError> {
        self.purposes
            .create(name, description, conversion_discount, self.pool.now())
    }

    /// Join a wallet to a community.
    pub fn join_community(
        &mut self,
        wallet: &WalletId,
        community: &CommunityId,
    ) -> Result<(), LedgerError> {
        self.communities.require(community)?;
        let newly_joined = self.wallets.join_community(wallet, community.clone())?;
        if newly_joined {
            self.communities.record_join(community)?;
        }
        Ok(())
    }

    /// Register a wallet as a recipient for a purpose. This is what the
    /// transfer gate consults.
    pub fn register_purpose(
        &mut self,
        wallet: &WalletId,
        purpose: &PurposeId,
    ) -> Result<(), LedgerError> {
        self.purposes.require(purpose)?;
        self.wallets.register_purpose(wallet, purpose.clone())?;
        self.purposes.register_recipient(purpose, wallet.clone())
    }

    pub fn balance(&self, wallet: &WalletId) -> Result<Balance, LedgerError> {
        self.wallets.balance(wallet)
    }

    // ── Mint ─────────────────────────────────────────────────────────────────

    /// Mint new supply into a wallet and log it.
    pub fn mint(
        &mut self,
        amount: Magnitude,
        wallet: &WalletId,
        note: Option<String>,
    ) -> Result<Unit, LedgerError> {
        self.wallets.require_wallet(wallet)?;

        let mut tx = Transaction::new(TxKind::Mint, self.pool.now(), "mint");
        tx.to_wallet = Some(wallet.clone());

        let mut unit = self.pool.mint(amount, wallet.clone(), note)?;
        unit.provenance[0].tx_id = Some(tx.id.clone());
        tx.output_units.push(unit.id.clone());

        self.wallets.add_unit(unit.clone())?;
        self.transactions.push(tx);
        Ok(unit)
    }

    // ── Convert ──────────────────────────────────────────────────────────────

    /// Apply a dimensional conversion: the old unit is retired, the
    /// successor indexed, exit fees routed to community funds, and every
    /// other fee burned. All reconciled before anything is recorded.
    pub fn convert(
        &mut self,
        unit_id: &UnitId,
        request: &ConversionRequest,
    ) -> Result<Unit, LedgerError> {
        let unit = self.wallets.require_unit(unit_id)?.clone();
        let ctx = ConversionContext {
            communities: self.communities.map(),
            purposes: self.purposes.map(),
            current_time: self.pool.now(),
        };
        let Conversion {
            unit: mut successor,
            fees,
            exit_fees,
        } = self.engine.convert(&unit, request, &ctx)?;

        // Exit fees are routed; the rest of the bill is burned. The entry
        // share is recovered by subtraction, so sweep float residue.
        let exit_total: Magnitude = exit_fees.values().sum();
        let mut burn = fees.total - exit_total;
        if burn.abs() < FEE_RESIDUAL_EPSILON {
            burn = 0.0;
        }
        self.pool.collect_fee(&unit.id, burn)?;

        let now = self.pool.now();
        for (community, fee) in &exit_fees {
            let name = self
                .communities
                .get(community)
                .map(|c| c.name.clone())
                .unwrap_or_default();
            self.funds
                .deposit_exit_fee(community, *fee, &unit.id, &unit.wallet_id, now, &name);
        }

        let mut tx = Transaction::new(TxKind::Convert, now, "convert");
        tx.input_units.push(unit.id.clone());
        tx.output_units.push(successor.id.clone());
        tx.total_fees = fees.total;
        tx.from_wallet = Some(unit.wallet_id.clone());
        tx.to_wallet = Some(unit.wallet_id.clone());
        if let Some(entry) = successor.provenance.last_mut() {
            entry.tx_id = Some(tx.id.clone());
        }

        self.wallets.remove_unit(&unit.id)?;
        self.wallets.add_unit(successor.clone())?;
        self.transactions.push(tx);
        info!(from = %unit.id, to = %successor.id, fees = fees.total, "converted");
        Ok(successor)
    }

    /// The conversion's numbers without touching anything.
    pub fn preview_conversion(
        &self,
        unit_id: &UnitId,
        request: &ConversionRequest,
    ) -> Result<strata_convert::ConversionPreview, LedgerError> {
        let unit = self.wallets.require_unit(unit_id)?;
        let ctx = ConversionContext {
            communities: self.communities.map(),
            purposes: self.purposes.map(),
            current_time: self.pool.now(),
        };
        self.engine.preview(unit, request, &ctx)
    }

    /// Whether a conversion would succeed; failures are reported with the
    /// engine's reason bundled.
    pub fn validate_conversion(
        &self,
        unit_id: &UnitId,
        request: &ConversionRequest,
    ) -> Result<(), LedgerError> {
        let unit = self.wallets.require_unit(unit_id)?;
        let ctx = ConversionContext {
            communities: self.communities.map(),
            purposes: self.purposes.map(),
            current_time: self.pool.now(),
        };
        self.engine
            .validate(unit, request, &ctx)
            .map_err(|e| LedgerError::ConversionInvalid(e.to_string()))
    }

    // ── Transfer ─────────────────────────────────────────────────────────────

    /// Move value to another wallet. The recipient must be registered for
    /// every purpose the unit carries. A partial amount splits the unit;
    /// the moved side records `Earned` when a note is given, `Gifted`
    /// otherwise.
    pub fn transfer(
        &mut self,
        unit_id: &UnitId,
        to_wallet: &WalletId,
        amount: Option<Magnitude>,
        note: Option<String>,
    ) -> Result<TransferOutcome, LedgerError> {
        let unit = self.wallets.require_unit(unit_id)?.clone();
        self.wallets.require_wallet(to_wallet)?;

        for purpose in &unit.purpose {
            if !self.purposes.accepts(purpose, to_wallet) {
                let name = self
                    .purposes
                    .get(purpose)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| purpose.to_string());
                return Err(LedgerError::PurposeGateFailed {
                    purpose: name,
                    wallet: to_wallet.to_string(),
                });
            }
        }

        let now = self.pool.now();
        let kind = if note.is_some() {
            ProvenanceKind::Earned
        } else {
            ProvenanceKind::Gifted
        };

        match amount {
            Some(requested) if requested > unit.magnitude => Err(LedgerError::InsufficientBalance {
                need: requested,
                have: unit.magnitude,
            }),
            Some(requested) if requested < unit.magnitude => {
                // Partial: split, move the carved side, keep the change.
                let (mut moved, change) = unit.split(requested, now)?;

                let mut tx = Transaction::new(TxKind::Transfer, now, "transfer");
                tx.input_units.push(unit.id.clone());
                tx.output_units.push(moved.id.clone());
                tx.output_units.push(change.id.clone());
                tx.from_wallet = Some(unit.wallet_id.clone());
                tx.to_wallet = Some(to_wallet.clone());

                moved.wallet_id = to_wallet.clone();
                moved.push_provenance(ProvenanceEntry {
                    timestamp: now,
                    kind,
                    from_wallet: Some(unit.wallet_id.clone()),
                    to_wallet: Some(to_wallet.clone()),
                    amount: moved.magnitude,
                    note,
                    tx_id: Some(tx.id.clone()),
                });

                self.wallets.remove_unit(&unit.id)?;
                self.wallets.add_unit(moved.clone())?;
                self.wallets.add_unit(change.clone())?;
                self.transactions.push(tx.clone());
                info!(unit = %moved.id, amount = moved.magnitude, to = %to_wallet, "partial transfer");
                Ok(TransferOutcome {
                    transaction_id: tx.id,
                    unit: moved,
                    change_unit: Some(change),
                })
            }
            _ => {
                // Full transfer: the unit keeps its id and changes hands.
                let mut tx = Transaction::new(TxKind::Transfer, now, "transfer");
                tx.input_units.push(unit.id.clone());
                tx.output_units.push(unit.id.clone());
                tx.from_wallet = Some(unit.wallet_id.clone());
                tx.to_wallet = Some(to_wallet.clone());

                let mut moved = unit.clone();
                moved.wallet_id = to_wallet.clone();
                moved.push_provenance(ProvenanceEntry {
                    timestamp: now,
                    kind,
                    from_wallet: Some(unit.wallet_id.clone()),
                    to_wallet: Some(to_wallet.clone()),
                    amount: moved.magnitude,
                    note,
                    tx_id: Some(tx.id.clone()),
                });

                self.wallets.update_unit(moved.clone())?;
                self.transactions.push(tx.clone());
                info!(unit = %moved.id, amount = moved.magnitude, to = %to_wallet, "transfer");
                Ok(TransferOutcome {
                    transaction_id: tx.id,
                    unit: moved,
                    change_unit: None,
                })
            }
        }
    }

    // ── Split / merge ────────────────────────────────────────────────────────

    /// Split a unit in place: two successors in the same wallet.
    pub fn split(
        &mut self,
        unit_id: &UnitId,
        amount: Magnitude,
    ) -> Result<(Unit, Unit), LedgerError> {
        let unit = self.wallets.require_unit(unit_id)?.clone();
        let now = self.pool.now();
        let (carved, remainder) = unit.split(amount, now)?;

        let mut tx = Transaction::new(TxKind::Transfer, now, "split");
        tx.input_units.push(unit.id.clone());
        tx.output_units.push(carved.id.clone());
        tx.output_units.push(remainder.id.clone());
        tx.from_wallet = Some(unit.wallet_id.clone());
        tx.to_wallet = Some(unit.wallet_id.clone());

        self.wallets.remove_unit(&unit.id)?;
        self.wallets.add_unit(carved.clone())?;
        self.wallets.add_unit(remainder.clone())?;
        self.transactions.push(tx);
        Ok((carved, remainder))
    }

    /// Merge units sharing every dimension and one owner. Each source is
    /// settled against the dividend pool first so their clocks agree.
    pub fn merge(&mut self, unit_ids: &[UnitId]) -> Result<Unit, LedgerError> {
        let mut sources = Vec::with_capacity(unit_ids.len());
        for id in unit_ids {
            sources.push(self.wallets.require_unit(id)?.clone());
        }
        let now = self.pool.now();

        // Dry-run to surface incompatibilities before any pool mutation.
        Unit::merge(&sources, now)?;

        for source in &mut sources {
            pool_aware_tick(source, &mut self.dividend, now);
        }
        let merged = Unit::merge(&sources, now)?;

        let mut tx = Transaction::new(TxKind::Transfer, now, "merge");
        tx.from_wallet = Some(merged.wallet_id.clone());
        tx.to_wallet = Some(merged.wallet_id.clone());
        tx.output_units.push(merged.id.clone());
        for source in &sources {
            tx.input_units.push(source.id.clone());
        }

        for source in &sources {
            self.wallets.remove_unit(&source.id)?;
        }
        self.wallets.add_unit(merged.clone())?;
        self.transactions.push(tx);
        info!(unit = %merged.id, sources = sources.len(), "merged");
        Ok(merged)
    }

    // ── Tick ─────────────────────────────────────────────────────────────────

    /// Advance the clock by whole or fractional days and step every unit
    /// through the pool-aware tick. Never fails; underfunding shows up in
    /// the stats.
    ///
    /// Units are visited in two deterministic passes: every T0 unit
    /// first, then the rest. Demurrage collected in this batch is thereby
    /// available to this batch's dividends; growth strata only go short
    /// when the batch as a whole does.
    pub fn tick(&mut self, days: f64) -> TickStats {
        let delta_ms = (days * MS_PER_DAY as f64).round() as Timestamp;
        self.pool.advance_time(delta_ms);
        let now = self.pool.now();

        let mut stats = TickStats::default();
        let ids = self.wallets.unit_ids();
        for decaying_pass in [true, false] {
            for id in &ids {
                if let Some(unit) = self.wallets.unit_mut(id) {
                    if (unit.temporality == Temporality::T0) != decaying_pass {
                        continue;
                    }
                    stats.absorb(&pool_aware_tick(unit, &mut self.dividend, now));
                }
            }
        }
        stats.finish(&self.dividend);
        info!(
            days,
            units = stats.units_updated,
            demurrage = stats.demurrage_collected,
            distributed = stats.dividend_distributed,
            funding_ratio = stats.funding_ratio,
            "tick"
        );
        stats
    }

    // ── Community funds ──────────────────────────────────────────────────────

    /// Grant from a community's fund: draws the fund down and emits a new
    /// unit carrying that community to the recipient.
    pub fn disburse_community_fund(
        &mut self,
        community: &CommunityId,
        amount: Magnitude,
        to_wallet: &WalletId,
        note: Option<String>,
    ) -> Result<Unit, LedgerError> {
        self.communities.require(community)?;
        self.wallets.require_wallet(to_wallet)?;
        let now = self.pool.now();
        self.funds
            .disburse(community, amount, to_wallet, now, note.clone())?;

        let mut tx = Transaction::new(TxKind::Transfer, now, "community fund disbursement");
        tx.to_wallet = Some(to_wallet.clone());

        let unit = Unit {
            id: UnitId::generate(),
            magnitude: amount,
            temporality: Temporality::T0,
            locality: std::iter::once(community.clone()).collect(),
            purpose: BTreeSet::new(),
            provenance: vec![ProvenanceEntry {
                timestamp: now,
                kind: ProvenanceKind::Earned,
                from_wallet: None,
                to_wallet: Some(to_wallet.clone()),
                amount,
                note,
                tx_id: Some(tx.id.clone()),
            }],
            created_at: now,
            last_tick_at: now,
            wallet_id: to_wallet.clone(),
        };
        tx.output_units.push(unit.id.clone());

        self.wallets.add_unit(unit.clone())?;
        self.transactions.push(tx);
        Ok(unit)
    }

    // ── Compute bridge ───────────────────────────────────────────────────────

    pub fn submit_compute_job(
        &mut self,
        requestor: &WalletId,
        spec: JobSpec,
        payment: Magnitude,
        opts: JobOptions,
    ) -> Result<ComputeJob, LedgerError> {
        self.wallets.require_wallet(requestor)?;
        self.compute
            .submit_job(requestor.clone(), spec, payment, opts, self.pool.now())
    }

    /// Claim a job. The provider wallet must exist — rewards have to land
    /// somewhere.
    pub fn claim_compute_job(
        &mut self,
        job: &JobId,
        provider: &WalletId,
    ) -> Result<(), LedgerError> {
        self.wallets.require_wallet(provider)?;
        self.compute.claim_job(job, provider.clone(), self.pool.now())
    }

    pub fn abandon_compute_job(
        &mut self,
        job: &JobId,
        provider: &WalletId,
    ) -> Result<(), LedgerError> {
        self.compute.abandon_job(job, provider)
    }

    pub fn cancel_compute_job(
        &mut self,
        job: &JobId,
        requestor: &WalletId,
    ) -> Result<(), LedgerError> {
        self.compute.cancel_job(job, requestor)
    }

    /// Submit a result. On verified completion the reward mints through
    /// the ledger's own mint path and is logged like any other mint.
    pub fn complete_compute_job(
        &mut self,
        job: &JobId,
        provider: &WalletId,
        result: JobResult,
    ) -> Result<MintOutcome, LedgerError> {
        let now = self.pool.now();
        let mut sink = RewardSink {
            pool: &mut self.pool,
            wallets: &mut self.wallets,
            communities: &self.communities,
            purposes: &self.purposes,
            transactions: &mut self.transactions,
        };
        self.compute.submit_result(job, provider, result, now, &mut sink)
    }

    pub fn expire_stale_jobs(&mut self) -> usize {
        self.compute.expire_stale(self.pool.now())
    }

    pub fn get_available_compute_jobs(&self) -> Vec<ComputeJob> {
        self.compute
            .available_jobs(self.pool.now())
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn get_compute_stats(&self) -> ComputeStats {
        self.compute.stats()
    }
}

/// The mint capability handed to the compute pool for the duration of one
/// `complete_compute_job` call. Synchronous, and structurally unable to
/// re-enter the compute pool — it borrows everything except it.
struct RewardSink<'a> {
    pool: &'a mut CommonsPool,
    wallets: &'a mut WalletManager,
    communities: &'a CommunityRegistry,
    purposes: &'a PurposeRegistry,
    transactions: &'a mut Vec<Transaction>,
}

impl RewardMinter for RewardSink<'_> {
    fn mint_reward(
        &mut self,
        amount: Magnitude,
        wallet: &WalletId,
        purpose: Option<&PurposeId>,
        locality: Option<&CommunityId>,
        note: Option<&str>,
    ) -> Option<UnitId> {
        if !self.wallets.contains_wallet(wallet) {
            warn!(wallet = %wallet, "reward mint refused: unknown wallet");
            return None;
        }

        let mut tx = Transaction::new(TxKind::Mint, self.pool.now(), "compute reward");
        tx.to_wallet = Some(wallet.clone());

        let mut unit = self
            .pool
            .mint(amount, wallet.clone(), note.map(str::to_string))
            .ok()?;
        unit.provenance[0].tx_id = Some(tx.id.clone());

        // Tags apply only when they resolve; an unknown id is dropped
        // rather than failing the whole reward.
        if let Some(p) = purpose {
            if self.purposes.contains(p) {
                unit.purpose.insert(p.clone());
            }
        }
        if let Some(c) = locality {
            if self.communities.contains(c) {
                unit.locality.insert(c.clone());
            }
        }

        tx.output_units.push(unit.id.clone());
        let unit_id = unit.id.clone();
        self.wallets.add_unit(unit).ok()?;
        self.transactions.push(tx);
        Some(unit_id)
    }
}
