//! Seeded random operation sequences. Several hundred interleaved
//! operations against one ledger, then every quantified invariant is
//! checked. The generator is deterministic per seed, so failures are
//! reproducible.
//!
//! Run with:
//!   cargo test -p strata-ledger --test sequences

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use strata_compute::{JobOptions, JobResult, JobSpec, VerificationMode, WorkProof};
use strata_convert::ConversionRequest;
use strata_core::unit::Temporality;
use strata_ledger::Ledger;

const STEPS: usize = 400;

fn check_invariants(ledger: &Ledger, seed: u64, step: usize) {
    let pool = ledger.pool();
    let tolerance = 1e-6 * pool.total_minted().max(1.0);
    assert!(
        (pool.current_supply() - (pool.total_minted() - pool.total_burned())).abs() <= tolerance,
        "seed {seed} step {step}: supply != minted - burned"
    );
    assert!(
        ledger.supply_identity_holds(),
        "seed {seed} step {step}: supply identity broken"
    );
    for unit in ledger.wallets().units() {
        assert!(
            unit.magnitude >= 0.0,
            "seed {seed} step {step}: negative magnitude"
        );
        assert!(
            unit.provenance_is_monotonic(),
            "seed {seed} step {step}: provenance out of order"
        );
    }
    assert!(
        ledger.wallets().index_is_consistent(),
        "seed {seed} step {step}: index broken"
    );
    assert!(
        ledger.dividend_pool().total_distributed()
            <= ledger.dividend_pool().total_collected() + 1e-9,
        "seed {seed} step {step}: dividends exceed demurrage"
    );
}

fn run_sequence(seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ledger = Ledger::new();
    let wallets: Vec<_> = (0..3)
        .map(|i| ledger.create_wallet(format!("wallet-{i}")).id)
        .collect();

    let strata = [
        Temporality::T0,
        Temporality::T1,
        Temporality::T2,
        Temporality::TInf,
    ];

    for step in 0..STEPS {
        let unit_ids = ledger.wallets().unit_ids();
        match rng.gen_range(0..8u32) {
            // Mint into a random wallet.
            0 => {
                let wallet = &wallets[rng.gen_range(0..wallets.len())];
                let amount = rng.gen_range(1.0..100.0);
                ledger.mint(amount, wallet, None).unwrap();
            }
            // Full transfer of a random unit.
            1 => {
                if let Some(id) = unit_ids.get(rng.gen_range(0..unit_ids.len().max(1))) {
                    let to = &wallets[rng.gen_range(0..wallets.len())];
                    ledger.transfer(id, to, None, None).unwrap();
                }
            }
            // Partial transfer of 30%.
            2 => {
                if let Some(id) = unit_ids.get(rng.gen_range(0..unit_ids.len().max(1))) {
                    let magnitude = ledger.wallets().get_unit(id).unwrap().magnitude;
                    if magnitude > 1e-3 {
                        let to = &wallets[rng.gen_range(0..wallets.len())];
                        ledger.transfer(id, to, Some(magnitude * 0.3), None).unwrap();
                    }
                }
            }
            // Stratum conversion.
            3 => {
                if let Some(id) = unit_ids.get(rng.gen_range(0..unit_ids.len().max(1))) {
                    let target = strata[rng.gen_range(0..strata.len())];
                    ledger
                        .convert(id, &ConversionRequest::to_temporality(target))
                        .unwrap();
                }
            }
            // Split off 40%.
            4 => {
                if let Some(id) = unit_ids.get(rng.gen_range(0..unit_ids.len().max(1))) {
                    let magnitude = ledger.wallets().get_unit(id).unwrap().magnitude;
                    if magnitude > 1e-3 {
                        ledger.split(id, magnitude * 0.4).unwrap();
                    }
                }
            }
            // Merge the first compatible pair.
            5 => {
                let mut pair = None;
                'outer: for wallet in &wallets {
                    for stratum in strata {
                        let owned: Vec<_> = ledger
                            .wallets()
                            .units_of(wallet)
                            .into_iter()
                            .filter(|u| u.temporality == stratum)
                            .map(|u| u.id.clone())
                            .collect();
                        if owned.len() >= 2 {
                            pair = Some([owned[0].clone(), owned[1].clone()]);
                            break 'outer;
                        }
                    }
                }
                if let Some(pair) = pair {
                    ledger.merge(&pair).unwrap();
                }
            }
            // Time passes.
            6 => {
                ledger.tick(rng.gen_range(0.1..20.0));
            }
            // A quick compute round-trip.
            7 => {
                let requestor = &wallets[rng.gen_range(0..wallets.len())];
                let provider = &wallets[rng.gen_range(0..wallets.len())];
                let job = ledger
                    .submit_compute_job(
                        requestor,
                        JobSpec {
                            kind: "simulation".into(),
                            payload: serde_json::Value::Null,
                            estimated_compute: 1.0,
                            description: None,
                        },
                        rng.gen_range(1.0..20.0),
                        JobOptions::default(),
                    )
                    .unwrap();
                ledger.claim_compute_job(&job.id, provider).unwrap();
                ledger
                    .complete_compute_job(
                        &job.id,
                        provider,
                        JobResult {
                            output: serde_json::Value::Null,
                            actual_compute: 1.0,
                            proof: Some(WorkProof {
                                mode: VerificationMode::Attestation,
                                attestations: vec![],
                                tee_attestation: None,
                                reproducibility: None,
                            }),
                        },
                    )
                    .unwrap();
            }
            _ => unreachable!(),
        }

        if step % 50 == 0 {
            check_invariants(&ledger, seed, step);
        }
    }

    check_invariants(&ledger, seed, STEPS);
    assert!(ledger.wallets().unit_count() > 0);
    assert!(ledger.transactions().len() > STEPS / 8);

    // The survivors still round-trip.
    let snapshot = ledger.snapshot();
    let restored = Ledger::restore(snapshot.clone()).unwrap();
    assert_eq!(restored.snapshot(), snapshot, "seed {seed}: restore drifted");
}

#[test]
fn random_sequences_preserve_invariants_seed_1() {
    run_sequence(0xC0FFEE);
}

#[test]
fn random_sequences_preserve_invariants_seed_2() {
    run_sequence(7);
}

#[test]
fn random_sequences_preserve_invariants_seed_3() {
    run_sequence(20_260_801);
}
