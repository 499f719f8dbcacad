//! Invariant checks after mixed operation sequences, plus the round-trip
//! and idempotence laws: snapshot/restore equality, the no-op conversion,
//! and preview/convert agreement.
//!
//! Run with:
//!   cargo test -p strata-ledger --test invariants

use strata_compute::{JobOptions, JobResult, JobSpec, JobStatus, VerificationMode, WorkProof};
use strata_convert::{ConversionRequest, LocalityChange, PurposeChange};
use strata_core::error::LedgerError;
use strata_core::types::WalletId;
use strata_core::unit::Temporality;
use strata_ledger::Ledger;

const EPS: f64 = 1e-9;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Assert every quantified invariant at once.
fn assert_invariants(ledger: &Ledger) {
    // Supply conservation: minted − burned == supply.
    let pool = ledger.pool();
    let tolerance = 1e-6 * pool.total_minted().max(1.0);
    assert!(
        (pool.current_supply() - (pool.total_minted() - pool.total_burned())).abs() <= tolerance,
        "supply must equal minted minus burned"
    );

    // Wallet-sum equality across units, dividend pool, and funds.
    assert!(ledger.supply_identity_holds(), "supply identity must hold");

    // Non-negativity everywhere.
    for unit in ledger.wallets().units() {
        assert!(unit.magnitude >= 0.0, "unit magnitude must be non-negative");
        assert!(
            unit.provenance_is_monotonic(),
            "provenance timestamps must be non-decreasing"
        );
        // Purpose/locality closure.
        for community in &unit.locality {
            assert!(
                ledger.communities().contains(community),
                "every locality id must resolve"
            );
        }
        for purpose in &unit.purpose {
            assert!(
                ledger.purposes().contains(purpose),
                "every purpose id must resolve"
            );
        }
    }
    assert!(ledger.dividend_pool().balance() >= 0.0);
    for fund in ledger.community_funds().funds() {
        assert!(fund.balance >= 0.0, "fund balances must be non-negative");
    }

    // Index consistency.
    assert!(ledger.wallets().index_is_consistent());

    // Funding ratio bound.
    assert!(
        ledger.dividend_pool().total_distributed() <= ledger.dividend_pool().total_collected() + EPS,
        "the pool cannot distribute more than it collected"
    );

    // Job state validity.
    for job in &ledger.compute().export().jobs {
        if job.status == JobStatus::Completed {
            assert!(job.result.is_some(), "a completed job must carry its result");
        }
        if job.status == JobStatus::Claimed {
            assert!(job.provider.is_some(), "a claimed job must name its provider");
        }
    }
}

fn attested_result() -> JobResult {
    JobResult {
        output: serde_json::json!({ "ok": true }),
        actual_compute: 1.0,
        proof: Some(WorkProof {
            mode: VerificationMode::Attestation,
            attestations: vec![],
            tee_attestation: None,
            reproducibility: None,
        }),
    }
}

/// A ledger exercised through every operation family.
fn storm() -> Ledger {
    let mut ledger = Ledger::new();
    let alice = ledger.create_wallet("alice").id;
    let bob = ledger.create_wallet("bob").id;
    let carol = ledger.create_wallet("carol").id;

    let riverside = ledger.create_community("riverside", 0.05).unwrap();
    let gridtown = ledger.create_community("gridtown", 0.10).unwrap();
    let research = ledger.create_purpose("research", None, Some(0.02)).unwrap();

    ledger.join_community(&alice, &riverside.id).unwrap();
    ledger.register_purpose(&bob, &research.id).unwrap();

    // Mints across strata.
    let a1 = ledger.mint(1000.0, &alice, Some("seed".into())).unwrap();
    let a2 = ledger.mint(500.0, &alice, None).unwrap();
    let b1 = ledger.mint(250.0, &bob, None).unwrap();
    let c1 = ledger.mint(100.0, &carol, None).unwrap();

    // A heavyweight conversion: stratum, both localities, purpose, strip.
    ledger
        .convert(
            &a1.id,
            &ConversionRequest {
                target_temporality: Some(Temporality::T1),
                target_locality: Some(LocalityChange {
                    add: vec![riverside.id.clone(), gridtown.id.clone()],
                    remove: vec![gridtown.id.clone()],
                }),
                target_purpose: Some(PurposeChange {
                    add: vec![research.id.clone()],
                    remove: vec![],
                }),
                strip_reputation: true,
            },
        )
        .unwrap();

    // Growth stratum for bob, transfers, split, merge.
    ledger
        .convert(&b1.id, &ConversionRequest::to_temporality(Temporality::T2))
        .unwrap();
    ledger
        .transfer(&a2.id, &bob, Some(120.0), Some("consulting".into()))
        .unwrap();
    let (carved, remainder) = ledger.split(&c1.id, 40.0).unwrap();
    ledger.merge(&[carved.id.clone(), remainder.id.clone()]).unwrap();

    // Time passes twice, with a conversion in between.
    ledger.tick(365.0);
    ledger.tick(30.5);

    // Compute lifecycle: one completed, one cancelled, one expired.
    let spec = |kind: &str| JobSpec {
        kind: kind.into(),
        payload: serde_json::json!({ "n": 1 }),
        estimated_compute: 10.0,
        description: None,
    };
    let done = ledger
        .submit_compute_job(&carol, spec("simulation"), 40.0, JobOptions::default())
        .unwrap();
    ledger.claim_compute_job(&done.id, &bob).unwrap();
    ledger.complete_compute_job(&done.id, &bob, attested_result()).unwrap();

    let dropped = ledger
        .submit_compute_job(&carol, spec("render"), 5.0, JobOptions::default())
        .unwrap();
    ledger.cancel_compute_job(&dropped.id, &carol).unwrap();

    ledger
        .submit_compute_job(&carol, spec("index"), 5.0, JobOptions::default())
        .unwrap();
    ledger.tick(2.0);
    ledger.expire_stale_jobs();

    ledger
}

#[test]
fn invariants_hold_after_a_mixed_operation_storm() {
    init_tracing();
    let ledger = storm();
    assert_invariants(&ledger);

    // Job state validity over the full job set.
    let stats = ledger.get_compute_stats();
    assert_eq!(stats.completed_jobs, 1);
    assert_eq!(stats.cancelled_jobs, 1);
    assert_eq!(stats.expired_jobs, 1);
    assert_eq!(stats.total_jobs, 3);
}

#[test]
fn snapshot_restore_reproduces_state_and_behavior() {
    init_tracing();
    let ledger = storm();
    let snapshot = ledger.snapshot();

    // JSON round-trip is lossless.
    let json = snapshot.to_json().unwrap();
    let reparsed = strata_ledger::Snapshot::from_json(&json).unwrap();
    assert_eq!(snapshot, reparsed);

    // Restored state is deep-equal.
    let mut restored = Ledger::restore(reparsed).unwrap();
    assert_eq!(restored.snapshot(), snapshot);
    assert_eq!(restored.status(), ledger.status());
    assert_invariants(&restored);

    // And behaves: a later mint and tick work against restored state.
    let dana = restored.create_wallet("dana").id;
    restored.mint(10.0, &dana, None).unwrap();
    restored.tick(1.0);
    assert_invariants(&restored);
}

#[test]
fn no_op_conversion_renames_without_fees() {
    init_tracing();
    let mut ledger = Ledger::new();
    let alice = ledger.create_wallet("alice").id;
    let minted = ledger.mint(100.0, &alice, None).unwrap();

    let request = ConversionRequest {
        target_temporality: Some(Temporality::T0),
        target_locality: Some(LocalityChange::default()),
        target_purpose: Some(PurposeChange::default()),
        strip_reputation: false,
    };
    let converted = ledger.convert(&minted.id, &request).unwrap();

    assert_eq!(converted.magnitude, 100.0);
    assert_ne!(converted.id, minted.id);
    assert_eq!(converted.provenance.len(), minted.provenance.len() + 1);
    assert_eq!(ledger.pool().total_burned(), 0.0);
    assert!(ledger.wallets().get_unit(&minted.id).is_none());
}

#[test]
fn preview_agrees_with_convert() {
    init_tracing();
    let mut ledger = Ledger::new();
    let alice = ledger.create_wallet("alice").id;
    let community = ledger.create_community("riverside", 0.07).unwrap();
    let minted = ledger.mint(400.0, &alice, None).unwrap();

    let joined = ledger
        .convert(
            &minted.id,
            &ConversionRequest {
                target_locality: Some(LocalityChange {
                    add: vec![community.id.clone()],
                    remove: vec![],
                }),
                ..Default::default()
            },
        )
        .unwrap();

    let request = ConversionRequest {
        target_temporality: Some(Temporality::T1),
        target_locality: Some(LocalityChange {
            add: vec![],
            remove: vec![community.id.clone()],
        }),
        target_purpose: None,
        strip_reputation: true,
    };
    let preview = ledger.preview_conversion(&joined.id, &request).unwrap();
    let converted = ledger.convert(&joined.id, &request).unwrap();

    assert!((preview.new_magnitude - converted.magnitude).abs() < EPS);
    assert_eq!(preview.exit_fees.len(), 1);
    assert!(ledger.supply_identity_holds());
}

#[test]
fn transfer_rejects_overdraw_and_splits_partials() {
    init_tracing();
    let mut ledger = Ledger::new();
    let alice = ledger.create_wallet("alice").id;
    let bob = ledger.create_wallet("bob").id;
    let minted = ledger.mint(100.0, &alice, None).unwrap();

    assert!(matches!(
        ledger.transfer(&minted.id, &bob, Some(150.0), None),
        Err(LedgerError::InsufficientBalance { .. })
    ));
    assert!(matches!(
        ledger.transfer(&minted.id, &WalletId::generate(), None, None),
        Err(LedgerError::WalletNotFound(_))
    ));

    let outcome = ledger.transfer(&minted.id, &bob, Some(30.0), None).unwrap();
    assert_eq!(outcome.unit.wallet_id, bob);
    assert_eq!(outcome.unit.magnitude, 30.0);
    let change = outcome.change_unit.expect("partial leaves change");
    assert_eq!(change.wallet_id, alice);
    assert_eq!(change.magnitude, 70.0);
    assert!(ledger.wallets().get_unit(&minted.id).is_none(), "parent retired");

    // Gifted without a note, Earned with one.
    assert_eq!(
        outcome.unit.provenance.last().unwrap().kind,
        strata_core::unit::ProvenanceKind::Gifted
    );
    let earned = ledger
        .transfer(&change.id, &bob, None, Some("invoice 7".into()))
        .unwrap();
    assert_eq!(
        earned.unit.provenance.last().unwrap().kind,
        strata_core::unit::ProvenanceKind::Earned
    );
    assert!(ledger.supply_identity_holds());
}

#[test]
fn merge_settles_sources_against_the_pool_first() {
    init_tracing();
    let mut ledger = Ledger::new();
    let alice = ledger.create_wallet("alice").id;
    let a = ledger.mint(600.0, &alice, None).unwrap();
    let b = ledger.mint(400.0, &alice, None).unwrap();

    // Let a year of demurrage accrue, then merge without ticking first.
    ledger.advance_time(strata_core::constants::MS_PER_YEAR);
    let merged = ledger.merge(&[a.id.clone(), b.id.clone()]).unwrap();

    let expected = 1000.0 * (-0.02f64).exp();
    assert!((merged.magnitude - expected).abs() < 1e-6, "sources decay before merging");
    assert!((ledger.dividend_pool().balance() - (1000.0 - expected)).abs() < 1e-6);
    assert_eq!(merged.last_tick_at, ledger.current_time());
    assert!(ledger.supply_identity_holds());
}

#[test]
fn merge_rejects_incompatible_sources_without_side_effects() {
    init_tracing();
    let mut ledger = Ledger::new();
    let alice = ledger.create_wallet("alice").id;
    let a = ledger.mint(600.0, &alice, None).unwrap();
    let seed = ledger.mint(400.0, &alice, None).unwrap();
    let b = ledger
        .convert(&seed.id, &ConversionRequest::to_temporality(Temporality::T2))
        .unwrap();

    ledger.advance_time(strata_core::constants::MS_PER_YEAR);
    let before = ledger.dividend_pool().balance();
    assert!(matches!(
        ledger.merge(&[a.id.clone(), b.id.clone()]),
        Err(LedgerError::MergeIncompatibleDimension(_))
    ));
    assert_eq!(
        ledger.dividend_pool().balance(),
        before,
        "a rejected merge must not settle anything"
    );
    assert!(ledger.wallets().get_unit(&a.id).is_some());
    assert!(ledger.wallets().get_unit(&b.id).is_some());
}

#[test]
fn fund_disbursement_returns_value_to_circulation() {
    init_tracing();
    let mut ledger = Ledger::new();
    let alice = ledger.create_wallet("alice").id;
    let community = ledger.create_community("riverside", 0.10).unwrap();
    let minted = ledger.mint(200.0, &alice, None).unwrap();

    let joined = ledger
        .convert(
            &minted.id,
            &ConversionRequest {
                target_locality: Some(LocalityChange {
                    add: vec![community.id.clone()],
                    remove: vec![],
                }),
                ..Default::default()
            },
        )
        .unwrap();
    ledger
        .convert(
            &joined.id,
            &ConversionRequest {
                target_locality: Some(LocalityChange {
                    add: vec![],
                    remove: vec![community.id.clone()],
                }),
                ..Default::default()
            },
        )
        .unwrap();

    let fund_before = ledger.community_funds().balance(&community.id);
    assert!(fund_before > 0.0);

    let grant = ledger
        .disburse_community_fund(&community.id, 10.0, &alice, Some("repair grant".into()))
        .unwrap();
    assert_eq!(grant.magnitude, 10.0);
    assert!(grant.locality.contains(&community.id));
    assert!((ledger.community_funds().balance(&community.id) - (fund_before - 10.0)).abs() < EPS);
    assert!(ledger.supply_identity_holds());

    assert!(matches!(
        ledger.disburse_community_fund(&community.id, 1e9, &alice, None),
        Err(LedgerError::InsufficientBalance { .. })
    ));
}
