use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use gatepass::core::Currency;
use gatepass::modules::fees::models::{EffectiveRates, FeeBearer, FeeRates, RateSource};
use gatepass::modules::fees::services::{FeeCalculator, RateResolver};
use gatepass::modules::payouts::services::reconciliation;
use gatepass::modules::transactions::models::{Transaction, TransactionStatus};

/// Settlement must be a pure function of each transaction's stored snapshot.
/// These tests pin the regression where a zero/absent snapshot was patched
/// over with whatever rate configuration was current at read time.

fn record_sale(
    subtotal: Decimal,
    bearer: FeeBearer,
    rates: &EffectiveRates,
    reference: &str,
) -> Transaction {
    let breakdown = FeeCalculator::new()
        .calculate(subtotal, Decimal::ZERO, bearer, rates, Currency::NGN)
        .unwrap();

    Transaction::from_breakdown(
        "res-1".to_string(),
        "event-1".to_string(),
        "org-1".to_string(),
        reference.to_string(),
        &breakdown,
        rates,
        bearer,
        Currency::NGN,
        TransactionStatus::Success,
    )
    .unwrap()
}

#[test]
fn settlement_ignores_later_rate_changes() {
    // A sale recorded under 5%/2%...
    let old_rates = EffectiveRates {
        platform_percent: dec!(0.05),
        processor_percent: dec!(0.02),
        platform_source: RateSource::PlatformDefault,
    };
    let txn = record_sale(dec!(100), FeeBearer::Customer, &old_rates, "ps_old");
    let before = reconciliation::settle(&txn).unwrap();

    // ...then the platform re-resolves with doubled defaults, as would
    // happen after a pricing change
    let new_defaults = FeeRates::new(dec!(0.10), dec!(0.04)).unwrap();
    let new_rates = RateResolver::new()
        .resolve(&new_defaults, None, None)
        .unwrap();
    assert_ne!(new_rates.platform_percent, txn.applied_platform_rate);

    // The settled amounts come from the snapshot, byte for byte
    let after = reconciliation::settle(&txn).unwrap();
    assert_eq!(before, after);
    assert_eq!(after.platform_fee, dec!(5));
    assert_eq!(after.processor_fee, dec!(2));
    assert_eq!(after.net, dec!(100));
}

#[test]
fn zero_fee_snapshot_is_not_backfilled() {
    // A fee-waived sale: snapshot rates and fees are genuinely zero
    let waived = EffectiveRates {
        platform_percent: Decimal::ZERO,
        processor_percent: Decimal::ZERO,
        platform_source: RateSource::EventOverride,
    };
    let txn = record_sale(dec!(250), FeeBearer::Customer, &waived, "ps_waived");

    let settlement = reconciliation::settle(&txn).unwrap();

    // The zero snapshot settles as zero; no default rate sneaks back in
    assert_eq!(settlement.platform_fee, Decimal::ZERO);
    assert_eq!(settlement.processor_fee, Decimal::ZERO);
    assert_eq!(settlement.net, settlement.gross);
}

#[test]
fn summary_matches_sum_of_settlements() {
    let rates = EffectiveRates {
        platform_percent: dec!(0.05),
        processor_percent: dec!(0.015),
        platform_source: RateSource::PlatformDefault,
    };

    let txns = vec![
        record_sale(dec!(100), FeeBearer::Customer, &rates, "ps_1"),
        record_sale(dec!(2500.50), FeeBearer::Organizer, &rates, "ps_2"),
        record_sale(dec!(80), FeeBearer::Customer, &rates, "ps_3"),
    ];

    let summary = reconciliation::summarize(&txns).unwrap();

    let mut gross = Decimal::ZERO;
    let mut net = Decimal::ZERO;
    for txn in &txns {
        let settlement = reconciliation::settle(txn).unwrap();
        gross += settlement.gross;
        net += settlement.net;
    }

    assert_eq!(summary.transaction_count, 3);
    assert_eq!(summary.gross, gross);
    assert_eq!(summary.net, net);
    assert_eq!(
        summary.gross - summary.platform_fees - summary.processor_fees,
        summary.net
    );
}

#[test]
fn refunded_and_failed_transactions_do_not_settle() {
    let rates = EffectiveRates {
        platform_percent: dec!(0.05),
        processor_percent: dec!(0.02),
        platform_source: RateSource::PlatformDefault,
    };

    let mut refunded = record_sale(dec!(100), FeeBearer::Customer, &rates, "ps_refunded");
    refunded.update_status(TransactionStatus::Refunded).unwrap();

    assert!(reconciliation::settle(&refunded).is_err());

    let summary = reconciliation::summarize(&[refunded]).unwrap();
    assert_eq!(summary.transaction_count, 0);
    assert_eq!(summary.net, Decimal::ZERO);
}

proptest! {
    #[test]
    fn net_is_gross_minus_stored_fees(
        subtotal_cents in 1u64..100_000_000u64,
        platform_bp in 0u32..4_000u32,
        processor_bp in 0u32..2_000u32,
        bearer in prop::sample::select(vec![FeeBearer::Customer, FeeBearer::Organizer]),
    ) {
        let rates = EffectiveRates {
            platform_percent: Decimal::from(platform_bp) / Decimal::from(10_000),
            processor_percent: Decimal::from(processor_bp) / Decimal::from(10_000),
            platform_source: RateSource::PlatformDefault,
        };
        let subtotal = Decimal::from(subtotal_cents) / Decimal::from(100);

        let breakdown = FeeCalculator::new()
            .calculate(subtotal, Decimal::ZERO, bearer, &rates, Currency::NGN);

        // Organizer-borne fees can exceed a tiny subtotal; skip rejected carts
        prop_assume!(breakdown.is_ok());

        let txn = Transaction::from_breakdown(
            "res-1".to_string(),
            "event-1".to_string(),
            "org-1".to_string(),
            format!("ps_{}_{}", subtotal_cents, platform_bp),
            &breakdown.unwrap(),
            &rates,
            bearer,
            Currency::NGN,
            TransactionStatus::Success,
        )
        .unwrap();

        let settlement = reconciliation::settle(&txn).unwrap();

        prop_assert_eq!(
            settlement.net,
            settlement.gross - settlement.platform_fee - settlement.processor_fee
        );
        prop_assert_eq!(settlement.gross, txn.amount);
        prop_assert_eq!(settlement.platform_fee, txn.platform_fee);
        prop_assert_eq!(settlement.processor_fee, txn.processor_fee);
        prop_assert!(settlement.net >= Decimal::ZERO);
    }
}
