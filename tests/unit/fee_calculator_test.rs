use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use gatepass::core::Currency;
use gatepass::modules::fees::models::{EffectiveRates, FeeBearer, RateSource};
use gatepass::modules::fees::services::FeeCalculator;

/// Property-based tests for the fee calculator
///
/// Validates the bearer semantics and rounding invariants:
/// - bearer = customer: customer_total >= subtotal
/// - bearer = organizer: customer_total == subtotal
/// - platform_fee + processor_fee <= customer_total
/// - customer_total - fees == organizer_net (both bearers)

fn rates(platform_bp: u32, processor_bp: u32) -> EffectiveRates {
    EffectiveRates {
        platform_percent: Decimal::from(platform_bp) / Decimal::from(10_000),
        processor_percent: Decimal::from(processor_bp) / Decimal::from(10_000),
        platform_source: RateSource::PlatformDefault,
    }
}

proptest! {
    #[test]
    fn customer_bearer_never_charges_below_subtotal(
        ticket_cents in 0u64..100_000_000u64,
        addon_cents in 0u64..10_000_000u64,
        platform_bp in 0u32..5_000u32,
        processor_bp in 0u32..2_000u32,
    ) {
        let calc = FeeCalculator::new();
        let ticket = Decimal::from(ticket_cents) / Decimal::from(100);
        let addon = Decimal::from(addon_cents) / Decimal::from(100);

        let breakdown = calc
            .calculate(
                ticket,
                addon,
                FeeBearer::Customer,
                &rates(platform_bp, processor_bp),
                Currency::NGN,
            )
            .unwrap();

        prop_assert!(breakdown.customer_total >= breakdown.subtotal);
        prop_assert_eq!(breakdown.organizer_net, breakdown.subtotal);
    }

    #[test]
    fn organizer_bearer_charges_exactly_subtotal(
        ticket_cents in 0u64..100_000_000u64,
        addon_cents in 0u64..10_000_000u64,
        platform_bp in 0u32..4_000u32,
        processor_bp in 0u32..2_000u32,
    ) {
        let calc = FeeCalculator::new();
        let ticket = Decimal::from(ticket_cents) / Decimal::from(100);
        let addon = Decimal::from(addon_cents) / Decimal::from(100);

        let breakdown = calc
            .calculate(
                ticket,
                addon,
                FeeBearer::Organizer,
                &rates(platform_bp, processor_bp),
                Currency::NGN,
            )
            .unwrap();

        prop_assert_eq!(breakdown.customer_total, breakdown.subtotal);
        prop_assert!(breakdown.organizer_net <= breakdown.subtotal);
    }

    #[test]
    fn fees_never_exceed_customer_total(
        ticket_cents in 0u64..100_000_000u64,
        platform_bp in 0u32..5_000u32,
        processor_bp in 0u32..2_000u32,
        bearer in prop::sample::select(vec![FeeBearer::Customer, FeeBearer::Organizer]),
    ) {
        let calc = FeeCalculator::new();
        let ticket = Decimal::from(ticket_cents) / Decimal::from(100);

        // Organizer-borne fees can exceed a tiny subtotal at high rates,
        // which the calculator rejects; only successful breakdowns are
        // constrained here.
        if let Ok(breakdown) = calc.calculate(
            ticket,
            Decimal::ZERO,
            bearer,
            &rates(platform_bp, processor_bp),
            Currency::NGN,
        ) {
            prop_assert!(
                breakdown.platform_fee + breakdown.processor_fee <= breakdown.customer_total
            );
        }
    }

    #[test]
    fn settlement_identity_holds(
        ticket_cents in 0u64..100_000_000u64,
        addon_cents in 0u64..10_000_000u64,
        platform_bp in 0u32..4_000u32,
        processor_bp in 0u32..2_000u32,
        bearer in prop::sample::select(vec![FeeBearer::Customer, FeeBearer::Organizer]),
    ) {
        let calc = FeeCalculator::new();
        let ticket = Decimal::from(ticket_cents) / Decimal::from(100);
        let addon = Decimal::from(addon_cents) / Decimal::from(100);

        if let Ok(breakdown) = calc.calculate(
            ticket,
            addon,
            bearer,
            &rates(platform_bp, processor_bp),
            Currency::NGN,
        ) {
            prop_assert_eq!(
                breakdown.customer_total - breakdown.platform_fee - breakdown.processor_fee,
                breakdown.organizer_net
            );
        }
    }

    #[test]
    fn fees_are_rounded_to_currency_scale(
        ticket_cents in 1u64..100_000_000u64,
        platform_bp in 1u32..4_000u32,
    ) {
        let calc = FeeCalculator::new();
        let ticket = Decimal::from(ticket_cents) / Decimal::from(100);

        let breakdown = calc
            .calculate(
                ticket,
                Decimal::ZERO,
                FeeBearer::Customer,
                &rates(platform_bp, 0),
                Currency::NGN,
            )
            .unwrap();

        prop_assert!(breakdown.platform_fee.scale() <= Currency::NGN.scale());
        prop_assert!(breakdown.customer_total.scale() <= Currency::NGN.scale());
    }

    #[test]
    fn calculation_is_idempotent(
        ticket_cents in 0u64..100_000_000u64,
        platform_bp in 0u32..4_000u32,
        processor_bp in 0u32..2_000u32,
    ) {
        let calc = FeeCalculator::new();
        let ticket = Decimal::from(ticket_cents) / Decimal::from(100);
        let r = rates(platform_bp, processor_bp);

        let first = calc
            .calculate(ticket, Decimal::ZERO, FeeBearer::Customer, &r, Currency::NGN)
            .unwrap();
        let second = calc
            .calculate(ticket, Decimal::ZERO, FeeBearer::Customer, &r, Currency::NGN)
            .unwrap();

        prop_assert_eq!(first, second);
    }
}

#[test]
fn worked_example_from_pricing_docs() {
    // subtotal 100, platform 5%, processor 2%
    let calc = FeeCalculator::new();
    let r = EffectiveRates {
        platform_percent: dec!(0.05),
        processor_percent: dec!(0.02),
        platform_source: RateSource::PlatformDefault,
    };

    let customer = calc
        .calculate(dec!(100), Decimal::ZERO, FeeBearer::Customer, &r, Currency::NGN)
        .unwrap();
    assert_eq!(
        customer.platform_fee + customer.processor_fee,
        dec!(7),
        "customer bearer: fees should be 7"
    );
    assert_eq!(customer.customer_total, dec!(107));

    let organizer = calc
        .calculate(dec!(100), Decimal::ZERO, FeeBearer::Organizer, &r, Currency::NGN)
        .unwrap();
    assert_eq!(organizer.customer_total, dec!(100));
    assert_eq!(organizer.organizer_net, dec!(93));
}

#[test]
fn organizer_bearer_rejects_fees_above_subtotal() {
    // 99% combined rates against a tiny subtotal still fits, but rates
    // summing past 100% cannot be organizer-borne
    let calc = FeeCalculator::new();
    let r = EffectiveRates {
        platform_percent: dec!(0.60),
        processor_percent: dec!(0.50),
        platform_source: RateSource::EventOverride,
    };

    let result = calc.calculate(dec!(100), Decimal::ZERO, FeeBearer::Organizer, &r, Currency::NGN);
    assert!(result.is_err());

    // The same rates are fine when the customer bears them
    let customer = calc
        .calculate(dec!(100), Decimal::ZERO, FeeBearer::Customer, &r, Currency::NGN)
        .unwrap();
    assert_eq!(customer.customer_total, dec!(210));
}

#[test]
fn zero_decimal_currency_produces_whole_fees() {
    let calc = FeeCalculator::new();
    let r = EffectiveRates {
        platform_percent: dec!(0.05),
        processor_percent: dec!(0.015),
        platform_source: RateSource::PlatformDefault,
    };

    let breakdown = calc
        .calculate(dec!(10001), Decimal::ZERO, FeeBearer::Customer, &r, Currency::XOF)
        .unwrap();

    assert_eq!(breakdown.platform_fee.scale(), 0);
    assert_eq!(breakdown.processor_fee.scale(), 0);
    assert_eq!(breakdown.customer_total.scale(), 0);
}
