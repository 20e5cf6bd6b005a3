use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use gatepass::modules::fees::models::{FeeRates, RateSource};
use gatepass::modules::fees::services::RateResolver;

/// Tests for effective-rate resolution precedence:
/// event override > organizer override > platform default.
/// An override set to zero is honored; only an unset override falls
/// through.

fn defaults() -> FeeRates {
    FeeRates::new(dec!(0.04), dec!(0.015)).unwrap()
}

#[test]
fn fixture_event_override_wins_over_everything() {
    let resolver = RateResolver::new();

    let rates = resolver
        .resolve(&defaults(), Some(dec!(0.03)), Some(dec!(0.07)))
        .unwrap();

    assert_eq!(rates.platform_percent, dec!(0.07));
    assert_eq!(rates.platform_source, RateSource::EventOverride);
}

#[test]
fn fixture_organizer_override_wins_over_default() {
    let resolver = RateResolver::new();

    let rates = resolver
        .resolve(&defaults(), Some(dec!(0.03)), None)
        .unwrap();

    assert_eq!(rates.platform_percent, dec!(0.03));
    assert_eq!(rates.platform_source, RateSource::OrganizerOverride);
}

#[test]
fn fixture_default_applies_when_nothing_overrides() {
    let resolver = RateResolver::new();

    let rates = resolver.resolve(&defaults(), None, None).unwrap();

    assert_eq!(rates.platform_percent, dec!(0.04));
    assert_eq!(rates.platform_source, RateSource::PlatformDefault);
}

#[test]
fn processor_rate_always_comes_from_defaults() {
    let resolver = RateResolver::new();

    for (organizer, event) in [
        (None, None),
        (Some(dec!(0.03)), None),
        (Some(dec!(0.03)), Some(dec!(0.07))),
    ] {
        let rates = resolver.resolve(&defaults(), organizer, event).unwrap();
        assert_eq!(rates.processor_percent, dec!(0.015));
    }
}

#[test]
fn zero_override_does_not_fall_through() {
    // A configured zero rate (a fee-waived event) must not be treated as
    // unset and silently replaced with the default.
    let resolver = RateResolver::new();

    let rates = resolver
        .resolve(&defaults(), Some(dec!(0.03)), Some(Decimal::ZERO))
        .unwrap();

    assert_eq!(rates.platform_percent, Decimal::ZERO);
    assert_eq!(rates.platform_source, RateSource::EventOverride);

    let rates = resolver
        .resolve(&defaults(), Some(Decimal::ZERO), None)
        .unwrap();

    assert_eq!(rates.platform_percent, Decimal::ZERO);
    assert_eq!(rates.platform_source, RateSource::OrganizerOverride);
}

proptest! {
    #[test]
    fn resolution_is_idempotent(
        organizer_bp in prop::option::of(0u32..5_000u32),
        event_bp in prop::option::of(0u32..5_000u32),
    ) {
        let resolver = RateResolver::new();
        let organizer = organizer_bp.map(|bp| Decimal::from(bp) / Decimal::from(10_000));
        let event = event_bp.map(|bp| Decimal::from(bp) / Decimal::from(10_000));

        let first = resolver.resolve(&defaults(), organizer, event).unwrap();
        let second = resolver.resolve(&defaults(), organizer, event).unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn resolved_source_matches_precedence(
        organizer_bp in prop::option::of(0u32..5_000u32),
        event_bp in prop::option::of(0u32..5_000u32),
    ) {
        let resolver = RateResolver::new();
        let organizer = organizer_bp.map(|bp| Decimal::from(bp) / Decimal::from(10_000));
        let event = event_bp.map(|bp| Decimal::from(bp) / Decimal::from(10_000));

        let rates = resolver.resolve(&defaults(), organizer, event).unwrap();

        match (event, organizer) {
            (Some(rate), _) => {
                prop_assert_eq!(rates.platform_source, RateSource::EventOverride);
                prop_assert_eq!(rates.platform_percent, rate);
            }
            (None, Some(rate)) => {
                prop_assert_eq!(rates.platform_source, RateSource::OrganizerOverride);
                prop_assert_eq!(rates.platform_percent, rate);
            }
            (None, None) => {
                prop_assert_eq!(rates.platform_source, RateSource::PlatformDefault);
                prop_assert_eq!(rates.platform_percent, defaults().platform_percent);
            }
        }
    }

    #[test]
    fn out_of_range_overrides_are_rejected(
        bad_rate in 10_000u32..50_000u32,
    ) {
        let resolver = RateResolver::new();
        let rate = Decimal::from(bad_rate) / Decimal::from(10_000);

        prop_assert!(resolver.resolve(&defaults(), None, Some(rate)).is_err());
        prop_assert!(resolver.resolve(&defaults(), Some(rate), None).is_err());
    }
}
