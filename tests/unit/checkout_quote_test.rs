use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use gatepass::core::Currency;
use gatepass::modules::checkout::models::{Discount, DiscountKind};
use gatepass::modules::fees::models::{FeeBearer, FeeRates};
use gatepass::modules::fees::services::{FeeCalculator, RateResolver};

/// End-to-end pricing pipeline tests: discount application feeding the
/// resolver/calculator the way the checkout quote does. Discounts reduce
/// the ticket subtotal before fees are computed; add-ons are never
/// discounted.

fn defaults() -> FeeRates {
    FeeRates::new(dec!(0.05), dec!(0.02)).unwrap()
}

fn quote(
    ticket_subtotal: Decimal,
    addon_subtotal: Decimal,
    discount: Option<&Discount>,
    bearer: FeeBearer,
    organizer_override: Option<Decimal>,
    event_override: Option<Decimal>,
) -> gatepass::modules::fees::services::FeeBreakdown {
    let discount_total = discount
        .map(|d| d.amount_off(ticket_subtotal, Currency::NGN))
        .unwrap_or(Decimal::ZERO);

    let rates = RateResolver::new()
        .resolve(&defaults(), organizer_override, event_override)
        .unwrap();

    FeeCalculator::new()
        .calculate(
            ticket_subtotal - discount_total,
            addon_subtotal,
            bearer,
            &rates,
            Currency::NGN,
        )
        .unwrap()
}

#[test]
fn percent_discount_reduces_fee_base() {
    let discount = Discount::new(
        "event-1".to_string(),
        "EARLY10".to_string(),
        DiscountKind::Percent,
        dec!(0.10),
        None,
        None,
    )
    .unwrap();

    // 1000 tickets, 10% off => 900 fee base; 5% + 2% on 900 = 63
    let breakdown = quote(
        dec!(1000),
        Decimal::ZERO,
        Some(&discount),
        FeeBearer::Customer,
        None,
        None,
    );

    assert_eq!(breakdown.subtotal, dec!(900));
    assert_eq!(breakdown.platform_fee, dec!(45));
    assert_eq!(breakdown.processor_fee, dec!(18));
    assert_eq!(breakdown.customer_total, dec!(963));
}

#[test]
fn addons_are_not_discounted() {
    let discount = Discount::new(
        "event-1".to_string(),
        "HALF".to_string(),
        DiscountKind::Percent,
        dec!(0.50),
        None,
        None,
    )
    .unwrap();

    // 50% off tickets only: 200 tickets -> 100, add-ons stay 80
    let breakdown = quote(
        dec!(200),
        dec!(80),
        Some(&discount),
        FeeBearer::Customer,
        None,
        None,
    );

    assert_eq!(breakdown.ticket_subtotal, dec!(100));
    assert_eq!(breakdown.addon_subtotal, dec!(80));
    assert_eq!(breakdown.subtotal, dec!(180));
}

#[test]
fn fixed_discount_cannot_exceed_ticket_subtotal() {
    let discount = Discount::new(
        "event-1".to_string(),
        "FLAT500".to_string(),
        DiscountKind::Fixed,
        dec!(500),
        None,
        None,
    )
    .unwrap();

    // Tickets are only 120; the discount caps there and add-ons still charge
    let breakdown = quote(
        dec!(120),
        dec!(40),
        Some(&discount),
        FeeBearer::Customer,
        None,
        None,
    );

    assert_eq!(breakdown.ticket_subtotal, Decimal::ZERO);
    assert_eq!(breakdown.addon_subtotal, dec!(40));
    assert!(breakdown.customer_total > Decimal::ZERO);
}

#[test]
fn event_override_flows_through_quote() {
    // Event negotiated 3% platform rate; organizer default would be 5%
    let breakdown = quote(
        dec!(1000),
        Decimal::ZERO,
        None,
        FeeBearer::Customer,
        Some(dec!(0.04)),
        Some(dec!(0.03)),
    );

    assert_eq!(breakdown.platform_fee, dec!(30));
    // Processor rate is not overridable
    assert_eq!(breakdown.processor_fee, dec!(20));
}

#[test]
fn organizer_borne_fees_keep_guest_price_at_face_value() {
    let discount = Discount::new(
        "event-1".to_string(),
        "EARLY10".to_string(),
        DiscountKind::Percent,
        dec!(0.10),
        None,
        None,
    )
    .unwrap();

    let breakdown = quote(
        dec!(1000),
        Decimal::ZERO,
        Some(&discount),
        FeeBearer::Organizer,
        None,
        None,
    );

    assert_eq!(breakdown.customer_total, dec!(900));
    assert_eq!(breakdown.organizer_net, dec!(837));
}
