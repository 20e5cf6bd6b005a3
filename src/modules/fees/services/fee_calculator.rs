use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Currency, Result};
use crate::modules::fees::models::{EffectiveRates, FeeBearer};

/// Complete fee breakdown for a sale.
///
/// Every amount is rounded to the currency scale. The identity
/// `customer_total - platform_fee - processor_fee == organizer_net` holds for
/// both bearer modes, which is what lets settlement derive the net payout
/// from the gross charge and the two stored fees alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub ticket_subtotal: Decimal,
    pub addon_subtotal: Decimal,
    pub subtotal: Decimal,
    pub platform_fee: Decimal,
    pub processor_fee: Decimal,
    /// What the guest is charged
    pub customer_total: Decimal,
    /// What the organizer is owed
    pub organizer_net: Decimal,
}

/// Computes platform/processor fees and the resulting charge and payout
/// amounts for a cart.
pub struct FeeCalculator;

impl FeeCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Calculate the fee breakdown for a sale.
    ///
    /// Bearer semantics:
    /// * `Customer` - fees are added on top; the guest pays
    ///   `subtotal + fees` and the organizer keeps the full subtotal.
    /// * `Organizer` - the guest pays exactly the subtotal and fees are
    ///   deducted from the organizer's payout.
    pub fn calculate(
        &self,
        ticket_subtotal: Decimal,
        addon_subtotal: Decimal,
        bearer: FeeBearer,
        rates: &EffectiveRates,
        currency: Currency,
    ) -> Result<FeeBreakdown> {
        if ticket_subtotal < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Ticket subtotal cannot be negative, got {}",
                ticket_subtotal
            )));
        }
        if addon_subtotal < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Add-on subtotal cannot be negative, got {}",
                addon_subtotal
            )));
        }

        let subtotal = currency.round(ticket_subtotal + addon_subtotal);

        let platform_fee = currency.round(subtotal * rates.platform_percent);
        let processor_fee = currency.round(subtotal * rates.processor_percent);
        let fees = platform_fee + processor_fee;

        let (customer_total, organizer_net) = match bearer {
            FeeBearer::Customer => (subtotal + fees, subtotal),
            FeeBearer::Organizer => {
                if fees > subtotal {
                    return Err(AppError::validation(format!(
                        "Fees {} exceed subtotal {}; organizer-borne fees cannot produce a negative payout",
                        fees, subtotal
                    )));
                }
                (subtotal, subtotal - fees)
            }
        };

        Ok(FeeBreakdown {
            ticket_subtotal,
            addon_subtotal,
            subtotal,
            platform_fee,
            processor_fee,
            customer_total,
            organizer_net,
        })
    }
}

impl Default for FeeCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::fees::models::RateSource;

    fn rates(platform: Decimal, processor: Decimal) -> EffectiveRates {
        EffectiveRates {
            platform_percent: platform,
            processor_percent: processor,
            platform_source: RateSource::PlatformDefault,
        }
    }

    #[test]
    fn test_customer_bearer_adds_fees_on_top() {
        // subtotal 100, platform 5%, processor 2% => fees 7, total 107
        let calc = FeeCalculator::new();
        let breakdown = calc
            .calculate(
                Decimal::from(100),
                Decimal::ZERO,
                FeeBearer::Customer,
                &rates(Decimal::new(5, 2), Decimal::new(2, 2)),
                Currency::NGN,
            )
            .unwrap();

        assert_eq!(breakdown.platform_fee, Decimal::from(5));
        assert_eq!(breakdown.processor_fee, Decimal::from(2));
        assert_eq!(breakdown.customer_total, Decimal::from(107));
        assert_eq!(breakdown.organizer_net, Decimal::from(100));
    }

    #[test]
    fn test_organizer_bearer_deducts_fees() {
        // Same inputs, organizer bears: guest pays 100, organizer nets 93
        let calc = FeeCalculator::new();
        let breakdown = calc
            .calculate(
                Decimal::from(100),
                Decimal::ZERO,
                FeeBearer::Organizer,
                &rates(Decimal::new(5, 2), Decimal::new(2, 2)),
                Currency::NGN,
            )
            .unwrap();

        assert_eq!(breakdown.customer_total, Decimal::from(100));
        assert_eq!(breakdown.organizer_net, Decimal::from(93));
    }

    #[test]
    fn test_addons_included_in_fee_base() {
        let calc = FeeCalculator::new();
        let breakdown = calc
            .calculate(
                Decimal::from(80),
                Decimal::from(20),
                FeeBearer::Customer,
                &rates(Decimal::new(5, 2), Decimal::new(2, 2)),
                Currency::NGN,
            )
            .unwrap();

        assert_eq!(breakdown.subtotal, Decimal::from(100));
        assert_eq!(breakdown.customer_total, Decimal::from(107));
    }

    #[test]
    fn test_fees_rounded_to_currency_scale() {
        // 1,234.56 * 1.5% = 18.5184 => 18.52 at NGN scale
        let calc = FeeCalculator::new();
        let breakdown = calc
            .calculate(
                Decimal::new(123456, 2),
                Decimal::ZERO,
                FeeBearer::Customer,
                &rates(Decimal::new(15, 3), Decimal::ZERO),
                Currency::NGN,
            )
            .unwrap();

        assert_eq!(breakdown.platform_fee, Decimal::new(1852, 2));
        assert_eq!(breakdown.platform_fee.scale(), 2);
    }

    #[test]
    fn test_zero_decimal_currency_rounds_fees_whole() {
        let calc = FeeCalculator::new();
        let breakdown = calc
            .calculate(
                Decimal::from(10_001),
                Decimal::ZERO,
                FeeBearer::Customer,
                &rates(Decimal::new(5, 2), Decimal::ZERO),
                Currency::XOF,
            )
            .unwrap();

        // 10,001 * 5% = 500.05 => 500 at XOF scale
        assert_eq!(breakdown.platform_fee, Decimal::from(500));
    }

    #[test]
    fn test_zero_rates_charge_face_value() {
        let calc = FeeCalculator::new();
        let breakdown = calc
            .calculate(
                Decimal::from(250),
                Decimal::ZERO,
                FeeBearer::Customer,
                &rates(Decimal::ZERO, Decimal::ZERO),
                Currency::NGN,
            )
            .unwrap();

        assert_eq!(breakdown.customer_total, Decimal::from(250));
        assert_eq!(breakdown.organizer_net, Decimal::from(250));
    }

    #[test]
    fn test_negative_subtotal_rejected() {
        let calc = FeeCalculator::new();
        assert!(calc
            .calculate(
                Decimal::from(-1),
                Decimal::ZERO,
                FeeBearer::Customer,
                &rates(Decimal::new(5, 2), Decimal::ZERO),
                Currency::NGN,
            )
            .is_err());
    }

    #[test]
    fn test_settlement_identity_holds_for_both_bearers() {
        let calc = FeeCalculator::new();
        for bearer in [FeeBearer::Customer, FeeBearer::Organizer] {
            let breakdown = calc
                .calculate(
                    Decimal::new(123456, 2),
                    Decimal::new(7890, 2),
                    bearer,
                    &rates(Decimal::new(5, 2), Decimal::new(15, 3)),
                    Currency::NGN,
                )
                .unwrap();

            assert_eq!(
                breakdown.customer_total - breakdown.platform_fee - breakdown.processor_fee,
                breakdown.organizer_net
            );
        }
    }
}
