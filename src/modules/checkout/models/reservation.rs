use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Currency, Result};
use crate::modules::fees::models::{EffectiveRates, FeeBearer, RateSource};
use crate::modules::fees::services::FeeBreakdown;

/// Reservation status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Inventory held, awaiting payment
    #[serde(rename = "active")]
    Active,

    /// Payment settled; holds converted to sales
    #[serde(rename = "converted")]
    Converted,

    /// Hold lapsed without payment
    #[serde(rename = "expired")]
    Expired,

    /// Abandoned or administratively released
    #[serde(rename = "released")]
    Released,
}

impl Default for ReservationStatus {
    fn default() -> Self {
        ReservationStatus::Active
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationStatus::Active => write!(f, "active"),
            ReservationStatus::Converted => write!(f, "converted"),
            ReservationStatus::Expired => write!(f, "expired"),
            ReservationStatus::Released => write!(f, "released"),
        }
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(ReservationStatus::Active),
            "converted" => Ok(ReservationStatus::Converted),
            "expired" => Ok(ReservationStatus::Expired),
            "released" => Ok(ReservationStatus::Released),
            _ => Err(format!("Invalid reservation status: {}", s)),
        }
    }
}

/// What a reservation line points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
pub enum ItemKind {
    #[serde(rename = "tier")]
    Tier,

    #[serde(rename = "addon")]
    Addon,
}

/// One held line of a reservation
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReservationItem {
    #[serde(skip_deserializing)]
    pub id: Option<String>,

    #[serde(skip_deserializing)]
    pub reservation_id: String,

    pub kind: ItemKind,

    /// Tier or add-on id, depending on `kind`
    pub item_id: String,

    pub quantity: i32,

    /// Unit price frozen when the cart was priced
    pub unit_price: Decimal,

    pub line_total: Decimal,
}

impl ReservationItem {
    pub fn new(
        reservation_id: String,
        kind: ItemKind,
        item_id: String,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<Self> {
        if quantity <= 0 {
            return Err(AppError::validation(format!(
                "Reservation line quantity must be positive, got {}",
                quantity
            )));
        }

        if unit_price < Decimal::ZERO {
            return Err(AppError::validation("Unit price cannot be negative"));
        }

        Ok(Self {
            id: Some(Uuid::new_v4().to_string()),
            reservation_id,
            kind,
            item_id,
            quantity,
            unit_price,
            line_total: unit_price * Decimal::from(quantity),
        })
    }
}

/// A time-boxed hold on inventory, priced at creation.
///
/// The quote (subtotals, discount, fees, rates) is frozen when the
/// reservation is created; that is the amount the gateway charge is
/// initialized with, and the values the transaction snapshot is built from
/// once payment settles.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    #[serde(skip_deserializing)]
    pub id: Option<String>,

    pub event_id: String,

    pub organizer_id: String,

    pub buyer_email: String,

    #[sqlx(try_from = "String")]
    pub currency: Currency,

    pub fee_bearer: FeeBearer,

    pub ticket_subtotal: Decimal,

    pub addon_subtotal: Decimal,

    /// Amount taken off the ticket subtotal by a discount code
    pub discount_total: Decimal,

    /// Discount applied, if any
    pub discount_id: Option<String>,

    pub platform_fee: Decimal,

    pub processor_fee: Decimal,

    pub customer_total: Decimal,

    pub organizer_net: Decimal,

    pub applied_platform_rate: Decimal,

    pub applied_processor_rate: Decimal,

    pub platform_rate_source: RateSource,

    pub status: ReservationStatus,

    /// Set once a gateway charge is initialized
    pub gateway_reference: Option<String>,

    pub expires_at: DateTime<Utc>,

    #[serde(skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_deserializing)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Line items (joined from reservation_items)
    #[sqlx(skip)]
    #[serde(default)]
    pub items: Vec<ReservationItem>,
}

impl Reservation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_id: String,
        organizer_id: String,
        buyer_email: String,
        currency: Currency,
        fee_bearer: FeeBearer,
        breakdown: &FeeBreakdown,
        rates: &EffectiveRates,
        discount_total: Decimal,
        discount_id: Option<String>,
        hold_minutes: i64,
    ) -> Result<Self> {
        if buyer_email.trim().is_empty() || !buyer_email.contains('@') {
            return Err(AppError::validation(format!(
                "Invalid buyer email: {}",
                buyer_email
            )));
        }

        if hold_minutes <= 0 {
            return Err(AppError::validation(
                "Reservation hold must be at least one minute",
            ));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        Ok(Self {
            id: Some(id),
            event_id,
            organizer_id,
            buyer_email,
            currency,
            fee_bearer,
            ticket_subtotal: breakdown.ticket_subtotal,
            addon_subtotal: breakdown.addon_subtotal,
            discount_total,
            discount_id,
            platform_fee: breakdown.platform_fee,
            processor_fee: breakdown.processor_fee,
            customer_total: breakdown.customer_total,
            organizer_net: breakdown.organizer_net,
            applied_platform_rate: rates.platform_percent,
            applied_processor_rate: rates.processor_percent,
            platform_rate_source: rates.platform_source,
            status: ReservationStatus::Active,
            gateway_reference: None,
            expires_at: now + Duration::minutes(hold_minutes),
            created_at: Some(now),
            updated_at: Some(now),
            items: Vec::new(),
        })
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Whether a payment can still be initialized against this hold
    pub fn is_payable(&self) -> bool {
        self.status == ReservationStatus::Active && !self.is_expired()
    }

    /// Rebuild the quote breakdown stored on this reservation
    pub fn quoted_breakdown(&self) -> FeeBreakdown {
        FeeBreakdown {
            ticket_subtotal: self.ticket_subtotal,
            addon_subtotal: self.addon_subtotal,
            subtotal: self.ticket_subtotal + self.addon_subtotal,
            platform_fee: self.platform_fee,
            processor_fee: self.processor_fee,
            customer_total: self.customer_total,
            organizer_net: self.organizer_net,
        }
    }

    /// Rebuild the rate snapshot stored on this reservation
    pub fn quoted_rates(&self) -> EffectiveRates {
        EffectiveRates {
            platform_percent: self.applied_platform_rate,
            processor_percent: self.applied_processor_rate,
            platform_source: self.platform_rate_source,
        }
    }

    pub fn update_status(&mut self, new_status: ReservationStatus) -> Result<()> {
        match (self.status, new_status) {
            (ReservationStatus::Active, ReservationStatus::Converted)
            | (ReservationStatus::Active, ReservationStatus::Expired)
            | (ReservationStatus::Active, ReservationStatus::Released)
            // A payment can land after the sweeper expired the hold
            | (ReservationStatus::Expired, ReservationStatus::Converted) => {
                self.status = new_status;
                self.updated_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(AppError::validation(format!(
                "Invalid reservation status transition from {} to {}",
                self.status, new_status
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown() -> FeeBreakdown {
        FeeBreakdown {
            ticket_subtotal: Decimal::from(100),
            addon_subtotal: Decimal::from(20),
            subtotal: Decimal::from(120),
            platform_fee: Decimal::from(6),
            processor_fee: Decimal::new(24, 1),
            customer_total: Decimal::new(1284, 1),
            organizer_net: Decimal::from(120),
        }
    }

    fn rates() -> EffectiveRates {
        EffectiveRates {
            platform_percent: Decimal::new(5, 2),
            processor_percent: Decimal::new(2, 2),
            platform_source: RateSource::OrganizerOverride,
        }
    }

    fn test_reservation() -> Reservation {
        Reservation::new(
            "event-1".to_string(),
            "org-1".to_string(),
            "guest@example.com".to_string(),
            Currency::NGN,
            FeeBearer::Customer,
            &breakdown(),
            &rates(),
            Decimal::ZERO,
            None,
            15,
        )
        .unwrap()
    }

    #[test]
    fn test_reservation_freezes_quote() {
        let reservation = test_reservation();

        assert_eq!(reservation.quoted_breakdown(), breakdown());
        assert_eq!(reservation.quoted_rates(), rates());
        assert!(reservation.is_payable());
        assert!(!reservation.is_expired());
    }

    #[test]
    fn test_reservation_rejects_bad_email() {
        let result = Reservation::new(
            "event-1".to_string(),
            "org-1".to_string(),
            "nope".to_string(),
            Currency::NGN,
            FeeBearer::Customer,
            &breakdown(),
            &rates(),
            Decimal::ZERO,
            None,
            15,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_status_transitions() {
        let mut reservation = test_reservation();

        assert!(reservation.update_status(ReservationStatus::Expired).is_ok());
        // Late payment can still convert an expired hold
        assert!(reservation
            .update_status(ReservationStatus::Converted)
            .is_ok());
        assert!(reservation.update_status(ReservationStatus::Active).is_err());
    }

    #[test]
    fn test_released_is_terminal() {
        let mut reservation = test_reservation();
        reservation
            .update_status(ReservationStatus::Released)
            .unwrap();

        assert!(reservation
            .update_status(ReservationStatus::Converted)
            .is_err());
    }

    #[test]
    fn test_item_line_total() {
        let item = ReservationItem::new(
            "res-1".to_string(),
            ItemKind::Tier,
            "tier-1".to_string(),
            3,
            Decimal::new(250000, 2),
        )
        .unwrap();

        assert_eq!(item.line_total, Decimal::new(750000, 2));
    }

    #[test]
    fn test_item_rejects_zero_quantity() {
        assert!(ReservationItem::new(
            "res-1".to_string(),
            ItemKind::Addon,
            "addon-1".to_string(),
            0,
            Decimal::from(10),
        )
        .is_err());
    }
}
