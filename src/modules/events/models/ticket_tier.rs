use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Currency, Result};

/// A priced ticket tier with a fixed inventory.
///
/// Inventory accounting: `quantity` is the total allocation, `sold` counts
/// paid tickets, `held` counts tickets inside active reservations.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketTier {
    #[serde(skip_deserializing)]
    pub id: Option<String>,

    #[serde(skip_deserializing)]
    pub event_id: String,

    pub name: String,

    /// Face price in the event currency
    pub price: Decimal,

    pub quantity: i32,

    #[serde(skip_deserializing)]
    pub sold: i32,

    #[serde(skip_deserializing)]
    pub held: i32,

    #[serde(skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_deserializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TicketTier {
    pub fn new(
        event_id: String,
        name: String,
        price: Decimal,
        quantity: i32,
        currency: Currency,
    ) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(AppError::validation("Tier name cannot be empty"));
        }

        currency
            .validate_amount(price)
            .map_err(AppError::Validation)?;

        if quantity <= 0 {
            return Err(AppError::validation(format!(
                "Tier quantity must be positive, got {}",
                quantity
            )));
        }

        let now = Utc::now();

        Ok(Self {
            id: Some(Uuid::new_v4().to_string()),
            event_id,
            name,
            price,
            quantity,
            sold: 0,
            held: 0,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    /// Tickets still available to reserve
    pub fn available(&self) -> i32 {
        self.quantity - self.sold - self.held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_creation_valid() {
        let tier = TicketTier::new(
            "event-1".to_string(),
            "VIP".to_string(),
            Decimal::new(2500000, 2),
            100,
            Currency::NGN,
        )
        .unwrap();

        assert_eq!(tier.available(), 100);
    }

    #[test]
    fn test_tier_rejects_negative_price() {
        assert!(TicketTier::new(
            "event-1".to_string(),
            "VIP".to_string(),
            Decimal::from(-1),
            100,
            Currency::NGN,
        )
        .is_err());
    }

    #[test]
    fn test_tier_rejects_zero_quantity() {
        assert!(TicketTier::new(
            "event-1".to_string(),
            "VIP".to_string(),
            Decimal::from(100),
            0,
            Currency::NGN,
        )
        .is_err());
    }

    #[test]
    fn test_free_tier_is_valid() {
        let tier = TicketTier::new(
            "event-1".to_string(),
            "Guest list".to_string(),
            Decimal::ZERO,
            50,
            Currency::NGN,
        )
        .unwrap();
        assert_eq!(tier.price, Decimal::ZERO);
    }

    #[test]
    fn test_availability_accounts_for_holds() {
        let mut tier = TicketTier::new(
            "event-1".to_string(),
            "Regular".to_string(),
            Decimal::from(5000),
            100,
            Currency::NGN,
        )
        .unwrap();

        tier.sold = 40;
        tier.held = 10;
        assert_eq!(tier.available(), 50);
    }
}
