use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Currency, Result};

/// Discount kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
pub enum DiscountKind {
    /// Fraction off the ticket subtotal (0.10 = 10% off)
    #[serde(rename = "percent")]
    Percent,

    /// Fixed amount off the ticket subtotal
    #[serde(rename = "fixed")]
    Fixed,
}

/// A per-event discount code applied to the ticket subtotal before fees.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Discount {
    #[serde(skip_deserializing)]
    pub id: Option<String>,

    #[serde(skip_deserializing)]
    pub event_id: String,

    pub code: String,

    pub kind: DiscountKind,

    pub value: Decimal,

    /// Redemption cap; `None` is unlimited
    pub max_redemptions: Option<i32>,

    #[serde(skip_deserializing)]
    pub redeemed: i32,

    pub expires_at: Option<DateTime<Utc>>,

    #[serde(skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_deserializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Discount {
    pub fn new(
        event_id: String,
        code: String,
        kind: DiscountKind,
        value: Decimal,
        max_redemptions: Option<i32>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Err(AppError::validation("Discount code cannot be empty"));
        }

        match kind {
            DiscountKind::Percent => {
                if value <= Decimal::ZERO || value > Decimal::ONE {
                    return Err(AppError::validation(format!(
                        "Percent discount must be in (0, 1], got {}",
                        value
                    )));
                }
            }
            DiscountKind::Fixed => {
                if value <= Decimal::ZERO {
                    return Err(AppError::validation(format!(
                        "Fixed discount must be positive, got {}",
                        value
                    )));
                }
            }
        }

        if let Some(cap) = max_redemptions {
            if cap <= 0 {
                return Err(AppError::validation(
                    "Redemption cap must be positive when set",
                ));
            }
        }

        let now = Utc::now();

        Ok(Self {
            id: Some(Uuid::new_v4().to_string()),
            event_id,
            code,
            kind,
            value,
            max_redemptions,
            redeemed: 0,
            expires_at,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    /// Whether the code can still be applied
    pub fn is_usable(&self) -> bool {
        if let Some(expires_at) = self.expires_at {
            if Utc::now() > expires_at {
                return false;
            }
        }

        match self.max_redemptions {
            Some(cap) => self.redeemed < cap,
            None => true,
        }
    }

    /// Amount taken off the given ticket subtotal, capped at the subtotal
    /// and rounded to the currency scale.
    pub fn amount_off(&self, ticket_subtotal: Decimal, currency: Currency) -> Decimal {
        let raw = match self.kind {
            DiscountKind::Percent => ticket_subtotal * self.value,
            DiscountKind::Fixed => self.value,
        };

        currency.round(raw.min(ticket_subtotal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percent_discount(value: Decimal) -> Discount {
        Discount::new(
            "event-1".to_string(),
            "early10".to_string(),
            DiscountKind::Percent,
            value,
            Some(100),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_code_normalized_to_uppercase() {
        let discount = percent_discount(Decimal::new(10, 2));
        assert_eq!(discount.code, "EARLY10");
    }

    #[test]
    fn test_percent_amount_off() {
        let discount = percent_discount(Decimal::new(10, 2));
        assert_eq!(
            discount.amount_off(Decimal::from(500), Currency::NGN),
            Decimal::from(50)
        );
    }

    #[test]
    fn test_fixed_amount_capped_at_subtotal() {
        let discount = Discount::new(
            "event-1".to_string(),
            "FLAT200".to_string(),
            DiscountKind::Fixed,
            Decimal::from(200),
            None,
            None,
        )
        .unwrap();

        assert_eq!(
            discount.amount_off(Decimal::from(150), Currency::NGN),
            Decimal::from(150)
        );
    }

    #[test]
    fn test_redemption_cap() {
        let mut discount = percent_discount(Decimal::new(10, 2));
        assert!(discount.is_usable());

        discount.redeemed = 100;
        assert!(!discount.is_usable());
    }

    #[test]
    fn test_expired_code_unusable() {
        let mut discount = percent_discount(Decimal::new(10, 2));
        discount.expires_at = Some(Utc::now() - chrono::Duration::hours(1));
        assert!(!discount.is_usable());
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(Discount::new(
            "event-1".to_string(),
            "BAD".to_string(),
            DiscountKind::Percent,
            Decimal::new(15, 1),
            None,
            None,
        )
        .is_err());

        assert!(Discount::new(
            "event-1".to_string(),
            "BAD".to_string(),
            DiscountKind::Fixed,
            Decimal::ZERO,
            None,
            None,
        )
        .is_err());
    }
}
