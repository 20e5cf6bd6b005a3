use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Currency, Result};

/// An optional add-on sold alongside tickets (parking, merch, meal vouchers).
/// Inventory accounting mirrors [`super::TicketTier`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventAddon {
    #[serde(skip_deserializing)]
    pub id: Option<String>,

    #[serde(skip_deserializing)]
    pub event_id: String,

    pub name: String,

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

impl EventAddon {
    pub fn new(
        event_id: String,
        name: String,
        price: Decimal,
        quantity: i32,
        currency: Currency,
    ) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(AppError::validation("Add-on name cannot be empty"));
        }

        currency
            .validate_amount(price)
            .map_err(AppError::Validation)?;

        if quantity <= 0 {
            return Err(AppError::validation(format!(
                "Add-on quantity must be positive, got {}",
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

    pub fn available(&self) -> i32 {
        self.quantity - self.sold - self.held
    }
}
