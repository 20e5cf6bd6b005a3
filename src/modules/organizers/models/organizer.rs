use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::fees::models::fee_config::validate_rate;

/// An organizer account (the platform tenant).
///
/// Carries the optional organizer-level platform-fee override and the bank
/// details payouts are transferred to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organizer {
    #[serde(skip_deserializing)]
    pub id: Option<String>,

    /// Display name shown on the checkout widget
    pub name: String,

    /// Contact email
    pub email: String,

    /// Organizer-level platform fee override. `None` means "use the platform
    /// default"; an explicit zero is a real zero rate.
    pub platform_fee_percent: Option<Decimal>,

    /// Settlement bank code (gateway bank list)
    pub settlement_bank_code: Option<String>,

    /// Settlement account number
    pub settlement_account_number: Option<String>,

    /// Gateway transfer-recipient code, created lazily on first payout
    #[serde(skip_deserializing)]
    pub settlement_recipient_code: Option<String>,

    #[serde(skip_deserializing, default = "default_active")]
    pub is_active: bool,

    #[serde(skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_deserializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Organizer {
    pub fn new(
        name: String,
        email: String,
        platform_fee_percent: Option<Decimal>,
    ) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(AppError::validation("Organizer name cannot be empty"));
        }

        if email.trim().is_empty() || !email.contains('@') {
            return Err(AppError::validation(format!(
                "Invalid organizer email: {}",
                email
            )));
        }

        if let Some(rate) = platform_fee_percent {
            validate_rate("organizer platform fee override", rate)?;
        }

        let now = Utc::now();

        Ok(Self {
            id: Some(Uuid::new_v4().to_string()),
            name,
            email,
            platform_fee_percent,
            settlement_bank_code: None,
            settlement_account_number: None,
            settlement_recipient_code: None,
            is_active: true,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    /// Whether payouts can be initiated for this organizer
    pub fn has_settlement_details(&self) -> bool {
        self.settlement_bank_code.is_some() && self.settlement_account_number.is_some()
    }

    pub fn set_settlement_details(&mut self, bank_code: String, account_number: String) -> Result<()> {
        if bank_code.trim().is_empty() {
            return Err(AppError::validation("Bank code cannot be empty"));
        }

        if account_number.trim().is_empty() {
            return Err(AppError::validation("Account number cannot be empty"));
        }

        self.settlement_bank_code = Some(bank_code);
        self.settlement_account_number = Some(account_number);
        self.updated_at = Some(Utc::now());
        Ok(())
    }
}
