use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Currency, Result};
use crate::modules::fees::models::{EffectiveRates, FeeBearer, RateSource};
use crate::modules::fees::services::FeeBreakdown;

/// Transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Payment initialized, awaiting gateway confirmation
    #[serde(rename = "pending")]
    Pending,

    /// Charge confirmed by the gateway
    #[serde(rename = "success")]
    Success,

    /// Charge failed, abandoned, or mismatched
    #[serde(rename = "failed")]
    Failed,

    /// Charge refunded after success
    #[serde(rename = "refunded")]
    Refunded,
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Pending
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Success => write!(f, "success"),
            TransactionStatus::Failed => write!(f, "failed"),
            TransactionStatus::Refunded => write!(f, "refunded"),
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "success" => Ok(TransactionStatus::Success),
            "failed" => Ok(TransactionStatus::Failed),
            "refunded" => Ok(TransactionStatus::Refunded),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

/// A payment record with its fee snapshot.
///
/// The applied rates and fee amounts are frozen at payment time. Once the
/// transaction is successful they are the authoritative inputs to
/// settlement; later changes to event, organizer, or platform fee
/// configuration must not alter what this row settles for. A snapshot of
/// zero is a real zero, not a missing value.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    #[serde(skip_deserializing)]
    pub id: Option<String>,

    pub reservation_id: String,

    pub event_id: String,

    pub organizer_id: String,

    /// Gateway's transaction reference (unique, idempotency key)
    pub gateway_reference: String,

    /// Gross amount the guest was charged
    pub amount: Decimal,

    #[sqlx(try_from = "String")]
    pub currency: Currency,

    /// Bearer in force when the charge was made
    pub fee_bearer: FeeBearer,

    /// Platform rate applied at payment time
    pub applied_platform_rate: Decimal,

    /// Processor rate applied at payment time
    pub applied_processor_rate: Decimal,

    /// Where the applied platform rate came from
    pub platform_rate_source: RateSource,

    /// Platform fee frozen at payment time
    pub platform_fee: Decimal,

    /// Processor fee frozen at payment time
    pub processor_fee: Decimal,

    pub status: TransactionStatus,

    /// Payment channel reported by the gateway (card, bank, ussd, ...)
    pub payment_channel: Option<String>,

    /// Set when the transaction is swept into a payout
    pub payout_id: Option<String>,

    pub paid_at: Option<DateTime<Utc>>,

    #[serde(skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_deserializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Record a charge with its fee snapshot.
    ///
    /// `breakdown` and `rates` are the output of the resolver/calculator at
    /// the moment the gateway confirmed the charge; this constructor is the
    /// single place a snapshot enters the system.
    #[allow(clippy::too_many_arguments)]
    pub fn from_breakdown(
        reservation_id: String,
        event_id: String,
        organizer_id: String,
        gateway_reference: String,
        breakdown: &FeeBreakdown,
        rates: &EffectiveRates,
        fee_bearer: FeeBearer,
        currency: Currency,
        status: TransactionStatus,
    ) -> Result<Self> {
        if gateway_reference.trim().is_empty() {
            return Err(AppError::validation(
                "Gateway reference cannot be empty",
            ));
        }

        if reservation_id.trim().is_empty() {
            return Err(AppError::validation("Reservation ID cannot be empty"));
        }

        let transaction = Self {
            id: Some(Uuid::new_v4().to_string()),
            reservation_id,
            event_id,
            organizer_id,
            gateway_reference,
            amount: breakdown.customer_total,
            currency,
            fee_bearer,
            applied_platform_rate: rates.platform_percent,
            applied_processor_rate: rates.processor_percent,
            platform_rate_source: rates.platform_source,
            platform_fee: breakdown.platform_fee,
            processor_fee: breakdown.processor_fee,
            status,
            payment_channel: None,
            payout_id: None,
            paid_at: (status == TransactionStatus::Success).then(Utc::now),
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };

        transaction.validate_snapshot()?;

        Ok(transaction)
    }

    /// Consistency checks over the frozen fields
    fn validate_snapshot(&self) -> Result<()> {
        if self.amount < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Transaction amount cannot be negative, got {}",
                self.amount
            )));
        }

        for (label, rate) in [
            ("applied platform rate", self.applied_platform_rate),
            ("applied processor rate", self.applied_processor_rate),
        ] {
            if rate < Decimal::ZERO || rate >= Decimal::ONE {
                return Err(AppError::validation(format!(
                    "Snapshot {} out of range: {}",
                    label, rate
                )));
            }
        }

        if self.platform_fee < Decimal::ZERO || self.processor_fee < Decimal::ZERO {
            return Err(AppError::validation("Snapshot fees cannot be negative"));
        }

        if self.platform_fee + self.processor_fee > self.amount {
            return Err(AppError::validation(format!(
                "Snapshot fees {} exceed transaction amount {}",
                self.platform_fee + self.processor_fee,
                self.amount
            )));
        }

        Ok(())
    }

    pub fn is_success(&self) -> bool {
        self.status == TransactionStatus::Success
    }

    pub fn update_status(&mut self, new_status: TransactionStatus) -> Result<()> {
        match (self.status, new_status) {
            (TransactionStatus::Pending, TransactionStatus::Success)
            | (TransactionStatus::Pending, TransactionStatus::Failed)
            | (TransactionStatus::Success, TransactionStatus::Refunded) => {
                if new_status == TransactionStatus::Success {
                    self.paid_at = Some(Utc::now());
                }
                self.status = new_status;
                self.updated_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(AppError::validation(format!(
                "Invalid transaction status transition from {} to {}",
                self.status, new_status
            ))),
        }
    }
}
