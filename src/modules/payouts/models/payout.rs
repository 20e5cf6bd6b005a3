use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Currency, Result};
use crate::modules::payouts::services::reconciliation::FinancialSummary;

/// Payout status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
pub enum PayoutStatus {
    /// Batch created, transfer not yet initiated
    #[serde(rename = "pending")]
    Pending,

    /// Transfer initiated with the gateway
    #[serde(rename = "processing")]
    Processing,

    /// Transfer confirmed
    #[serde(rename = "paid")]
    Paid,

    /// Transfer failed or was reversed
    #[serde(rename = "failed")]
    Failed,
}

impl Default for PayoutStatus {
    fn default() -> Self {
        PayoutStatus::Pending
    }
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayoutStatus::Pending => write!(f, "pending"),
            PayoutStatus::Processing => write!(f, "processing"),
            PayoutStatus::Paid => write!(f, "paid"),
            PayoutStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for PayoutStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PayoutStatus::Pending),
            "processing" => Ok(PayoutStatus::Processing),
            "paid" => Ok(PayoutStatus::Paid),
            "failed" => Ok(PayoutStatus::Failed),
            _ => Err(format!("Invalid payout status: {}", s)),
        }
    }
}

/// A settlement batch owed to an organizer.
///
/// Amounts are the aggregate of the covered transactions' stored snapshots;
/// the batch never recomputes fees from configuration.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payout {
    #[serde(skip_deserializing)]
    pub id: Option<String>,

    pub organizer_id: String,

    /// Our transfer reference (unique)
    pub reference: String,

    #[sqlx(try_from = "String")]
    pub currency: Currency,

    /// Gross charged across covered transactions
    pub gross: Decimal,

    pub platform_fees: Decimal,

    pub processor_fees: Decimal,

    /// Net amount transferred to the organizer
    pub amount: Decimal,

    pub transaction_count: i64,

    pub status: PayoutStatus,

    /// Gateway transfer code, set once the transfer is initiated
    pub transfer_code: Option<String>,

    pub paid_at: Option<DateTime<Utc>>,

    #[serde(skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_deserializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Payout {
    pub fn new(
        organizer_id: String,
        currency: Currency,
        summary: &FinancialSummary,
    ) -> Result<Self> {
        if summary.transaction_count == 0 {
            return Err(AppError::validation(
                "Payout must cover at least one transaction",
            ));
        }

        if summary.net <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Payout amount must be positive, got {}",
                summary.net
            )));
        }

        let now = Utc::now();

        Ok(Self {
            id: Some(Uuid::new_v4().to_string()),
            organizer_id,
            reference: format!("gp-payout-{}", Uuid::new_v4()),
            currency,
            gross: summary.gross,
            platform_fees: summary.platform_fees,
            processor_fees: summary.processor_fees,
            amount: summary.net,
            transaction_count: summary.transaction_count as i64,
            status: PayoutStatus::Pending,
            transfer_code: None,
            paid_at: None,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> FinancialSummary {
        FinancialSummary {
            gross: Decimal::from(321),
            platform_fees: Decimal::from(15),
            processor_fees: Decimal::from(6),
            net: Decimal::from(300),
            transaction_count: 2,
        }
    }

    #[test]
    fn test_payout_from_summary() {
        let payout = Payout::new("org-1".to_string(), Currency::NGN, &summary()).unwrap();

        assert_eq!(payout.amount, Decimal::from(300));
        assert_eq!(payout.gross, Decimal::from(321));
        assert_eq!(payout.transaction_count, 2);
        assert_eq!(payout.status, PayoutStatus::Pending);
        assert!(payout.reference.starts_with("gp-payout-"));
    }

    #[test]
    fn test_payout_rejects_empty_batch() {
        let empty = FinancialSummary::empty();
        assert!(Payout::new("org-1".to_string(), Currency::NGN, &empty).is_err());
    }

    #[test]
    fn test_payout_rejects_zero_net() {
        let mut zero_net = summary();
        zero_net.net = Decimal::ZERO;
        assert!(Payout::new("org-1".to_string(), Currency::NGN, &zero_net).is_err());
    }
}
