//! Settlement arithmetic over recorded transactions.
//!
//! This is the only place in the codebase that turns a transaction into an
//! amount owed. Dashboards, payout batches, and transaction listings all go
//! through these functions; none of them may re-derive
//! `gross - platform fee - processor fee` on their own.
//!
//! The inputs are the fee values frozen on each transaction at payment
//! time. Current fee configuration is deliberately not a parameter here: a
//! snapshot of zero settles as zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Result};
use crate::modules::transactions::models::{Transaction, TransactionStatus};

/// Settlement amounts for a single successful transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Gross amount the guest was charged
    pub gross: Decimal,
    pub platform_fee: Decimal,
    pub processor_fee: Decimal,
    /// Amount owed to the organizer
    pub net: Decimal,
}

/// Aggregated settlement figures for a set of transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub gross: Decimal,
    pub platform_fees: Decimal,
    pub processor_fees: Decimal,
    pub net: Decimal,
    pub transaction_count: u64,
}

impl FinancialSummary {
    pub fn empty() -> Self {
        Self {
            gross: Decimal::ZERO,
            platform_fees: Decimal::ZERO,
            processor_fees: Decimal::ZERO,
            net: Decimal::ZERO,
            transaction_count: 0,
        }
    }
}

/// Settle a single transaction from its stored snapshot.
///
/// Only successful transactions settle; anything else is a caller bug.
pub fn settle(transaction: &Transaction) -> Result<Settlement> {
    if transaction.status != TransactionStatus::Success {
        return Err(AppError::validation(format!(
            "Cannot settle transaction in status {}",
            transaction.status
        )));
    }

    let net = transaction.amount - transaction.platform_fee - transaction.processor_fee;

    if net < Decimal::ZERO {
        // The model constructor rejects this shape; hitting it means the
        // stored row was mutated outside the recording path.
        return Err(AppError::internal(format!(
            "Corrupt fee snapshot on transaction {}: fees exceed gross amount",
            transaction.id.as_deref().unwrap_or("<unsaved>")
        )));
    }

    Ok(Settlement {
        gross: transaction.amount,
        platform_fee: transaction.platform_fee,
        processor_fee: transaction.processor_fee,
        net,
    })
}

/// Aggregate settlement figures over successful transactions.
///
/// Non-successful transactions in the slice are skipped, so callers can
/// hand over unfiltered listings.
pub fn summarize(transactions: &[Transaction]) -> Result<FinancialSummary> {
    let mut summary = FinancialSummary::empty();

    for transaction in transactions {
        if transaction.status != TransactionStatus::Success {
            continue;
        }

        let settlement = settle(transaction)?;
        summary.gross += settlement.gross;
        summary.platform_fees += settlement.platform_fee;
        summary.processor_fees += settlement.processor_fee;
        summary.net += settlement.net;
        summary.transaction_count += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Currency;
    use crate::modules::fees::models::{EffectiveRates, FeeBearer, RateSource};
    use crate::modules::fees::services::FeeBreakdown;

    fn success_txn(amount: i64, platform_fee: i64, processor_fee: i64) -> Transaction {
        let breakdown = FeeBreakdown {
            ticket_subtotal: Decimal::from(amount - platform_fee - processor_fee),
            addon_subtotal: Decimal::ZERO,
            subtotal: Decimal::from(amount - platform_fee - processor_fee),
            platform_fee: Decimal::from(platform_fee),
            processor_fee: Decimal::from(processor_fee),
            customer_total: Decimal::from(amount),
            organizer_net: Decimal::from(amount - platform_fee - processor_fee),
        };
        let rates = EffectiveRates {
            platform_percent: Decimal::new(5, 2),
            processor_percent: Decimal::new(2, 2),
            platform_source: RateSource::PlatformDefault,
        };

        Transaction::from_breakdown(
            "res-1".to_string(),
            "event-1".to_string(),
            "org-1".to_string(),
            format!("ps_{}_{}", amount, platform_fee),
            &breakdown,
            &rates,
            FeeBearer::Customer,
            Currency::NGN,
            TransactionStatus::Success,
        )
        .unwrap()
    }

    #[test]
    fn test_settle_uses_stored_snapshot() {
        let txn = success_txn(107, 5, 2);
        let settlement = settle(&txn).unwrap();

        assert_eq!(settlement.gross, Decimal::from(107));
        assert_eq!(settlement.net, Decimal::from(100));
    }

    #[test]
    fn test_zero_snapshot_settles_as_zero_fees() {
        // A zero fee snapshot is authoritative: settlement must not reach
        // for any default rate to "fix" it.
        let txn = success_txn(100, 0, 0);
        let settlement = settle(&txn).unwrap();

        assert_eq!(settlement.platform_fee, Decimal::ZERO);
        assert_eq!(settlement.processor_fee, Decimal::ZERO);
        assert_eq!(settlement.net, Decimal::from(100));
    }

    #[test]
    fn test_settle_refuses_pending() {
        let mut txn = success_txn(107, 5, 2);
        txn.status = TransactionStatus::Pending;

        assert!(settle(&txn).is_err());
    }

    #[test]
    fn test_settle_flags_corrupt_snapshot() {
        let mut txn = success_txn(107, 5, 2);
        txn.platform_fee = Decimal::from(200);

        let result = settle(&txn);
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn test_summarize_skips_non_success() {
        let mut failed = success_txn(50, 2, 1);
        failed.status = TransactionStatus::Failed;

        let txns = vec![success_txn(107, 5, 2), failed, success_txn(214, 10, 4)];
        let summary = summarize(&txns).unwrap();

        assert_eq!(summary.transaction_count, 2);
        assert_eq!(summary.gross, Decimal::from(321));
        assert_eq!(summary.platform_fees, Decimal::from(15));
        assert_eq!(summary.processor_fees, Decimal::from(6));
        assert_eq!(summary.net, Decimal::from(300));
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[]).unwrap();
        assert_eq!(summary, FinancialSummary::empty());
    }
}
