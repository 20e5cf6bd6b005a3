use sqlx::PgPool;

use crate::core::{AppError, Result};
use crate::modules::transactions::models::{Transaction, TransactionStatus};

const TRANSACTION_COLUMNS: &str = r#"
    id, reservation_id, event_id, organizer_id, gateway_reference,
    amount, currency, fee_bearer, applied_platform_rate,
    applied_processor_rate, platform_rate_source, platform_fee,
    processor_fee, status, payment_channel, payout_id, paid_at,
    created_at, updated_at
"#;

/// Repository for transaction persistence.
///
/// Idempotent on `gateway_reference`: a webhook replay returns the existing
/// row instead of inserting a second snapshot.
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, transaction: &Transaction) -> Result<Transaction> {
        if let Some(existing) = self
            .find_by_gateway_reference(&transaction.gateway_reference)
            .await?
        {
            return Ok(existing);
        }

        let id = transaction
            .id
            .as_ref()
            .ok_or_else(|| AppError::internal("Transaction ID is required for creation"))?;

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, reservation_id, event_id, organizer_id, gateway_reference,
                amount, currency, fee_bearer, applied_platform_rate,
                applied_processor_rate, platform_rate_source, platform_fee,
                processor_fee, status, payment_channel, payout_id, paid_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(id)
        .bind(&transaction.reservation_id)
        .bind(&transaction.event_id)
        .bind(&transaction.organizer_id)
        .bind(&transaction.gateway_reference)
        .bind(transaction.amount)
        .bind(transaction.currency.to_string())
        .bind(transaction.fee_bearer)
        .bind(transaction.applied_platform_rate)
        .bind(transaction.applied_processor_rate)
        .bind(transaction.platform_rate_source)
        .bind(transaction.platform_fee)
        .bind(transaction.processor_fee)
        .bind(transaction.status)
        .bind(&transaction.payment_channel)
        .bind(&transaction.payout_id)
        .bind(transaction.paid_at)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    // Lost the race with a concurrent webhook delivery
                    return AppError::validation(format!(
                        "Transaction with gateway reference '{}' already exists",
                        transaction.gateway_reference
                    ));
                }
            }
            AppError::Internal(format!("Failed to create transaction: {}", e))
        })?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("Transaction was created but not found"))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {} FROM transactions WHERE id = $1",
            TRANSACTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch transaction: {}", e)))?;

        Ok(transaction)
    }

    pub async fn find_by_gateway_reference(&self, reference: &str) -> Result<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {} FROM transactions WHERE gateway_reference = $1",
            TRANSACTION_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::Internal(format!(
                "Failed to fetch transaction by gateway reference: {}",
                e
            ))
        })?;

        Ok(transaction)
    }

    pub async fn list_for_organizer(
        &self,
        organizer_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE organizer_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(organizer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to list transactions: {}", e)))?;

        Ok(transactions)
    }

    pub async fn list_successful_for_event(&self, event_id: &str) -> Result<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE event_id = $1 AND status = $2
            ORDER BY paid_at ASC
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(event_id)
        .bind(TransactionStatus::Success)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::Internal(format!("Failed to list event transactions: {}", e))
        })?;

        Ok(transactions)
    }

    /// Successful transactions not yet swept into a payout
    pub async fn list_unsettled_for_organizer(
        &self,
        organizer_id: &str,
    ) -> Result<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE organizer_id = $1 AND status = $2 AND payout_id IS NULL
            ORDER BY paid_at ASC
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(organizer_id)
        .bind(TransactionStatus::Success)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::Internal(format!("Failed to list unsettled transactions: {}", e))
        })?;

        Ok(transactions)
    }

    pub async fn update_status(&self, id: &str, status: TransactionStatus) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = $1,
                paid_at = CASE WHEN $1 = 'success' THEN NOW() ELSE paid_at END,
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update transaction status: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Transaction {}", id)));
        }

        Ok(())
    }

    pub async fn update_payment_channel(&self, id: &str, channel: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE transactions
            SET payment_channel = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(channel)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update payment channel: {}", e)))?;

        Ok(())
    }

    /// Attach a batch of transactions to a payout, refusing rows already
    /// settled elsewhere.
    pub async fn mark_settled(&self, ids: &[String], payout_id: &str) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET payout_id = $1, updated_at = NOW()
            WHERE id = ANY($2) AND payout_id IS NULL
            "#,
        )
        .bind(payout_id)
        .bind(ids)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to mark transactions settled: {}", e)))?;

        Ok(result.rows_affected())
    }

    /// Detach transactions from a failed payout so a later batch can sweep
    /// them again
    pub async fn clear_settlement(&self, payout_id: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET payout_id = NULL, updated_at = NOW()
            WHERE payout_id = $1
            "#,
        )
        .bind(payout_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to clear settlement: {}", e)))?;

        Ok(result.rows_affected())
    }
}
