use sqlx::PgPool;

use crate::core::{AppError, Result};
use crate::modules::payouts::models::{Payout, PayoutStatus};

const PAYOUT_COLUMNS: &str = r#"
    id, organizer_id, reference, currency, gross, platform_fees,
    processor_fees, amount, transaction_count, status, transfer_code,
    paid_at, created_at, updated_at
"#;

/// Repository for payout batches
pub struct PayoutRepository {
    pool: PgPool,
}

impl PayoutRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, payout: &Payout) -> Result<Payout> {
        let id = payout
            .id
            .as_ref()
            .ok_or_else(|| AppError::internal("Payout ID is required for creation"))?;

        sqlx::query(
            r#"
            INSERT INTO payouts (
                id, organizer_id, reference, currency, gross, platform_fees,
                processor_fees, amount, transaction_count, status,
                transfer_code, paid_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(id)
        .bind(&payout.organizer_id)
        .bind(&payout.reference)
        .bind(payout.currency.to_string())
        .bind(payout.gross)
        .bind(payout.platform_fees)
        .bind(payout.processor_fees)
        .bind(payout.amount)
        .bind(payout.transaction_count)
        .bind(payout.status)
        .bind(&payout.transfer_code)
        .bind(payout.paid_at)
        .bind(payout.created_at)
        .bind(payout.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create payout: {}", e)))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("Payout was created but not found"))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Payout>> {
        let payout = sqlx::query_as::<_, Payout>(&format!(
            "SELECT {} FROM payouts WHERE id = $1",
            PAYOUT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch payout: {}", e)))?;

        Ok(payout)
    }

    pub async fn find_by_reference(&self, reference: &str) -> Result<Option<Payout>> {
        let payout = sqlx::query_as::<_, Payout>(&format!(
            "SELECT {} FROM payouts WHERE reference = $1",
            PAYOUT_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch payout by reference: {}", e)))?;

        Ok(payout)
    }

    pub async fn list_for_organizer(
        &self,
        organizer_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Payout>> {
        let payouts = sqlx::query_as::<_, Payout>(&format!(
            r#"
            SELECT {}
            FROM payouts
            WHERE organizer_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            PAYOUT_COLUMNS
        ))
        .bind(organizer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to list payouts: {}", e)))?;

        Ok(payouts)
    }

    pub async fn set_transfer_code(&self, id: &str, transfer_code: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payouts
            SET transfer_code = $1, status = 'processing', updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(transfer_code)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to set transfer code: {}", e)))?;

        Ok(())
    }

    pub async fn update_status(&self, id: &str, status: PayoutStatus) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE payouts
            SET status = $1,
                paid_at = CASE WHEN $1 = 'paid' THEN NOW() ELSE paid_at END,
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update payout status: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Payout {}", id)));
        }

        Ok(())
    }
}
