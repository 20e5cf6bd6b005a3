use sqlx::PgPool;

use crate::core::{AppError, Result};
use crate::modules::checkout::models::Discount;

/// Repository for discount codes
pub struct DiscountRepository {
    pool: PgPool,
}

impl DiscountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, discount: &Discount) -> Result<Discount> {
        let id = discount
            .id
            .as_ref()
            .ok_or_else(|| AppError::internal("Discount ID is required for creation"))?;

        sqlx::query(
            r#"
            INSERT INTO discounts (
                id, event_id, code, kind, value, max_redemptions, redeemed,
                expires_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(id)
        .bind(&discount.event_id)
        .bind(&discount.code)
        .bind(discount.kind)
        .bind(discount.value)
        .bind(discount.max_redemptions)
        .bind(discount.redeemed)
        .bind(discount.expires_at)
        .bind(discount.created_at)
        .bind(discount.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::validation(format!(
                        "Discount code '{}' already exists for this event",
                        discount.code
                    ));
                }
            }
            AppError::Internal(format!("Failed to create discount: {}", e))
        })?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("Discount was created but not found"))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Discount>> {
        let discount = sqlx::query_as::<_, Discount>(
            r#"
            SELECT id, event_id, code, kind, value, max_redemptions, redeemed,
                   expires_at, created_at, updated_at
            FROM discounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch discount: {}", e)))?;

        Ok(discount)
    }

    pub async fn find_by_code(&self, event_id: &str, code: &str) -> Result<Option<Discount>> {
        let discount = sqlx::query_as::<_, Discount>(
            r#"
            SELECT id, event_id, code, kind, value, max_redemptions, redeemed,
                   expires_at, created_at, updated_at
            FROM discounts
            WHERE event_id = $1 AND code = $2
            "#,
        )
        .bind(event_id)
        .bind(code.trim().to_uppercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch discount by code: {}", e)))?;

        Ok(discount)
    }

    pub async fn list_for_event(&self, event_id: &str) -> Result<Vec<Discount>> {
        let discounts = sqlx::query_as::<_, Discount>(
            r#"
            SELECT id, event_id, code, kind, value, max_redemptions, redeemed,
                   expires_at, created_at, updated_at
            FROM discounts
            WHERE event_id = $1
            ORDER BY code ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to list discounts: {}", e)))?;

        Ok(discounts)
    }

    /// Count a redemption, refusing once the cap is reached
    pub async fn increment_redeemed(&self, id: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE discounts
            SET redeemed = redeemed + 1, updated_at = NOW()
            WHERE id = $1
              AND (max_redemptions IS NULL OR redeemed < max_redemptions)
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to redeem discount: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::validation(format!(
                "Discount {} is exhausted",
                id
            )));
        }

        Ok(())
    }
}
