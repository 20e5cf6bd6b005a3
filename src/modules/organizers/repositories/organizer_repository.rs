use sqlx::PgPool;

use crate::core::{AppError, Result};
use crate::modules::organizers::models::Organizer;

/// Repository for organizer persistence
pub struct OrganizerRepository {
    pool: PgPool,
}

impl OrganizerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, organizer: &Organizer) -> Result<Organizer> {
        let id = organizer
            .id
            .as_ref()
            .ok_or_else(|| AppError::internal("Organizer ID is required for creation"))?;

        sqlx::query(
            r#"
            INSERT INTO organizers (
                id, name, email, platform_fee_percent,
                settlement_bank_code, settlement_account_number,
                settlement_recipient_code, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(id)
        .bind(&organizer.name)
        .bind(&organizer.email)
        .bind(organizer.platform_fee_percent)
        .bind(&organizer.settlement_bank_code)
        .bind(&organizer.settlement_account_number)
        .bind(&organizer.settlement_recipient_code)
        .bind(organizer.is_active)
        .bind(organizer.created_at)
        .bind(organizer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::validation(format!(
                        "Organizer with email '{}' already exists",
                        organizer.email
                    ));
                }
            }
            AppError::Internal(format!("Failed to create organizer: {}", e))
        })?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("Organizer was created but not found"))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Organizer>> {
        let organizer = sqlx::query_as::<_, Organizer>(
            r#"
            SELECT
                id, name, email, platform_fee_percent,
                settlement_bank_code, settlement_account_number,
                settlement_recipient_code, is_active, created_at, updated_at
            FROM organizers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch organizer: {}", e)))?;

        Ok(organizer)
    }

    pub async fn update_settlement_details(
        &self,
        id: &str,
        bank_code: &str,
        account_number: &str,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE organizers
            SET settlement_bank_code = $1,
                settlement_account_number = $2,
                settlement_recipient_code = NULL,
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(bank_code)
        .bind(account_number)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update settlement details: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Organizer {}", id)));
        }

        Ok(())
    }

    pub async fn set_recipient_code(&self, id: &str, recipient_code: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE organizers
            SET settlement_recipient_code = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(recipient_code)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store recipient code: {}", e)))?;

        Ok(())
    }
}
