use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::core::{AppError, Result};
use crate::modules::checkout::models::{Reservation, ReservationItem, ReservationStatus};

const RESERVATION_COLUMNS: &str = r#"
    id, event_id, organizer_id, buyer_email, currency, fee_bearer,
    ticket_subtotal, addon_subtotal, discount_total, discount_id,
    platform_fee, processor_fee, customer_total, organizer_net,
    applied_platform_rate, applied_processor_rate, platform_rate_source,
    status, gateway_reference, expires_at, created_at, updated_at
"#;

/// Repository for reservations and their line items
pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a reservation with its line items in a transaction
    pub async fn create(&self, reservation: &Reservation) -> Result<Reservation> {
        let id = reservation
            .id
            .as_ref()
            .ok_or_else(|| AppError::internal("Reservation ID is required for creation"))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO reservations (
                id, event_id, organizer_id, buyer_email, currency, fee_bearer,
                ticket_subtotal, addon_subtotal, discount_total, discount_id,
                platform_fee, processor_fee, customer_total, organizer_net,
                applied_platform_rate, applied_processor_rate,
                platform_rate_source, status, gateway_reference, expires_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21, $22)
            "#,
        )
        .bind(id)
        .bind(&reservation.event_id)
        .bind(&reservation.organizer_id)
        .bind(&reservation.buyer_email)
        .bind(reservation.currency.to_string())
        .bind(reservation.fee_bearer)
        .bind(reservation.ticket_subtotal)
        .bind(reservation.addon_subtotal)
        .bind(reservation.discount_total)
        .bind(&reservation.discount_id)
        .bind(reservation.platform_fee)
        .bind(reservation.processor_fee)
        .bind(reservation.customer_total)
        .bind(reservation.organizer_net)
        .bind(reservation.applied_platform_rate)
        .bind(reservation.applied_processor_rate)
        .bind(reservation.platform_rate_source)
        .bind(reservation.status)
        .bind(&reservation.gateway_reference)
        .bind(reservation.expires_at)
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create reservation: {}", e)))?;

        for item in &reservation.items {
            let item_id = item
                .id
                .as_ref()
                .ok_or_else(|| AppError::internal("Reservation item ID is required"))?;

            sqlx::query(
                r#"
                INSERT INTO reservation_items (
                    id, reservation_id, kind, item_id, quantity, unit_price,
                    line_total
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(item_id)
            .bind(id)
            .bind(item.kind)
            .bind(&item.item_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.line_total)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create reservation item: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("Reservation was created but not found"))
    }

    /// Find reservation by ID, including line items
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Reservation>> {
        let reservation = sqlx::query_as::<_, Reservation>(&format!(
            "SELECT {} FROM reservations WHERE id = $1",
            RESERVATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch reservation: {}", e)))?;

        let Some(mut reservation) = reservation else {
            return Ok(None);
        };

        reservation.items = self.find_items(id).await?;

        Ok(Some(reservation))
    }

    pub async fn find_by_gateway_reference(&self, reference: &str) -> Result<Option<Reservation>> {
        let reservation = sqlx::query_as::<_, Reservation>(&format!(
            "SELECT {} FROM reservations WHERE gateway_reference = $1",
            RESERVATION_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::Internal(format!(
                "Failed to fetch reservation by gateway reference: {}",
                e
            ))
        })?;

        let Some(mut reservation) = reservation else {
            return Ok(None);
        };

        let id = reservation.id.clone().unwrap_or_default();
        reservation.items = self.find_items(&id).await?;

        Ok(Some(reservation))
    }

    async fn find_items(&self, reservation_id: &str) -> Result<Vec<ReservationItem>> {
        let items = sqlx::query_as::<_, ReservationItem>(
            r#"
            SELECT id, reservation_id, kind, item_id, quantity, unit_price,
                   line_total
            FROM reservation_items
            WHERE reservation_id = $1
            ORDER BY id
            "#,
        )
        .bind(reservation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch reservation items: {}", e)))?;

        Ok(items)
    }

    pub async fn set_gateway_reference(&self, id: &str, reference: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET gateway_reference = $1, updated_at = NOW()
            WHERE id = $2 AND status = 'active'
            "#,
        )
        .bind(reference)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to set gateway reference: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::validation(format!(
                "Reservation {} is not active",
                id
            )));
        }

        Ok(())
    }

    pub async fn update_status(&self, id: &str, status: ReservationStatus) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update reservation status: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Reservation {}", id)));
        }

        Ok(())
    }

    /// Active reservations whose hold has lapsed, for the sweeper
    pub async fn list_expired_active(&self, now: DateTime<Utc>) -> Result<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(&format!(
            r#"
            SELECT {}
            FROM reservations
            WHERE status = 'active' AND expires_at < $1
            ORDER BY expires_at ASC
            "#,
            RESERVATION_COLUMNS
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to list expired reservations: {}", e)))?;

        let mut with_items = Vec::with_capacity(reservations.len());
        for mut reservation in reservations {
            let id = reservation.id.clone().unwrap_or_default();
            reservation.items = self.find_items(&id).await?;
            with_items.push(reservation);
        }

        Ok(with_items)
    }

    /// Active reservations with an initialized charge older than the cutoff,
    /// for webhook-miss polling
    pub async fn list_awaiting_verification(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(&format!(
            r#"
            SELECT {}
            FROM reservations
            WHERE status = 'active'
              AND gateway_reference IS NOT NULL
              AND created_at < $1
            ORDER BY created_at ASC
            "#,
            RESERVATION_COLUMNS
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::Internal(format!(
                "Failed to list reservations awaiting verification: {}",
                e
            ))
        })?;

        Ok(reservations)
    }
}
