use sqlx::PgPool;

use crate::core::{AppError, Result};
use crate::modules::events::models::{Event, EventAddon, EventStatus, TicketTier};

/// Repository for events, ticket tiers, and add-ons.
///
/// Inventory movements (hold/release/commit) are conditional single-statement
/// updates so concurrent checkouts cannot oversell a tier.
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create(&self, event: &Event) -> Result<Event> {
        let id = event
            .id
            .as_ref()
            .ok_or_else(|| AppError::internal("Event ID is required for creation"))?;

        sqlx::query(
            r#"
            INSERT INTO events (
                id, organizer_id, title, venue, starts_at, ends_at,
                currency, fee_bearer, platform_fee_percent, status,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(id)
        .bind(&event.organizer_id)
        .bind(&event.title)
        .bind(&event.venue)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .bind(event.currency.to_string())
        .bind(event.fee_bearer)
        .bind(event.platform_fee_percent)
        .bind(event.status)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create event: {}", e)))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("Event was created but not found"))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT
                id, organizer_id, title, venue, starts_at, ends_at,
                currency, fee_bearer, platform_fee_percent, status,
                created_at, updated_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch event: {}", e)))?;

        Ok(event)
    }

    /// Find an event owned by the given organizer
    pub async fn find_for_organizer(&self, id: &str, organizer_id: &str) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT
                id, organizer_id, title, venue, starts_at, ends_at,
                currency, fee_bearer, platform_fee_percent, status,
                created_at, updated_at
            FROM events
            WHERE id = $1 AND organizer_id = $2
            "#,
        )
        .bind(id)
        .bind(organizer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch event: {}", e)))?;

        Ok(event)
    }

    pub async fn list_for_organizer(
        &self,
        organizer_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT
                id, organizer_id, title, venue, starts_at, ends_at,
                currency, fee_bearer, platform_fee_percent, status,
                created_at, updated_at
            FROM events
            WHERE organizer_id = $1
            ORDER BY starts_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(organizer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to list events: {}", e)))?;

        Ok(events)
    }

    pub async fn update_status(&self, id: &str, status: EventStatus) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update event status: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Event {}", id)));
        }

        Ok(())
    }

    // Ticket tiers

    pub async fn create_tier(&self, tier: &TicketTier) -> Result<TicketTier> {
        let id = tier
            .id
            .as_ref()
            .ok_or_else(|| AppError::internal("Tier ID is required for creation"))?;

        sqlx::query(
            r#"
            INSERT INTO ticket_tiers (
                id, event_id, name, price, quantity, sold, held,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id)
        .bind(&tier.event_id)
        .bind(&tier.name)
        .bind(tier.price)
        .bind(tier.quantity)
        .bind(tier.sold)
        .bind(tier.held)
        .bind(tier.created_at)
        .bind(tier.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create ticket tier: {}", e)))?;

        self.find_tier(id)
            .await?
            .ok_or_else(|| AppError::internal("Ticket tier was created but not found"))
    }

    pub async fn find_tier(&self, id: &str) -> Result<Option<TicketTier>> {
        let tier = sqlx::query_as::<_, TicketTier>(
            r#"
            SELECT id, event_id, name, price, quantity, sold, held,
                   created_at, updated_at
            FROM ticket_tiers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch ticket tier: {}", e)))?;

        Ok(tier)
    }

    pub async fn list_tiers(&self, event_id: &str) -> Result<Vec<TicketTier>> {
        let tiers = sqlx::query_as::<_, TicketTier>(
            r#"
            SELECT id, event_id, name, price, quantity, sold, held,
                   created_at, updated_at
            FROM ticket_tiers
            WHERE event_id = $1
            ORDER BY price ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to list ticket tiers: {}", e)))?;

        Ok(tiers)
    }

    /// Place a hold on tier inventory. Fails when fewer than `quantity`
    /// tickets remain unreserved.
    pub async fn hold_tier(&self, tier_id: &str, quantity: i32) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE ticket_tiers
            SET held = held + $1, updated_at = NOW()
            WHERE id = $2 AND quantity - sold - held >= $1
            "#,
        )
        .bind(quantity)
        .bind(tier_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to hold tier inventory: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::validation(format!(
                "Not enough tickets available in tier {}",
                tier_id
            )));
        }

        Ok(())
    }

    /// Release a hold (reservation expired or was abandoned)
    pub async fn release_tier(&self, tier_id: &str, quantity: i32) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE ticket_tiers
            SET held = GREATEST(held - $1, 0), updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(quantity)
        .bind(tier_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to release tier inventory: {}", e)))?;

        Ok(())
    }

    /// Convert a hold into a sale after payment settles
    pub async fn commit_tier(&self, tier_id: &str, quantity: i32) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE ticket_tiers
            SET held = GREATEST(held - $1, 0), sold = sold + $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(quantity)
        .bind(tier_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to commit tier inventory: {}", e)))?;

        Ok(())
    }

    // Add-ons

    pub async fn create_addon(&self, addon: &EventAddon) -> Result<EventAddon> {
        let id = addon
            .id
            .as_ref()
            .ok_or_else(|| AppError::internal("Add-on ID is required for creation"))?;

        sqlx::query(
            r#"
            INSERT INTO event_addons (
                id, event_id, name, price, quantity, sold, held,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id)
        .bind(&addon.event_id)
        .bind(&addon.name)
        .bind(addon.price)
        .bind(addon.quantity)
        .bind(addon.sold)
        .bind(addon.held)
        .bind(addon.created_at)
        .bind(addon.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create add-on: {}", e)))?;

        self.find_addon(id)
            .await?
            .ok_or_else(|| AppError::internal("Add-on was created but not found"))
    }

    pub async fn find_addon(&self, id: &str) -> Result<Option<EventAddon>> {
        let addon = sqlx::query_as::<_, EventAddon>(
            r#"
            SELECT id, event_id, name, price, quantity, sold, held,
                   created_at, updated_at
            FROM event_addons
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch add-on: {}", e)))?;

        Ok(addon)
    }

    pub async fn list_addons(&self, event_id: &str) -> Result<Vec<EventAddon>> {
        let addons = sqlx::query_as::<_, EventAddon>(
            r#"
            SELECT id, event_id, name, price, quantity, sold, held,
                   created_at, updated_at
            FROM event_addons
            WHERE event_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to list add-ons: {}", e)))?;

        Ok(addons)
    }

    pub async fn hold_addon(&self, addon_id: &str, quantity: i32) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE event_addons
            SET held = held + $1, updated_at = NOW()
            WHERE id = $2 AND quantity - sold - held >= $1
            "#,
        )
        .bind(quantity)
        .bind(addon_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to hold add-on inventory: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::validation(format!(
                "Not enough add-ons available for {}",
                addon_id
            )));
        }

        Ok(())
    }

    pub async fn release_addon(&self, addon_id: &str, quantity: i32) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE event_addons
            SET held = GREATEST(held - $1, 0), updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(quantity)
        .bind(addon_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to release add-on inventory: {}", e)))?;

        Ok(())
    }

    pub async fn commit_addon(&self, addon_id: &str, quantity: i32) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE event_addons
            SET held = GREATEST(held - $1, 0), sold = sold + $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(quantity)
        .bind(addon_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to commit add-on inventory: {}", e)))?;

        Ok(())
    }
}
