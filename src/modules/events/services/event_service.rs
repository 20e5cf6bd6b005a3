use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::core::{AppError, Currency, Result};
use crate::modules::checkout::models::{Discount, DiscountKind};
use crate::modules::checkout::repositories::DiscountRepository;
use crate::modules::events::models::{Event, EventAddon, EventStatus, TicketTier};
use crate::modules::events::repositories::EventRepository;
use crate::modules::fees::models::FeeBearer;
use crate::modules::payouts::services::reconciliation::{self, FinancialSummary};
use crate::modules::transactions::repositories::TransactionRepository;

/// Service for event management and per-event financials
pub struct EventService {
    event_repo: Arc<EventRepository>,
    transaction_repo: Arc<TransactionRepository>,
    discount_repo: Arc<DiscountRepository>,
}

impl EventService {
    pub fn new(
        event_repo: Arc<EventRepository>,
        transaction_repo: Arc<TransactionRepository>,
        discount_repo: Arc<DiscountRepository>,
    ) -> Self {
        Self {
            event_repo,
            transaction_repo,
            discount_repo,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_event(
        &self,
        organizer_id: &str,
        title: String,
        venue: String,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        currency: Currency,
        fee_bearer: FeeBearer,
        platform_fee_percent: Option<Decimal>,
    ) -> Result<Event> {
        let event = Event::new(
            organizer_id.to_string(),
            title,
            venue,
            starts_at,
            ends_at,
            currency,
            fee_bearer,
            platform_fee_percent,
        )?;

        self.event_repo.create(&event).await
    }

    pub async fn get_event(&self, id: &str, organizer_id: &str) -> Result<Event> {
        self.event_repo
            .find_for_organizer(id, organizer_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Event {}", id)))
    }

    pub async fn list_events(
        &self,
        organizer_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Event>> {
        self.event_repo
            .list_for_organizer(organizer_id, limit, offset)
            .await
    }

    /// Put an event on sale
    pub async fn publish_event(&self, id: &str, organizer_id: &str) -> Result<Event> {
        let mut event = self.get_event(id, organizer_id).await?;

        // Validate the transition on the model before persisting
        event.update_status(EventStatus::Published)?;
        self.event_repo.update_status(id, EventStatus::Published).await?;

        tracing::info!(event_id = %id, organizer_id = %organizer_id, "Event published");

        Ok(event)
    }

    pub async fn cancel_event(&self, id: &str, organizer_id: &str) -> Result<Event> {
        let mut event = self.get_event(id, organizer_id).await?;

        event.update_status(EventStatus::Cancelled)?;
        self.event_repo.update_status(id, EventStatus::Cancelled).await?;

        tracing::info!(event_id = %id, organizer_id = %organizer_id, "Event cancelled");

        Ok(event)
    }

    pub async fn add_tier(
        &self,
        event_id: &str,
        organizer_id: &str,
        name: String,
        price: Decimal,
        quantity: i32,
    ) -> Result<TicketTier> {
        let event = self.get_event(event_id, organizer_id).await?;

        let tier = TicketTier::new(
            event.id.clone().unwrap_or_default(),
            name,
            price,
            quantity,
            event.currency,
        )?;

        self.event_repo.create_tier(&tier).await
    }

    pub async fn add_addon(
        &self,
        event_id: &str,
        organizer_id: &str,
        name: String,
        price: Decimal,
        quantity: i32,
    ) -> Result<EventAddon> {
        let event = self.get_event(event_id, organizer_id).await?;

        let addon = EventAddon::new(
            event.id.clone().unwrap_or_default(),
            name,
            price,
            quantity,
            event.currency,
        )?;

        self.event_repo.create_addon(&addon).await
    }

    pub async fn list_tiers(&self, event_id: &str, organizer_id: &str) -> Result<Vec<TicketTier>> {
        self.get_event(event_id, organizer_id).await?;
        self.event_repo.list_tiers(event_id).await
    }

    pub async fn list_addons(&self, event_id: &str, organizer_id: &str) -> Result<Vec<EventAddon>> {
        self.get_event(event_id, organizer_id).await?;
        self.event_repo.list_addons(event_id).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add_discount(
        &self,
        event_id: &str,
        organizer_id: &str,
        code: String,
        kind: DiscountKind,
        value: Decimal,
        max_redemptions: Option<i32>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Discount> {
        let event = self.get_event(event_id, organizer_id).await?;

        let discount = Discount::new(
            event.id.clone().unwrap_or_default(),
            code,
            kind,
            value,
            max_redemptions,
            expires_at,
        )?;

        self.discount_repo.create(&discount).await
    }

    pub async fn list_discounts(
        &self,
        event_id: &str,
        organizer_id: &str,
    ) -> Result<Vec<Discount>> {
        self.get_event(event_id, organizer_id).await?;
        self.discount_repo.list_for_event(event_id).await
    }

    /// Financial summary for an event's dashboard.
    ///
    /// Aggregation runs over the stored transaction snapshots through the
    /// shared reconciliation routine; current fee configuration is never
    /// consulted here.
    pub async fn event_financials(
        &self,
        event_id: &str,
        organizer_id: &str,
    ) -> Result<FinancialSummary> {
        self.get_event(event_id, organizer_id).await?;

        let transactions = self
            .transaction_repo
            .list_successful_for_event(event_id)
            .await?;

        reconciliation::summarize(&transactions)
    }
}
