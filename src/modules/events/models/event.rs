use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Currency, Result};
use crate::modules::fees::models::fee_config::validate_rate;
use crate::modules::fees::models::FeeBearer;

/// Event status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
pub enum EventStatus {
    /// Being configured; not visible to guests
    #[serde(rename = "draft")]
    Draft,

    /// On sale
    #[serde(rename = "published")]
    Published,

    /// Sales closed, event concluded
    #[serde(rename = "completed")]
    Completed,

    /// Cancelled before or during sales
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl Default for EventStatus {
    fn default() -> Self {
        EventStatus::Draft
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Draft => write!(f, "draft"),
            EventStatus::Published => write!(f, "published"),
            EventStatus::Completed => write!(f, "completed"),
            EventStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "draft" => Ok(EventStatus::Draft),
            "published" => Ok(EventStatus::Published),
            "completed" => Ok(EventStatus::Completed),
            "cancelled" => Ok(EventStatus::Cancelled),
            _ => Err(format!("Invalid event status: {}", s)),
        }
    }
}

/// A ticketed event.
///
/// Carries the event-level fee configuration: the fee bearer and the
/// optional platform-rate override that takes precedence over the
/// organizer's.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    #[serde(skip_deserializing)]
    pub id: Option<String>,

    #[serde(skip_deserializing)]
    pub organizer_id: String,

    pub title: String,

    pub venue: String,

    pub starts_at: DateTime<Utc>,

    pub ends_at: DateTime<Utc>,

    #[sqlx(try_from = "String")]
    pub currency: Currency,

    /// Who absorbs the fees for sales on this event
    #[serde(default)]
    pub fee_bearer: FeeBearer,

    /// Event-level platform fee override. `None` falls through to the
    /// organizer override and then the platform default; `Some(0)` is an
    /// explicit zero rate.
    pub platform_fee_percent: Option<Decimal>,

    #[serde(skip_deserializing)]
    pub status: EventStatus,

    #[serde(skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_deserializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Event {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        organizer_id: String,
        title: String,
        venue: String,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        currency: Currency,
        fee_bearer: FeeBearer,
        platform_fee_percent: Option<Decimal>,
    ) -> Result<Self> {
        if organizer_id.trim().is_empty() {
            return Err(AppError::validation("Organizer ID cannot be empty"));
        }

        if title.trim().is_empty() {
            return Err(AppError::validation("Event title cannot be empty"));
        }

        if title.len() > 200 {
            return Err(AppError::validation(
                "Event title cannot exceed 200 characters",
            ));
        }

        if ends_at <= starts_at {
            return Err(AppError::validation("Event must end after it starts"));
        }

        if let Some(rate) = platform_fee_percent {
            validate_rate("event platform fee override", rate)?;
        }

        let now = Utc::now();

        Ok(Self {
            id: Some(Uuid::new_v4().to_string()),
            organizer_id,
            title,
            venue,
            starts_at,
            ends_at,
            currency,
            fee_bearer,
            platform_fee_percent,
            status: EventStatus::Draft,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    /// Whether guests can currently buy tickets
    pub fn is_on_sale(&self) -> bool {
        self.status == EventStatus::Published && Utc::now() < self.ends_at
    }

    /// Update status, allowing only forward transitions
    pub fn update_status(&mut self, new_status: EventStatus) -> Result<()> {
        match (self.status, new_status) {
            (EventStatus::Draft, EventStatus::Published)
            | (EventStatus::Draft, EventStatus::Cancelled)
            | (EventStatus::Published, EventStatus::Completed)
            | (EventStatus::Published, EventStatus::Cancelled) => {
                self.status = new_status;
                self.updated_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(AppError::validation(format!(
                "Invalid status transition from {} to {}",
                self.status, new_status
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_event() -> Event {
        let starts = Utc::now() + Duration::days(30);
        Event::new(
            "org-1".to_string(),
            "Afrobeats Night".to_string(),
            "Eko Convention Centre".to_string(),
            starts,
            starts + Duration::hours(6),
            Currency::NGN,
            FeeBearer::Customer,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_event_creation_valid() {
        let event = test_event();
        assert!(event.id.is_some());
        assert_eq!(event.status, EventStatus::Draft);
        assert!(!event.is_on_sale());
    }

    #[test]
    fn test_event_rejects_inverted_times() {
        let starts = Utc::now();
        let result = Event::new(
            "org-1".to_string(),
            "Show".to_string(),
            "Venue".to_string(),
            starts,
            starts - Duration::hours(1),
            Currency::NGN,
            FeeBearer::Customer,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_event_rejects_invalid_override() {
        let starts = Utc::now() + Duration::days(1);
        let result = Event::new(
            "org-1".to_string(),
            "Show".to_string(),
            "Venue".to_string(),
            starts,
            starts + Duration::hours(2),
            Currency::NGN,
            FeeBearer::Customer,
            Some(Decimal::from(2)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_status_transitions() {
        let mut event = test_event();

        assert!(event.update_status(EventStatus::Published).is_ok());
        assert!(event.is_on_sale());

        assert!(event.update_status(EventStatus::Draft).is_err());

        assert!(event.update_status(EventStatus::Completed).is_ok());
        assert!(event.update_status(EventStatus::Cancelled).is_err());
    }

    #[test]
    fn test_draft_can_be_cancelled() {
        let mut event = test_event();
        assert!(event.update_status(EventStatus::Cancelled).is_ok());
        assert!(event.update_status(EventStatus::Published).is_err());
    }
}
