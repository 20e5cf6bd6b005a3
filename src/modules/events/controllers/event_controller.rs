use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::core::error::AppError;
use crate::core::Currency;
use crate::middleware::auth::OrganizerId;
use crate::modules::checkout::models::DiscountKind;
use crate::modules::events::services::EventService;
use crate::modules::fees::models::FeeBearer;

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub venue: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub currency: Currency,
    #[serde(default)]
    pub fee_bearer: FeeBearer,
    pub platform_fee_percent: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTierRequest {
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateAddonRequest {
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateDiscountRequest {
    pub code: String,
    pub kind: DiscountKind,
    pub value: Decimal,
    pub max_redemptions: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Query parameters for listing events
#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Create a new event
/// POST /events
pub async fn create_event(
    service: web::Data<Arc<EventService>>,
    organizer_id: OrganizerId,
    request: web::Json<CreateEventRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let event = service
        .create_event(
            &organizer_id.0,
            request.title,
            request.venue,
            request.starts_at,
            request.ends_at,
            request.currency,
            request.fee_bearer,
            request.platform_fee_percent,
        )
        .await?;

    Ok(HttpResponse::Created().json(event))
}

/// Get event by ID
/// GET /events/{id}
pub async fn get_event(
    service: web::Data<Arc<EventService>>,
    organizer_id: OrganizerId,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let event = service.get_event(&path.into_inner(), &organizer_id.0).await?;

    Ok(HttpResponse::Ok().json(event))
}

/// List events for the authenticated organizer
/// GET /events
pub async fn list_events(
    service: web::Data<Arc<EventService>>,
    organizer_id: OrganizerId,
    query: web::Query<ListEventsQuery>,
) -> Result<HttpResponse, AppError> {
    let events = service
        .list_events(&organizer_id.0, query.limit, query.offset)
        .await?;

    Ok(HttpResponse::Ok().json(events))
}

/// Put an event on sale
/// POST /events/{id}/publish
pub async fn publish_event(
    service: web::Data<Arc<EventService>>,
    organizer_id: OrganizerId,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let event = service
        .publish_event(&path.into_inner(), &organizer_id.0)
        .await?;

    Ok(HttpResponse::Ok().json(event))
}

/// Cancel an event
/// POST /events/{id}/cancel
pub async fn cancel_event(
    service: web::Data<Arc<EventService>>,
    organizer_id: OrganizerId,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let event = service
        .cancel_event(&path.into_inner(), &organizer_id.0)
        .await?;

    Ok(HttpResponse::Ok().json(event))
}

/// Add a ticket tier to an event
/// POST /events/{id}/tiers
pub async fn create_tier(
    service: web::Data<Arc<EventService>>,
    organizer_id: OrganizerId,
    path: web::Path<String>,
    request: web::Json<CreateTierRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let tier = service
        .add_tier(
            &path.into_inner(),
            &organizer_id.0,
            request.name,
            request.price,
            request.quantity,
        )
        .await?;

    Ok(HttpResponse::Created().json(tier))
}

/// List ticket tiers for an event
/// GET /events/{id}/tiers
pub async fn list_tiers(
    service: web::Data<Arc<EventService>>,
    organizer_id: OrganizerId,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let tiers = service
        .list_tiers(&path.into_inner(), &organizer_id.0)
        .await?;

    Ok(HttpResponse::Ok().json(tiers))
}

/// Add an add-on to an event
/// POST /events/{id}/addons
pub async fn create_addon(
    service: web::Data<Arc<EventService>>,
    organizer_id: OrganizerId,
    path: web::Path<String>,
    request: web::Json<CreateAddonRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let addon = service
        .add_addon(
            &path.into_inner(),
            &organizer_id.0,
            request.name,
            request.price,
            request.quantity,
        )
        .await?;

    Ok(HttpResponse::Created().json(addon))
}

/// List add-ons for an event
/// GET /events/{id}/addons
pub async fn list_addons(
    service: web::Data<Arc<EventService>>,
    organizer_id: OrganizerId,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let addons = service
        .list_addons(&path.into_inner(), &organizer_id.0)
        .await?;

    Ok(HttpResponse::Ok().json(addons))
}

/// Add a discount code to an event
/// POST /events/{id}/discounts
pub async fn create_discount(
    service: web::Data<Arc<EventService>>,
    organizer_id: OrganizerId,
    path: web::Path<String>,
    request: web::Json<CreateDiscountRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let discount = service
        .add_discount(
            &path.into_inner(),
            &organizer_id.0,
            request.code,
            request.kind,
            request.value,
            request.max_redemptions,
            request.expires_at,
        )
        .await?;

    Ok(HttpResponse::Created().json(discount))
}

/// List discount codes for an event
/// GET /events/{id}/discounts
pub async fn list_discounts(
    service: web::Data<Arc<EventService>>,
    organizer_id: OrganizerId,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let discounts = service
        .list_discounts(&path.into_inner(), &organizer_id.0)
        .await?;

    Ok(HttpResponse::Ok().json(discounts))
}

/// Financial summary for an event (gross, fees, net) from settled snapshots
/// GET /events/{id}/financials
pub async fn event_financials(
    service: web::Data<Arc<EventService>>,
    organizer_id: OrganizerId,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let summary = service
        .event_financials(&path.into_inner(), &organizer_id.0)
        .await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// Configure event routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/events")
            .route("", web::post().to(create_event))
            .route("", web::get().to(list_events))
            .route("/{id}", web::get().to(get_event))
            .route("/{id}/publish", web::post().to(publish_event))
            .route("/{id}/cancel", web::post().to(cancel_event))
            .route("/{id}/tiers", web::post().to(create_tier))
            .route("/{id}/tiers", web::get().to(list_tiers))
            .route("/{id}/addons", web::post().to(create_addon))
            .route("/{id}/addons", web::get().to(list_addons))
            .route("/{id}/discounts", web::post().to(create_discount))
            .route("/{id}/discounts", web::get().to(list_discounts))
            .route("/{id}/financials", web::get().to(event_financials)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limit() {
        assert_eq!(default_limit(), 50);
    }

    #[test]
    fn test_list_query_defaults() {
        let query: ListEventsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 50);
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn test_create_event_request_fee_bearer_defaults_to_customer() {
        let json = r#"{
            "title": "Afrobeats Night",
            "venue": "Eko Convention Centre",
            "starts_at": "2026-10-01T18:00:00Z",
            "ends_at": "2026-10-02T00:00:00Z",
            "currency": "NGN"
        }"#;

        let request: CreateEventRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.fee_bearer, FeeBearer::Customer);
        assert!(request.platform_fee_percent.is_none());
    }
}
