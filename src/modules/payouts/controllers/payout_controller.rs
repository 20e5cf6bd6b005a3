use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::error::AppError;
use crate::core::Currency;
use crate::middleware::auth::OrganizerId;
use crate::modules::payouts::services::PayoutService;

#[derive(Debug, Deserialize)]
pub struct CreatePayoutRequest {
    pub currency: Currency,
}

/// Query parameters for listing payouts
#[derive(Debug, Deserialize)]
pub struct ListPayoutsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Sweep unsettled transactions into a payout and initiate the transfer
/// POST /payouts
pub async fn create_payout(
    service: web::Data<Arc<PayoutService>>,
    organizer_id: OrganizerId,
    request: web::Json<CreatePayoutRequest>,
) -> Result<HttpResponse, AppError> {
    let payout = service
        .create_payout(&organizer_id.0, request.currency)
        .await?;

    Ok(HttpResponse::Created().json(payout))
}

/// Get payout by ID
/// GET /payouts/{id}
pub async fn get_payout(
    service: web::Data<Arc<PayoutService>>,
    organizer_id: OrganizerId,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let payout = service
        .get_payout(&path.into_inner(), &organizer_id.0)
        .await?;

    Ok(HttpResponse::Ok().json(payout))
}

/// List payouts for the authenticated organizer
/// GET /payouts
pub async fn list_payouts(
    service: web::Data<Arc<PayoutService>>,
    organizer_id: OrganizerId,
    query: web::Query<ListPayoutsQuery>,
) -> Result<HttpResponse, AppError> {
    let payouts = service
        .list_payouts(&organizer_id.0, query.limit, query.offset)
        .await?;

    Ok(HttpResponse::Ok().json(payouts))
}

/// Configure payout routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payouts")
            .route("", web::post().to(create_payout))
            .route("", web::get().to(list_payouts))
            .route("/{id}", web::get().to(get_payout)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_payout_request_parses_currency() {
        let request: CreatePayoutRequest = serde_json::from_str(r#"{"currency": "NGN"}"#).unwrap();
        assert_eq!(request.currency, Currency::NGN);
    }

    #[test]
    fn test_list_query_defaults() {
        let query: ListPayoutsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 50);
        assert_eq!(query.offset, 0);
    }
}
