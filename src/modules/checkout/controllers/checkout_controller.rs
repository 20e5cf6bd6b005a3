use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::error::AppError;
use crate::modules::checkout::services::{CartRequest, CheckoutService};

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub event_id: String,
    #[serde(flatten)]
    pub cart: CartRequest,
}

#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    pub event_id: String,
    pub buyer_email: String,
    #[serde(flatten)]
    pub cart: CartRequest,
}

/// Price a cart without holding inventory
/// POST /checkout/quote
pub async fn quote(
    service: web::Data<Arc<CheckoutService>>,
    request: web::Json<QuoteRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let quote = service.quote(&request.event_id, &request.cart).await?;

    Ok(HttpResponse::Ok().json(quote))
}

/// Create a time-boxed reservation for a cart
/// POST /checkout/reservations
pub async fn reserve(
    service: web::Data<Arc<CheckoutService>>,
    request: web::Json<ReserveRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let reservation = service
        .reserve(&request.event_id, request.buyer_email, &request.cart)
        .await?;

    Ok(HttpResponse::Created().json(reservation))
}

/// Fetch a reservation (widget polls this after redirecting to the gateway)
/// GET /checkout/reservations/{id}
pub async fn get_reservation(
    service: web::Data<Arc<CheckoutService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let reservation = service.get_reservation(&path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(reservation))
}

/// Initialize a gateway charge for a reservation
/// POST /checkout/reservations/{id}/pay
pub async fn pay(
    service: web::Data<Arc<CheckoutService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = service.initialize_payment(&path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(session))
}

/// Configure public checkout routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/checkout")
            .route("/quote", web::post().to(quote))
            .route("/reservations", web::post().to(reserve))
            .route("/reservations/{id}", web::get().to(get_reservation))
            .route("/reservations/{id}/pay", web::post().to(pay)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_request_parses_flattened_cart() {
        let json = r#"{
            "event_id": "event-1",
            "tiers": [{"id": "tier-1", "quantity": 2}],
            "discount_code": "EARLY10"
        }"#;

        let request: QuoteRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.event_id, "event-1");
        assert_eq!(request.cart.tiers.len(), 1);
        assert_eq!(request.cart.tiers[0].quantity, 2);
        assert!(request.cart.addons.is_empty());
        assert_eq!(request.cart.discount_code.as_deref(), Some("EARLY10"));
    }

    #[test]
    fn test_reserve_request_requires_email() {
        let json = r#"{"event_id": "event-1", "tiers": []}"#;
        assert!(serde_json::from_str::<ReserveRequest>(json).is_err());
    }
}
