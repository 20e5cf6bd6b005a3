use std::sync::Arc;

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::core::error::AppError;
use crate::middleware::auth::OrganizerId;
use crate::modules::organizers::services::OrganizerService;

#[derive(Debug, Deserialize)]
pub struct CreateOrganizerRequest {
    pub name: String,
    pub email: String,
    pub platform_fee_percent: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettlementRequest {
    pub bank_code: String,
    pub account_number: String,
}

/// Onboard a new organizer (platform-operator action)
/// POST /organizers
pub async fn create_organizer(
    service: web::Data<Arc<OrganizerService>>,
    _operator: OrganizerId,
    request: web::Json<CreateOrganizerRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let organizer = service
        .create_organizer(request.name, request.email, request.platform_fee_percent)
        .await?;

    Ok(HttpResponse::Created().json(organizer))
}

/// Get the authenticated organizer's profile
/// GET /organizers/me
pub async fn get_profile(
    service: web::Data<Arc<OrganizerService>>,
    organizer_id: OrganizerId,
) -> Result<HttpResponse, AppError> {
    let organizer = service.get_organizer(&organizer_id.0).await?;

    Ok(HttpResponse::Ok().json(organizer))
}

/// Update settlement bank details for the authenticated organizer
/// PUT /organizers/me/settlement
pub async fn update_settlement(
    service: web::Data<Arc<OrganizerService>>,
    organizer_id: OrganizerId,
    request: web::Json<UpdateSettlementRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let organizer = service
        .update_settlement_details(&organizer_id.0, request.bank_code, request.account_number)
        .await?;

    Ok(HttpResponse::Ok().json(organizer))
}

/// Configure organizer routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/organizers")
            .route("", web::post().to(create_organizer))
            .route("/me", web::get().to(get_profile))
            .route("/me/settlement", web::put().to(update_settlement)),
    );
}
