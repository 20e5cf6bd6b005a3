use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::core::error::AppError;
use crate::modules::payouts::services::PayoutService;
use crate::modules::transactions::services::TransactionService;

/// Paystack webhook envelope
#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event: String,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    reference: Option<String>,
}

/// Paystack webhook intake
/// POST /webhooks/paystack
///
/// The signature is an HMAC-SHA512 of the raw body; the body must not be
/// deserialized before verification. Event payloads are treated as
/// notifications only; charge state is re-verified against the gateway
/// before anything is recorded.
pub async fn paystack_webhook(
    transaction_service: web::Data<Arc<TransactionService>>,
    payout_service: web::Data<Arc<PayoutService>>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let signature = req
        .headers()
        .get("x-paystack-signature")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Missing x-paystack-signature header"))?;

    if !transaction_service.verify_webhook_signature(signature, &body) {
        warn!("Rejected webhook with invalid signature");
        return Err(AppError::unauthorized("Invalid webhook signature"));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)?;

    let reference = event.data.reference.clone().unwrap_or_default();
    if reference.is_empty() {
        warn!(event = %event.event, "Webhook event carries no reference");
        return Ok(HttpResponse::Ok().json(serde_json::json!({ "received": true })));
    }

    match event.event.as_str() {
        "charge.success" => {
            info!(reference = %reference, "Processing charge.success webhook");
            transaction_service.confirm_charge(&reference).await?;
        }
        "transfer.success" => {
            info!(reference = %reference, "Processing transfer.success webhook");
            payout_service.complete_transfer(&reference).await?;
        }
        "transfer.failed" | "transfer.reversed" => {
            warn!(reference = %reference, event = %event.event, "Transfer did not complete");
            payout_service.fail_transfer(&reference).await?;
        }
        "refund.processed" => {
            info!(reference = %reference, "Processing refund.processed webhook");
            transaction_service.mark_refunded(&reference).await?;
        }
        other => {
            debug!(event = %other, "Ignoring unhandled webhook event");
        }
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "received": true })))
}

/// Configure webhook routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/webhooks").route("/paystack", web::post().to(paystack_webhook)),
    );
}
