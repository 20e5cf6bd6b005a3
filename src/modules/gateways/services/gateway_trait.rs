use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Currency, Result};

/// Payment gateway abstraction for charges, transfers, and webhook
/// verification.
///
/// All amounts cross this boundary in minor currency units
/// (kobo/pesewas/cents), matching what the gateway's wire format expects.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Initialize a charge and return the hosted payment page
    async fn initialize_payment(&self, request: InitializeRequest) -> Result<InitializeResponse>;

    /// Verify a charge by its reference
    async fn verify_payment(&self, reference: &str) -> Result<ChargeVerification>;

    /// Initiate a transfer to an organizer's settlement account
    async fn initiate_transfer(&self, request: TransferRequest) -> Result<TransferResponse>;

    /// Verify a webhook signature against the raw request body
    fn verify_webhook(&self, signature: &str, payload: &[u8]) -> bool;

    /// Gateway name
    fn name(&self) -> &str;

    /// Check if the gateway supports a currency
    fn supports_currency(&self, currency: Currency) -> bool;
}

/// Charge initialization data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeRequest {
    /// Our reference for the charge (reservation-derived, unique)
    pub reference: String,

    /// Amount in minor currency units
    pub amount_minor: i64,

    pub currency: Currency,

    /// Guest email, required by the gateway
    pub email: String,

    /// Redirect after payment completes
    pub callback_url: Option<String>,
}

/// Response from charge initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResponse {
    /// Hosted payment page for the guest
    pub authorization_url: String,

    /// Gateway's access code for the charge session
    pub access_code: String,

    /// Echoed charge reference
    pub reference: String,
}

/// Charge status as reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeStatus {
    Success,
    Failed,
    Abandoned,
    Pending,
}

/// Result of verifying a charge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeVerification {
    pub reference: String,

    pub status: ChargeStatus,

    /// Amount settled, in minor currency units
    pub amount_minor: i64,

    pub currency: Currency,

    /// Payment channel (card, bank, ussd, ...)
    pub channel: Option<String>,

    pub paid_at: Option<DateTime<Utc>>,
}

/// Transfer initiation data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Our reference for the payout batch
    pub reference: String,

    /// Amount in minor currency units
    pub amount_minor: i64,

    pub currency: Currency,

    /// Recipient bank code
    pub bank_code: String,

    /// Recipient account number
    pub account_number: String,

    /// Recipient display name
    pub account_name: String,

    /// Previously created gateway recipient code, if any
    pub recipient_code: Option<String>,
}

/// Response from transfer initiation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResponse {
    /// Gateway's transfer code
    pub transfer_code: String,

    /// Recipient code (new or reused), for caching on the organizer
    pub recipient_code: String,

    /// Echoed payout reference
    pub reference: String,
}
