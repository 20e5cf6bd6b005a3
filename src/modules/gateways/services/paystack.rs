use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha512;

use super::gateway_trait::{
    ChargeStatus, ChargeVerification, InitializeRequest, InitializeResponse, PaymentGateway,
    TransferRequest, TransferResponse,
};
use crate::core::{AppError, Currency, Result};

type HmacSha512 = Hmac<Sha512>;

/// Paystack gateway client
///
/// API Documentation: https://paystack.com/docs/api/
pub struct PaystackClient {
    client: Client,
    secret_key: String,
    base_url: String,
}

/// Paystack wraps every response in the same envelope
#[derive(Debug, Deserialize)]
struct PaystackEnvelope<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

impl PaystackClient {
    pub fn new(secret_key: String, base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            secret_key,
            base_url: base_url.unwrap_or_else(|| "https://api.paystack.co".to_string()),
        }
    }

    /// Unwrap a Paystack envelope, mapping gateway-level failures
    fn unwrap_envelope<T>(&self, envelope: PaystackEnvelope<T>, context: &str) -> Result<T> {
        if !envelope.status {
            return Err(AppError::gateway(format!(
                "Paystack {} failed: {}",
                context, envelope.message
            )));
        }

        envelope.data.ok_or_else(|| {
            AppError::gateway(format!(
                "Paystack {} returned no data: {}",
                context, envelope.message
            ))
        })
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        context: &str,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::gateway(format!("Paystack {} error: {}", context, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(AppError::gateway(format!(
                "Paystack {} error {}: {}",
                context, status, error_body
            )));
        }

        let envelope: PaystackEnvelope<T> = response.json().await.map_err(|e| {
            AppError::gateway(format!("Failed to parse Paystack {} response: {}", context, e))
        })?;

        self.unwrap_envelope(envelope, context)
    }

    /// Create a transfer recipient, returning the recipient code
    async fn create_recipient(&self, request: &TransferRequest) -> Result<String> {
        #[derive(Serialize)]
        struct RecipientRequest<'a> {
            #[serde(rename = "type")]
            kind: &'a str,
            name: &'a str,
            account_number: &'a str,
            bank_code: &'a str,
            currency: String,
        }

        #[derive(Deserialize)]
        struct RecipientData {
            recipient_code: String,
        }

        let recipient: RecipientData = self
            .post_json(
                "/transferrecipient",
                &RecipientRequest {
                    kind: "nuban",
                    name: &request.account_name,
                    account_number: &request.account_number,
                    bank_code: &request.bank_code,
                    currency: request.currency.to_string(),
                },
                "recipient creation",
            )
            .await?;

        Ok(recipient.recipient_code)
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize_payment(&self, request: InitializeRequest) -> Result<InitializeResponse> {
        #[derive(Serialize)]
        struct PaystackInitializeRequest<'a> {
            email: &'a str,
            amount: i64,
            currency: String,
            reference: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            callback_url: Option<&'a str>,
        }

        #[derive(Deserialize)]
        struct InitializeData {
            authorization_url: String,
            access_code: String,
            reference: String,
        }

        let data: InitializeData = self
            .post_json(
                "/transaction/initialize",
                &PaystackInitializeRequest {
                    email: &request.email,
                    amount: request.amount_minor,
                    currency: request.currency.to_string(),
                    reference: &request.reference,
                    callback_url: request.callback_url.as_deref(),
                },
                "initialize",
            )
            .await?;

        Ok(InitializeResponse {
            authorization_url: data.authorization_url,
            access_code: data.access_code,
            reference: data.reference,
        })
    }

    async fn verify_payment(&self, reference: &str) -> Result<ChargeVerification> {
        #[derive(Deserialize)]
        struct VerifyData {
            reference: String,
            status: String,
            amount: i64,
            currency: String,
            channel: Option<String>,
            paid_at: Option<String>,
        }

        let url = format!("{}/transaction/verify/{}", self.base_url, reference);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| AppError::gateway(format!("Paystack verify error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(AppError::gateway(format!(
                "Paystack verify error {}: {}",
                status, error_body
            )));
        }

        let envelope: PaystackEnvelope<VerifyData> = response
            .json()
            .await
            .map_err(|e| AppError::gateway(format!("Failed to parse Paystack verify response: {}", e)))?;

        let data = self.unwrap_envelope(envelope, "verify")?;

        let status = match data.status.as_str() {
            "success" => ChargeStatus::Success,
            "failed" => ChargeStatus::Failed,
            "abandoned" => ChargeStatus::Abandoned,
            _ => ChargeStatus::Pending,
        };

        let currency: Currency = data
            .currency
            .parse()
            .map_err(|e: String| AppError::gateway(format!("Paystack verify: {}", e)))?;

        let paid_at = data
            .paid_at
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(ChargeVerification {
            reference: data.reference,
            status,
            amount_minor: data.amount,
            currency,
            channel: data.channel,
            paid_at,
        })
    }

    async fn initiate_transfer(&self, request: TransferRequest) -> Result<TransferResponse> {
        // Reuse a cached recipient code when the caller has one
        let recipient_code = match &request.recipient_code {
            Some(code) => code.clone(),
            None => self.create_recipient(&request).await?,
        };

        #[derive(Serialize)]
        struct PaystackTransferRequest<'a> {
            source: &'a str,
            amount: i64,
            currency: String,
            recipient: &'a str,
            reference: &'a str,
            reason: &'a str,
        }

        #[derive(Deserialize)]
        struct TransferData {
            transfer_code: String,
            reference: String,
        }

        let data: TransferData = self
            .post_json(
                "/transfer",
                &PaystackTransferRequest {
                    source: "balance",
                    amount: request.amount_minor,
                    currency: request.currency.to_string(),
                    recipient: &recipient_code,
                    reference: &request.reference,
                    reason: "GatePass payout",
                },
                "transfer",
            )
            .await?;

        Ok(TransferResponse {
            transfer_code: data.transfer_code,
            recipient_code,
            reference: data.reference,
        })
    }

    fn verify_webhook(&self, signature: &str, payload: &[u8]) -> bool {
        // Paystack signs the raw body with HMAC-SHA512 of the secret key and
        // sends the hex digest in x-paystack-signature
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };

        let Ok(mut mac) = HmacSha512::new_from_slice(self.secret_key.as_bytes()) else {
            return false;
        };

        mac.update(payload);
        mac.verify_slice(&expected).is_ok()
    }

    fn name(&self) -> &str {
        "paystack"
    }

    fn supports_currency(&self, currency: Currency) -> bool {
        matches!(
            currency,
            Currency::NGN | Currency::GHS | Currency::ZAR | Currency::KES | Currency::USD
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PaystackClient {
        PaystackClient::new("sk_test_secret".to_string(), None)
    }

    fn sign(payload: &[u8], key: &str) -> String {
        let mut mac = HmacSha512::new_from_slice(key.as_bytes()).unwrap();
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_webhook_signature_valid() {
        let client = client();
        let payload = br#"{"event":"charge.success","data":{"reference":"ref-1"}}"#;
        let signature = sign(payload, "sk_test_secret");

        assert!(client.verify_webhook(&signature, payload));
    }

    #[test]
    fn test_webhook_signature_wrong_key() {
        let client = client();
        let payload = br#"{"event":"charge.success"}"#;
        let signature = sign(payload, "sk_other_secret");

        assert!(!client.verify_webhook(&signature, payload));
    }

    #[test]
    fn test_webhook_signature_tampered_body() {
        let client = client();
        let payload = br#"{"event":"charge.success","data":{"amount":10700}}"#;
        let signature = sign(payload, "sk_test_secret");
        let tampered = br#"{"event":"charge.success","data":{"amount":99999}}"#;

        assert!(!client.verify_webhook(&signature, tampered));
    }

    #[test]
    fn test_webhook_signature_not_hex() {
        let client = client();
        assert!(!client.verify_webhook("not-hex!", b"{}"));
    }

    #[test]
    fn test_supported_currencies() {
        let client = client();
        assert!(client.supports_currency(Currency::NGN));
        assert!(client.supports_currency(Currency::USD));
        assert!(!client.supports_currency(Currency::XOF));
    }
}
