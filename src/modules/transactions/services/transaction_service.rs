use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::core::{AppError, Result};
use crate::modules::checkout::models::{ItemKind, Reservation, ReservationStatus};
use crate::modules::checkout::repositories::{DiscountRepository, ReservationRepository};
use crate::modules::events::repositories::EventRepository;
use crate::modules::fees::services::FeeBreakdown;
use crate::modules::gateways::services::{ChargeStatus, ChargeVerification, PaymentGateway};
use crate::modules::payouts::services::reconciliation::{self, Settlement};
use crate::modules::transactions::models::{Transaction, TransactionStatus};
use crate::modules::transactions::repositories::TransactionRepository;

/// A transaction together with its settlement figures, for dashboards
#[derive(Debug, Clone, Serialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,

    /// Present for successful transactions only
    pub settlement: Option<Settlement>,
}

/// Service recording payments and their fee snapshots.
///
/// This is the one place fee snapshots are written. The snapshot comes from
/// the reservation's frozen quote (the amounts the gateway actually charged),
/// never from configuration current at webhook time.
pub struct TransactionService {
    transaction_repo: Arc<TransactionRepository>,
    reservation_repo: Arc<ReservationRepository>,
    event_repo: Arc<EventRepository>,
    discount_repo: Arc<DiscountRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl TransactionService {
    pub fn new(
        transaction_repo: Arc<TransactionRepository>,
        reservation_repo: Arc<ReservationRepository>,
        event_repo: Arc<EventRepository>,
        discount_repo: Arc<DiscountRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            transaction_repo,
            reservation_repo,
            event_repo,
            discount_repo,
            gateway,
        }
    }

    /// Verify a webhook signature against the raw body
    pub fn verify_webhook_signature(&self, signature: &str, payload: &[u8]) -> bool {
        self.gateway.verify_webhook(signature, payload)
    }

    /// Confirm a charge with the gateway and record the outcome.
    ///
    /// Webhooks are treated as notifications only; the charge state is
    /// always re-read from the gateway's verify endpoint before anything is
    /// recorded.
    pub async fn confirm_charge(&self, reference: &str) -> Result<Transaction> {
        let verification = self.gateway.verify_payment(reference).await?;

        match verification.status {
            ChargeStatus::Success => self.record_successful_charge(&verification).await,
            ChargeStatus::Failed | ChargeStatus::Abandoned => {
                self.release_unpaid_reservation(reference).await?;
                Err(AppError::gateway(format!(
                    "Charge {} was not successful",
                    reference
                )))
            }
            ChargeStatus::Pending => Err(AppError::gateway(format!(
                "Charge {} is still pending",
                reference
            ))),
        }
    }

    /// Record a gateway-verified successful charge. Idempotent on the
    /// gateway reference.
    pub async fn record_successful_charge(
        &self,
        verification: &ChargeVerification,
    ) -> Result<Transaction> {
        if let Some(existing) = self
            .transaction_repo
            .find_by_gateway_reference(&verification.reference)
            .await?
        {
            return Ok(existing);
        }

        let reservation = self
            .reservation_repo
            .find_by_gateway_reference(&verification.reference)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "No reservation for gateway reference {}",
                    verification.reference
                ))
            })?;

        let expected_minor = reservation
            .currency
            .to_minor_units(reservation.customer_total)
            .map_err(AppError::Internal)?;

        if verification.currency != reservation.currency
            || verification.amount_minor != expected_minor
        {
            return self
                .record_amount_mismatch(&reservation, verification, expected_minor)
                .await;
        }

        let transaction = Transaction::from_breakdown(
            reservation.id.clone().unwrap_or_default(),
            reservation.event_id.clone(),
            reservation.organizer_id.clone(),
            verification.reference.clone(),
            &reservation.quoted_breakdown(),
            &reservation.quoted_rates(),
            reservation.fee_bearer,
            reservation.currency,
            TransactionStatus::Success,
        )?;

        let created = self.transaction_repo.create(&transaction).await?;

        if let (Some(id), Some(channel)) = (created.id.as_deref(), &verification.channel) {
            self.transaction_repo
                .update_payment_channel(id, channel)
                .await?;
        }

        self.convert_reservation(&reservation).await?;

        info!(
            reference = %verification.reference,
            event_id = %created.event_id,
            amount = %created.amount,
            platform_fee = %created.platform_fee,
            processor_fee = %created.processor_fee,
            rate_source = %created.platform_rate_source,
            "Payment recorded"
        );

        Ok(created)
    }

    /// Poll the gateway for reservations whose webhook never arrived
    pub async fn verify_pending(&self, older_than_minutes: i64) -> Result<usize> {
        let cutoff = Utc::now() - Duration::minutes(older_than_minutes);
        let awaiting = self
            .reservation_repo
            .list_awaiting_verification(cutoff)
            .await?;

        let mut settled = 0;
        for reservation in awaiting {
            let Some(reference) = reservation.gateway_reference.clone() else {
                continue;
            };

            match self.gateway.verify_payment(&reference).await {
                Ok(verification) => match verification.status {
                    ChargeStatus::Success => {
                        self.record_successful_charge(&verification).await?;
                        settled += 1;
                    }
                    ChargeStatus::Failed | ChargeStatus::Abandoned => {
                        self.release_unpaid_reservation(&reference).await?;
                    }
                    ChargeStatus::Pending => {}
                },
                Err(e) => {
                    error!(
                        reference = %reference,
                        error = %e,
                        "Failed to verify pending charge"
                    );
                }
            }
        }

        Ok(settled)
    }

    /// Mark a settled charge refunded after the gateway processes a refund
    pub async fn mark_refunded(&self, reference: &str) -> Result<()> {
        let transaction = self
            .transaction_repo
            .find_by_gateway_reference(reference)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("No transaction for gateway reference {}", reference))
            })?;

        // Validate the transition on the model before persisting
        let mut updated = transaction.clone();
        updated.update_status(TransactionStatus::Refunded)?;

        let id = transaction
            .id
            .as_deref()
            .ok_or_else(|| AppError::internal("Transaction has no ID"))?;

        self.transaction_repo
            .update_status(id, TransactionStatus::Refunded)
            .await?;

        info!(reference = %reference, "Transaction marked refunded");

        Ok(())
    }

    /// Transactions for an organizer's dashboard, each with its settlement
    pub async fn list_for_organizer(
        &self,
        organizer_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TransactionView>> {
        let transactions = self
            .transaction_repo
            .list_for_organizer(organizer_id, limit, offset)
            .await?;

        transactions
            .into_iter()
            .map(|transaction| {
                let settlement = if transaction.is_success() {
                    Some(reconciliation::settle(&transaction)?)
                } else {
                    None
                };

                Ok(TransactionView {
                    transaction,
                    settlement,
                })
            })
            .collect()
    }

    /// Record an audit row for a charge whose settled amount does not match
    /// the reservation's quote. Nothing converts; the row is flagged failed
    /// for manual review.
    async fn record_amount_mismatch(
        &self,
        reservation: &Reservation,
        verification: &ChargeVerification,
        expected_minor: i64,
    ) -> Result<Transaction> {
        warn!(
            reference = %verification.reference,
            expected_minor = expected_minor,
            actual_minor = verification.amount_minor,
            expected_currency = %reservation.currency,
            actual_currency = %verification.currency,
            "Charge amount does not match reservation quote"
        );

        let actual = verification
            .currency
            .from_minor_units(verification.amount_minor);

        // Zeroed fees: a mismatched charge has no trustworthy fee split
        let audit_breakdown = FeeBreakdown {
            ticket_subtotal: actual,
            addon_subtotal: rust_decimal::Decimal::ZERO,
            subtotal: actual,
            platform_fee: rust_decimal::Decimal::ZERO,
            processor_fee: rust_decimal::Decimal::ZERO,
            customer_total: actual,
            organizer_net: actual,
        };

        let transaction = Transaction::from_breakdown(
            reservation.id.clone().unwrap_or_default(),
            reservation.event_id.clone(),
            reservation.organizer_id.clone(),
            verification.reference.clone(),
            &audit_breakdown,
            &reservation.quoted_rates(),
            reservation.fee_bearer,
            verification.currency,
            TransactionStatus::Failed,
        )?;

        self.transaction_repo.create(&transaction).await
    }

    /// Convert a paid reservation: holds become sales, the discount
    /// redemption is counted, and the reservation is marked converted.
    async fn convert_reservation(&self, reservation: &Reservation) -> Result<()> {
        let Some(id) = reservation.id.clone() else {
            return Err(AppError::internal("Reservation has no ID"));
        };

        // Validate the transition on the model before persisting; an
        // expired hold can still convert when the charge landed late.
        let mut updated = reservation.clone();
        updated.update_status(ReservationStatus::Converted)?;

        for item in &reservation.items {
            match item.kind {
                ItemKind::Tier => {
                    self.event_repo
                        .commit_tier(&item.item_id, item.quantity)
                        .await?;
                }
                ItemKind::Addon => {
                    self.event_repo
                        .commit_addon(&item.item_id, item.quantity)
                        .await?;
                }
            }
        }

        if let Some(discount_id) = &reservation.discount_id {
            if let Err(e) = self.discount_repo.increment_redeemed(discount_id).await {
                // The sale already settled; an exhausted cap only affects
                // future carts.
                warn!(
                    discount_id = %discount_id,
                    error = %e,
                    "Failed to count discount redemption"
                );
            }
        }

        self.reservation_repo
            .update_status(&id, ReservationStatus::Converted)
            .await?;

        Ok(())
    }

    /// Release a reservation whose charge failed or was abandoned
    async fn release_unpaid_reservation(&self, reference: &str) -> Result<()> {
        let Some(reservation) = self
            .reservation_repo
            .find_by_gateway_reference(reference)
            .await?
        else {
            return Ok(());
        };

        if reservation.status != ReservationStatus::Active {
            return Ok(());
        }

        let Some(id) = reservation.id.clone() else {
            return Ok(());
        };

        for item in &reservation.items {
            let result = match item.kind {
                ItemKind::Tier => {
                    self.event_repo
                        .release_tier(&item.item_id, item.quantity)
                        .await
                }
                ItemKind::Addon => {
                    self.event_repo
                        .release_addon(&item.item_id, item.quantity)
                        .await
                }
            };

            if let Err(e) = result {
                error!(
                    reservation_id = %id,
                    item_id = %item.item_id,
                    error = %e,
                    "Failed to release inventory for unpaid reservation"
                );
            }
        }

        self.reservation_repo
            .update_status(&id, ReservationStatus::Released)
            .await?;

        info!(reference = %reference, reservation_id = %id, "Unpaid reservation released");

        Ok(())
    }
}
