use std::sync::Arc;

use tracing::{error, info, warn};

use crate::core::{AppError, Currency, Result};
use crate::modules::gateways::services::{PaymentGateway, TransferRequest};
use crate::modules::organizers::repositories::OrganizerRepository;
use crate::modules::payouts::models::{Payout, PayoutStatus};
use crate::modules::payouts::repositories::PayoutRepository;
use crate::modules::payouts::services::reconciliation;
use crate::modules::transactions::repositories::TransactionRepository;

/// Service creating payout batches and driving gateway transfers.
///
/// A batch sweeps the organizer's unsettled successful transactions in one
/// currency, totals them through the shared reconciliation routine, and
/// initiates a gateway transfer for the net.
pub struct PayoutService {
    payout_repo: Arc<PayoutRepository>,
    transaction_repo: Arc<TransactionRepository>,
    organizer_repo: Arc<OrganizerRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl PayoutService {
    pub fn new(
        payout_repo: Arc<PayoutRepository>,
        transaction_repo: Arc<TransactionRepository>,
        organizer_repo: Arc<OrganizerRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            payout_repo,
            transaction_repo,
            organizer_repo,
            gateway,
        }
    }

    /// Create a payout batch for an organizer's unsettled transactions in
    /// the given currency, and initiate the transfer.
    pub async fn create_payout(&self, organizer_id: &str, currency: Currency) -> Result<Payout> {
        let organizer = self
            .organizer_repo
            .find_by_id(organizer_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Organizer {}", organizer_id)))?;

        if !organizer.has_settlement_details() {
            return Err(AppError::validation(
                "Organizer has no settlement bank details on file",
            ));
        }

        let unsettled = self
            .transaction_repo
            .list_unsettled_for_organizer(organizer_id)
            .await?;

        let batch: Vec<_> = unsettled
            .into_iter()
            .filter(|t| t.currency == currency)
            .collect();

        if batch.is_empty() {
            return Err(AppError::validation(format!(
                "No unsettled {} transactions to pay out",
                currency
            )));
        }

        let summary = reconciliation::summarize(&batch)?;
        let payout = Payout::new(organizer_id.to_string(), currency, &summary)?;
        let payout = self.payout_repo.create(&payout).await?;

        let payout_id = payout
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Created payout has no ID"))?;

        let ids: Vec<String> = batch.iter().filter_map(|t| t.id.clone()).collect();
        let settled_count = self.transaction_repo.mark_settled(&ids, &payout_id).await?;

        if settled_count != ids.len() as u64 {
            warn!(
                payout_id = %payout_id,
                expected = ids.len(),
                settled = settled_count,
                "Some transactions were settled by a concurrent payout"
            );
        }

        let amount_minor = currency
            .to_minor_units(payout.amount)
            .map_err(AppError::Internal)?;

        let transfer = self
            .gateway
            .initiate_transfer(TransferRequest {
                reference: payout.reference.clone(),
                amount_minor,
                currency,
                bank_code: organizer.settlement_bank_code.clone().unwrap_or_default(),
                account_number: organizer
                    .settlement_account_number
                    .clone()
                    .unwrap_or_default(),
                account_name: organizer.name.clone(),
                recipient_code: organizer.settlement_recipient_code.clone(),
            })
            .await;

        match transfer {
            Ok(transfer) => {
                if organizer.settlement_recipient_code.as_deref()
                    != Some(transfer.recipient_code.as_str())
                {
                    self.organizer_repo
                        .set_recipient_code(organizer_id, &transfer.recipient_code)
                        .await?;
                }

                self.payout_repo
                    .set_transfer_code(&payout_id, &transfer.transfer_code)
                    .await?;

                info!(
                    payout_id = %payout_id,
                    reference = %payout.reference,
                    amount = %payout.amount,
                    transaction_count = payout.transaction_count,
                    "Payout transfer initiated"
                );

                self.get_payout(&payout_id, organizer_id).await
            }
            Err(e) => {
                // Unwind so the transactions are sweepable by a retry
                error!(
                    payout_id = %payout_id,
                    error = %e,
                    "Transfer initiation failed; releasing batch"
                );
                self.transaction_repo.clear_settlement(&payout_id).await?;
                self.payout_repo
                    .update_status(&payout_id, PayoutStatus::Failed)
                    .await?;

                Err(e)
            }
        }
    }

    pub async fn get_payout(&self, id: &str, organizer_id: &str) -> Result<Payout> {
        let payout = self
            .payout_repo
            .find_by_id(id)
            .await?
            .filter(|p| p.organizer_id == organizer_id)
            .ok_or_else(|| AppError::not_found(format!("Payout {}", id)))?;

        Ok(payout)
    }

    pub async fn list_payouts(
        &self,
        organizer_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Payout>> {
        self.payout_repo
            .list_for_organizer(organizer_id, limit, offset)
            .await
    }

    /// Mark a payout paid after the gateway confirms the transfer
    pub async fn complete_transfer(&self, reference: &str) -> Result<()> {
        let payout = self
            .payout_repo
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payout with reference {}", reference)))?;

        let id = payout
            .id
            .ok_or_else(|| AppError::internal("Payout has no ID"))?;

        self.payout_repo.update_status(&id, PayoutStatus::Paid).await?;

        info!(payout_id = %id, reference = %reference, "Payout confirmed paid");

        Ok(())
    }

    /// Mark a payout failed and release its transactions for re-batching
    pub async fn fail_transfer(&self, reference: &str) -> Result<()> {
        let payout = self
            .payout_repo
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payout with reference {}", reference)))?;

        let id = payout
            .id
            .ok_or_else(|| AppError::internal("Payout has no ID"))?;

        self.payout_repo
            .update_status(&id, PayoutStatus::Failed)
            .await?;
        let released = self.transaction_repo.clear_settlement(&id).await?;

        warn!(
            payout_id = %id,
            reference = %reference,
            released_transactions = released,
            "Payout failed; transactions released for re-batching"
        );

        Ok(())
    }
}
