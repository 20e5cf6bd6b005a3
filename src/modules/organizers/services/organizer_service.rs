use std::sync::Arc;

use rust_decimal::Decimal;

use crate::core::{AppError, Result};
use crate::modules::organizers::models::Organizer;
use crate::modules::organizers::repositories::OrganizerRepository;

/// Service for organizer account operations
pub struct OrganizerService {
    organizer_repo: Arc<OrganizerRepository>,
}

impl OrganizerService {
    pub fn new(organizer_repo: Arc<OrganizerRepository>) -> Self {
        Self { organizer_repo }
    }

    pub async fn create_organizer(
        &self,
        name: String,
        email: String,
        platform_fee_percent: Option<Decimal>,
    ) -> Result<Organizer> {
        let organizer = Organizer::new(name, email, platform_fee_percent)?;
        self.organizer_repo.create(&organizer).await
    }

    pub async fn get_organizer(&self, id: &str) -> Result<Organizer> {
        self.organizer_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Organizer {}", id)))
    }

    pub async fn update_settlement_details(
        &self,
        id: &str,
        bank_code: String,
        account_number: String,
    ) -> Result<Organizer> {
        // Run the model-level validation before touching the database
        let mut organizer = self.get_organizer(id).await?;
        organizer.set_settlement_details(bank_code, account_number)?;

        self.organizer_repo
            .update_settlement_details(
                id,
                organizer.settlement_bank_code.as_deref().unwrap_or_default(),
                organizer
                    .settlement_account_number
                    .as_deref()
                    .unwrap_or_default(),
            )
            .await?;

        self.get_organizer(id).await
    }
}
