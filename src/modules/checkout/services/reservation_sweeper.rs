use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{error, info};

use crate::core::error::AppError;
use crate::modules::checkout::models::{ItemKind, ReservationStatus};
use crate::modules::checkout::repositories::ReservationRepository;
use crate::modules::events::repositories::EventRepository;

/// Background job releasing lapsed reservation holds.
///
/// Expiry is enforced here on the server, not by the widget's countdown:
/// a reservation past `expires_at` has its held inventory returned and its
/// status moved to `expired`. A charge that still lands afterwards is
/// honored by the payment path, which accepts expired holds.
pub struct ReservationSweeper {
    reservation_repo: Arc<ReservationRepository>,
    event_repo: Arc<EventRepository>,
    sweep_interval: Duration,
}

impl ReservationSweeper {
    pub fn new(
        reservation_repo: Arc<ReservationRepository>,
        event_repo: Arc<EventRepository>,
        sweep_interval_secs: u64,
    ) -> Self {
        Self {
            reservation_repo,
            event_repo,
            sweep_interval: Duration::from_secs(sweep_interval_secs),
        }
    }

    /// Run the sweeper loop. Spawn as a tokio task from main.
    pub async fn start(self: Arc<Self>) {
        info!(
            interval_secs = self.sweep_interval.as_secs(),
            "Starting reservation sweeper"
        );

        let mut ticker = interval(self.sweep_interval);

        loop {
            ticker.tick().await;

            match self.sweep().await {
                Ok(expired_count) => {
                    if expired_count > 0 {
                        info!(expired_count, "Expired reservations released");
                    }
                }
                Err(e) => {
                    error!(error = %e, "Error sweeping expired reservations");
                }
            }
        }
    }

    /// Release all lapsed active reservations, returning how many expired
    pub async fn sweep(&self) -> Result<usize, AppError> {
        let expired = self.reservation_repo.list_expired_active(Utc::now()).await?;
        let mut count = 0;

        for reservation in expired {
            let Some(id) = reservation.id.clone() else {
                continue;
            };

            for item in &reservation.items {
                let result = match item.kind {
                    ItemKind::Tier => {
                        self.event_repo.release_tier(&item.item_id, item.quantity).await
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
                        "Failed to release inventory for expired reservation"
                    );
                }
            }

            self.reservation_repo
                .update_status(&id, ReservationStatus::Expired)
                .await?;

            count += 1;
        }

        Ok(count)
    }
}
