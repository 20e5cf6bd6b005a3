use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, Currency, Result};
use crate::modules::checkout::models::{
    Discount, ItemKind, Reservation, ReservationItem,
};
use crate::modules::checkout::repositories::{DiscountRepository, ReservationRepository};
use crate::modules::events::models::Event;
use crate::modules::events::repositories::EventRepository;
use crate::modules::fees::models::{EffectiveRates, FeeBearer, FeeRates};
use crate::modules::fees::services::{FeeBreakdown, FeeCalculator, RateResolver};
use crate::modules::gateways::services::{InitializeRequest, PaymentGateway};
use crate::modules::organizers::repositories::OrganizerRepository;

/// One cart line by tier or add-on id
#[derive(Debug, Clone, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub quantity: i32,
}

/// A guest's cart for one event
#[derive(Debug, Clone, Deserialize)]
pub struct CartRequest {
    #[serde(default)]
    pub tiers: Vec<CartLine>,

    #[serde(default)]
    pub addons: Vec<CartLine>,

    pub discount_code: Option<String>,
}

/// Priced cart returned to the checkout widget
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub event_id: String,
    pub currency: Currency,
    pub fee_bearer: FeeBearer,
    pub ticket_subtotal: Decimal,
    pub addon_subtotal: Decimal,
    pub discount_total: Decimal,
    pub platform_fee: Decimal,
    pub processor_fee: Decimal,
    pub customer_total: Decimal,
}

/// Hosted-payment handle returned after initialization
#[derive(Debug, Clone, Serialize)]
pub struct PaymentSession {
    pub reservation_id: String,
    pub reference: String,
    pub authorization_url: String,
    pub access_code: String,
    pub amount: Decimal,
    pub currency: Currency,
}

struct PricedCart {
    event: Event,
    lines: Vec<(ItemKind, String, i32, Decimal)>,
    discount: Option<Discount>,
    discount_total: Decimal,
    rates: EffectiveRates,
    breakdown: FeeBreakdown,
}

/// Service behind the embeddable checkout: pricing, holds, and payment
/// initialization.
pub struct CheckoutService {
    event_repo: Arc<EventRepository>,
    organizer_repo: Arc<OrganizerRepository>,
    reservation_repo: Arc<ReservationRepository>,
    discount_repo: Arc<DiscountRepository>,
    gateway: Arc<dyn PaymentGateway>,
    resolver: RateResolver,
    calculator: FeeCalculator,
    fee_defaults: FeeRates,
    hold_minutes: i64,
    callback_url: Option<String>,
}

impl CheckoutService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_repo: Arc<EventRepository>,
        organizer_repo: Arc<OrganizerRepository>,
        reservation_repo: Arc<ReservationRepository>,
        discount_repo: Arc<DiscountRepository>,
        gateway: Arc<dyn PaymentGateway>,
        fee_defaults: FeeRates,
        hold_minutes: i64,
        callback_url: Option<String>,
    ) -> Self {
        Self {
            event_repo,
            organizer_repo,
            reservation_repo,
            discount_repo,
            gateway,
            resolver: RateResolver::new(),
            calculator: FeeCalculator::new(),
            fee_defaults,
            hold_minutes,
            callback_url,
        }
    }

    /// Price a cart without holding inventory
    pub async fn quote(&self, event_id: &str, cart: &CartRequest) -> Result<Quote> {
        let priced = self.price_cart(event_id, cart).await?;

        Ok(Quote {
            event_id: event_id.to_string(),
            currency: priced.event.currency,
            fee_bearer: priced.event.fee_bearer,
            ticket_subtotal: priced.breakdown.ticket_subtotal,
            addon_subtotal: priced.breakdown.addon_subtotal,
            discount_total: priced.discount_total,
            platform_fee: priced.breakdown.platform_fee,
            processor_fee: priced.breakdown.processor_fee,
            customer_total: priced.breakdown.customer_total,
        })
    }

    /// Price a cart and place a time-boxed hold on its inventory
    pub async fn reserve(
        &self,
        event_id: &str,
        buyer_email: String,
        cart: &CartRequest,
    ) -> Result<Reservation> {
        let priced = self.price_cart(event_id, cart).await?;

        if priced.breakdown.customer_total == Decimal::ZERO {
            return Err(AppError::validation(
                "Cart total is zero; there is nothing to charge",
            ));
        }

        let mut reservation = Reservation::new(
            priced.event.id.clone().unwrap_or_default(),
            priced.event.organizer_id.clone(),
            buyer_email,
            priced.event.currency,
            priced.event.fee_bearer,
            &priced.breakdown,
            &priced.rates,
            priced.discount_total,
            priced.discount.as_ref().and_then(|d| d.id.clone()),
            self.hold_minutes,
        )?;

        let reservation_id = reservation.id.clone().unwrap_or_default();
        for (kind, item_id, quantity, unit_price) in &priced.lines {
            reservation.items.push(ReservationItem::new(
                reservation_id.clone(),
                *kind,
                item_id.clone(),
                *quantity,
                *unit_price,
            )?);
        }

        // Hold inventory line by line; unwind on the first failure so a
        // partially held cart is never left behind.
        let mut held: Vec<(ItemKind, String, i32)> = Vec::new();
        for (kind, item_id, quantity, _) in &priced.lines {
            let result = match kind {
                ItemKind::Tier => self.event_repo.hold_tier(item_id, *quantity).await,
                ItemKind::Addon => self.event_repo.hold_addon(item_id, *quantity).await,
            };

            if let Err(e) = result {
                self.release_lines(&held).await;
                return Err(e);
            }

            held.push((*kind, item_id.clone(), *quantity));
        }

        match self.reservation_repo.create(&reservation).await {
            Ok(created) => {
                tracing::info!(
                    reservation_id = %reservation_id,
                    event_id = %event_id,
                    customer_total = %created.customer_total,
                    "Reservation created"
                );
                Ok(created)
            }
            Err(e) => {
                self.release_lines(&held).await;
                Err(e)
            }
        }
    }

    /// Initialize a gateway charge for an active reservation
    pub async fn initialize_payment(&self, reservation_id: &str) -> Result<PaymentSession> {
        let reservation = self
            .reservation_repo
            .find_by_id(reservation_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Reservation {}", reservation_id)))?;

        if !reservation.is_payable() {
            return Err(AppError::validation(format!(
                "Reservation {} is {} and can no longer be paid",
                reservation_id,
                if reservation.is_expired() {
                    "expired".to_string()
                } else {
                    reservation.status.to_string()
                }
            )));
        }

        if !self.gateway.supports_currency(reservation.currency) {
            return Err(AppError::validation(format!(
                "Gateway {} does not support currency {}",
                self.gateway.name(),
                reservation.currency
            )));
        }

        let amount_minor = reservation
            .currency
            .to_minor_units(reservation.customer_total)
            .map_err(AppError::Internal)?;

        // A fresh reference per initialization; the reference on file is the
        // one the webhook converts against.
        let reference = format!("gp-{}", Uuid::new_v4());

        let response = self
            .gateway
            .initialize_payment(InitializeRequest {
                reference: reference.clone(),
                amount_minor,
                currency: reservation.currency,
                email: reservation.buyer_email.clone(),
                callback_url: self.callback_url.clone(),
            })
            .await?;

        self.reservation_repo
            .set_gateway_reference(reservation_id, &response.reference)
            .await?;

        tracing::info!(
            reservation_id = %reservation_id,
            reference = %response.reference,
            amount_minor = amount_minor,
            "Payment initialized"
        );

        Ok(PaymentSession {
            reservation_id: reservation_id.to_string(),
            reference: response.reference,
            authorization_url: response.authorization_url,
            access_code: response.access_code,
            amount: reservation.customer_total,
            currency: reservation.currency,
        })
    }

    /// Fetch a reservation for the widget to poll
    pub async fn get_reservation(&self, reservation_id: &str) -> Result<Reservation> {
        self.reservation_repo
            .find_by_id(reservation_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Reservation {}", reservation_id)))
    }

    async fn price_cart(&self, event_id: &str, cart: &CartRequest) -> Result<PricedCart> {
        if cart.tiers.is_empty() && cart.addons.is_empty() {
            return Err(AppError::validation("Cart cannot be empty"));
        }

        let event = self
            .event_repo
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Event {}", event_id)))?;

        if !event.is_on_sale() {
            return Err(AppError::validation(format!(
                "Event {} is not on sale",
                event_id
            )));
        }

        let organizer = self
            .organizer_repo
            .find_by_id(&event.organizer_id)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!(
                    "Event {} references missing organizer {}",
                    event_id, event.organizer_id
                ))
            })?;

        let mut lines: Vec<(ItemKind, String, i32, Decimal)> = Vec::new();
        let mut ticket_subtotal = Decimal::ZERO;
        let mut addon_subtotal = Decimal::ZERO;

        for line in &cart.tiers {
            if line.quantity <= 0 {
                return Err(AppError::validation("Tier quantity must be positive"));
            }

            let tier = self
                .event_repo
                .find_tier(&line.id)
                .await?
                .filter(|t| t.event_id == event_id)
                .ok_or_else(|| AppError::not_found(format!("Ticket tier {}", line.id)))?;

            if tier.available() < line.quantity {
                return Err(AppError::validation(format!(
                    "Only {} tickets left in tier '{}'",
                    tier.available(),
                    tier.name
                )));
            }

            ticket_subtotal += tier.price * Decimal::from(line.quantity);
            lines.push((ItemKind::Tier, line.id.clone(), line.quantity, tier.price));
        }

        for line in &cart.addons {
            if line.quantity <= 0 {
                return Err(AppError::validation("Add-on quantity must be positive"));
            }

            let addon = self
                .event_repo
                .find_addon(&line.id)
                .await?
                .filter(|a| a.event_id == event_id)
                .ok_or_else(|| AppError::not_found(format!("Add-on {}", line.id)))?;

            if addon.available() < line.quantity {
                return Err(AppError::validation(format!(
                    "Only {} left of add-on '{}'",
                    addon.available(),
                    addon.name
                )));
            }

            addon_subtotal += addon.price * Decimal::from(line.quantity);
            lines.push((ItemKind::Addon, line.id.clone(), line.quantity, addon.price));
        }

        let (discount, discount_total) = match &cart.discount_code {
            Some(code) => {
                let discount = self
                    .discount_repo
                    .find_by_code(event_id, code)
                    .await?
                    .filter(Discount::is_usable)
                    .ok_or_else(|| {
                        AppError::validation(format!("Discount code '{}' is not valid", code))
                    })?;

                let amount = discount.amount_off(ticket_subtotal, event.currency);
                (Some(discount), amount)
            }
            None => (None, Decimal::ZERO),
        };

        let rates = self.resolver.resolve(
            &self.fee_defaults,
            organizer.platform_fee_percent,
            event.platform_fee_percent,
        )?;

        let breakdown = self.calculator.calculate(
            ticket_subtotal - discount_total,
            addon_subtotal,
            event.fee_bearer,
            &rates,
            event.currency,
        )?;

        Ok(PricedCart {
            event,
            lines,
            discount,
            discount_total,
            rates,
            breakdown,
        })
    }

    async fn release_lines(&self, held: &[(ItemKind, String, i32)]) {
        for (kind, item_id, quantity) in held {
            let result = match kind {
                ItemKind::Tier => self.event_repo.release_tier(item_id, *quantity).await,
                ItemKind::Addon => self.event_repo.release_addon(item_id, *quantity).await,
            };

            if let Err(e) = result {
                tracing::error!(
                    item_id = %item_id,
                    error = %e,
                    "Failed to release held inventory"
                );
            }
        }
    }
}
