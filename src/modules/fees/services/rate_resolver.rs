use rust_decimal::Decimal;

use crate::core::Result;
use crate::modules::fees::models::fee_config::validate_rate;
use crate::modules::fees::models::{EffectiveRates, FeeRates, RateSource};

/// Resolves the fee rates that apply to a sale.
///
/// Platform-rate precedence: event override > organizer override > platform
/// default. An override is `Option<Decimal>`: `None` falls through to the
/// next level, while `Some(rate)` wins outright, including an explicit zero.
/// The processor rate has no per-tenant override and always comes from the
/// platform defaults.
///
/// Resolution only applies on the unpaid path (quotes, payment
/// initialization). Settled transactions carry their own rate snapshot and
/// must never be re-resolved.
pub struct RateResolver;

impl RateResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve effective rates for a sale.
    ///
    /// # Arguments
    /// * `defaults` - Platform default rates (validated at construction)
    /// * `organizer_override` - Organizer-level platform-rate override
    /// * `event_override` - Event-level platform-rate override
    pub fn resolve(
        &self,
        defaults: &FeeRates,
        organizer_override: Option<Decimal>,
        event_override: Option<Decimal>,
    ) -> Result<EffectiveRates> {
        if let Some(rate) = event_override {
            validate_rate("event platform fee override", rate)?;
        }
        if let Some(rate) = organizer_override {
            validate_rate("organizer platform fee override", rate)?;
        }

        let (platform_percent, platform_source) = match (event_override, organizer_override) {
            (Some(rate), _) => (rate, RateSource::EventOverride),
            (None, Some(rate)) => (rate, RateSource::OrganizerOverride),
            (None, None) => (defaults.platform_percent, RateSource::PlatformDefault),
        };

        Ok(EffectiveRates {
            platform_percent,
            processor_percent: defaults.processor_percent,
            platform_source,
        })
    }
}

impl Default for RateResolver {
    fn default() -> Self {
        Self::new()
    }
}
