use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Result};

/// Platform-wide default fee rates.
///
/// Rates are fractions, not percentages: 0.05 means 5%. Both rates must lie
/// in `[0, 1)`. Event- and organizer-level overrides apply to the platform
/// rate only; the processor rate is negotiated platform-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRates {
    pub platform_percent: Decimal,
    pub processor_percent: Decimal,
}

impl FeeRates {
    pub fn new(platform_percent: Decimal, processor_percent: Decimal) -> Result<Self> {
        validate_rate("platform fee rate", platform_percent)?;
        validate_rate("processor fee rate", processor_percent)?;

        Ok(Self {
            platform_percent,
            processor_percent,
        })
    }
}

/// Validate a fee rate is a fraction in `[0, 1)`
pub(crate) fn validate_rate(label: &str, rate: Decimal) -> Result<()> {
    if rate < Decimal::ZERO {
        return Err(AppError::validation(format!(
            "{} cannot be negative, got {}",
            label, rate
        )));
    }

    if rate >= Decimal::ONE {
        return Err(AppError::validation(format!(
            "{} must be below 1.0 (100%), got {}",
            label, rate
        )));
    }

    Ok(())
}

/// Who absorbs the platform and processor fees for a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
pub enum FeeBearer {
    /// Fees are added on top of the subtotal; the guest pays them
    #[serde(rename = "customer")]
    Customer,

    /// Fees are deducted from the subtotal; the guest pays the face price
    #[serde(rename = "organizer")]
    Organizer,
}

impl Default for FeeBearer {
    fn default() -> Self {
        FeeBearer::Customer
    }
}

impl std::fmt::Display for FeeBearer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeeBearer::Customer => write!(f, "customer"),
            FeeBearer::Organizer => write!(f, "organizer"),
        }
    }
}

impl std::str::FromStr for FeeBearer {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "customer" => Ok(FeeBearer::Customer),
            "organizer" => Ok(FeeBearer::Organizer),
            _ => Err(format!("Invalid fee bearer: {}", s)),
        }
    }
}

/// Where the resolved platform rate came from.
///
/// Snapshotted onto transactions alongside the rate itself, so a payout
/// dispute can be answered from the transaction row alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
pub enum RateSource {
    #[serde(rename = "event_override")]
    EventOverride,

    #[serde(rename = "organizer_override")]
    OrganizerOverride,

    #[serde(rename = "platform_default")]
    PlatformDefault,
}

impl std::fmt::Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateSource::EventOverride => write!(f, "event_override"),
            RateSource::OrganizerOverride => write!(f, "organizer_override"),
            RateSource::PlatformDefault => write!(f, "platform_default"),
        }
    }
}

impl std::str::FromStr for RateSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "event_override" => Ok(RateSource::EventOverride),
            "organizer_override" => Ok(RateSource::OrganizerOverride),
            "platform_default" => Ok(RateSource::PlatformDefault),
            _ => Err(format!("Invalid rate source: {}", s)),
        }
    }
}

/// The rates that actually apply to a sale after override resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveRates {
    pub platform_percent: Decimal,
    pub processor_percent: Decimal,
    pub platform_source: RateSource,
}
