use crate::core::{AppError, Result};
use crate::modules::fees::models::FeeRates;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub paystack: PaystackConfig,
    pub fees: FeesConfig,
    pub checkout: CheckoutConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaystackConfig {
    pub secret_key: String,
    pub base_url: String,
    pub callback_url: Option<String>,
}

/// Platform default fee rates, as fractions (0.05 = 5%)
#[derive(Debug, Clone)]
pub struct FeesConfig {
    pub platform_fee_percent: Decimal,
    pub processor_fee_percent: Decimal,
}

impl FeesConfig {
    /// Validated default rates for the resolver
    pub fn default_rates(&self) -> Result<FeeRates> {
        FeeRates::new(self.platform_fee_percent, self.processor_fee_percent)
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// How long a reservation holds inventory
    pub hold_minutes: i64,
    /// How often the sweeper releases lapsed holds
    pub sweep_interval_secs: u64,
    /// How old an unconfirmed charge must be before verify polling picks
    /// it up
    pub verify_after_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub rate_limit_per_minute: u32,
}

/// Fee rates have no baked-in default: an operator who has not configured
/// them gets a missing-config error at boot, not a silent percentage.
fn required_rate(key: &str) -> Result<Decimal> {
    let raw = env::var(key)
        .map_err(|_| AppError::missing_fee_config(format!("{} is not set", key)))?;

    raw.parse()
        .map_err(|_| AppError::Configuration(format!("Invalid {}", key)))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: &str) -> Result<T> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| AppError::Configuration(format!("Invalid {}", key)))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            paystack: PaystackConfig {
                secret_key: env::var("PAYSTACK_SECRET_KEY").map_err(|_| {
                    AppError::Configuration("PAYSTACK_SECRET_KEY not set".to_string())
                })?,
                base_url: env::var("PAYSTACK_BASE_URL")
                    .unwrap_or_else(|_| "https://api.paystack.co".to_string()),
                callback_url: env::var("PAYSTACK_CALLBACK_URL").ok(),
            },
            fees: FeesConfig {
                platform_fee_percent: required_rate("PLATFORM_FEE_PERCENT")?,
                processor_fee_percent: required_rate("PROCESSOR_FEE_PERCENT")?,
            },
            checkout: CheckoutConfig {
                hold_minutes: env_parse("RESERVATION_HOLD_MINUTES", "15")?,
                sweep_interval_secs: env_parse("RESERVATION_SWEEP_INTERVAL_SECS", "60")?,
                verify_after_minutes: env_parse("PAYMENT_VERIFY_AFTER_MINUTES", "30")?,
            },
            security: SecurityConfig {
                rate_limit_per_minute: env_parse("RATE_LIMIT_PER_MINUTE", "1000")?,
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Surfaces malformed rates at boot rather than on the first quote
        self.fees.default_rates()?;

        if self.checkout.hold_minutes <= 0 {
            return Err(AppError::Configuration(
                "Reservation hold must be at least one minute".to_string(),
            ));
        }

        if self.checkout.sweep_interval_secs == 0 {
            return Err(AppError::Configuration(
                "Sweep interval must be greater than 0".to_string(),
            ));
        }

        if self.security.rate_limit_per_minute == 0 {
            return Err(AppError::Configuration(
                "Rate limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
