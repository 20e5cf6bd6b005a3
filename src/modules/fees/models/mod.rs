pub mod fee_config;

pub use fee_config::{EffectiveRates, FeeBearer, FeeRates, RateSource};
