pub mod models;
pub mod services;

pub use models::{EffectiveRates, FeeBearer, FeeRates, RateSource};
pub use services::{FeeBreakdown, FeeCalculator, RateResolver};
