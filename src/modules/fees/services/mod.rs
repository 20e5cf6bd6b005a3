pub mod fee_calculator;
pub mod rate_resolver;

pub use fee_calculator::{FeeBreakdown, FeeCalculator};
pub use rate_resolver::RateResolver;
