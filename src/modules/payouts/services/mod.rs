pub mod payout_service;
pub mod reconciliation;

pub use payout_service::PayoutService;
