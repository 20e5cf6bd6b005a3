pub mod payout;

pub use payout::{Payout, PayoutStatus};
