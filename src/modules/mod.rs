pub mod checkout;
pub mod events;
pub mod fees;
pub mod gateways;
pub mod health;
pub mod organizers;
pub mod payouts;
pub mod transactions;
