pub mod checkout_service;
pub mod reservation_sweeper;

pub use checkout_service::{CartLine, CartRequest, CheckoutService, PaymentSession, Quote};
pub use reservation_sweeper::ReservationSweeper;
