pub mod services;

pub use services::{PaymentGateway, PaystackClient};
