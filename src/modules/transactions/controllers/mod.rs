pub mod transaction_controller;
pub mod webhook_controller;
