pub mod checkout_controller;
