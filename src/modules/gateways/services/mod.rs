pub mod gateway_trait;
pub mod paystack;

pub use gateway_trait::{
    ChargeStatus, ChargeVerification, InitializeRequest, InitializeResponse, PaymentGateway,
    TransferRequest, TransferResponse,
};
pub use paystack::PaystackClient;
