pub mod discount_repository;
pub mod reservation_repository;

pub use discount_repository::DiscountRepository;
pub use reservation_repository::ReservationRepository;
