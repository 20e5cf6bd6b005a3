pub mod discount;
pub mod reservation;

pub use discount::{Discount, DiscountKind};
pub use reservation::{ItemKind, Reservation, ReservationItem, ReservationStatus};
