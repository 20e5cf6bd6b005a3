pub mod event;
pub mod event_addon;
pub mod ticket_tier;

pub use event::{Event, EventStatus};
pub use event_addon::EventAddon;
pub use ticket_tier::TicketTier;
