pub mod organizer_service;

pub use organizer_service::OrganizerService;
