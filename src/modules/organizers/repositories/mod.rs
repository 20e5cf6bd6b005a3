pub mod organizer_repository;

pub use organizer_repository::OrganizerRepository;
