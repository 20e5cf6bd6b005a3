pub mod organizer_controller;
