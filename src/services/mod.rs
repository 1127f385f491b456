pub mod auth;
pub mod bookings;
pub mod categories;
pub mod events;
pub mod venues;

pub use auth::AuthService;
pub use bookings::BookingService;
pub use categories::CategoryService;
pub use events::EventService;
pub use venues::VenueService;
