mod bookings;
mod categories;
mod events;
mod users;
mod venues;

pub use bookings::PgBookingRepository;
pub use categories::PgCategoryRepository;
pub use events::PgEventRepository;
pub use users::PgUserRepository;
pub use venues::PgVenueRepository;
