pub mod user;
pub mod event;
pub mod venue;
pub mod category;
pub mod booking;

pub use user::User;
pub use event::{Event, EventInput};
pub use venue::{Venue, VenueInput};
pub use category::Category;
pub use booking::{Booking, BookingRow, BookingStatus, NewBooking};
