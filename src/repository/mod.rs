//! Storage seams for every entity.
//!
//! Services depend on the traits below through `Arc<dyn _>`; which backend
//! sits behind them is decided once, when [`Repositories`] is built.
//!
//! - [`postgres`] is the production backend.
//! - [`memory`] keeps everything behind a mutex per collection and is meant
//!   for tests only.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Booking, Category, Event, EventInput, NewBooking, User, Venue, VenueInput};

pub mod memory;
pub mod postgres;

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Event>>;
    async fn get(&self, id: Uuid) -> AppResult<Event>;
    async fn create(&self, input: EventInput) -> AppResult<Event>;
    async fn update(&self, id: Uuid, input: EventInput) -> AppResult<Event>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait VenueRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Venue>>;
    async fn get(&self, id: Uuid) -> AppResult<Venue>;
    async fn create(&self, input: VenueInput) -> AppResult<Venue>;
    async fn update(&self, id: Uuid, input: VenueInput) -> AppResult<Venue>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Category>>;
    async fn get(&self, id: Uuid) -> AppResult<Category>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create(&self, email: &str, password_hash: &str) -> AppResult<User>;
    async fn get_by_email(&self, email: &str) -> AppResult<User>;
    async fn get(&self, id: Uuid) -> AppResult<User>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Newest first, any status, seats sorted per booking.
    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Booking>>;

    /// Persists the header and every seat atomically. A seat already held
    /// by an active booking for the same event fails with `Conflict` and
    /// leaves nothing behind.
    async fn create(&self, booking: NewBooking) -> AppResult<Booking>;

    /// `active -> canceled` for the owner only; `NotFound` when nothing
    /// matched.
    async fn cancel(&self, id: Uuid, user_id: Uuid) -> AppResult<()>;

    /// Seat labels held by active bookings for the event, sorted.
    async fn occupied_seats(&self, event_id: Uuid) -> AppResult<Vec<String>>;
}

/// The full set of storage backends handed to the services.
#[derive(Clone)]
pub struct Repositories {
    pub events: Arc<dyn EventRepository>,
    pub venues: Arc<dyn VenueRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub users: Arc<dyn UserRepository>,
    pub bookings: Arc<dyn BookingRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            events: Arc::new(postgres::PgEventRepository::new(pool.clone())),
            venues: Arc::new(postgres::PgVenueRepository::new(pool.clone())),
            categories: Arc::new(postgres::PgCategoryRepository::new(pool.clone())),
            users: Arc::new(postgres::PgUserRepository::new(pool.clone())),
            bookings: Arc::new(postgres::PgBookingRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let bookings = Arc::new(memory::MemoryBookingRepository::default());
        let events = Arc::new(memory::MemoryEventRepository::referenced_by(bookings.clone()));
        let venues = Arc::new(memory::MemoryVenueRepository::referenced_by(events.clone()));
        Self {
            events,
            venues,
            categories: Arc::new(memory::MemoryCategoryRepository::seeded()),
            users: Arc::new(memory::MemoryUserRepository::default()),
            bookings,
        }
    }
}
