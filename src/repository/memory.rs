//! In-memory repositories for tests.
//!
//! Each repository keeps its whole collection behind a single
//! `tokio::sync::Mutex`, so concurrent writers are serialized. The booking
//! repository checks seat availability and inserts under the same lock,
//! which gives it the same no-double-booking guarantee the Postgres partial
//! unique index provides.
//!
//! Built through [`crate::repository::Repositories::in_memory`], the event
//! and venue repositories also see what references them and refuse
//! deletes the foreign keys would refuse.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Booking, BookingStatus, Category, Event, EventInput, NewBooking, User, Venue, VenueInput,
};
use crate::repository::{
    BookingRepository, CategoryRepository, EventRepository, UserRepository, VenueRepository,
};

#[derive(Default)]
pub struct MemoryEventRepository {
    events: Mutex<Vec<Event>>,
    bookings: Option<Arc<MemoryBookingRepository>>,
}

impl MemoryEventRepository {
    /// Refuses to delete an event any of `bookings` still points at.
    pub fn referenced_by(bookings: Arc<MemoryBookingRepository>) -> Self {
        Self {
            events: Mutex::default(),
            bookings: Some(bookings),
        }
    }

    async fn references_venue(&self, venue_id: Uuid) -> bool {
        let events = self.events.lock().await;
        events.iter().any(|event| event.venue_id == venue_id)
    }
}

#[async_trait]
impl EventRepository for MemoryEventRepository {
    async fn list(&self) -> AppResult<Vec<Event>> {
        let mut events = self.events.lock().await.clone();
        events.sort_by_key(|event| event.start_at);
        Ok(events)
    }

    async fn get(&self, id: Uuid) -> AppResult<Event> {
        let events = self.events.lock().await;
        events
            .iter()
            .find(|event| event.id == id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn create(&self, input: EventInput) -> AppResult<Event> {
        if !input.has_valid_window() {
            return Err(AppError::Invalid);
        }
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            start_at: input.start_at,
            end_at: input.end_at,
            venue_id: input.venue_id,
            published: input.published,
            created_at: now,
            updated_at: now,
        };
        self.events.lock().await.push(event.clone());
        Ok(event)
    }

    async fn update(&self, id: Uuid, input: EventInput) -> AppResult<Event> {
        if !input.has_valid_window() {
            return Err(AppError::Invalid);
        }
        let mut events = self.events.lock().await;
        let event = events
            .iter_mut()
            .find(|event| event.id == id)
            .ok_or(AppError::NotFound)?;
        event.title = input.title;
        event.description = input.description;
        event.start_at = input.start_at;
        event.end_at = input.end_at;
        event.venue_id = input.venue_id;
        event.published = input.published;
        event.updated_at = Utc::now();
        Ok(event.clone())
    }

    // Lock order is venues, events, bookings
    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut events = self.events.lock().await;
        if !events.iter().any(|event| event.id == id) {
            return Err(AppError::NotFound);
        }
        if let Some(bookings) = &self.bookings {
            if bookings.references_event(id).await {
                return Err(AppError::Invalid);
            }
        }
        events.retain(|event| event.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryVenueRepository {
    venues: Mutex<Vec<Venue>>,
    events: Option<Arc<MemoryEventRepository>>,
}

impl MemoryVenueRepository {
    /// Refuses to delete a venue any of `events` still takes place at.
    pub fn referenced_by(events: Arc<MemoryEventRepository>) -> Self {
        Self {
            venues: Mutex::default(),
            events: Some(events),
        }
    }
}

#[async_trait]
impl VenueRepository for MemoryVenueRepository {
    async fn list(&self) -> AppResult<Vec<Venue>> {
        let mut venues = self.venues.lock().await.clone();
        venues.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(venues)
    }

    async fn get(&self, id: Uuid) -> AppResult<Venue> {
        let venues = self.venues.lock().await;
        venues
            .iter()
            .find(|venue| venue.id == id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn create(&self, input: VenueInput) -> AppResult<Venue> {
        let now = Utc::now();
        let venue = Venue {
            id: Uuid::new_v4(),
            name: input.name,
            address: input.address,
            created_at: now,
            updated_at: now,
        };
        self.venues.lock().await.push(venue.clone());
        Ok(venue)
    }

    async fn update(&self, id: Uuid, input: VenueInput) -> AppResult<Venue> {
        let mut venues = self.venues.lock().await;
        let venue = venues
            .iter_mut()
            .find(|venue| venue.id == id)
            .ok_or(AppError::NotFound)?;
        venue.name = input.name;
        venue.address = input.address;
        venue.updated_at = Utc::now();
        Ok(venue.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut venues = self.venues.lock().await;
        if !venues.iter().any(|venue| venue.id == id) {
            return Err(AppError::NotFound);
        }
        if let Some(events) = &self.events {
            if events.references_venue(id).await {
                return Err(AppError::Invalid);
            }
        }
        venues.retain(|venue| venue.id != id);
        Ok(())
    }
}

pub struct MemoryCategoryRepository {
    categories: Mutex<Vec<Category>>,
}

impl MemoryCategoryRepository {
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            categories: Mutex::new(categories),
        }
    }

    /// Same names the seed migration inserts.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let categories = ["Concerts", "Theatre", "Exhibitions", "Sports"]
            .into_iter()
            .map(|name| Category {
                id: Uuid::new_v4(),
                name: name.to_string(),
                created_at: now,
                updated_at: now,
            })
            .collect();
        Self::new(categories)
    }
}

#[async_trait]
impl CategoryRepository for MemoryCategoryRepository {
    async fn list(&self) -> AppResult<Vec<Category>> {
        let mut categories = self.categories.lock().await.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get(&self, id: Uuid) -> AppResult<Category> {
        let categories = self.categories.lock().await;
        categories
            .iter()
            .find(|category| category.id == id)
            .cloned()
            .ok_or(AppError::NotFound)
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, email: &str, password_hash: &str) -> AppResult<User> {
        let mut users = self.users.lock().await;
        if users.iter().any(|user| user.email == email) {
            return Err(AppError::Conflict);
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> AppResult<User> {
        let users = self.users.lock().await;
        users
            .iter()
            .find(|user| user.email == email)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn get(&self, id: Uuid) -> AppResult<User> {
        let users = self.users.lock().await;
        users
            .iter()
            .find(|user| user.id == id)
            .cloned()
            .ok_or(AppError::NotFound)
    }
}

// Bookings in insertion order; the seat list of a canceled booking is kept
#[derive(Default)]
pub struct MemoryBookingRepository {
    bookings: Mutex<Vec<Booking>>,
}

impl MemoryBookingRepository {
    // Canceled bookings still count, as the foreign key does
    async fn references_event(&self, event_id: Uuid) -> bool {
        let bookings = self.bookings.lock().await;
        bookings.iter().any(|booking| booking.event_id == event_id)
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingRepository {
    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Booking>> {
        let bookings = self.bookings.lock().await;
        Ok(bookings
            .iter()
            .rev()
            .filter(|booking| booking.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create(&self, new: NewBooking) -> AppResult<Booking> {
        let mut bookings = self.bookings.lock().await;

        let occupied: HashSet<&str> = bookings
            .iter()
            .filter(|b| b.event_id == new.event_id && b.status == BookingStatus::Active)
            .flat_map(|b| b.seats.iter().map(String::as_str))
            .collect();
        if new.seats.iter().any(|seat| occupied.contains(seat.as_str())) {
            return Err(AppError::Conflict);
        }

        let now = Utc::now();
        let mut seats = new.seats;
        seats.sort();
        seats.dedup();
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            event_id: new.event_id,
            status: BookingStatus::Active,
            total_price: new.total_price,
            currency: new.currency,
            seats,
            created_at: now,
            updated_at: now,
        };
        bookings.push(booking.clone());
        Ok(booking)
    }

    async fn cancel(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut bookings = self.bookings.lock().await;
        let booking = bookings
            .iter_mut()
            .find(|b| b.id == id && b.user_id == user_id && b.status == BookingStatus::Active)
            .ok_or(AppError::NotFound)?;
        booking.status = BookingStatus::Canceled;
        booking.updated_at = Utc::now();
        Ok(())
    }

    async fn occupied_seats(&self, event_id: Uuid) -> AppResult<Vec<String>> {
        let bookings = self.bookings.lock().await;
        let mut seats: Vec<String> = bookings
            .iter()
            .filter(|b| b.event_id == event_id && b.status == BookingStatus::Active)
            .flat_map(|b| b.seats.iter().cloned())
            .collect();
        seats.sort();
        seats.dedup();
        Ok(seats)
    }
}
