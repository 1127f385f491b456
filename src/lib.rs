pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod services;

use std::sync::Arc;

use repository::Repositories;
use services::{AuthService, BookingService, CategoryService, EventService, VenueService};

// Shared state for every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub events: EventService,
    pub venues: VenueService,
    pub categories: CategoryService,
    pub auth: AuthService,
    pub bookings: BookingService,
}

impl AppState {
    /// Wires every service to the given storage backends.
    pub fn new(config: config::Config, repos: Repositories) -> Arc<Self> {
        let events = EventService::new(repos.events.clone(), repos.venues.clone());
        let venues = VenueService::new(repos.venues);
        let categories = CategoryService::new(repos.categories);
        let auth = AuthService::new(repos.users, &config.auth);
        let bookings = BookingService::new(repos.bookings, repos.events, config.booking.clone());

        Arc::new(Self {
            config,
            events,
            venues,
            categories,
            auth,
            bookings,
        })
    }
}
