use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Event, EventInput};
use crate::repository::{EventRepository, VenueRepository};

#[derive(Clone)]
pub struct EventService {
    repo: Arc<dyn EventRepository>,
    venues: Arc<dyn VenueRepository>,
}

impl EventService {
    pub fn new(repo: Arc<dyn EventRepository>, venues: Arc<dyn VenueRepository>) -> Self {
        Self { repo, venues }
    }

    pub async fn list(&self) -> AppResult<Vec<Event>> {
        self.repo.list().await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Event> {
        self.repo.get(id).await
    }

    pub async fn create(&self, input: EventInput) -> AppResult<Event> {
        self.validate(&input).await?;
        self.repo.create(input).await
    }

    pub async fn update(&self, id: Uuid, input: EventInput) -> AppResult<Event> {
        self.validate(&input).await?;
        self.repo.update(id, input).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repo.delete(id).await
    }

    // An unknown venue is bad input for the event, not a missing event
    async fn validate(&self, input: &EventInput) -> AppResult<()> {
        if !input.has_valid_window() || input.venue_id.is_nil() {
            return Err(AppError::Invalid);
        }
        match self.venues.get(input.venue_id).await {
            Ok(_) => Ok(()),
            Err(AppError::NotFound) => Err(AppError::Invalid),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VenueInput;
    use crate::repository::memory::{MemoryEventRepository, MemoryVenueRepository};
    use chrono::{Duration, Utc};

    async fn service_with_venue() -> (EventService, Uuid) {
        let venues = Arc::new(MemoryVenueRepository::default());
        let venue = venues
            .create(VenueInput {
                name: "Main hall".into(),
                address: "1 Abay Avenue".into(),
            })
            .await
            .unwrap();
        let service = EventService::new(Arc::new(MemoryEventRepository::default()), venues);
        (service, venue.id)
    }

    fn input(venue_id: Uuid) -> EventInput {
        let start = Utc::now() + Duration::days(1);
        EventInput {
            title: "Jazz night".into(),
            description: "Quartet".into(),
            start_at: start,
            end_at: start + Duration::hours(3),
            venue_id,
            published: true,
        }
    }

    #[tokio::test]
    async fn create_with_known_venue_succeeds() {
        let (service, venue_id) = service_with_venue().await;
        let event = service.create(input(venue_id)).await.unwrap();
        assert_eq!(service.get(event.id).await.unwrap(), event);
    }

    #[tokio::test]
    async fn unknown_or_nil_venue_is_invalid() {
        let (service, _) = service_with_venue().await;
        assert!(matches!(
            service.create(input(Uuid::new_v4())).await.unwrap_err(),
            AppError::Invalid
        ));
        assert!(matches!(
            service.create(input(Uuid::nil())).await.unwrap_err(),
            AppError::Invalid
        ));
    }

    #[tokio::test]
    async fn inverted_window_is_invalid() {
        let (service, venue_id) = service_with_venue().await;
        let mut bad = input(venue_id);
        bad.end_at = bad.start_at;
        assert!(matches!(service.create(bad).await.unwrap_err(), AppError::Invalid));
    }

    #[tokio::test]
    async fn update_checks_venue_then_existence() {
        let (service, venue_id) = service_with_venue().await;
        let event = service.create(input(venue_id)).await.unwrap();

        assert!(matches!(
            service.update(event.id, input(Uuid::new_v4())).await.unwrap_err(),
            AppError::Invalid
        ));
        assert!(matches!(
            service.update(Uuid::new_v4(), input(venue_id)).await.unwrap_err(),
            AppError::NotFound
        ));

        let mut renamed = input(venue_id);
        renamed.title = "Late jazz night".into();
        let updated = service.update(event.id, renamed).await.unwrap();
        assert_eq!(updated.title, "Late jazz night");
        assert_eq!(updated.created_at, event.created_at);
    }

    #[tokio::test]
    async fn delete_twice_is_not_found() {
        let (service, venue_id) = service_with_venue().await;
        let event = service.create(input(venue_id)).await.unwrap();
        service.delete(event.id).await.unwrap();
        assert!(matches!(service.delete(event.id).await.unwrap_err(), AppError::NotFound));
    }
}
