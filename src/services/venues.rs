use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Venue, VenueInput};
use crate::repository::VenueRepository;

#[derive(Clone)]
pub struct VenueService {
    repo: Arc<dyn VenueRepository>,
}

impl VenueService {
    pub fn new(repo: Arc<dyn VenueRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> AppResult<Vec<Venue>> {
        self.repo.list().await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Venue> {
        self.repo.get(id).await
    }

    pub async fn create(&self, input: VenueInput) -> AppResult<Venue> {
        self.repo.create(input).await
    }

    pub async fn update(&self, id: Uuid, input: VenueInput) -> AppResult<Venue> {
        self.repo.update(id, input).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repo.delete(id).await
    }
}
