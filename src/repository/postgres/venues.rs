use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Venue, VenueInput};
use crate::repository::VenueRepository;

#[derive(Clone)]
pub struct PgVenueRepository {
    pool: PgPool,
}

impl PgVenueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VenueRepository for PgVenueRepository {
    async fn list(&self) -> AppResult<Vec<Venue>> {
        let venues = sqlx::query_as::<_, Venue>(
            "SELECT id, name, address, created_at, updated_at FROM venues ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(venues)
    }

    async fn get(&self, id: Uuid) -> AppResult<Venue> {
        let venue = sqlx::query_as::<_, Venue>(
            "SELECT id, name, address, created_at, updated_at FROM venues WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(venue)
    }

    async fn create(&self, input: VenueInput) -> AppResult<Venue> {
        let venue = sqlx::query_as::<_, Venue>(
            "INSERT INTO venues (name, address)
             VALUES ($1, $2)
             RETURNING id, name, address, created_at, updated_at",
        )
        .bind(&input.name)
        .bind(&input.address)
        .fetch_one(&self.pool)
        .await?;
        Ok(venue)
    }

    async fn update(&self, id: Uuid, input: VenueInput) -> AppResult<Venue> {
        let venue = sqlx::query_as::<_, Venue>(
            "UPDATE venues
             SET name = $1, address = $2, updated_at = now()
             WHERE id = $3
             RETURNING id, name, address, created_at, updated_at",
        )
        .bind(&input.name)
        .bind(&input.address)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(venue)
    }

    // Venues still referenced by events fail with a foreign-key violation
    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM venues WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
