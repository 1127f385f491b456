use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Event, EventInput};
use crate::repository::EventRepository;

const EVENT_COLUMNS: &str =
    "id, title, description, start_at, end_at, venue_id, published, created_at, updated_at";

#[derive(Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn list(&self) -> AppResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY start_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn get(&self, id: Uuid) -> AppResult<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(event)
    }

    async fn create(&self, input: EventInput) -> AppResult<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "INSERT INTO events (title, description, start_at, end_at, venue_id, published)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.start_at)
        .bind(input.end_at)
        .bind(input.venue_id)
        .bind(input.published)
        .fetch_one(&self.pool)
        .await?;
        Ok(event)
    }

    async fn update(&self, id: Uuid, input: EventInput) -> AppResult<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "UPDATE events
             SET title = $1, description = $2, start_at = $3, end_at = $4,
                 venue_id = $5, published = $6, updated_at = now()
             WHERE id = $7
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.start_at)
        .bind(input.end_at)
        .bind(input.venue_id)
        .bind(input.published)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(event)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
