use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::Category;
use crate::repository::CategoryRepository;

#[derive(Clone)]
pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn list(&self) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at, updated_at FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn get(&self, id: Uuid) -> AppResult<Category> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at, updated_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }
}
