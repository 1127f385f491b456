use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppResult;
use crate::models::Category;
use crate::repository::CategoryRepository;

#[derive(Clone)]
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> AppResult<Vec<Category>> {
        self.repo.list().await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Category> {
        self.repo.get(id).await
    }
}
