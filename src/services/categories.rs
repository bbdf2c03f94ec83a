use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::ServiceError;
use crate::models::{Category, CreateCategoryRequest};
use crate::store::{RecordStore, StoreError};

#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn RecordStore<Category>>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn RecordStore<Category>>) -> Self {
        Self { store }
    }

    pub async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, ServiceError> {
        let category = req.into_category(Utc::now())?;
        self.store.insert(&category).await?;
        info!(category_id = %category.id, "Category '{}' created", category.name);
        Ok(category)
    }

    pub async fn get_category(&self, id: Uuid) -> Result<Category, StoreError> {
        self.store.get_by_id(id).await
    }
}
