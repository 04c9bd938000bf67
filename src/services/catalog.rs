//! Service catalog read service

use crate::{error::AppResult, models::service::Service, repository::Repository};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List bookable (active) services
    pub async fn list_services(&self) -> AppResult<Vec<Service>> {
        self.repository.catalog.list_active().await
    }
}
