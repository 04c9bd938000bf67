//! Service catalog repository

use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::service::Service};

#[derive(Clone)]
pub struct CatalogRepository {
    pool: Pool<Postgres>,
}

impl CatalogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Fetch all referenced services in one batched lookup
    pub async fn find_by_ids(&self, ids: &[i32]) -> AppResult<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    /// List active services for booking UIs
    pub async fn list_active(&self) -> AppResult<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE active = TRUE ORDER BY category_id, name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }
}
