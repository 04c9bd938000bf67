//! Repository layer for database operations

pub mod appointments;
pub mod catalog;
pub mod users;

use sqlx::{Pool, Postgres};

use crate::config::DatabaseConfig;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub appointments: appointments::AppointmentsRepository,
    pub catalog: catalog::CatalogRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>, config: &DatabaseConfig) -> Self {
        Self {
            appointments: appointments::AppointmentsRepository::new(
                pool.clone(),
                config.statement_timeout_secs,
            ),
            catalog: catalog::CatalogRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }

    /// Verify the database connection is usable (readiness probe)
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
