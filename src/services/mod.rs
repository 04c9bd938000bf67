//! Business logic services

pub mod accounts;
pub mod appointments;
pub mod catalog;
pub mod email;
pub mod lifecycle;
pub mod pricing;
pub mod redis;
pub mod stats;

use std::sync::Arc;

use crate::{
    config::{AuthConfig, EmailConfig},
    error::AppResult,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub accounts: accounts::AccountsService,
    pub appointments: appointments::AppointmentsService,
    pub catalog: catalog::CatalogService,
    pub stats: stats::StatsService,
    pub email: email::EmailService,
    pub redis: redis::RedisService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub async fn new(
        repository: Repository,
        auth_config: AuthConfig,
        email_config: EmailConfig,
        email_send_timeout_secs: u64,
        redis_service: redis::RedisService,
    ) -> AppResult<Self> {
        let email_service = email::EmailService::new(email_config);
        let pricing = pricing::PricingService::new(Arc::new(repository.catalog.clone()));

        Ok(Self {
            accounts: accounts::AccountsService::new(
                repository.clone(),
                auth_config,
                email_service.clone(),
                redis_service.clone(),
                email_send_timeout_secs,
            ),
            appointments: appointments::AppointmentsService::new(repository.clone(), pricing),
            catalog: catalog::CatalogService::new(repository.clone()),
            stats: stats::StatsService::new(repository.clone()),
            email: email_service,
            redis: redis_service,
            repository,
        })
    }

    /// Verify the database connection is usable (readiness probe)
    pub async fn db_ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
