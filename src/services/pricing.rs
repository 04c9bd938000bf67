//! Appointment pricing engine
//!
//! Computes total price and estimated duration from a set of
//! (service, headcount) selections against the catalog. Pure over a single
//! batched catalog snapshot; no side effects.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::{appointment::ServiceSelection, service::Service},
    repository::catalog::CatalogRepository,
};

/// Catalog lookup seam. The engine never issues per-service queries; all
/// referenced ids resolve through one call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn find_services_by_ids(&self, ids: &[i32]) -> AppResult<Vec<Service>>;
}

#[async_trait]
impl CatalogLookup for CatalogRepository {
    async fn find_services_by_ids(&self, ids: &[i32]) -> AppResult<Vec<Service>> {
        self.find_by_ids(ids).await
    }
}

/// Computed aggregates for an appointment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub total_price: Decimal,
    pub estimated_duration: i32,
}

/// Compute totals from selections against a catalog snapshot.
///
/// Price is headcount-weighted; duration is summed once per line because a
/// multi-person line models a parallel-capacity service (a group class does
/// not take longer with more participants).
///
/// Unknown or inactive service ids are rejected rather than silently
/// contributing zero, so a booking can never be under-charged by a stale id.
pub fn compute_totals(selections: &[ServiceSelection], services: &[Service]) -> AppResult<Totals> {
    if selections.is_empty() {
        return Err(AppError::Validation("at least one service is required".to_string()));
    }

    let by_id: HashMap<i32, &Service> = services.iter().map(|s| (s.id, s)).collect();

    let mut total_price = Decimal::ZERO;
    let mut estimated_duration = 0i32;
    let mut rejected: Vec<i32> = Vec::new();

    for selection in selections {
        if selection.number_of_people < 1 {
            return Err(AppError::Validation("number_of_people must be >= 1".to_string()));
        }
        match by_id.get(&selection.service_id) {
            Some(service) if service.active => {
                total_price += service.price * Decimal::from(selection.number_of_people);
                estimated_duration += service.duration_minutes;
            }
            _ => rejected.push(selection.service_id),
        }
    }

    if !rejected.is_empty() {
        return Err(AppError::Validation(format!(
            "unknown or inactive service ids: {:?}",
            rejected
        )));
    }

    Ok(Totals { total_price, estimated_duration })
}

/// Pricing service: batched catalog resolution + pure totals computation
#[derive(Clone)]
pub struct PricingService {
    catalog: Arc<dyn CatalogLookup>,
}

impl PricingService {
    pub fn new(catalog: Arc<dyn CatalogLookup>) -> Self {
        Self { catalog }
    }

    /// Resolve every referenced service in one lookup and compute totals
    pub async fn price_selections(&self, selections: &[ServiceSelection]) -> AppResult<Totals> {
        if selections.is_empty() {
            return Err(AppError::Validation("at least one service is required".to_string()));
        }

        let mut ids: Vec<i32> = selections.iter().map(|s| s.service_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let services = self.catalog.find_services_by_ids(&ids).await?;
        compute_totals(selections, &services)
    }
}
