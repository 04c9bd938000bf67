//! Revenue and workload aggregates

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::{
    error::AppResult,
    models::appointment::AppointmentFilter,
    repository::Repository,
};

/// Scope for aggregate queries: optional stylist set and date range.
/// The same filter predicate drives both aggregates.
#[derive(Debug, Clone, Default)]
pub struct StatsFilter {
    pub stylist_ids: Vec<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl From<StatsFilter> for AppointmentFilter {
    fn from(f: StatsFilter) -> Self {
        AppointmentFilter {
            stylist_ids: f.stylist_ids,
            start_date: f.start_date,
            end_date: f.end_date,
            ..Default::default()
        }
    }
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Total income: sum of frozen appointment prices in scope
    pub async fn total_income(&self, filter: StatsFilter) -> AppResult<Decimal> {
        self.repository.appointments.total_income(&filter.into()).await
    }

    /// Total services delivered: sum of line headcounts in scope
    pub async fn total_service_count(&self, filter: StatsFilter) -> AppResult<i64> {
        self.repository.appointments.total_service_count(&filter.into()).await
    }
}
