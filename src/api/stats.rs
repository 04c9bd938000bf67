//! Revenue and workload statistics endpoints (admin only)

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    services::stats::StatsFilter,
};

use super::AuthenticatedUser;

/// Aggregate scope: optional stylist set and inclusive date range
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct StatsQuery {
    /// Comma-separated stylist IDs, e.g. `3,7,12`
    pub stylist_ids: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl StatsQuery {
    fn into_filter(self) -> AppResult<StatsFilter> {
        let stylist_ids = match self.stylist_ids.as_deref() {
            None | Some("") => Vec::new(),
            Some(raw) => raw
                .split(',')
                .map(|part| {
                    part.trim()
                        .parse::<i32>()
                        .map_err(|_| AppError::Validation(format!("invalid stylist id: {}", part)))
                })
                .collect::<Result<_, _>>()?,
        };

        Ok(StatsFilter {
            stylist_ids,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

/// Total income response
#[derive(Serialize, ToSchema)]
pub struct IncomeResponse {
    #[schema(value_type = String)]
    pub total_income: Decimal,
}

/// Total services response
#[derive(Serialize, ToSchema)]
pub struct ServiceCountResponse {
    pub total_services: i64,
}

/// Total income over the scoped appointments
#[utoipa::path(
    get,
    path = "/stats/income",
    tag = "stats",
    security(("bearer_auth" = [])),
    params(StatsQuery),
    responses(
        (status = 200, description = "Summed appointment income", body = IncomeResponse),
        (status = 403, description = "Administrator role required")
    )
)]
pub async fn get_total_income(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<IncomeResponse>> {
    claims.require_admin()?;

    let total_income = state.services.stats.total_income(query.into_filter()?).await?;
    Ok(Json(IncomeResponse { total_income }))
}

/// Total service headcount over the scoped appointments
#[utoipa::path(
    get,
    path = "/stats/services",
    tag = "stats",
    security(("bearer_auth" = [])),
    params(StatsQuery),
    responses(
        (status = 200, description = "Summed service headcount", body = ServiceCountResponse),
        (status = 403, description = "Administrator role required")
    )
)]
pub async fn get_total_services(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<ServiceCountResponse>> {
    claims.require_admin()?;

    let total_services = state
        .services
        .stats
        .total_service_count(query.into_filter()?)
        .await?;
    Ok(Json(ServiceCountResponse { total_services }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_stylist_ids() {
        let query = StatsQuery {
            stylist_ids: Some("3, 7,12".to_string()),
            ..Default::default()
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.stylist_ids, vec![3, 7, 12]);
    }

    #[test]
    fn rejects_non_numeric_stylist_ids() {
        let query = StatsQuery {
            stylist_ids: Some("3,x".to_string()),
            ..Default::default()
        };
        assert!(query.into_filter().is_err());
    }

    #[test]
    fn empty_scope_means_unfiltered() {
        let filter = StatsQuery::default().into_filter().unwrap();
        assert!(filter.stylist_ids.is_empty());
        assert!(filter.start_date.is_none());
    }
}
