//! Service catalog endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, models::service::Service};

use super::AuthenticatedUser;

/// List bookable services
#[utoipa::path(
    get,
    path = "/services",
    tag = "catalog",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active services", body = Vec<Service>)
    )
)]
pub async fn list_services(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Service>>> {
    let services = state.services.catalog.list_services().await?;
    Ok(Json(services))
}
