//! Appointment booking and management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        appointment::{
            AppointmentDetails, AppointmentListQuery, CreateAppointment, UpdateAppointment,
        },
        enums::Role,
        pagination::Paginated,
    },
};

use super::AuthenticatedUser;

/// Book a new appointment
#[utoipa::path(
    post,
    path = "/appointments",
    tag = "appointments",
    security(("bearer_auth" = [])),
    request_body = CreateAppointment,
    responses(
        (status = 201, description = "Appointment booked with resolved totals", body = AppointmentDetails),
        (status = 400, description = "Empty service list, bad headcount or unknown service"),
        (status = 404, description = "Stylist not found")
    )
)]
pub async fn create_appointment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateAppointment>,
) -> AppResult<(StatusCode, Json<AppointmentDetails>)> {
    claims.require_role(Role::Customer)?;

    let details = state.services.appointments.book(claims.user_id, request).await?;

    Ok((StatusCode::CREATED, Json(details)))
}

/// Get an appointment by ID, scoped to the caller
#[utoipa::path(
    get,
    path = "/appointments/{id}",
    tag = "appointments",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Appointment ID")
    ),
    responses(
        (status = 200, description = "Appointment", body = AppointmentDetails),
        (status = 404, description = "Not found or not owned by the caller")
    )
)]
pub async fn get_appointment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<AppointmentDetails>> {
    let details = state.services.appointments.get_for_actor(id, &claims).await?;
    Ok(Json(details))
}

/// Update an appointment (admin only)
#[utoipa::path(
    put,
    path = "/appointments/{id}",
    tag = "appointments",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Appointment ID")
    ),
    request_body = UpdateAppointment,
    responses(
        (status = 200, description = "Updated appointment", body = AppointmentDetails),
        (status = 400, description = "Invalid status transition or bad service list"),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Appointment not found")
    )
)]
pub async fn update_appointment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateAppointment>,
) -> AppResult<Json<AppointmentDetails>> {
    claims.require_admin()?;

    let details = state
        .services
        .appointments
        .update(id, request, claims.role)
        .await?;

    Ok(Json(details))
}

/// Bulk cancellation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkCancelRequest {
    #[validate(length(min = 1, message = "at least one appointment id is required"))]
    pub ids: Vec<i32>,
    /// Audit note written on every cancelled appointment
    pub note: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct BulkCancelResponse {
    pub cancelled: u64,
}

/// Cancel a set of appointments (admin only). Appointments already in a
/// terminal state are left untouched and not counted.
#[utoipa::path(
    post,
    path = "/appointments/cancel",
    tag = "appointments",
    security(("bearer_auth" = [])),
    request_body = BulkCancelRequest,
    responses(
        (status = 200, description = "Number of appointments cancelled", body = BulkCancelResponse),
        (status = 400, description = "Empty id list"),
        (status = 403, description = "Administrator role required")
    )
)]
pub async fn cancel_appointments(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BulkCancelRequest>,
) -> AppResult<Json<BulkCancelResponse>> {
    claims.require_admin()?;

    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let note = request.note.as_deref().unwrap_or("cancelled by administrator");
    let cancelled = state
        .services
        .appointments
        .cancel_by_ids(&request.ids, note)
        .await?;

    Ok(Json(BulkCancelResponse { cancelled }))
}

/// List the caller's own appointments (customer view)
#[utoipa::path(
    get,
    path = "/appointments/user/appointments",
    tag = "appointments",
    security(("bearer_auth" = [])),
    params(AppointmentListQuery),
    responses(
        (status = 200, description = "Paginated appointments", body = Paginated<AppointmentDetails>),
        (status = 400, description = "Invalid pagination parameters")
    )
)]
pub async fn get_user_appointments(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AppointmentListQuery>,
) -> AppResult<Json<Paginated<AppointmentDetails>>> {
    claims.require_role(Role::Customer)?;

    let page = state
        .services
        .appointments
        .list_for_user(claims.user_id, &query)
        .await?;

    Ok(Json(page))
}

/// List the caller's assigned appointments (stylist view)
#[utoipa::path(
    get,
    path = "/appointments/stylist/appointments",
    tag = "appointments",
    security(("bearer_auth" = [])),
    params(AppointmentListQuery),
    responses(
        (status = 200, description = "Paginated appointments", body = Paginated<AppointmentDetails>),
        (status = 400, description = "Invalid pagination parameters")
    )
)]
pub async fn get_stylist_appointments(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AppointmentListQuery>,
) -> AppResult<Json<Paginated<AppointmentDetails>>> {
    claims.require_role(Role::Stylist)?;

    let page = state
        .services
        .appointments
        .list_for_stylist(claims.user_id, &query)
        .await?;

    Ok(Json(page))
}
