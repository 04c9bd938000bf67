//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{appointments, auth, catalog, health, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Salonet API",
        version = "1.0.0",
        description = "Salon Appointment Booking REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "Salonet Team", email = "dev@salonet.app")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::forgot_password,
        auth::deactivate,
        // Appointments
        appointments::create_appointment,
        appointments::get_appointment,
        appointments::update_appointment,
        appointments::cancel_appointments,
        appointments::get_user_appointments,
        appointments::get_stylist_appointments,
        // Catalog
        catalog::list_services,
        // Stats
        stats::get_total_income,
        stats::get_total_services,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::ForgotPasswordRequest,
            crate::models::user::UserPublic,
            crate::services::accounts::DeactivationSummary,
            // Appointments
            crate::models::appointment::Appointment,
            crate::models::appointment::AppointmentDetails,
            crate::models::appointment::ServiceLine,
            crate::models::appointment::ServiceSelection,
            crate::models::appointment::CreateAppointment,
            crate::models::appointment::UpdateAppointment,
            appointments::BulkCancelRequest,
            appointments::BulkCancelResponse,
            crate::models::enums::AppointmentStatus,
            crate::models::enums::Role,
            // Catalog
            crate::models::service::Service,
            crate::models::service::ServiceCategory,
            // Stats
            stats::IncomeResponse,
            stats::ServiceCountResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication and account endpoints"),
        (name = "appointments", description = "Appointment booking and management"),
        (name = "catalog", description = "Service catalog"),
        (name = "stats", description = "Revenue and workload statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
