//! Appointment model and related types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::AppointmentStatus;

/// Appointment row from the database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Appointment {
    pub id: i32,
    pub user_id: i32,
    pub stylist_id: i32,
    pub date_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    /// Minutes, summed once per service line (group services run in parallel)
    pub estimated_duration: i32,
    /// Frozen at write time; later catalog price changes do not touch it
    #[schema(value_type = String)]
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One (service, headcount) line owned by an appointment
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ServiceLine {
    pub id: i32,
    pub appointment_id: i32,
    pub service_id: i32,
    pub number_of_people: i32,
}

/// Appointment with its service lines
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AppointmentDetails {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub services: Vec<ServiceLine>,
}

/// A (service, headcount) selection in a booking request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ServiceSelection {
    pub service_id: i32,
    #[serde(default = "default_headcount")]
    #[validate(range(min = 1, message = "number_of_people must be >= 1"))]
    pub number_of_people: i32,
}

fn default_headcount() -> i32 {
    1
}

/// Booking request submitted by a customer
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAppointment {
    pub stylist_id: i32,
    pub date_time: DateTime<Utc>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "at least one service is required"))]
    #[validate(nested)]
    pub services: Vec<ServiceSelection>,
}

/// Admin update request. A `services` value replaces the line set wholesale.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateAppointment {
    pub date_time: Option<DateTime<Utc>>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "at least one service is required"))]
    #[validate(nested)]
    pub services: Option<Vec<ServiceSelection>>,
}

/// Fully-priced appointment ready to persist. Built by the booking service
/// after the pricing engine has resolved totals from the catalog.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub user_id: i32,
    pub stylist_id: i32,
    pub date_time: DateTime<Utc>,
    pub notes: Option<String>,
    pub estimated_duration: i32,
    pub total_price: Decimal,
    pub lines: Vec<ServiceSelection>,
}

/// Resolved changes for a repository update. When `lines` is set, the line
/// set is replaced wholesale and the recomputed totals land with it.
#[derive(Debug, Clone, Default)]
pub struct AppointmentChanges {
    pub date_time: Option<DateTime<Utc>>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
    pub lines: Option<LineReplacement>,
}

#[derive(Debug, Clone)]
pub struct LineReplacement {
    pub selections: Vec<ServiceSelection>,
    pub estimated_duration: i32,
    pub total_price: Decimal,
}

/// Conjunctive filters for appointment listings and aggregates
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub user_ids: Vec<i32>,
    pub stylist_ids: Vec<i32>,
    pub statuses: Vec<AppointmentStatus>,
    /// Inclusive, at day boundary
    pub start_date: Option<NaiveDate>,
    /// Inclusive, at day boundary
    pub end_date: Option<NaiveDate>,
}

/// Sort keys allowed on appointment listings. Anything outside the
/// allow-list falls back to creation time, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentSort {
    DateTime,
    CreatedAtDesc,
}

impl AppointmentSort {
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("date_time") => AppointmentSort::DateTime,
            _ => AppointmentSort::CreatedAtDesc,
        }
    }

    pub fn order_clause(&self) -> &'static str {
        match self {
            AppointmentSort::DateTime => "a.date_time ASC",
            AppointmentSort::CreatedAtDesc => "a.created_at DESC",
        }
    }
}

/// Query parameters for listing endpoints
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct AppointmentListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<AppointmentStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sort_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_allow_list_only_accepts_date_time() {
        assert_eq!(
            AppointmentSort::from_param(Some("date_time")),
            AppointmentSort::DateTime
        );
        assert_eq!(
            AppointmentSort::from_param(Some("total_price")),
            AppointmentSort::CreatedAtDesc
        );
        assert_eq!(AppointmentSort::from_param(None), AppointmentSort::CreatedAtDesc);
    }

    #[test]
    fn empty_service_list_fails_validation() {
        let req = CreateAppointment {
            stylist_id: 1,
            date_time: Utc::now(),
            notes: None,
            services: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn zero_headcount_fails_validation() {
        let req = CreateAppointment {
            stylist_id: 1,
            date_time: Utc::now(),
            notes: None,
            services: vec![ServiceSelection { service_id: 1, number_of_people: 0 }],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn headcount_defaults_to_one() {
        let selection: ServiceSelection =
            serde_json::from_str(r#"{"service_id": 3}"#).unwrap();
        assert_eq!(selection.number_of_people, 1);
    }
}
