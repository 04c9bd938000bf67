//! Appointment lifecycle state machine
//!
//! PENDING -> CONFIRMED -> COMPLETED, with CANCELLED reachable from both
//! non-terminal states. Terminal states transition nowhere, for any role.

use crate::{
    error::{AppError, AppResult},
    models::enums::{AppointmentStatus, Role},
};

/// Validate a requested status change and return the status to persist.
///
/// Only administrators may set status through the generic update path;
/// customers and stylists go through dedicated flows (cancellation via
/// account deactivation, booking starts at PENDING). Requesting the current
/// status is a no-op rather than an error.
pub fn transition(
    current: AppointmentStatus,
    requested: AppointmentStatus,
    actor: Role,
) -> AppResult<AppointmentStatus> {
    if requested == current {
        return Ok(current);
    }

    if actor != Role::Admin {
        return Err(AppError::Forbidden(
            "only administrators may change appointment status".to_string(),
        ));
    }

    if !current.can_transition_to(requested) {
        return Err(AppError::InvalidTransition {
            from: current.to_string(),
            to: requested.to_string(),
        });
    }

    Ok(requested)
}
