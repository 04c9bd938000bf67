//! Appointment booking and management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        appointment::{
            AppointmentChanges, AppointmentDetails, AppointmentFilter, AppointmentListQuery,
            AppointmentSort, CreateAppointment, LineReplacement, NewAppointment,
            UpdateAppointment,
        },
        enums::Role,
        pagination::{PageQuery, Paginated},
        user::UserClaims,
    },
    repository::Repository,
    services::{lifecycle, pricing::PricingService},
};

#[derive(Clone)]
pub struct AppointmentsService {
    repository: Repository,
    pricing: PricingService,
}

impl AppointmentsService {
    pub fn new(repository: Repository, pricing: PricingService) -> Self {
        Self { repository, pricing }
    }

    /// Book a new appointment for a customer. Totals are resolved from the
    /// catalog here and frozen into the appointment row.
    pub async fn book(&self, user_id: i32, request: CreateAppointment) -> AppResult<AppointmentDetails> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let stylist = self.repository.users.get_by_id(request.stylist_id).await?;
        if stylist.role != Role::Stylist || !stylist.active {
            return Err(AppError::Validation(
                "stylist_id does not reference an active stylist".to_string(),
            ));
        }

        let totals = self.pricing.price_selections(&request.services).await?;

        let new = NewAppointment {
            user_id,
            stylist_id: request.stylist_id,
            date_time: request.date_time,
            notes: request.notes,
            estimated_duration: totals.estimated_duration,
            total_price: totals.total_price,
            lines: request.services,
        };

        let details = self.repository.appointments.create(&new).await?;

        tracing::info!(
            appointment_id = details.appointment.id,
            user_id,
            stylist_id = details.appointment.stylist_id,
            "appointment booked"
        );

        Ok(details)
    }

    /// Get an appointment scoped to the actor: admins see any appointment,
    /// customers and stylists only their own (not-found otherwise).
    pub async fn get_for_actor(&self, id: i32, claims: &UserClaims) -> AppResult<AppointmentDetails> {
        match claims.role {
            Role::Admin => self.repository.appointments.get_by_id(id).await,
            Role::Customer => {
                self.repository
                    .appointments
                    .find_user_appointment_by_id(id, claims.user_id)
                    .await
            }
            Role::Stylist => {
                self.repository
                    .appointments
                    .find_stylist_appointment_by_id(id, claims.user_id)
                    .await
            }
        }
    }

    /// Admin update: date, notes, status (through the state machine) and
    /// wholesale service replacement with recomputed totals.
    pub async fn update(
        &self,
        id: i32,
        request: UpdateAppointment,
        actor_role: Role,
    ) -> AppResult<AppointmentDetails> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let current = self.repository.appointments.get_by_id(id).await?;

        let status = match request.status {
            Some(requested) => {
                Some(lifecycle::transition(current.appointment.status, requested, actor_role)?)
            }
            None => None,
        };

        let lines = match request.services {
            Some(selections) => {
                let totals = self.pricing.price_selections(&selections).await?;
                Some(LineReplacement {
                    selections,
                    estimated_duration: totals.estimated_duration,
                    total_price: totals.total_price,
                })
            }
            None => None,
        };

        let changes = AppointmentChanges {
            date_time: request.date_time,
            status,
            notes: request.notes,
            lines,
        };

        self.repository.appointments.update(id, &changes).await
    }

    /// Paginated listing of a customer's own appointments
    pub async fn list_for_user(
        &self,
        user_id: i32,
        query: &AppointmentListQuery,
    ) -> AppResult<Paginated<AppointmentDetails>> {
        let filter = AppointmentFilter {
            user_ids: vec![user_id],
            statuses: query.status.into_iter().collect(),
            start_date: query.start_date,
            end_date: query.end_date,
            ..Default::default()
        };
        self.list(filter, query).await
    }

    /// Paginated listing of a stylist's assigned appointments
    pub async fn list_for_stylist(
        &self,
        stylist_id: i32,
        query: &AppointmentListQuery,
    ) -> AppResult<Paginated<AppointmentDetails>> {
        let filter = AppointmentFilter {
            stylist_ids: vec![stylist_id],
            statuses: query.status.into_iter().collect(),
            start_date: query.start_date,
            end_date: query.end_date,
            ..Default::default()
        };
        self.list(filter, query).await
    }

    async fn list(
        &self,
        filter: AppointmentFilter,
        query: &AppointmentListQuery,
    ) -> AppResult<Paginated<AppointmentDetails>> {
        let (page, per_page) = PageQuery { page: query.page, per_page: query.per_page }.resolve()?;
        let sort = AppointmentSort::from_param(query.sort_by.as_deref());

        let (items, total) = self
            .repository
            .appointments
            .list(&filter, page, per_page, sort)
            .await?;

        Ok(Paginated::new(items, page, per_page, total))
    }

    /// Cancel a list of appointments that are still active (bulk path)
    pub async fn cancel_by_ids(&self, ids: &[i32], note: &str) -> AppResult<u64> {
        self.repository.appointments.cancel_by_ids(ids, note).await
    }
}
