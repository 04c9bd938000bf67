//! Appointments repository: all reads and transactional writes for
//! appointments and their service lines.

use std::collections::HashMap;

use chrono::{Days, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sqlx::{PgConnection, Pool, Postgres, Transaction};

use crate::{
    error::{is_retryable, AppError, AppResult},
    models::{
        appointment::{
            Appointment, AppointmentChanges, AppointmentDetails, AppointmentFilter,
            AppointmentSort, NewAppointment, ServiceLine,
        },
        enums::AppointmentStatus,
    },
};

/// Serialization failures abort the losing transaction; it is safe to rerun
/// the whole transaction from the top.
const MAX_TX_RETRIES: u32 = 3;

const CANCELLABLE_STATUSES: [&str; 2] = ["pending", "confirmed"];

fn day_start(d: NaiveDate) -> chrono::DateTime<chrono::Utc> {
    d.and_time(NaiveTime::MIN).and_utc()
}

fn day_start_after(d: NaiveDate) -> chrono::DateTime<chrono::Utc> {
    day_start(d.checked_add_days(Days::new(1)).unwrap_or(d))
}

/// Build the conjunctive WHERE conditions for an [`AppointmentFilter`],
/// numbering bind parameters from $1. Count and listing queries share this
/// predicate so the reported total always matches the returned page.
fn filter_conditions(filter: &AppointmentFilter) -> Vec<String> {
    let mut conditions = Vec::new();
    let mut idx = 1;

    if !filter.user_ids.is_empty() {
        conditions.push(format!("a.user_id = ANY(${})", idx));
        idx += 1;
    }
    if !filter.stylist_ids.is_empty() {
        conditions.push(format!("a.stylist_id = ANY(${})", idx));
        idx += 1;
    }
    if !filter.statuses.is_empty() {
        conditions.push(format!("a.status = ANY(${})", idx));
        idx += 1;
    }
    if filter.start_date.is_some() {
        conditions.push(format!("a.date_time >= ${}", idx));
        idx += 1;
    }
    if filter.end_date.is_some() {
        // Inclusive end at day boundary: strictly before the next midnight
        conditions.push(format!("a.date_time < ${}", idx));
    }

    conditions
}

/// Write-time transition guard. A status validated against an earlier read
/// may be stale once the row lock is acquired (a concurrent cascade can have
/// cancelled the appointment in between); only the locked row is
/// authoritative. Same-status writes are a no-op.
fn ensure_status_transition(
    current: AppointmentStatus,
    requested: AppointmentStatus,
) -> AppResult<()> {
    if requested == current || current.can_transition_to(requested) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition {
            from: current.to_string(),
            to: requested.to_string(),
        })
    }
}

fn where_clause(conditions: &[String]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

/// Bind filter values in the same order `filter_conditions` numbered them
macro_rules! bind_filter {
    ($query:expr, $filter:expr) => {{
        let mut q = $query;
        if !$filter.user_ids.is_empty() {
            q = q.bind(&$filter.user_ids);
        }
        if !$filter.stylist_ids.is_empty() {
            q = q.bind(&$filter.stylist_ids);
        }
        if !$filter.statuses.is_empty() {
            let statuses: Vec<String> = $filter
                .statuses
                .iter()
                .map(|s| s.as_str().to_string())
                .collect();
            q = q.bind(statuses);
        }
        if let Some(d) = $filter.start_date {
            q = q.bind(day_start(d));
        }
        if let Some(d) = $filter.end_date {
            q = q.bind(day_start_after(d));
        }
        q
    }};
}

#[derive(Clone)]
pub struct AppointmentsRepository {
    pool: Pool<Postgres>,
    statement_timeout_secs: u64,
}

impl AppointmentsRepository {
    pub fn new(pool: Pool<Postgres>, statement_timeout_secs: u64) -> Self {
        Self { pool, statement_timeout_secs }
    }

    /// Open a serializable transaction with a bounded statement timeout.
    /// Serializable isolation linearizes concurrent line replacements on
    /// the same appointment; the loser aborts with sqlstate 40001.
    async fn begin_serializable(&self) -> AppResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = '{}s'",
            self.statement_timeout_secs
        ))
        .execute(&mut *tx)
        .await?;
        Ok(tx)
    }

    /// Create an appointment and its service lines atomically
    pub async fn create(&self, new: &NewAppointment) -> AppResult<AppointmentDetails> {
        let mut attempt = 0;
        loop {
            match self.try_create(new).await {
                Err(AppError::Database(e)) if is_retryable(&e) && attempt < MAX_TX_RETRIES => {
                    attempt += 1;
                    tracing::warn!(attempt, "retrying appointment create after {}", e);
                }
                other => return other,
            }
        }
    }

    async fn try_create(&self, new: &NewAppointment) -> AppResult<AppointmentDetails> {
        let mut tx = self.begin_serializable().await?;

        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments
                (user_id, stylist_id, date_time, status, notes, estimated_duration, total_price)
            VALUES ($1, $2, $3, 'pending', $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(new.stylist_id)
        .bind(new.date_time)
        .bind(&new.notes)
        .bind(new.estimated_duration)
        .bind(new.total_price)
        .fetch_one(&mut *tx)
        .await?;

        let services = Self::insert_lines(&mut tx, appointment.id, new).await?;

        tx.commit().await?;

        Ok(AppointmentDetails { appointment, services })
    }

    async fn insert_lines(
        tx: &mut Transaction<'_, Postgres>,
        appointment_id: i32,
        new: &NewAppointment,
    ) -> AppResult<Vec<ServiceLine>> {
        let mut lines = Vec::with_capacity(new.lines.len());
        for selection in &new.lines {
            let line = sqlx::query_as::<_, ServiceLine>(
                r#"
                INSERT INTO appointment_services (appointment_id, service_id, number_of_people)
                VALUES ($1, $2, $3)
                RETURNING *
                "#,
            )
            .bind(appointment_id)
            .bind(selection.service_id)
            .bind(selection.number_of_people)
            .fetch_one(&mut **tx)
            .await?;
            lines.push(line);
        }
        Ok(lines)
    }

    /// Get appointment by ID, with its service lines
    pub async fn get_by_id(&self, id: i32) -> AppResult<AppointmentDetails> {
        let appointment = sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Appointment with id {} not found", id)))?;

        let services = self.load_lines(id).await?;
        Ok(AppointmentDetails { appointment, services })
    }

    /// Get an appointment only if the given customer owns it. The ownership
    /// filter lives in the query itself: "exists but not yours" and
    /// "does not exist" are indistinguishable to the caller.
    pub async fn find_user_appointment_by_id(
        &self,
        id: i32,
        user_id: i32,
    ) -> AppResult<AppointmentDetails> {
        let appointment = sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Appointment with id {} not found", id)))?;

        let services = self.load_lines(id).await?;
        Ok(AppointmentDetails { appointment, services })
    }

    /// Get an appointment only if the given stylist is assigned to it
    pub async fn find_stylist_appointment_by_id(
        &self,
        id: i32,
        stylist_id: i32,
    ) -> AppResult<AppointmentDetails> {
        let appointment = sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments WHERE id = $1 AND stylist_id = $2",
        )
        .bind(id)
        .bind(stylist_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Appointment with id {} not found", id)))?;

        let services = self.load_lines(id).await?;
        Ok(AppointmentDetails { appointment, services })
    }

    async fn load_lines(&self, appointment_id: i32) -> AppResult<Vec<ServiceLine>> {
        let lines = sqlx::query_as::<_, ServiceLine>(
            "SELECT * FROM appointment_services WHERE appointment_id = $1 ORDER BY id",
        )
        .bind(appointment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }

    /// Update mutable fields and, when requested, replace the service line
    /// set wholesale, all within one serializable transaction.
    pub async fn update(&self, id: i32, changes: &AppointmentChanges) -> AppResult<AppointmentDetails> {
        let mut attempt = 0;
        loop {
            match self.try_update(id, changes).await {
                Err(AppError::Database(e)) if is_retryable(&e) && attempt < MAX_TX_RETRIES => {
                    attempt += 1;
                    tracing::warn!(attempt, "retrying appointment update after {}", e);
                }
                other => return other,
            }
        }
    }

    async fn try_update(&self, id: i32, changes: &AppointmentChanges) -> AppResult<AppointmentDetails> {
        let mut tx = self.begin_serializable().await?;

        // Row lock so two concurrent line replacements serialize instead of
        // interleaving delete/insert pairs.
        let locked =
            sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Appointment with id {} not found", id)))?;

        if let Some(requested) = changes.status {
            ensure_status_transition(locked.status, requested)?;
        }

        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET date_time = COALESCE($2, date_time),
                status = COALESCE($3, status),
                notes = COALESCE($4, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.date_time)
        .bind(changes.status)
        .bind(&changes.notes)
        .fetch_one(&mut *tx)
        .await?;

        let appointment = if let Some(ref replacement) = changes.lines {
            // Destructive replacement: prior lines are discarded, never merged
            sqlx::query("DELETE FROM appointment_services WHERE appointment_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            for selection in &replacement.selections {
                sqlx::query(
                    r#"
                    INSERT INTO appointment_services (appointment_id, service_id, number_of_people)
                    VALUES ($1, $2, $3)
                    "#,
                )
                .bind(id)
                .bind(selection.service_id)
                .bind(selection.number_of_people)
                .execute(&mut *tx)
                .await?;
            }

            sqlx::query_as::<_, Appointment>(
                r#"
                UPDATE appointments
                SET estimated_duration = $2, total_price = $3, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(replacement.estimated_duration)
            .bind(replacement.total_price)
            .fetch_one(&mut *tx)
            .await?
        } else {
            appointment
        };

        let services = sqlx::query_as::<_, ServiceLine>(
            "SELECT * FROM appointment_services WHERE appointment_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(AppointmentDetails { appointment, services })
    }

    /// Paginated, filtered, sorted listing. The count query uses the exact
    /// same predicate as the page query.
    pub async fn list(
        &self,
        filter: &AppointmentFilter,
        page: i64,
        per_page: i64,
        sort: AppointmentSort,
    ) -> AppResult<(Vec<AppointmentDetails>, i64)> {
        let conditions = filter_conditions(filter);
        let where_sql = where_clause(&conditions);
        let offset = (page - 1) * per_page;

        let count_sql = format!("SELECT COUNT(*) FROM appointments a {}", where_sql);
        let total: i64 = bind_filter!(sqlx::query_scalar::<_, i64>(&count_sql), filter)
            .fetch_one(&self.pool)
            .await?;

        let select_sql = format!(
            "SELECT a.* FROM appointments a {} ORDER BY {} LIMIT {} OFFSET {}",
            where_sql,
            sort.order_clause(),
            per_page,
            offset
        );
        let appointments = bind_filter!(sqlx::query_as::<_, Appointment>(&select_sql), filter)
            .fetch_all(&self.pool)
            .await?;

        // One batched line lookup for the whole page, never per-row queries
        let ids: Vec<i32> = appointments.iter().map(|a| a.id).collect();
        let mut lines_by_appointment: HashMap<i32, Vec<ServiceLine>> = HashMap::new();
        if !ids.is_empty() {
            let lines = sqlx::query_as::<_, ServiceLine>(
                "SELECT * FROM appointment_services WHERE appointment_id = ANY($1) ORDER BY id",
            )
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;
            for line in lines {
                lines_by_appointment.entry(line.appointment_id).or_default().push(line);
            }
        }

        let details = appointments
            .into_iter()
            .map(|appointment| {
                let services = lines_by_appointment.remove(&appointment.id).unwrap_or_default();
                AppointmentDetails { appointment, services }
            })
            .collect();

        Ok((details, total))
    }

    /// Sum of frozen appointment totals matching the filter
    pub async fn total_income(&self, filter: &AppointmentFilter) -> AppResult<Decimal> {
        let conditions = filter_conditions(filter);
        let sql = format!(
            "SELECT COALESCE(SUM(a.total_price), 0) FROM appointments a {}",
            where_clause(&conditions)
        );
        let total = bind_filter!(sqlx::query_scalar::<_, Decimal>(&sql), filter)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    /// Sum of headcounts over service lines whose owning appointment matches
    /// the filter
    pub async fn total_service_count(&self, filter: &AppointmentFilter) -> AppResult<i64> {
        let conditions = filter_conditions(filter);
        let sql = format!(
            r#"
            SELECT COALESCE(SUM(l.number_of_people), 0)::BIGINT
            FROM appointment_services l
            JOIN appointments a ON a.id = l.appointment_id
            {}
            "#,
            where_clause(&conditions)
        );
        let total = bind_filter!(sqlx::query_scalar::<_, i64>(&sql), filter)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    /// Cancel the given appointments if they are still active. The status
    /// predicate is part of the UPDATE itself, so an appointment that
    /// concurrently reached a terminal state is left untouched.
    pub async fn cancel_by_ids(&self, ids: &[i32], note: &str) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET status = 'cancelled', notes = $2, updated_at = NOW()
            WHERE id = ANY($1) AND status = ANY($3)
            "#,
        )
        .bind(ids)
        .bind(note)
        .bind(&CANCELLABLE_STATUSES[..])
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Cancel all active appointments involving the user as customer or
    /// stylist. Runs on the caller's transaction so it commits atomically
    /// with the account deactivation. The write re-checks the status so a
    /// concurrently completed appointment is never cancelled.
    pub async fn cancel_active_for_user(
        &self,
        conn: &mut PgConnection,
        user_id: i32,
        note: &str,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET status = 'cancelled', notes = $2, updated_at = NOW()
            WHERE (user_id = $1 OR stylist_id = $1) AND status = ANY($3)
            "#,
        )
        .bind(user_id)
        .bind(note)
        .bind(&CANCELLABLE_STATUSES[..])
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_builds_no_conditions() {
        let filter = AppointmentFilter::default();
        assert!(filter_conditions(&filter).is_empty());
        assert_eq!(where_clause(&[]), "");
    }

    #[test]
    fn filter_conditions_number_params_sequentially() {
        let filter = AppointmentFilter {
            user_ids: vec![1],
            stylist_ids: vec![2, 3],
            statuses: vec![AppointmentStatus::Pending],
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31),
        };
        let conditions = filter_conditions(&filter);
        assert_eq!(
            conditions,
            vec![
                "a.user_id = ANY($1)",
                "a.stylist_id = ANY($2)",
                "a.status = ANY($3)",
                "a.date_time >= $4",
                "a.date_time < $5",
            ]
        );
    }

    #[test]
    fn partial_filter_renumbers_from_one() {
        let filter = AppointmentFilter {
            stylist_ids: vec![7],
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30),
            ..Default::default()
        };
        let conditions = filter_conditions(&filter);
        assert_eq!(conditions, vec!["a.stylist_id = ANY($1)", "a.date_time < $2"]);
    }

    #[test]
    fn write_time_guard_rejects_transitions_out_of_terminal_states() {
        // A row cancelled by a concurrent cascade between the caller's read
        // and the row lock must stay cancelled, whatever was validated
        // against the earlier read.
        for requested in [
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Completed,
        ] {
            assert!(matches!(
                ensure_status_transition(AppointmentStatus::Cancelled, requested),
                Err(AppError::InvalidTransition { .. })
            ));
        }
        assert!(matches!(
            ensure_status_transition(AppointmentStatus::Completed, AppointmentStatus::Confirmed),
            Err(AppError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn write_time_guard_allows_valid_and_same_status_writes() {
        assert!(ensure_status_transition(
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed
        )
        .is_ok());
        assert!(ensure_status_transition(
            AppointmentStatus::Confirmed,
            AppointmentStatus::Cancelled
        )
        .is_ok());
        assert!(ensure_status_transition(
            AppointmentStatus::Cancelled,
            AppointmentStatus::Cancelled
        )
        .is_ok());
    }

    #[test]
    fn end_date_is_inclusive_at_day_boundary() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let upper = day_start_after(d);
        assert_eq!(upper.to_rfc3339(), "2024-03-16T00:00:00+00:00");
        // anything on the 15th, up to 23:59:59, sorts strictly below `upper`
        assert!(day_start(d) < upper);
    }
}
