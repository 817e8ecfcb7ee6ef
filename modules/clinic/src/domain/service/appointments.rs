//! Scheduling: booking with conflict detection, agendas, status transitions.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use praxis_db::TenantDb;
use praxis_tenancy::TenantContext;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Order, Set};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::domain::error::DomainError;
use crate::domain::model::{Appointment, AppointmentStatus, Page, PageRequest};
use crate::domain::service::require_org;
use crate::domain::service::settings::SettingsService;
use crate::infra::storage::entities::{appointment, doctor, patient};
use crate::infra::storage::map;

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointment {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub scheduled_start: DateTime<Utc>,
    /// Defaults to the start plus the practice's default appointment length.
    pub scheduled_end: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleAppointment {
    pub scheduled_start: DateTime<Utc>,
    /// Defaults to keeping the appointment's current length.
    pub scheduled_end: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct AppointmentsService {
    db: TenantDb,
    settings: SettingsService,
}

impl AppointmentsService {
    #[must_use]
    pub fn new(db: TenantDb, settings: SettingsService) -> Self {
        Self { db, settings }
    }

    /// Book an appointment, rejecting double-bookings.
    ///
    /// A slot counts as taken while any appointment of the same doctor in a
    /// slot-blocking status overlaps the requested window.
    #[instrument(
        skip(self, ctx, input),
        fields(patient_id = input.patient_id, doctor_id = input.doctor_id)
    )]
    pub async fn book(
        &self,
        ctx: &TenantContext,
        input: BookAppointment,
    ) -> Result<Appointment, DomainError> {
        info!("booking appointment");

        let org_id = require_org(ctx)?;

        let patient = self
            .db
            .get_unique::<patient::Entity, _>(ctx, input.patient_id)
            .await?
            .ok_or_else(|| DomainError::not_found("patient", input.patient_id))?;
        if patient.archived {
            return Err(DomainError::conflict(format!(
                "patient {} is archived",
                patient.id
            )));
        }

        let doctor = self
            .db
            .get_unique::<doctor::Entity, _>(ctx, input.doctor_id)
            .await?
            .ok_or_else(|| DomainError::not_found("doctor", input.doctor_id))?;
        if !doctor.active {
            return Err(DomainError::conflict(format!(
                "doctor {} is not accepting appointments",
                doctor.id
            )));
        }

        let start = input.scheduled_start;
        let end = match input.scheduled_end {
            Some(end) => end,
            None => {
                let minutes = self.settings.get(ctx).await?.default_appointment_minutes;
                start + Duration::minutes(i64::from(minutes))
            }
        };
        if end <= start {
            return Err(DomainError::validation(
                "scheduled_end",
                "must be after scheduled_start",
            ));
        }

        let clashes = self
            .db
            .find::<appointment::Entity>(ctx)
            .filter(appointment::Column::DoctorId.eq(doctor.id))
            .filter(
                appointment::Column::Status
                    .is_in(AppointmentStatus::SLOT_BLOCKING.map(AppointmentStatus::as_str)),
            )
            .filter(appointment::Column::ScheduledStart.lt(end))
            .filter(appointment::Column::ScheduledEnd.gt(start))
            .count(self.db.conn())
            .await?;
        if clashes > 0 {
            return Err(DomainError::conflict(format!(
                "doctor {} already has an appointment overlapping {start}..{end}",
                doctor.id
            )));
        }

        let now = Utc::now();
        let row = self
            .db
            .insert::<appointment::Entity>(
                ctx,
                appointment::ActiveModel {
                    org_id: Set(org_id),
                    patient_id: Set(patient.id),
                    doctor_id: Set(doctor.id),
                    scheduled_start: Set(start),
                    scheduled_end: Set(end),
                    reason: Set(input.reason),
                    status: Set(AppointmentStatus::Booked.as_str().to_owned()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                },
            )
            .await?;

        info!(appointment_id = row.id, "appointment booked");
        map::appointment(row)
    }

    /// Move a booked or confirmed appointment to a new window.
    ///
    /// The doctor's calendar is re-checked for overlaps; the appointment being
    /// moved does not clash with itself.
    #[instrument(skip(self, ctx, input), fields(appointment_id = id))]
    pub async fn reschedule(
        &self,
        ctx: &TenantContext,
        id: i64,
        input: RescheduleAppointment,
    ) -> Result<Appointment, DomainError> {
        info!("rescheduling appointment");

        let current = self.get(ctx, id).await?;
        if !matches!(
            current.status,
            AppointmentStatus::Booked | AppointmentStatus::Confirmed
        ) {
            return Err(DomainError::conflict(format!(
                "appointment {id} is {} and cannot be rescheduled",
                current.status
            )));
        }

        let start = input.scheduled_start;
        let end = match input.scheduled_end {
            Some(end) => end,
            None => start + (current.scheduled_end - current.scheduled_start),
        };
        if end <= start {
            return Err(DomainError::validation(
                "scheduled_end",
                "must be after scheduled_start",
            ));
        }

        let clashes = self
            .db
            .find::<appointment::Entity>(ctx)
            .filter(appointment::Column::Id.ne(id))
            .filter(appointment::Column::DoctorId.eq(current.doctor_id))
            .filter(
                appointment::Column::Status
                    .is_in(AppointmentStatus::SLOT_BLOCKING.map(AppointmentStatus::as_str)),
            )
            .filter(appointment::Column::ScheduledStart.lt(end))
            .filter(appointment::Column::ScheduledEnd.gt(start))
            .count(self.db.conn())
            .await?;
        if clashes > 0 {
            return Err(DomainError::conflict(format!(
                "doctor {} already has an appointment overlapping {start}..{end}",
                current.doctor_id
            )));
        }

        let result = self
            .db
            .update_many::<appointment::Entity>(ctx)
            .filter(appointment::Column::Id.eq(id))
            .col_expr(appointment::Column::ScheduledStart, Expr::value(start))
            .col_expr(appointment::Column::ScheduledEnd, Expr::value(end))
            .col_expr(appointment::Column::UpdatedAt, Expr::value(Utc::now()))
            .exec(self.db.conn())
            .await?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("appointment", id));
        }

        info!(appointment_id = id, "appointment rescheduled");
        self.get(ctx, id).await
    }

    #[instrument(skip(self, ctx), fields(appointment_id = id))]
    pub async fn get(&self, ctx: &TenantContext, id: i64) -> Result<Appointment, DomainError> {
        debug!("fetching appointment");

        let row = self
            .db
            .get_unique::<appointment::Entity, _>(ctx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("appointment", id))?;
        map::appointment(row)
    }

    /// One doctor's appointments on one calendar day, earliest first.
    #[instrument(skip(self, ctx), fields(day = %day))]
    pub async fn agenda(
        &self,
        ctx: &TenantContext,
        doctor_id: i64,
        day: NaiveDate,
    ) -> Result<Vec<Appointment>, DomainError> {
        debug!("building agenda");

        let day_start = day.and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::days(1);

        let rows = self
            .db
            .find::<appointment::Entity>(ctx)
            .filter(appointment::Column::DoctorId.eq(doctor_id))
            .filter(appointment::Column::ScheduledStart.gte(day_start))
            .filter(appointment::Column::ScheduledStart.lt(day_end))
            .order_by(appointment::Column::ScheduledStart, Order::Asc)
            .all(self.db.conn())
            .await?;
        rows.into_iter().map(map::appointment).collect()
    }

    /// Everything scheduled across the practice on one calendar day.
    #[instrument(skip(self, ctx), fields(day = %day))]
    pub async fn day_schedule(
        &self,
        ctx: &TenantContext,
        day: NaiveDate,
    ) -> Result<Vec<Appointment>, DomainError> {
        debug!("building day schedule");

        let day_start = day.and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::days(1);

        let rows = self
            .db
            .find::<appointment::Entity>(ctx)
            .filter(appointment::Column::ScheduledStart.gte(day_start))
            .filter(appointment::Column::ScheduledStart.lt(day_end))
            .order_by(appointment::Column::ScheduledStart, Order::Asc)
            .all(self.db.conn())
            .await?;
        rows.into_iter().map(map::appointment).collect()
    }

    /// One patient's appointment history, most recent first.
    #[instrument(skip(self, ctx))]
    pub async fn for_patient(
        &self,
        ctx: &TenantContext,
        patient_id: i64,
        page: PageRequest,
    ) -> Result<Page<Appointment>, DomainError> {
        debug!("listing patient appointments");

        let query = self
            .db
            .find::<appointment::Entity>(ctx)
            .filter(appointment::Column::PatientId.eq(patient_id));

        let total = query.clone().count(self.db.conn()).await?;
        let (limit, offset) = page.clamped();
        let rows = query
            .order_by(appointment::Column::ScheduledStart, Order::Desc)
            .limit(limit)
            .offset(offset)
            .all(self.db.conn())
            .await?;

        let items = rows
            .into_iter()
            .map(map::appointment)
            .collect::<Result<_, _>>()?;
        Ok(Page { items, total })
    }

    #[instrument(skip(self, ctx), fields(appointment_id = id))]
    pub async fn confirm(&self, ctx: &TenantContext, id: i64) -> Result<Appointment, DomainError> {
        self.transition(ctx, id, AppointmentStatus::Confirmed).await
    }

    #[instrument(skip(self, ctx), fields(appointment_id = id))]
    pub async fn cancel(&self, ctx: &TenantContext, id: i64) -> Result<Appointment, DomainError> {
        self.transition(ctx, id, AppointmentStatus::Cancelled).await
    }

    #[instrument(skip(self, ctx), fields(appointment_id = id))]
    pub async fn mark_no_show(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<Appointment, DomainError> {
        self.transition(ctx, id, AppointmentStatus::NoShow).await
    }

    /// Move an appointment along its lifecycle, rejecting transitions the
    /// status machine does not allow.
    async fn transition(
        &self,
        ctx: &TenantContext,
        id: i64,
        next: AppointmentStatus,
    ) -> Result<Appointment, DomainError> {
        let current = self.get(ctx, id).await?;
        if !current.status.can_transition(next) {
            return Err(DomainError::conflict(format!(
                "appointment {id} cannot move from {} to {next}",
                current.status
            )));
        }

        let result = self
            .db
            .update_many::<appointment::Entity>(ctx)
            .filter(appointment::Column::Id.eq(id))
            .col_expr(appointment::Column::Status, Expr::value(next.as_str()))
            .col_expr(appointment::Column::UpdatedAt, Expr::value(Utc::now()))
            .exec(self.db.conn())
            .await?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("appointment", id));
        }

        info!(appointment_id = id, status = %next, "appointment status changed");
        self.get(ctx, id).await
    }
}
