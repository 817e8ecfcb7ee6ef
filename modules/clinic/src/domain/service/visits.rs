//! Visit lifecycle: a booked appointment becomes an in-progress visit, which
//! is closed with a diagnosis once the consultation ends.

use chrono::Utc;
use praxis_db::scoped::{self, ScopedUpdateExt};
use praxis_db::TenantDb;
use praxis_tenancy::TenantContext;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, Order, Set};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::domain::error::DomainError;
use crate::domain::model::{AppointmentStatus, Visit};
use crate::domain::service::require_org;
use crate::infra::storage::entities::{appointment, visit};
use crate::infra::storage::map;

#[derive(Debug, Clone, Deserialize)]
pub struct StartVisit {
    pub appointment_id: i64,
    pub blood_pressure: Option<String>,
    pub pulse_bpm: Option<i32>,
    pub temperature_c: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloseVisit {
    pub visit_id: i64,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct VisitsService {
    db: TenantDb,
}

impl VisitsService {
    #[must_use]
    pub fn new(db: TenantDb) -> Self {
        Self { db }
    }

    /// Start the visit for an appointment.
    ///
    /// Moves the appointment to in-progress and creates the visit row in one
    /// transaction, so a failed insert leaves the appointment untouched.
    #[instrument(skip(self, ctx, input), fields(appointment_id = input.appointment_id))]
    pub async fn start(&self, ctx: &TenantContext, input: StartVisit) -> Result<Visit, DomainError> {
        info!("starting visit");

        require_org(ctx)?;
        let ctx = ctx.clone();
        let row = self
            .db
            .transaction(move |txn| {
                Box::pin(async move {
                    let appt = scoped::get_unique::<appointment::Entity, _, _>(
                        &ctx,
                        input.appointment_id,
                        txn,
                    )
                    .await?
                    .ok_or_else(|| {
                        DomainError::not_found("appointment", input.appointment_id)
                    })?;
                    let appt = map::appointment(appt)?;

                    if !appt.status.can_transition(AppointmentStatus::InProgress) {
                        return Err(DomainError::conflict(format!(
                            "appointment {} cannot start a visit from status {}",
                            appt.id, appt.status
                        )));
                    }

                    let now = Utc::now();
                    appointment::Entity::update_many()
                        .scoped()
                        .for_tenant(&ctx)
                        .filter(appointment::Column::Id.eq(appt.id))
                        .col_expr(
                            appointment::Column::Status,
                            Expr::value(AppointmentStatus::InProgress.as_str()),
                        )
                        .col_expr(appointment::Column::UpdatedAt, Expr::value(now))
                        .exec(txn)
                        .await?;

                    let row = scoped::insert_org_scoped::<visit::Entity, _>(
                        &ctx,
                        visit::ActiveModel {
                            org_id: Set(appt.org_id),
                            appointment_id: Set(appt.id),
                            patient_id: Set(appt.patient_id),
                            doctor_id: Set(appt.doctor_id),
                            started_at: Set(now),
                            ended_at: Set(None),
                            blood_pressure: Set(input.blood_pressure),
                            pulse_bpm: Set(input.pulse_bpm),
                            temperature_c: Set(input.temperature_c),
                            diagnosis: Set(None),
                            notes: Set(None),
                            ..Default::default()
                        },
                        txn,
                    )
                    .await?;

                    Ok::<_, DomainError>(row)
                })
            })
            .await?;

        info!(visit_id = row.id, "visit started");
        Ok(row.into())
    }

    /// Close a visit and complete its appointment, in one transaction.
    #[instrument(skip(self, ctx, input), fields(visit_id = input.visit_id))]
    pub async fn close(&self, ctx: &TenantContext, input: CloseVisit) -> Result<Visit, DomainError> {
        info!("closing visit");

        require_org(ctx)?;
        let ctx = ctx.clone();
        let row = self
            .db
            .transaction(move |txn| {
                Box::pin(async move {
                    let row =
                        scoped::get_unique::<visit::Entity, _, _>(&ctx, input.visit_id, txn)
                            .await?
                            .ok_or_else(|| DomainError::not_found("visit", input.visit_id))?;
                    if row.ended_at.is_some() {
                        return Err(DomainError::conflict(format!(
                            "visit {} is already closed",
                            row.id
                        )));
                    }

                    let appt = scoped::get_unique::<appointment::Entity, _, _>(
                        &ctx,
                        row.appointment_id,
                        txn,
                    )
                    .await?
                    .ok_or_else(|| DomainError::not_found("appointment", row.appointment_id))?;
                    let appt = map::appointment(appt)?;
                    if !appt.status.can_transition(AppointmentStatus::Completed) {
                        return Err(DomainError::conflict(format!(
                            "appointment {} cannot complete from status {}",
                            appt.id, appt.status
                        )));
                    }

                    let now = Utc::now();
                    let mut update = visit::Entity::update_many()
                        .scoped()
                        .for_tenant(&ctx)
                        .filter(visit::Column::Id.eq(row.id))
                        .col_expr(visit::Column::EndedAt, Expr::value(now));
                    if let Some(diagnosis) = input.diagnosis {
                        update = update.col_expr(visit::Column::Diagnosis, Expr::value(diagnosis));
                    }
                    if let Some(notes) = input.notes {
                        update = update.col_expr(visit::Column::Notes, Expr::value(notes));
                    }
                    update.exec(txn).await?;

                    appointment::Entity::update_many()
                        .scoped()
                        .for_tenant(&ctx)
                        .filter(appointment::Column::Id.eq(appt.id))
                        .col_expr(
                            appointment::Column::Status,
                            Expr::value(AppointmentStatus::Completed.as_str()),
                        )
                        .col_expr(appointment::Column::UpdatedAt, Expr::value(now))
                        .exec(txn)
                        .await?;

                    let closed =
                        scoped::get_unique::<visit::Entity, _, _>(&ctx, row.id, txn)
                            .await?
                            .ok_or_else(|| DomainError::not_found("visit", row.id))?;
                    Ok::<_, DomainError>(closed)
                })
            })
            .await?;

        info!(visit_id = row.id, "visit closed");
        Ok(row.into())
    }

    #[instrument(skip(self, ctx), fields(visit_id = id))]
    pub async fn get(&self, ctx: &TenantContext, id: i64) -> Result<Visit, DomainError> {
        debug!("fetching visit");

        let row = self
            .db
            .get_unique::<visit::Entity, _>(ctx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("visit", id))?;
        Ok(row.into())
    }

    /// A patient's visit history, most recent first.
    #[instrument(skip(self, ctx))]
    pub async fn for_patient(
        &self,
        ctx: &TenantContext,
        patient_id: i64,
    ) -> Result<Vec<Visit>, DomainError> {
        debug!("listing visits");

        let rows = self
            .db
            .find::<visit::Entity>(ctx)
            .filter(visit::Column::PatientId.eq(patient_id))
            .order_by(visit::Column::StartedAt, Order::Desc)
            .all(self.db.conn())
            .await?;
        Ok(rows.into_iter().map(Visit::from).collect())
    }
}
