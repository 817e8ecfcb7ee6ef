//! Role-oriented dashboards, assembled from the other services' data.

use chrono::{Duration, NaiveDate, NaiveTime};
use praxis_db::TenantDb;
use praxis_tenancy::TenantContext;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, Order};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::error::DomainError;
use crate::domain::model::{Appointment, InvoiceStatement, Role, Visit};
use crate::domain::service::billing::BillingService;
use crate::infra::storage::entities::{appointment, doctor, member, notification, patient, visit};
use crate::infra::storage::map;

/// Practice-wide numbers for the admin landing page.
#[derive(Debug, Clone, Serialize)]
pub struct AdminSummary {
    pub patients: u64,
    pub active_doctors: u64,
    pub appointments_today: u64,
    pub outstanding_invoices: u64,
    pub outstanding_amount: Decimal,
    pub unread_notifications: u64,
}

/// One doctor's working day.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorDay {
    pub appointments: Vec<Appointment>,
    pub open_visits: Vec<Visit>,
}

/// The front desk's view of a day.
#[derive(Debug, Clone, Serialize)]
pub struct ReceptionDay {
    pub appointments: Vec<Appointment>,
    pub outstanding: Vec<InvoiceStatement>,
}

#[derive(Clone)]
pub struct DashboardService {
    db: TenantDb,
    billing: BillingService,
}

impl DashboardService {
    #[must_use]
    pub fn new(db: TenantDb, billing: BillingService) -> Self {
        Self { db, billing }
    }

    /// Practice-wide summary. When the context names an acting user, that
    /// user must hold the admin role in the organisation.
    #[instrument(skip(self, ctx), fields(day = %today))]
    pub async fn admin_summary(
        &self,
        ctx: &TenantContext,
        today: NaiveDate,
    ) -> Result<AdminSummary, DomainError> {
        debug!("building admin summary");

        if let Some(user) = ctx.user_id() {
            let row = self
                .db
                .find::<member::Entity>(ctx)
                .filter(member::Column::UserId.eq(user.get()))
                .one(self.db.conn())
                .await?;
            let is_admin = match row {
                Some(row) => map::member(row)?.role == Role::Admin,
                None => false,
            };
            if !is_admin {
                return Err(DomainError::Forbidden(
                    "the admin dashboard requires the admin role",
                ));
            }
        }

        let patients = self
            .db
            .find::<patient::Entity>(ctx)
            .filter(patient::Column::Archived.eq(false))
            .count(self.db.conn())
            .await?;
        let active_doctors = self
            .db
            .find::<doctor::Entity>(ctx)
            .filter(doctor::Column::Active.eq(true))
            .count(self.db.conn())
            .await?;

        let day_start = today.and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::days(1);
        let appointments_today = self
            .db
            .find::<appointment::Entity>(ctx)
            .filter(appointment::Column::ScheduledStart.gte(day_start))
            .filter(appointment::Column::ScheduledStart.lt(day_end))
            .count(self.db.conn())
            .await?;

        let outstanding = self.billing.outstanding(ctx).await?;
        let outstanding_amount: Decimal = outstanding.iter().map(|s| s.due).sum();

        let unread_notifications = self
            .db
            .find::<notification::Entity>(ctx)
            .filter(notification::Column::ReadAt.is_null())
            .count(self.db.conn())
            .await?;

        Ok(AdminSummary {
            patients,
            active_doctors,
            appointments_today,
            outstanding_invoices: outstanding.len() as u64,
            outstanding_amount,
            unread_notifications,
        })
    }

    /// One doctor's appointments for the day plus any visits they have not
    /// closed yet.
    #[instrument(skip(self, ctx), fields(day = %day))]
    pub async fn doctor_day(
        &self,
        ctx: &TenantContext,
        doctor_id: i64,
        day: NaiveDate,
    ) -> Result<DoctorDay, DomainError> {
        debug!("building doctor day");

        let day_start = day.and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::days(1);

        let appointments = self
            .db
            .find::<appointment::Entity>(ctx)
            .filter(appointment::Column::DoctorId.eq(doctor_id))
            .filter(appointment::Column::ScheduledStart.gte(day_start))
            .filter(appointment::Column::ScheduledStart.lt(day_end))
            .order_by(appointment::Column::ScheduledStart, Order::Asc)
            .all(self.db.conn())
            .await?
            .into_iter()
            .map(map::appointment)
            .collect::<Result<Vec<Appointment>, _>>()?;

        let open_visits = self
            .db
            .find::<visit::Entity>(ctx)
            .filter(visit::Column::DoctorId.eq(doctor_id))
            .filter(visit::Column::EndedAt.is_null())
            .order_by(visit::Column::StartedAt, Order::Asc)
            .all(self.db.conn())
            .await?
            .into_iter()
            .map(Visit::from)
            .collect();

        Ok(DoctorDay {
            appointments,
            open_visits,
        })
    }

    /// Everything the front desk needs for a day: the full schedule and the
    /// invoices still owing money.
    #[instrument(skip(self, ctx), fields(day = %day))]
    pub async fn reception_day(
        &self,
        ctx: &TenantContext,
        day: NaiveDate,
    ) -> Result<ReceptionDay, DomainError> {
        debug!("building reception day");

        let day_start = day.and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::days(1);

        let appointments = self
            .db
            .find::<appointment::Entity>(ctx)
            .filter(appointment::Column::ScheduledStart.gte(day_start))
            .filter(appointment::Column::ScheduledStart.lt(day_end))
            .order_by(appointment::Column::ScheduledStart, Order::Asc)
            .all(self.db.conn())
            .await?
            .into_iter()
            .map(map::appointment)
            .collect::<Result<Vec<Appointment>, _>>()?;

        let outstanding = self.billing.outstanding(ctx).await?;

        Ok(ReceptionDay {
            appointments,
            outstanding,
        })
    }
}
