//! Practitioner roster.

use chrono::Utc;
use praxis_db::TenantDb;
use praxis_tenancy::TenantContext;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Order, Set};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::domain::error::DomainError;
use crate::domain::model::Doctor;
use crate::domain::service::require_org;
use crate::infra::storage::entities::doctor;

#[derive(Debug, Clone, Deserialize)]
pub struct AddDoctor {
    pub given_name: String,
    pub family_name: String,
    pub specialty: String,
    pub consultation_fee: Decimal,
}

/// Practice fields to change; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDoctor {
    pub specialty: Option<String>,
    pub consultation_fee: Option<Decimal>,
}

#[derive(Clone)]
pub struct DoctorsService {
    db: TenantDb,
}

impl DoctorsService {
    #[must_use]
    pub fn new(db: TenantDb) -> Self {
        Self { db }
    }

    #[instrument(skip(self, ctx, input), fields(family_name = %input.family_name))]
    pub async fn add(&self, ctx: &TenantContext, input: AddDoctor) -> Result<Doctor, DomainError> {
        info!("adding doctor");

        let org_id = require_org(ctx)?;
        if input.given_name.trim().is_empty() || input.family_name.trim().is_empty() {
            return Err(DomainError::validation("name", "must not be empty"));
        }
        if input.specialty.trim().is_empty() {
            return Err(DomainError::validation("specialty", "must not be empty"));
        }
        if input.consultation_fee < Decimal::ZERO {
            return Err(DomainError::validation(
                "consultation_fee",
                "must not be negative",
            ));
        }

        let row = self
            .db
            .insert::<doctor::Entity>(
                ctx,
                doctor::ActiveModel {
                    org_id: Set(org_id),
                    given_name: Set(input.given_name),
                    family_name: Set(input.family_name),
                    specialty: Set(input.specialty),
                    consultation_fee: Set(input.consultation_fee),
                    active: Set(true),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        info!(doctor_id = row.id, "doctor added");
        Ok(row.into())
    }

    #[instrument(skip(self, ctx), fields(doctor_id = id))]
    pub async fn get(&self, ctx: &TenantContext, id: i64) -> Result<Doctor, DomainError> {
        debug!("fetching doctor");

        let row = self
            .db
            .get_unique::<doctor::Entity, _>(ctx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("doctor", id))?;
        Ok(row.into())
    }

    /// Doctors currently accepting appointments, ordered by family name.
    #[instrument(skip(self, ctx))]
    pub async fn list_active(&self, ctx: &TenantContext) -> Result<Vec<Doctor>, DomainError> {
        debug!("listing active doctors");

        let rows = self
            .db
            .find::<doctor::Entity>(ctx)
            .filter(doctor::Column::Active.eq(true))
            .order_by(doctor::Column::FamilyName, Order::Asc)
            .all(self.db.conn())
            .await?;
        Ok(rows.into_iter().map(Doctor::from).collect())
    }

    #[instrument(skip(self, ctx, input), fields(doctor_id = id))]
    pub async fn update(
        &self,
        ctx: &TenantContext,
        id: i64,
        input: UpdateDoctor,
    ) -> Result<Doctor, DomainError> {
        info!("updating doctor");

        if let Some(specialty) = &input.specialty {
            if specialty.trim().is_empty() {
                return Err(DomainError::validation("specialty", "must not be empty"));
            }
        }
        if let Some(fee) = input.consultation_fee {
            if fee < Decimal::ZERO {
                return Err(DomainError::validation(
                    "consultation_fee",
                    "must not be negative",
                ));
            }
        }
        // Nothing to change; still confirms the doctor is visible in scope.
        if input.specialty.is_none() && input.consultation_fee.is_none() {
            return self.get(ctx, id).await;
        }

        let mut update = self
            .db
            .update_many::<doctor::Entity>(ctx)
            .filter(doctor::Column::Id.eq(id));
        if let Some(specialty) = input.specialty {
            update = update.col_expr(doctor::Column::Specialty, Expr::value(specialty));
        }
        if let Some(fee) = input.consultation_fee {
            update = update.col_expr(doctor::Column::ConsultationFee, Expr::value(fee));
        }

        let result = update.exec(self.db.conn()).await?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("doctor", id));
        }
        self.get(ctx, id).await
    }

    /// Take a doctor off the roster. Their historical appointments and visits
    /// stay untouched.
    #[instrument(skip(self, ctx), fields(doctor_id = id))]
    pub async fn deactivate(&self, ctx: &TenantContext, id: i64) -> Result<(), DomainError> {
        info!("deactivating doctor");

        let result = self
            .db
            .update_many::<doctor::Entity>(ctx)
            .filter(doctor::Column::Id.eq(id))
            .col_expr(doctor::Column::Active, Expr::value(false))
            .exec(self.db.conn())
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("doctor", id));
        }
        Ok(())
    }
}
