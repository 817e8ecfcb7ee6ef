//! Patient registry: registration, search, contact updates, archiving.

use chrono::{NaiveDate, Utc};
use praxis_db::TenantDb;
use praxis_tenancy::TenantContext;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, Order, Set};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::domain::error::DomainError;
use crate::domain::model::{Page, PageRequest, Patient};
use crate::domain::service::require_org;
use crate::infra::storage::entities::patient;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPatient {
    /// Medical record number, unique within the organisation.
    pub mrn: String,
    pub given_name: String,
    pub family_name: String,
    pub date_of_birth: NaiveDate,
    pub sex: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Search filter for [`PatientsService::list`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientFilter {
    /// Case-sensitive substring match against MRN and both name columns.
    pub search: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
}

/// Contact fields to change; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContact {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone)]
pub struct PatientsService {
    db: TenantDb,
}

impl PatientsService {
    #[must_use]
    pub fn new(db: TenantDb) -> Self {
        Self { db }
    }

    #[instrument(skip(self, ctx, input), fields(mrn = %input.mrn))]
    pub async fn register(
        &self,
        ctx: &TenantContext,
        input: RegisterPatient,
    ) -> Result<Patient, DomainError> {
        info!("registering patient");

        let org_id = require_org(ctx)?;
        if input.mrn.trim().is_empty() {
            return Err(DomainError::validation("mrn", "must not be empty"));
        }
        if input.given_name.trim().is_empty() || input.family_name.trim().is_empty() {
            return Err(DomainError::validation("name", "must not be empty"));
        }

        let taken = self
            .db
            .find::<patient::Entity>(ctx)
            .filter(patient::Column::Mrn.eq(&input.mrn))
            .count(self.db.conn())
            .await?;
        if taken > 0 {
            return Err(DomainError::conflict(format!(
                "medical record number {} is already registered",
                input.mrn
            )));
        }

        let now = Utc::now();
        let row = self
            .db
            .insert::<patient::Entity>(
                ctx,
                patient::ActiveModel {
                    org_id: Set(org_id),
                    mrn: Set(input.mrn),
                    given_name: Set(input.given_name),
                    family_name: Set(input.family_name),
                    date_of_birth: Set(input.date_of_birth),
                    sex: Set(input.sex),
                    phone: Set(input.phone),
                    email: Set(input.email),
                    address: Set(input.address),
                    archived: Set(false),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                },
            )
            .await?;

        info!(patient_id = row.id, "patient registered");
        Ok(row.into())
    }

    #[instrument(skip(self, ctx), fields(patient_id = id))]
    pub async fn get(&self, ctx: &TenantContext, id: i64) -> Result<Patient, DomainError> {
        debug!("fetching patient");

        let row = self
            .db
            .get_unique::<patient::Entity, _>(ctx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("patient", id))?;
        Ok(row.into())
    }

    /// Page through the organisation's patients, optionally searching by MRN
    /// or name. Archived patients are hidden unless the filter asks for them.
    #[instrument(skip(self, ctx, filter))]
    pub async fn list(
        &self,
        ctx: &TenantContext,
        filter: &PatientFilter,
        page: PageRequest,
    ) -> Result<Page<Patient>, DomainError> {
        debug!("listing patients");

        let mut query = self.db.find::<patient::Entity>(ctx);
        if !filter.include_archived {
            query = query.filter(patient::Column::Archived.eq(false));
        }
        if let Some(needle) = filter.search.as_deref() {
            query = query.filter(
                Condition::any()
                    .add(patient::Column::Mrn.contains(needle))
                    .add(patient::Column::GivenName.contains(needle))
                    .add(patient::Column::FamilyName.contains(needle)),
            );
        }

        let total = query.clone().count(self.db.conn()).await?;

        let (limit, offset) = page.clamped();
        let rows = query
            .order_by(patient::Column::FamilyName, Order::Asc)
            .order_by(patient::Column::GivenName, Order::Asc)
            .limit(limit)
            .offset(offset)
            .all(self.db.conn())
            .await?;

        debug!(total, returned = rows.len(), "patients listed");
        Ok(Page {
            items: rows.into_iter().map(Patient::from).collect(),
            total,
        })
    }

    #[instrument(skip(self, ctx, input), fields(patient_id = id))]
    pub async fn update_contact(
        &self,
        ctx: &TenantContext,
        id: i64,
        input: UpdateContact,
    ) -> Result<Patient, DomainError> {
        info!("updating patient contact details");

        let mut update = self
            .db
            .update_many::<patient::Entity>(ctx)
            .filter(patient::Column::Id.eq(id));
        if let Some(phone) = input.phone {
            update = update.col_expr(patient::Column::Phone, Expr::value(phone));
        }
        if let Some(email) = input.email {
            update = update.col_expr(patient::Column::Email, Expr::value(email));
        }
        if let Some(address) = input.address {
            update = update.col_expr(patient::Column::Address, Expr::value(address));
        }
        let result = update
            .col_expr(patient::Column::UpdatedAt, Expr::value(Utc::now()))
            .exec(self.db.conn())
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("patient", id));
        }
        self.get(ctx, id).await
    }

    /// Hide a patient from day-to-day lists without deleting the record.
    #[instrument(skip(self, ctx), fields(patient_id = id))]
    pub async fn archive(&self, ctx: &TenantContext, id: i64) -> Result<(), DomainError> {
        info!("archiving patient");

        let result = self
            .db
            .update_many::<patient::Entity>(ctx)
            .filter(patient::Column::Id.eq(id))
            .col_expr(patient::Column::Archived, Expr::value(true))
            .col_expr(patient::Column::UpdatedAt, Expr::value(Utc::now()))
            .exec(self.db.conn())
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("patient", id));
        }
        Ok(())
    }

    /// Delete a patient outright.
    ///
    /// Only possible while no appointments, visits or invoices reference the
    /// patient; the store's foreign keys reject the delete otherwise.
    #[instrument(skip(self, ctx), fields(patient_id = id))]
    pub async fn remove(&self, ctx: &TenantContext, id: i64) -> Result<(), DomainError> {
        info!("removing patient");

        let result = self
            .db
            .delete_many::<patient::Entity>(ctx)
            .filter(patient::Column::Id.eq(id))
            .exec(self.db.conn())
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("patient", id));
        }
        Ok(())
    }
}
