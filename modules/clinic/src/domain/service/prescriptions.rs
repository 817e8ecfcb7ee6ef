//! Prescriptions, issued against a visit.

use chrono::Utc;
use praxis_db::scoped;
use praxis_db::TenantDb;
use praxis_tenancy::TenantContext;
use sea_orm::{ColumnTrait, Order, Set};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::domain::error::DomainError;
use crate::domain::model::Prescription;
use crate::domain::service::require_org;
use crate::infra::storage::entities::{prescription, visit};

/// One medication line on a prescription.
#[derive(Debug, Clone, Deserialize)]
pub struct PrescriptionLine {
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub duration_days: i32,
    pub instructions: Option<String>,
}

#[derive(Clone)]
pub struct PrescriptionsService {
    db: TenantDb,
}

impl PrescriptionsService {
    #[must_use]
    pub fn new(db: TenantDb) -> Self {
        Self { db }
    }

    /// Issue one or more medication lines against a visit. All lines are
    /// written in one transaction.
    #[instrument(skip(self, ctx, lines), fields(lines = lines.len()))]
    pub async fn issue(
        &self,
        ctx: &TenantContext,
        visit_id: i64,
        lines: Vec<PrescriptionLine>,
    ) -> Result<Vec<Prescription>, DomainError> {
        info!("issuing prescription");

        require_org(ctx)?;
        if lines.is_empty() {
            return Err(DomainError::validation(
                "lines",
                "a prescription needs at least one medication line",
            ));
        }
        for line in &lines {
            if line.medication.trim().is_empty()
                || line.dosage.trim().is_empty()
                || line.frequency.trim().is_empty()
            {
                return Err(DomainError::validation(
                    "lines",
                    "medication, dosage and frequency must not be empty",
                ));
            }
            if line.duration_days < 1 {
                return Err(DomainError::validation(
                    "duration_days",
                    "must be at least one day",
                ));
            }
        }

        let ctx = ctx.clone();
        let rows = self
            .db
            .transaction(move |txn| {
                Box::pin(async move {
                    let visit = scoped::get_unique::<visit::Entity, _, _>(&ctx, visit_id, txn)
                        .await?
                        .ok_or_else(|| DomainError::not_found("visit", visit_id))?;

                    let issued_at = Utc::now();
                    let mut rows = Vec::with_capacity(lines.len());
                    for line in lines {
                        let row = scoped::insert_org_scoped::<prescription::Entity, _>(
                            &ctx,
                            prescription::ActiveModel {
                                org_id: Set(visit.org_id),
                                visit_id: Set(visit.id),
                                patient_id: Set(visit.patient_id),
                                medication: Set(line.medication),
                                dosage: Set(line.dosage),
                                frequency: Set(line.frequency),
                                duration_days: Set(line.duration_days),
                                instructions: Set(line.instructions),
                                issued_at: Set(issued_at),
                                ..Default::default()
                            },
                            txn,
                        )
                        .await?;
                        rows.push(row);
                    }
                    Ok::<_, DomainError>(rows)
                })
            })
            .await?;

        info!(count = rows.len(), "prescription issued");
        Ok(rows.into_iter().map(Prescription::from).collect())
    }

    #[instrument(skip(self, ctx))]
    pub async fn for_visit(
        &self,
        ctx: &TenantContext,
        visit_id: i64,
    ) -> Result<Vec<Prescription>, DomainError> {
        debug!("listing prescriptions for visit");

        let rows = self
            .db
            .find::<prescription::Entity>(ctx)
            .filter(prescription::Column::VisitId.eq(visit_id))
            .order_by(prescription::Column::Id, Order::Asc)
            .all(self.db.conn())
            .await?;
        Ok(rows.into_iter().map(Prescription::from).collect())
    }

    /// A patient's medication history, most recent first.
    #[instrument(skip(self, ctx))]
    pub async fn for_patient(
        &self,
        ctx: &TenantContext,
        patient_id: i64,
    ) -> Result<Vec<Prescription>, DomainError> {
        debug!("listing prescriptions for patient");

        let rows = self
            .db
            .find::<prescription::Entity>(ctx)
            .filter(prescription::Column::PatientId.eq(patient_id))
            .order_by(prescription::Column::IssuedAt, Order::Desc)
            .all(self.db.conn())
            .await?;
        Ok(rows.into_iter().map(Prescription::from).collect())
    }
}
