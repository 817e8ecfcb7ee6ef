//! Laboratory and radiology orders.
//!
//! Lab orders collect one or more measurements when the results come back;
//! radiology orders collect a written report. Both follow a small status
//! machine: `ordered` until the result arrives or the order is cancelled.

use std::collections::BTreeMap;

use chrono::Utc;
use praxis_db::scoped::{self, ScopedUpdateExt};
use praxis_db::TenantDb;
use praxis_tenancy::TenantContext;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, Order, Set};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::domain::error::DomainError;
use crate::domain::model::{
    LabOrder, LabOrderStatus, LabResult, LabResultGroup, RadiologyOrder, RadiologyOrderStatus,
};
use crate::domain::service::require_org;
use crate::infra::storage::entities::{doctor, lab_order, lab_result, patient, radiology_order};
use crate::infra::storage::map;

#[derive(Debug, Clone, Deserialize)]
pub struct OrderLabTest {
    pub patient_id: i64,
    /// Doctor placing the order.
    pub ordered_by: i64,
    pub test_name: String,
}

/// One measurement reported back by the laboratory.
#[derive(Debug, Clone, Deserialize)]
pub struct LabResultEntry {
    /// Panel the measurement belongs to, e.g. "haematology".
    pub category: String,
    pub name: String,
    pub value: String,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    #[serde(default)]
    pub flagged: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderRadiology {
    pub patient_id: i64,
    pub ordered_by: i64,
    /// Imaging modality, e.g. "x-ray", "mri".
    pub modality: String,
    pub body_site: String,
}

#[derive(Clone)]
pub struct DiagnosticsService {
    db: TenantDb,
}

impl DiagnosticsService {
    #[must_use]
    pub fn new(db: TenantDb) -> Self {
        Self { db }
    }

    #[instrument(skip(self, ctx, input), fields(patient_id = input.patient_id))]
    pub async fn order_lab_test(
        &self,
        ctx: &TenantContext,
        input: OrderLabTest,
    ) -> Result<LabOrder, DomainError> {
        info!("ordering lab test");

        let org_id = require_org(ctx)?;
        if input.test_name.trim().is_empty() {
            return Err(DomainError::validation("test_name", "must not be empty"));
        }
        self.check_patient(ctx, input.patient_id).await?;
        self.check_doctor(ctx, input.ordered_by).await?;

        let row = self
            .db
            .insert::<lab_order::Entity>(
                ctx,
                lab_order::ActiveModel {
                    org_id: Set(org_id),
                    patient_id: Set(input.patient_id),
                    ordered_by: Set(input.ordered_by),
                    test_name: Set(input.test_name),
                    status: Set(LabOrderStatus::Ordered.as_str().to_owned()),
                    ordered_at: Set(Utc::now()),
                    completed_at: Set(None),
                    ..Default::default()
                },
            )
            .await?;

        info!(order_id = row.id, "lab test ordered");
        map::lab_order(row)
    }

    /// Record the laboratory's measurements and complete the order, in one
    /// transaction.
    #[instrument(skip(self, ctx, entries), fields(entries = entries.len()))]
    pub async fn submit_lab_results(
        &self,
        ctx: &TenantContext,
        order_id: i64,
        entries: Vec<LabResultEntry>,
    ) -> Result<LabOrder, DomainError> {
        info!("submitting lab results");

        require_org(ctx)?;
        if entries.is_empty() {
            return Err(DomainError::validation(
                "entries",
                "a result submission needs at least one measurement",
            ));
        }
        for entry in &entries {
            if entry.category.trim().is_empty()
                || entry.name.trim().is_empty()
                || entry.value.trim().is_empty()
            {
                return Err(DomainError::validation(
                    "entries",
                    "category, name and value must not be empty",
                ));
            }
        }

        let ctx = ctx.clone();
        let row = self
            .db
            .transaction(move |txn| {
                Box::pin(async move {
                    let order =
                        scoped::get_unique::<lab_order::Entity, _, _>(&ctx, order_id, txn)
                            .await?
                            .ok_or_else(|| DomainError::not_found("lab order", order_id))?;
                    let order = map::lab_order(order)?;
                    if order.status != LabOrderStatus::Ordered {
                        return Err(DomainError::conflict(format!(
                            "lab order {} is already {}",
                            order.id, order.status
                        )));
                    }

                    let now = Utc::now();
                    for entry in entries {
                        scoped::insert_org_scoped::<lab_result::Entity, _>(
                            &ctx,
                            lab_result::ActiveModel {
                                org_id: Set(order.org_id),
                                order_id: Set(order.id),
                                patient_id: Set(order.patient_id),
                                category: Set(entry.category),
                                name: Set(entry.name),
                                value: Set(entry.value),
                                unit: Set(entry.unit),
                                reference_range: Set(entry.reference_range),
                                flagged: Set(entry.flagged),
                                recorded_at: Set(now),
                                ..Default::default()
                            },
                            txn,
                        )
                        .await?;
                    }

                    lab_order::Entity::update_many()
                        .scoped()
                        .for_tenant(&ctx)
                        .filter(lab_order::Column::Id.eq(order.id))
                        .col_expr(
                            lab_order::Column::Status,
                            Expr::value(LabOrderStatus::Completed.as_str()),
                        )
                        .col_expr(lab_order::Column::CompletedAt, Expr::value(now))
                        .exec(txn)
                        .await?;

                    let completed =
                        scoped::get_unique::<lab_order::Entity, _, _>(&ctx, order.id, txn)
                            .await?
                            .ok_or_else(|| DomainError::not_found("lab order", order.id))?;
                    Ok::<_, DomainError>(completed)
                })
            })
            .await?;

        info!(order_id = row.id, "lab results recorded");
        map::lab_order(row)
    }

    #[instrument(skip(self, ctx), fields(order_id = id))]
    pub async fn cancel_lab_order(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<LabOrder, DomainError> {
        info!("cancelling lab order");

        let row = self
            .db
            .get_unique::<lab_order::Entity, _>(ctx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("lab order", id))?;
        let order = map::lab_order(row)?;
        if order.status != LabOrderStatus::Ordered {
            return Err(DomainError::conflict(format!(
                "lab order {} is already {}",
                order.id, order.status
            )));
        }

        self.db
            .update_many::<lab_order::Entity>(ctx)
            .filter(lab_order::Column::Id.eq(id))
            .col_expr(
                lab_order::Column::Status,
                Expr::value(LabOrderStatus::Cancelled.as_str()),
            )
            .exec(self.db.conn())
            .await?;

        let row = self
            .db
            .get_unique::<lab_order::Entity, _>(ctx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("lab order", id))?;
        map::lab_order(row)
    }

    /// A patient's lab results grouped by panel, panels alphabetical.
    #[instrument(skip(self, ctx))]
    pub async fn results_for_patient(
        &self,
        ctx: &TenantContext,
        patient_id: i64,
    ) -> Result<Vec<LabResultGroup>, DomainError> {
        debug!("listing lab results");

        let rows = self
            .db
            .find::<lab_result::Entity>(ctx)
            .filter(lab_result::Column::PatientId.eq(patient_id))
            .order_by(lab_result::Column::RecordedAt, Order::Asc)
            .order_by(lab_result::Column::Id, Order::Asc)
            .all(self.db.conn())
            .await?;
        Ok(group_by_category(
            rows.into_iter().map(LabResult::from).collect(),
        ))
    }

    #[instrument(skip(self, ctx, input), fields(patient_id = input.patient_id))]
    pub async fn order_radiology(
        &self,
        ctx: &TenantContext,
        input: OrderRadiology,
    ) -> Result<RadiologyOrder, DomainError> {
        info!("ordering radiology");

        let org_id = require_org(ctx)?;
        if input.modality.trim().is_empty() {
            return Err(DomainError::validation("modality", "must not be empty"));
        }
        if input.body_site.trim().is_empty() {
            return Err(DomainError::validation("body_site", "must not be empty"));
        }
        self.check_patient(ctx, input.patient_id).await?;
        self.check_doctor(ctx, input.ordered_by).await?;

        let row = self
            .db
            .insert::<radiology_order::Entity>(
                ctx,
                radiology_order::ActiveModel {
                    org_id: Set(org_id),
                    patient_id: Set(input.patient_id),
                    ordered_by: Set(input.ordered_by),
                    modality: Set(input.modality),
                    body_site: Set(input.body_site),
                    status: Set(RadiologyOrderStatus::Ordered.as_str().to_owned()),
                    report: Set(None),
                    ordered_at: Set(Utc::now()),
                    reported_at: Set(None),
                    ..Default::default()
                },
            )
            .await?;

        info!(order_id = row.id, "radiology ordered");
        map::radiology_order(row)
    }

    /// Attach the radiologist's report and mark the order reported.
    #[instrument(skip(self, ctx, report), fields(order_id = id))]
    pub async fn attach_radiology_report(
        &self,
        ctx: &TenantContext,
        id: i64,
        report: String,
    ) -> Result<RadiologyOrder, DomainError> {
        info!("attaching radiology report");

        if report.trim().is_empty() {
            return Err(DomainError::validation("report", "must not be empty"));
        }

        let row = self
            .db
            .get_unique::<radiology_order::Entity, _>(ctx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("radiology order", id))?;
        let order = map::radiology_order(row)?;
        if order.status != RadiologyOrderStatus::Ordered {
            return Err(DomainError::conflict(format!(
                "radiology order {} is already {}",
                order.id, order.status
            )));
        }

        self.db
            .update_many::<radiology_order::Entity>(ctx)
            .filter(radiology_order::Column::Id.eq(id))
            .col_expr(radiology_order::Column::Report, Expr::value(report))
            .col_expr(
                radiology_order::Column::Status,
                Expr::value(RadiologyOrderStatus::Reported.as_str()),
            )
            .col_expr(radiology_order::Column::ReportedAt, Expr::value(Utc::now()))
            .exec(self.db.conn())
            .await?;

        let row = self
            .db
            .get_unique::<radiology_order::Entity, _>(ctx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("radiology order", id))?;
        map::radiology_order(row)
    }

    #[instrument(skip(self, ctx), fields(order_id = id))]
    pub async fn cancel_radiology_order(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<RadiologyOrder, DomainError> {
        info!("cancelling radiology order");

        let row = self
            .db
            .get_unique::<radiology_order::Entity, _>(ctx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("radiology order", id))?;
        let order = map::radiology_order(row)?;
        if order.status != RadiologyOrderStatus::Ordered {
            return Err(DomainError::conflict(format!(
                "radiology order {} is already {}",
                order.id, order.status
            )));
        }

        self.db
            .update_many::<radiology_order::Entity>(ctx)
            .filter(radiology_order::Column::Id.eq(id))
            .col_expr(
                radiology_order::Column::Status,
                Expr::value(RadiologyOrderStatus::Cancelled.as_str()),
            )
            .exec(self.db.conn())
            .await?;

        let row = self
            .db
            .get_unique::<radiology_order::Entity, _>(ctx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("radiology order", id))?;
        map::radiology_order(row)
    }

    /// A patient's radiology history, most recent first.
    #[instrument(skip(self, ctx))]
    pub async fn radiology_for_patient(
        &self,
        ctx: &TenantContext,
        patient_id: i64,
    ) -> Result<Vec<RadiologyOrder>, DomainError> {
        debug!("listing radiology orders");

        let rows = self
            .db
            .find::<radiology_order::Entity>(ctx)
            .filter(radiology_order::Column::PatientId.eq(patient_id))
            .order_by(radiology_order::Column::OrderedAt, Order::Desc)
            .all(self.db.conn())
            .await?;
        rows.into_iter().map(map::radiology_order).collect()
    }

    async fn check_patient(&self, ctx: &TenantContext, id: i64) -> Result<(), DomainError> {
        self.db
            .get_unique::<patient::Entity, _>(ctx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("patient", id))?;
        Ok(())
    }

    async fn check_doctor(&self, ctx: &TenantContext, id: i64) -> Result<(), DomainError> {
        self.db
            .get_unique::<doctor::Entity, _>(ctx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("doctor", id))?;
        Ok(())
    }
}

/// Group results by panel, keeping panels alphabetical and the incoming order
/// of results within each panel.
fn group_by_category(results: Vec<LabResult>) -> Vec<LabResultGroup> {
    let mut groups: BTreeMap<String, Vec<LabResult>> = BTreeMap::new();
    for result in results {
        groups
            .entry(result.category.clone())
            .or_default()
            .push(result);
    }
    groups
        .into_iter()
        .map(|(category, results)| LabResultGroup { category, results })
        .collect()
}
