//! Invoicing and payments.
//!
//! An invoice's status is derived from its payments: recording a payment
//! moves it to partially paid or paid, never the other way. Overpayment is
//! rejected rather than credited.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use praxis_db::scoped::{self, ScopedSelectExt, ScopedUpdateExt};
use praxis_db::TenantDb;
use praxis_tenancy::TenantContext;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, Order, Set};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::domain::error::DomainError;
use crate::domain::model::{Invoice, InvoiceStatement, InvoiceStatus, Payment, PaymentMethod};
use crate::domain::service::require_org;
use crate::infra::storage::entities::{invoice, patient, payment, visit};
use crate::infra::storage::map;

#[derive(Debug, Clone, Deserialize)]
pub struct RaiseInvoice {
    pub patient_id: i64,
    pub visit_id: Option<i64>,
    pub total: Decimal,
    pub issued_on: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordPayment {
    pub invoice_id: i64,
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// External reference, e.g. a card terminal receipt id.
    pub reference: Option<String>,
}

#[derive(Clone)]
pub struct BillingService {
    db: TenantDb,
}

impl BillingService {
    #[must_use]
    pub fn new(db: TenantDb) -> Self {
        Self { db }
    }

    #[instrument(skip(self, ctx, input), fields(patient_id = input.patient_id))]
    pub async fn raise_invoice(
        &self,
        ctx: &TenantContext,
        input: RaiseInvoice,
    ) -> Result<Invoice, DomainError> {
        info!("raising invoice");

        let org_id = require_org(ctx)?;
        if input.total <= Decimal::ZERO {
            return Err(DomainError::validation("total", "must be positive"));
        }

        self.db
            .get_unique::<patient::Entity, _>(ctx, input.patient_id)
            .await?
            .ok_or_else(|| DomainError::not_found("patient", input.patient_id))?;
        if let Some(visit_id) = input.visit_id {
            self.db
                .get_unique::<visit::Entity, _>(ctx, visit_id)
                .await?
                .ok_or_else(|| DomainError::not_found("visit", visit_id))?;
        }

        let row = self
            .db
            .insert::<invoice::Entity>(
                ctx,
                invoice::ActiveModel {
                    org_id: Set(org_id),
                    patient_id: Set(input.patient_id),
                    visit_id: Set(input.visit_id),
                    total: Set(input.total),
                    status: Set(InvoiceStatus::Issued.as_str().to_owned()),
                    issued_on: Set(input.issued_on),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        info!(invoice_id = row.id, "invoice raised");
        map::invoice(row)
    }

    /// Record a payment and derive the invoice's new status, in one
    /// transaction.
    #[instrument(
        skip(self, ctx, input),
        fields(invoice_id = input.invoice_id, amount = %input.amount)
    )]
    pub async fn record_payment(
        &self,
        ctx: &TenantContext,
        input: RecordPayment,
    ) -> Result<Invoice, DomainError> {
        info!("recording payment");

        require_org(ctx)?;
        if input.amount <= Decimal::ZERO {
            return Err(DomainError::validation("amount", "must be positive"));
        }

        let ctx = ctx.clone();
        let row = self
            .db
            .transaction(move |txn| {
                Box::pin(async move {
                    let row =
                        scoped::get_unique::<invoice::Entity, _, _>(&ctx, input.invoice_id, txn)
                            .await?
                            .ok_or_else(|| {
                                DomainError::not_found("invoice", input.invoice_id)
                            })?;
                    let inv = map::invoice(row)?;
                    match inv.status {
                        InvoiceStatus::Void => {
                            return Err(DomainError::conflict(format!(
                                "invoice {} is void",
                                inv.id
                            )));
                        }
                        InvoiceStatus::Paid => {
                            return Err(DomainError::conflict(format!(
                                "invoice {} is already settled",
                                inv.id
                            )));
                        }
                        InvoiceStatus::Issued | InvoiceStatus::PartiallyPaid => {}
                    }

                    let paid: Decimal = payment::Entity::find()
                        .scoped()
                        .for_tenant(&ctx)
                        .filter(payment::Column::InvoiceId.eq(inv.id))
                        .all(txn)
                        .await?
                        .iter()
                        .map(|p| p.amount)
                        .sum();
                    let due = inv.total - paid;
                    if input.amount > due {
                        return Err(DomainError::validation(
                            "amount",
                            format!("payment of {} exceeds the outstanding balance of {due}",
                                input.amount),
                        ));
                    }

                    scoped::insert_org_scoped::<payment::Entity, _>(
                        &ctx,
                        payment::ActiveModel {
                            org_id: Set(inv.org_id),
                            invoice_id: Set(inv.id),
                            amount: Set(input.amount),
                            method: Set(input.method.as_str().to_owned()),
                            reference: Set(input.reference),
                            received_at: Set(Utc::now()),
                            ..Default::default()
                        },
                        txn,
                    )
                    .await?;

                    let next = if paid + input.amount == inv.total {
                        InvoiceStatus::Paid
                    } else {
                        InvoiceStatus::PartiallyPaid
                    };
                    invoice::Entity::update_many()
                        .scoped()
                        .for_tenant(&ctx)
                        .filter(invoice::Column::Id.eq(inv.id))
                        .col_expr(invoice::Column::Status, Expr::value(next.as_str()))
                        .exec(txn)
                        .await?;

                    let row = scoped::get_unique::<invoice::Entity, _, _>(&ctx, inv.id, txn)
                        .await?
                        .ok_or_else(|| DomainError::not_found("invoice", inv.id))?;
                    Ok::<_, DomainError>(row)
                })
            })
            .await?;

        let inv = map::invoice(row)?;
        info!(invoice_id = inv.id, status = %inv.status, "payment recorded");
        Ok(inv)
    }

    /// One invoice with its payments and derived balance.
    #[instrument(skip(self, ctx))]
    pub async fn statement(
        &self,
        ctx: &TenantContext,
        invoice_id: i64,
    ) -> Result<InvoiceStatement, DomainError> {
        debug!("building statement");

        let row = self
            .db
            .get_unique::<invoice::Entity, _>(ctx, invoice_id)
            .await?
            .ok_or_else(|| DomainError::not_found("invoice", invoice_id))?;
        let inv = map::invoice(row)?;

        let payments = self
            .db
            .find::<payment::Entity>(ctx)
            .filter(payment::Column::InvoiceId.eq(inv.id))
            .order_by(payment::Column::ReceivedAt, Order::Asc)
            .order_by(payment::Column::Id, Order::Asc)
            .all(self.db.conn())
            .await?
            .into_iter()
            .map(map::payment)
            .collect::<Result<Vec<Payment>, _>>()?;

        Ok(build_statement(inv, payments))
    }

    /// Every invoice still owing money, oldest first, with payments attached.
    #[instrument(skip(self, ctx))]
    pub async fn outstanding(
        &self,
        ctx: &TenantContext,
    ) -> Result<Vec<InvoiceStatement>, DomainError> {
        debug!("listing outstanding invoices");

        let invoices = self
            .db
            .find::<invoice::Entity>(ctx)
            .filter(invoice::Column::Status.is_in([
                InvoiceStatus::Issued.as_str(),
                InvoiceStatus::PartiallyPaid.as_str(),
            ]))
            .order_by(invoice::Column::IssuedOn, Order::Asc)
            .order_by(invoice::Column::Id, Order::Asc)
            .all(self.db.conn())
            .await?
            .into_iter()
            .map(map::invoice)
            .collect::<Result<Vec<Invoice>, _>>()?;
        if invoices.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = invoices.iter().map(|inv| inv.id).collect();
        let mut by_invoice: HashMap<i64, Vec<Payment>> = HashMap::new();
        let payments = self
            .db
            .find::<payment::Entity>(ctx)
            .filter(payment::Column::InvoiceId.is_in(ids))
            .order_by(payment::Column::ReceivedAt, Order::Asc)
            .all(self.db.conn())
            .await?;
        for row in payments {
            let p = map::payment(row)?;
            by_invoice.entry(p.invoice_id).or_default().push(p);
        }

        Ok(invoices
            .into_iter()
            .map(|inv| {
                let payments = by_invoice.remove(&inv.id).unwrap_or_default();
                build_statement(inv, payments)
            })
            .collect())
    }

    /// Void an invoice that has no payments against it.
    #[instrument(skip(self, ctx))]
    pub async fn void_invoice(
        &self,
        ctx: &TenantContext,
        invoice_id: i64,
    ) -> Result<Invoice, DomainError> {
        info!("voiding invoice");

        let row = self
            .db
            .get_unique::<invoice::Entity, _>(ctx, invoice_id)
            .await?
            .ok_or_else(|| DomainError::not_found("invoice", invoice_id))?;
        let inv = map::invoice(row)?;
        if inv.status == InvoiceStatus::Void {
            return Err(DomainError::conflict(format!(
                "invoice {} is already void",
                inv.id
            )));
        }

        let payments = self
            .db
            .find::<payment::Entity>(ctx)
            .filter(payment::Column::InvoiceId.eq(inv.id))
            .count(self.db.conn())
            .await?;
        if payments > 0 {
            return Err(DomainError::conflict(format!(
                "invoice {} has recorded payments and cannot be voided",
                inv.id
            )));
        }

        self.db
            .update_many::<invoice::Entity>(ctx)
            .filter(invoice::Column::Id.eq(inv.id))
            .col_expr(
                invoice::Column::Status,
                Expr::value(InvoiceStatus::Void.as_str()),
            )
            .exec(self.db.conn())
            .await?;

        let row = self
            .db
            .get_unique::<invoice::Entity, _>(ctx, invoice_id)
            .await?
            .ok_or_else(|| DomainError::not_found("invoice", invoice_id))?;
        map::invoice(row)
    }
}

fn build_statement(invoice: Invoice, payments: Vec<Payment>) -> InvoiceStatement {
    let paid: Decimal = payments.iter().map(|p| p.amount).sum();
    let due = invoice.total - paid;
    InvoiceStatement {
        invoice,
        payments,
        paid,
        due,
    }
}
