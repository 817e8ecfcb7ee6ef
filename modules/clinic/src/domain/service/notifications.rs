//! In-app notifications for staff.

use chrono::Utc;
use praxis_db::TenantDb;
use praxis_tenancy::TenantContext;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Order, Set};
use tracing::{debug, info, instrument};

use crate::domain::error::DomainError;
use crate::domain::model::Notification;
use crate::domain::service::require_org;
use crate::infra::storage::entities::notification;

#[derive(Clone)]
pub struct NotificationsService {
    db: TenantDb,
}

impl NotificationsService {
    #[must_use]
    pub fn new(db: TenantDb) -> Self {
        Self { db }
    }

    #[instrument(skip(self, ctx, message))]
    pub async fn push(
        &self,
        ctx: &TenantContext,
        recipient_id: i64,
        message: String,
    ) -> Result<Notification, DomainError> {
        debug!("pushing notification");

        let org_id = require_org(ctx)?;
        if message.trim().is_empty() {
            return Err(DomainError::validation("message", "must not be empty"));
        }

        let row = self
            .db
            .insert::<notification::Entity>(
                ctx,
                notification::ActiveModel {
                    org_id: Set(org_id),
                    recipient_id: Set(recipient_id),
                    message: Set(message),
                    read_at: Set(None),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;
        Ok(row.into())
    }

    /// Unread notifications for one recipient, newest first.
    #[instrument(skip(self, ctx))]
    pub async fn unread_for(
        &self,
        ctx: &TenantContext,
        recipient_id: i64,
    ) -> Result<Vec<Notification>, DomainError> {
        debug!("listing unread notifications");

        let rows = self
            .db
            .find::<notification::Entity>(ctx)
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::ReadAt.is_null())
            .order_by(notification::Column::CreatedAt, Order::Desc)
            .order_by(notification::Column::Id, Order::Desc)
            .all(self.db.conn())
            .await?;
        Ok(rows.into_iter().map(Notification::from).collect())
    }

    /// Mark one notification read. Marking an already-read notification is a
    /// no-op, not an error.
    #[instrument(skip(self, ctx), fields(notification_id = id))]
    pub async fn mark_read(&self, ctx: &TenantContext, id: i64) -> Result<(), DomainError> {
        debug!("marking notification read");

        let result = self
            .db
            .update_many::<notification::Entity>(ctx)
            .filter(notification::Column::Id.eq(id))
            .filter(notification::Column::ReadAt.is_null())
            .col_expr(notification::Column::ReadAt, Expr::value(Utc::now()))
            .exec(self.db.conn())
            .await?;

        if result.rows_affected == 0 {
            // Distinguish "already read" from "not ours / missing".
            self.db
                .get_unique::<notification::Entity, _>(ctx, id)
                .await?
                .ok_or_else(|| DomainError::not_found("notification", id))?;
        }
        Ok(())
    }

    /// Mark everything unread for one recipient as read; returns how many
    /// rows changed.
    #[instrument(skip(self, ctx))]
    pub async fn mark_all_read(
        &self,
        ctx: &TenantContext,
        recipient_id: i64,
    ) -> Result<u64, DomainError> {
        info!("marking all notifications read");

        let result = self
            .db
            .update_many::<notification::Entity>(ctx)
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::ReadAt.is_null())
            .col_expr(notification::Column::ReadAt, Expr::value(Utc::now()))
            .exec(self.db.conn())
            .await?;
        Ok(result.rows_affected)
    }

    /// Delete a recipient's read notifications; returns how many rows went.
    #[instrument(skip(self, ctx))]
    pub async fn clear_read(
        &self,
        ctx: &TenantContext,
        recipient_id: i64,
    ) -> Result<u64, DomainError> {
        info!("clearing read notifications");

        let result = self
            .db
            .delete_many::<notification::Entity>(ctx)
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::ReadAt.is_not_null())
            .exec(self.db.conn())
            .await?;
        Ok(result.rows_affected)
    }
}
