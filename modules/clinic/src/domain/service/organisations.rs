//! Organisation provisioning and staff membership.

use chrono::Utc;
use praxis_db::TenantDb;
use praxis_tenancy::{OrgId, TenantContext};
use sea_orm::{ColumnTrait, Order, Set};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::domain::error::DomainError;
use crate::domain::model::{Member, Organisation, Role};
use crate::infra::storage::entities::{member, organisation};
use crate::infra::storage::map;

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrganisation {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMember {
    /// Only honoured under an unrestricted context; an organisation context
    /// stamps its own organisation over this value.
    pub org_id: i64,
    pub user_id: i64,
    pub display_name: String,
    pub role: Role,
}

#[derive(Clone)]
pub struct OrganisationsService {
    db: TenantDb,
}

impl OrganisationsService {
    #[must_use]
    pub fn new(db: TenantDb) -> Self {
        Self { db }
    }

    /// Provision a new organisation.
    ///
    /// Only the unrestricted operator path may create organisations; a
    /// request pinned to one organisation has no business creating another.
    #[instrument(skip(self, ctx), fields(name = %input.name))]
    pub async fn create_organisation(
        &self,
        ctx: &TenantContext,
        input: NewOrganisation,
    ) -> Result<Organisation, DomainError> {
        info!("creating organisation");

        if !ctx.is_unrestricted() {
            return Err(DomainError::Forbidden(
                "organisation provisioning requires an unrestricted context",
            ));
        }
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("name", "must not be empty"));
        }

        let row = self
            .db
            .insert::<organisation::Entity>(
                ctx,
                organisation::ActiveModel {
                    name: Set(input.name),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        info!(org_id = row.id, "organisation created");
        Ok(row.into())
    }

    /// Look up one organisation. The registry is global, so any context may
    /// read it.
    #[instrument(skip(self, ctx), fields(org_id = id))]
    pub async fn get_organisation(
        &self,
        ctx: &TenantContext,
        id: i64,
    ) -> Result<Organisation, DomainError> {
        debug!("fetching organisation");

        let row = self
            .db
            .get_unique::<organisation::Entity, _>(ctx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("organisation", id))?;
        Ok(row.into())
    }

    /// Add a staff member to an organisation.
    #[instrument(skip(self, ctx), fields(user_id = input.user_id, role = %input.role))]
    pub async fn add_member(
        &self,
        ctx: &TenantContext,
        input: NewMember,
    ) -> Result<Member, DomainError> {
        info!("adding member");

        if input.display_name.trim().is_empty() {
            return Err(DomainError::validation("display_name", "must not be empty"));
        }

        let org_id = ctx.org_id().map_or(input.org_id, OrgId::get);

        self.get_organisation(ctx, org_id).await?;

        let existing = self
            .db
            .find::<member::Entity>(ctx)
            .filter(member::Column::OrgId.eq(org_id))
            .filter(member::Column::UserId.eq(input.user_id))
            .count(self.db.conn())
            .await?;
        if existing > 0 {
            return Err(DomainError::conflict(format!(
                "user {} is already a member of organisation {org_id}",
                input.user_id
            )));
        }

        let row = self
            .db
            .insert::<member::Entity>(
                ctx,
                member::ActiveModel {
                    org_id: Set(org_id),
                    user_id: Set(input.user_id),
                    display_name: Set(input.display_name),
                    role: Set(input.role.as_str().to_owned()),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        info!(member_id = row.id, "member added");
        map::member(row)
    }

    /// Staff of the context's organisation, ordered by display name.
    #[instrument(skip(self, ctx))]
    pub async fn members(&self, ctx: &TenantContext) -> Result<Vec<Member>, DomainError> {
        debug!("listing members");

        let rows = self
            .db
            .find::<member::Entity>(ctx)
            .order_by(member::Column::DisplayName, Order::Asc)
            .all(self.db.conn())
            .await?;
        rows.into_iter().map(map::member).collect()
    }

    /// The role `user_id` holds in the context's organisation, if any.
    #[instrument(skip(self, ctx))]
    pub async fn role_of(
        &self,
        ctx: &TenantContext,
        user_id: i64,
    ) -> Result<Option<Role>, DomainError> {
        let row = self
            .db
            .find::<member::Entity>(ctx)
            .filter(member::Column::UserId.eq(user_id))
            .one(self.db.conn())
            .await?;
        match row {
            Some(row) => Ok(Some(map::member(row)?.role)),
            None => Ok(None),
        }
    }
}
