//! Scoped write operations and the unique-lookup read path.

use std::marker::PhantomData;

use sea_orm::sea_query::{IntoCondition, SimpleExpr};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ConnectionTrait, DeleteResult, EntityTrait,
    IntoActiveModel, PrimaryKeyTrait, QueryFilter, UpdateResult,
};

use crate::scoped::cond::org_condition;
use crate::scoped::entity::OrgScopedEntity;
use crate::scoped::error::ScopeError;
use crate::scoped::select::{Scoped, Unscoped};
use praxis_tenancy::TenantContext;

/// Insert one row, stamping the context's organisation onto the payload.
///
/// For an organisation-owned entity under an organisation context the
/// `org_id` field is overwritten before the insert, whatever the payload
/// said; callers cannot smuggle a row into a foreign organisation. Global
/// entities and unrestricted contexts insert the payload as given.
///
/// # Errors
/// Returns [`ScopeError::Db`] when the insert fails, constraint violations
/// included.
pub async fn insert_org_scoped<E, C>(
    ctx: &TenantContext,
    mut am: E::ActiveModel,
    conn: &C,
) -> Result<E::Model, ScopeError>
where
    E: OrgScopedEntity,
    C: ConnectionTrait,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    E::Model: IntoActiveModel<E::ActiveModel>,
{
    if let (Some(org), Some(col)) = (ctx.org_id(), E::org_col()) {
        am.set(col, org.get().into());
    }
    Ok(am.insert(conn).await?)
}

/// Fetch one row by primary key, then check ownership.
///
/// The lookup itself runs unfiltered so the store can use its unique index;
/// the organisation check happens on the fetched row. A row owned by another
/// organisation is reported as `Ok(None)`, indistinguishable from a row that
/// does not exist.
///
/// # Errors
/// Returns [`ScopeError::Db`] when the query fails, and
/// [`ScopeError::Invalid`] when an organisation-owned row carries no usable
/// organisation id.
pub async fn get_unique<E, V, C>(
    ctx: &TenantContext,
    key: V,
    conn: &C,
) -> Result<Option<E::Model>, ScopeError>
where
    E: OrgScopedEntity,
    V: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    C: ConnectionTrait,
{
    let Some(model) = E::find_by_id(key).one(conn).await? else {
        return Ok(None);
    };

    match (ctx.org_id(), E::org_col()) {
        (Some(org), Some(_)) => match E::org_of(&model) {
            Some(owner) if owner == org => Ok(Some(model)),
            Some(_) => Ok(None),
            None => Err(ScopeError::Invalid(
                "organisation-owned row carries no organisation id",
            )),
        },
        _ => Ok(Some(model)),
    }
}

/// An `UpdateMany` that cannot execute until the organisation predicate has
/// been merged via [`ScopedUpdateMany::for_tenant`].
///
/// The predicate is ANDed with whatever selector the statement already has,
/// so an id belonging to another organisation simply matches zero rows, and
/// the [`UpdateResult`] reports as much.
#[derive(Clone, Debug)]
pub struct ScopedUpdateMany<E: EntityTrait, S> {
    pub(crate) inner: sea_orm::UpdateMany<E>,
    pub(crate) _state: PhantomData<S>,
}

/// Entry point: converts a plain `UpdateMany` into a [`ScopedUpdateMany`].
pub trait ScopedUpdateExt<E: EntityTrait>: Sized {
    /// Wrap this update; call [`ScopedUpdateMany::for_tenant`] before
    /// executing.
    fn scoped(self) -> ScopedUpdateMany<E, Unscoped>;
}

impl<E> ScopedUpdateExt<E> for sea_orm::UpdateMany<E>
where
    E: EntityTrait,
{
    fn scoped(self) -> ScopedUpdateMany<E, Unscoped> {
        ScopedUpdateMany {
            inner: self,
            _state: PhantomData,
        }
    }
}

impl<E> ScopedUpdateMany<E, Unscoped>
where
    E: OrgScopedEntity,
{
    /// Narrow the update to `ctx`'s organisation and make it executable.
    #[must_use]
    pub fn for_tenant(self, ctx: &TenantContext) -> ScopedUpdateMany<E, Scoped> {
        let inner = match org_condition::<E>(ctx) {
            Some(cond) => self.inner.filter(cond),
            None => self.inner,
        };
        ScopedUpdateMany {
            inner,
            _state: PhantomData,
        }
    }
}

impl<E> ScopedUpdateMany<E, Scoped>
where
    E: EntityTrait,
{
    /// Set a column to an expression.
    #[must_use]
    pub fn col_expr(mut self, col: E::Column, expr: SimpleExpr) -> Self {
        self.inner = self.inner.col_expr(col, expr);
        self
    }

    /// Add a selector on top of the organisation predicate, which stays in
    /// place.
    #[must_use]
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: IntoCondition,
    {
        self.inner = QueryFilter::filter(self.inner, filter);
        self
    }

    /// Execute the update.
    ///
    /// # Errors
    /// Returns [`ScopeError::Db`] when the statement fails.
    pub async fn exec<C>(self, conn: &C) -> Result<UpdateResult, ScopeError>
    where
        C: ConnectionTrait,
    {
        Ok(self.inner.exec(conn).await?)
    }

    /// Unwrap the inner `UpdateMany`. The merged predicate stays in the
    /// statement.
    #[must_use]
    pub fn into_inner(self) -> sea_orm::UpdateMany<E> {
        self.inner
    }
}

/// A `DeleteMany` that cannot execute until the organisation predicate has
/// been merged via [`ScopedDeleteMany::for_tenant`].
#[derive(Clone, Debug)]
pub struct ScopedDeleteMany<E: EntityTrait, S> {
    pub(crate) inner: sea_orm::DeleteMany<E>,
    pub(crate) _state: PhantomData<S>,
}

/// Entry point: converts a plain `DeleteMany` into a [`ScopedDeleteMany`].
pub trait ScopedDeleteExt<E: EntityTrait>: Sized {
    /// Wrap this delete; call [`ScopedDeleteMany::for_tenant`] before
    /// executing.
    fn scoped(self) -> ScopedDeleteMany<E, Unscoped>;
}

impl<E> ScopedDeleteExt<E> for sea_orm::DeleteMany<E>
where
    E: EntityTrait,
{
    fn scoped(self) -> ScopedDeleteMany<E, Unscoped> {
        ScopedDeleteMany {
            inner: self,
            _state: PhantomData,
        }
    }
}

impl<E> ScopedDeleteMany<E, Unscoped>
where
    E: OrgScopedEntity,
{
    /// Narrow the delete to `ctx`'s organisation and make it executable.
    #[must_use]
    pub fn for_tenant(self, ctx: &TenantContext) -> ScopedDeleteMany<E, Scoped> {
        let inner = match org_condition::<E>(ctx) {
            Some(cond) => self.inner.filter(cond),
            None => self.inner,
        };
        ScopedDeleteMany {
            inner,
            _state: PhantomData,
        }
    }
}

impl<E> ScopedDeleteMany<E, Scoped>
where
    E: EntityTrait,
{
    /// Add a selector on top of the organisation predicate, which stays in
    /// place.
    #[must_use]
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: IntoCondition,
    {
        self.inner = QueryFilter::filter(self.inner, filter);
        self
    }

    /// Execute the delete.
    ///
    /// # Errors
    /// Returns [`ScopeError::Db`] when the statement fails.
    pub async fn exec<C>(self, conn: &C) -> Result<DeleteResult, ScopeError>
    where
        C: ConnectionTrait,
    {
        Ok(self.inner.exec(conn).await?)
    }

    /// Unwrap the inner `DeleteMany`. The merged predicate stays in the
    /// statement.
    #[must_use]
    pub fn into_inner(self) -> sea_orm::DeleteMany<E> {
        self.inner
    }
}
