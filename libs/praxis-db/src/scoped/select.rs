//! Typestate wrapper around `SeaORM`'s `Select`.

use std::marker::PhantomData;

use sea_orm::sea_query::IntoCondition;
use sea_orm::{
    ConnectionTrait, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::scoped::cond::org_condition;
use crate::scoped::entity::OrgScopedEntity;
use crate::scoped::error::ScopeError;
use praxis_tenancy::TenantContext;

/// Typestate marker: the query has not been narrowed yet and cannot execute.
#[derive(Debug, Clone, Copy)]
pub struct Unscoped;

/// Typestate marker: the organisation predicate has been merged in.
#[derive(Debug, Clone, Copy)]
pub struct Scoped;

/// A `Select` that cannot reach the database until it has passed through
/// [`ScopedSelect::for_tenant`].
///
/// The wrapper starts in the [`Unscoped`] state, which exposes no execution
/// methods. `for_tenant` AND-merges the organisation predicate (when the
/// entity and context call for one) and moves to [`Scoped`], where the usual
/// refinements and executors become available.
#[must_use]
#[derive(Clone, Debug)]
pub struct ScopedSelect<E: EntityTrait, S> {
    pub(crate) inner: sea_orm::Select<E>,
    pub(crate) _state: PhantomData<S>,
}

/// Entry point: converts a plain `Select` into a [`ScopedSelect`].
pub trait ScopedSelectExt<E: EntityTrait>: Sized {
    /// Wrap this select; call [`ScopedSelect::for_tenant`] before executing.
    fn scoped(self) -> ScopedSelect<E, Unscoped>;
}

impl<E> ScopedSelectExt<E> for sea_orm::Select<E>
where
    E: EntityTrait,
{
    fn scoped(self) -> ScopedSelect<E, Unscoped> {
        ScopedSelect {
            inner: self,
            _state: PhantomData,
        }
    }
}

impl<E> ScopedSelect<E, Unscoped>
where
    E: OrgScopedEntity,
{
    /// Narrow the query to `ctx`'s organisation and make it executable.
    ///
    /// Global entities and unrestricted contexts add no predicate; the query
    /// runs exactly as written.
    pub fn for_tenant(self, ctx: &TenantContext) -> ScopedSelect<E, Scoped> {
        let inner = match org_condition::<E>(ctx) {
            Some(cond) => self.inner.filter(cond),
            None => self.inner,
        };
        ScopedSelect {
            inner,
            _state: PhantomData,
        }
    }
}

impl<E> ScopedSelect<E, Scoped>
where
    E: EntityTrait,
{
    /// Execute and return all matching rows.
    ///
    /// # Errors
    /// Returns [`ScopeError::Db`] when the query fails.
    pub async fn all<C>(self, conn: &C) -> Result<Vec<E::Model>, ScopeError>
    where
        C: ConnectionTrait,
    {
        Ok(self.inner.all(conn).await?)
    }

    /// Execute and return at most one row.
    ///
    /// # Errors
    /// Returns [`ScopeError::Db`] when the query fails.
    pub async fn one<C>(self, conn: &C) -> Result<Option<E::Model>, ScopeError>
    where
        C: ConnectionTrait,
    {
        Ok(self.inner.one(conn).await?)
    }

    /// Execute and return the number of matching rows.
    ///
    /// # Errors
    /// Returns [`ScopeError::Db`] when the query fails.
    pub async fn count<C>(self, conn: &C) -> Result<u64, ScopeError>
    where
        C: ConnectionTrait,
        E::Model: sea_orm::FromQueryResult + Send + Sync,
    {
        Ok(self.inner.count(conn).await?)
    }

    /// Add a filter on top of the organisation predicate, which stays in
    /// place.
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: IntoCondition,
    {
        self.inner = QueryFilter::filter(self.inner, filter);
        self
    }

    /// Order the results.
    pub fn order_by<C>(mut self, col: C, order: Order) -> Self
    where
        C: sea_orm::IntoSimpleExpr,
    {
        self.inner = QueryOrder::order_by(self.inner, col, order);
        self
    }

    /// Limit the number of rows returned.
    pub fn limit(mut self, limit: u64) -> Self {
        self.inner = QuerySelect::limit(self.inner, limit);
        self
    }

    /// Skip the first `offset` rows.
    pub fn offset(mut self, offset: u64) -> Self {
        self.inner = QuerySelect::offset(self.inner, offset);
        self
    }

    /// Unwrap the inner `Select` for refinements this wrapper does not
    /// expose, such as joins or pagination.
    ///
    /// The organisation predicate already merged into the query cannot be
    /// removed this way, only added to.
    #[must_use]
    pub fn into_inner(self) -> sea_orm::Select<E> {
        self.inner
    }
}
