//! Shared connection handle whose entry points are all scoped.

use std::future::Future;
use std::pin::Pin;

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, PrimaryKeyTrait, TransactionTrait,
};

use crate::scoped::entity::OrgScopedEntity;
use crate::scoped::error::ScopeError;
use crate::scoped::ops::{
    self, ScopedDeleteExt, ScopedDeleteMany, ScopedUpdateExt, ScopedUpdateMany,
};
use crate::scoped::select::{Scoped, ScopedSelect, ScopedSelectExt};
use praxis_tenancy::TenantContext;

/// Cloneable handle over the connection pool.
///
/// Services hold one of these and reach the database only through its
/// methods, each of which takes the request's [`TenantContext`] and applies
/// the organisation narrowing before anything executes. The raw connection
/// stays reachable through [`TenantDb::conn`] for migrations and for
/// executing scoped builders, which carry their predicate with them.
#[derive(Clone, Debug)]
pub struct TenantDb {
    conn: DatabaseConnection,
}

impl TenantDb {
    #[must_use]
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Raw connection for migrations and scoped-builder execution.
    #[must_use]
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Scoped `SELECT` over `E`, ready to refine and execute.
    pub fn find<E>(&self, ctx: &TenantContext) -> ScopedSelect<E, Scoped>
    where
        E: OrgScopedEntity,
    {
        E::find().scoped().for_tenant(ctx)
    }

    /// Primary-key lookup with the post-fetch ownership check; see
    /// [`ops::get_unique`].
    ///
    /// # Errors
    /// Returns [`ScopeError::Db`] when the query fails, and
    /// [`ScopeError::Invalid`] for an organisation-owned row without a usable
    /// organisation id.
    pub async fn get_unique<E, V>(
        &self,
        ctx: &TenantContext,
        key: V,
    ) -> Result<Option<E::Model>, ScopeError>
    where
        E: OrgScopedEntity,
        V: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    {
        ops::get_unique::<E, V, _>(ctx, key, &self.conn).await
    }

    /// Insert with the context's organisation stamped onto the payload; see
    /// [`ops::insert_org_scoped`].
    ///
    /// # Errors
    /// Returns [`ScopeError::Db`] when the insert fails.
    pub async fn insert<E>(
        &self,
        ctx: &TenantContext,
        am: E::ActiveModel,
    ) -> Result<E::Model, ScopeError>
    where
        E: OrgScopedEntity,
        E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<E::ActiveModel>,
    {
        ops::insert_org_scoped::<E, _>(ctx, am, &self.conn).await
    }

    /// Scoped bulk update over `E`. Execute with [`ScopedUpdateMany::exec`].
    pub fn update_many<E>(&self, ctx: &TenantContext) -> ScopedUpdateMany<E, Scoped>
    where
        E: OrgScopedEntity,
    {
        E::update_many().scoped().for_tenant(ctx)
    }

    /// Scoped bulk delete over `E`. Execute with [`ScopedDeleteMany::exec`].
    pub fn delete_many<E>(&self, ctx: &TenantContext) -> ScopedDeleteMany<E, Scoped>
    where
        E: OrgScopedEntity,
    {
        E::delete_many().scoped().for_tenant(ctx)
    }

    /// Run `f` inside a transaction, committing on `Ok` and rolling back on
    /// `Err`.
    ///
    /// The closure works against the transaction connection; scoped builders
    /// and the free functions in [`ops`] accept it like any other
    /// connection. The error type only has to be convertible from
    /// [`ScopeError`] so services can return their own errors from the
    /// closure.
    ///
    /// # Errors
    /// Returns the closure's error after rollback, or the begin/commit
    /// failure mapped through `Err::from`.
    pub async fn transaction<T, Err, F>(&self, f: F) -> Result<T, Err>
    where
        T: Send,
        Err: From<ScopeError> + Send,
        F: for<'c> FnOnce(
                &'c DatabaseTransaction,
            )
                -> Pin<Box<dyn Future<Output = Result<T, Err>> + Send + 'c>>
            + Send,
    {
        let txn = self
            .conn
            .begin()
            .await
            .map_err(ScopeError::from)
            .map_err(Err::from)?;

        match f(&txn).await {
            Ok(value) => {
                txn.commit()
                    .await
                    .map_err(ScopeError::from)
                    .map_err(Err::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = txn.rollback().await {
                    tracing::error!(error = %rollback, "transaction rollback failed");
                }
                Err(err)
            }
        }
    }
}
