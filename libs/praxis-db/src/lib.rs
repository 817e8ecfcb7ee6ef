//! Organisation-scoped data access for Praxis services.
//!
//! Wraps `SeaORM` so that every statement against organisation-owned tables is
//! narrowed to the organisation named by the request's
//! [`TenantContext`](praxis_tenancy::TenantContext). See [`scoped`] for the
//! query layer and [`config`] for pool configuration.

pub mod config;
pub mod scoped;

pub use config::{DbConfig, DbConfigError, PoolConfig};
pub use scoped::{
    OrgScopedEntity, ScopeError, ScopedDeleteMany, ScopedSelect, ScopedUpdateMany, TenantDb,
};
