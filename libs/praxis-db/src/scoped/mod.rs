//! Organisation-scoped ORM layer.
//!
//! Every table that belongs to an organisation carries an `org_id` column, and
//! every statement against such a table must be narrowed to the organisation
//! named by the request's [`TenantContext`]. This module makes that narrowing
//! a property of the types instead of a convention:
//!
//! - reads go through [`ScopedSelect`], a typestate wrapper around `SeaORM`'s
//!   `Select` that only exposes execution once [`for_tenant`] has merged the
//!   organisation predicate into the query;
//! - bulk writes go through [`ScopedUpdateMany`] and [`ScopedDeleteMany`],
//!   which narrow the statement the same way so a cross-organisation id in the
//!   selector simply matches zero rows;
//! - inserts go through [`ops::insert_org_scoped`], which overwrites the
//!   payload's `org_id` with the context's organisation before the row is
//!   written;
//! - primary-key lookups go through [`ops::get_unique`], which fetches the row
//!   unfiltered and then compares its owner against the context, reporting a
//!   foreign row as absent.
//!
//! Entities opt in by implementing [`OrgScopedEntity`] next to their column
//! definitions. An entity whose `org_col` is `None` is global: the layer
//! passes its statements through untouched. A context without an organisation
//! ([`TenantContext::unrestricted`]) also passes statements through; that
//! variant is only constructible on purpose, so an unscoped statement in a
//! request path is a call site you can point at in review.
//!
//! # Example
//! ```rust,ignore
//! use praxis_db::scoped::{ScopedSelectExt, TenantDb};
//!
//! let ctx = TenantContext::organisation(org_id);
//! let patients = patient::Entity::find()
//!     .scoped()          // ScopedSelect<E, Unscoped>, cannot execute yet
//!     .for_tenant(&ctx)  // ScopedSelect<E, Scoped>
//!     .all(db.conn())
//!     .await?;
//! ```
//!
//! [`for_tenant`]: ScopedSelect::for_tenant
//! [`ops::insert_org_scoped`]: insert_org_scoped
//! [`ops::get_unique`]: get_unique

pub mod cond;
pub mod conn;
pub mod entity;
pub mod error;
pub mod ops;
pub mod select;

pub use cond::org_condition;
pub use conn::TenantDb;
pub use entity::OrgScopedEntity;
pub use error::ScopeError;
pub use ops::{
    get_unique, insert_org_scoped, ScopedDeleteExt, ScopedDeleteMany, ScopedUpdateExt,
    ScopedUpdateMany,
};
pub use select::{Scoped, ScopedSelect, ScopedSelectExt, Unscoped};

pub use praxis_tenancy::{OrgId, OrgScope, TenantContext, UserId};
