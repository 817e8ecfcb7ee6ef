//! Tenancy primitives shared by every Praxis service.
//!
//! A [`TenantContext`] travels with each request and tells the storage layer
//! which organisation's rows the request may touch. The context is built once
//! at the edge (after authentication) and passed down by reference; nothing in
//! this crate reads ambient state.

pub mod context;
pub mod org;

pub use context::{OrgScope, TenantContext};
pub use org::{InvalidId, OrgId, UserId};
