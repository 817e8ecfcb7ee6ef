//! Praxis clinic management.
//!
//! Domain services for a multi-practice clinic backend: patient records,
//! scheduling, visits, prescriptions, diagnostics, billing, notifications and
//! per-practice settings. Every service method takes the request's
//! [`TenantContext`](praxis_tenancy::TenantContext) and reaches storage only
//! through the organisation-scoped layer in `praxis-db`, so one practice can
//! never observe or modify another practice's rows.

pub mod domain;
pub mod infra;

pub use domain::error::DomainError;
pub use domain::service::ClinicServices;
