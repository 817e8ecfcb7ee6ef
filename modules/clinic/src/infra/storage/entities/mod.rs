//! `SeaORM` entities, one per table.
//!
//! Each organisation-owned entity implements
//! [`OrgScopedEntity`](praxis_db::scoped::OrgScopedEntity) next to its column
//! definitions, which makes the list of scoped tables reviewable here rather
//! than spread through the services. `organisation` is the only global table.

pub mod appointment;
pub mod doctor;
pub mod invoice;
pub mod lab_order;
pub mod lab_result;
pub mod member;
pub mod notification;
pub mod org_settings;
pub mod organisation;
pub mod patient;
pub mod payment;
pub mod prescription;
pub mod radiology_order;
pub mod visit;
