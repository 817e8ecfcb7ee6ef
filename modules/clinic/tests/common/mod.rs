//! Shared fixtures for the clinic integration tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, NaiveDate, Utc};
use praxis_clinic::domain::model::{Doctor, Patient};
use praxis_clinic::domain::service::doctors::AddDoctor;
use praxis_clinic::domain::service::organisations::NewOrganisation;
use praxis_clinic::domain::service::patients::RegisterPatient;
use praxis_clinic::infra::storage::migrations::Migrator;
use praxis_clinic::ClinicServices;
use praxis_db::DbConfig;
use praxis_tenancy::{OrgId, TenantContext};
use rust_decimal::Decimal;
use sea_orm_migration::MigratorTrait;

/// Fresh in-memory database with the clinic schema applied.
pub async fn clinic() -> ClinicServices {
    let db = DbConfig::in_memory().connect().await.expect("connect");
    Migrator::up(db.conn(), None).await.expect("migrate");
    ClinicServices::new(db)
}

/// Create an organisation through the operator path and return a context
/// pinned to it.
pub async fn provision_org(services: &ClinicServices, name: &str) -> TenantContext {
    let org = services
        .organisations
        .create_organisation(
            &TenantContext::unrestricted(),
            NewOrganisation {
                name: name.to_owned(),
            },
        )
        .await
        .expect("create organisation");
    TenantContext::organisation(OrgId::new(org.id).expect("org id"))
}

pub async fn seed_patient(
    services: &ClinicServices,
    ctx: &TenantContext,
    mrn: &str,
    family_name: &str,
) -> Patient {
    services
        .patients
        .register(
            ctx,
            RegisterPatient {
                mrn: mrn.to_owned(),
                given_name: "Alex".to_owned(),
                family_name: family_name.to_owned(),
                date_of_birth: day(1990, 6, 15),
                sex: None,
                phone: Some("555-0100".to_owned()),
                email: None,
                address: None,
            },
        )
        .await
        .expect("register patient")
}

pub async fn seed_doctor(
    services: &ClinicServices,
    ctx: &TenantContext,
    family_name: &str,
) -> Doctor {
    services
        .doctors
        .add(
            ctx,
            AddDoctor {
                given_name: "Dana".to_owned(),
                family_name: family_name.to_owned(),
                specialty: "general practice".to_owned(),
                consultation_fee: Decimal::from(50),
            },
        )
        .await
        .expect("add doctor")
}

pub fn day(year: i32, month: u32, dom: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, dom).unwrap()
}

pub fn at(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    date.and_hms_opt(hour, minute, 0).unwrap().and_utc()
}
