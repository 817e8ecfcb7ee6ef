//! Clinic domain services.
//!
//! One service per concern, all sharing the same [`TenantDb`] handle. Every
//! method takes the request's [`TenantContext`] by reference; storage access
//! goes through the scoped layer, so the organisation narrowing is applied
//! before any statement runs. Services return [`DomainError`], with rows of
//! other organisations reported as [`DomainError::NotFound`].
//!
//! [`DomainError`]: crate::domain::error::DomainError
//! [`DomainError::NotFound`]: crate::domain::error::DomainError::NotFound

pub mod appointments;
pub mod billing;
pub mod dashboard;
pub mod diagnostics;
pub mod doctors;
pub mod notifications;
pub mod organisations;
pub mod patients;
pub mod prescriptions;
pub mod settings;
pub mod visits;

use praxis_db::TenantDb;
use praxis_tenancy::TenantContext;

pub use appointments::AppointmentsService;
pub use billing::BillingService;
pub use dashboard::DashboardService;
pub use diagnostics::DiagnosticsService;
pub use doctors::DoctorsService;
pub use notifications::NotificationsService;
pub use organisations::OrganisationsService;
pub use patients::PatientsService;
pub use prescriptions::PrescriptionsService;
pub use settings::SettingsService;
pub use visits::VisitsService;

use crate::domain::error::DomainError;

/// All clinic services wired over one connection handle.
#[derive(Clone)]
pub struct ClinicServices {
    pub organisations: OrganisationsService,
    pub patients: PatientsService,
    pub doctors: DoctorsService,
    pub appointments: AppointmentsService,
    pub visits: VisitsService,
    pub prescriptions: PrescriptionsService,
    pub diagnostics: DiagnosticsService,
    pub billing: BillingService,
    pub settings: SettingsService,
    pub notifications: NotificationsService,
    pub dashboard: DashboardService,
}

impl ClinicServices {
    #[must_use]
    pub fn new(db: TenantDb) -> Self {
        let settings = SettingsService::new(db.clone());
        let billing = BillingService::new(db.clone());
        Self {
            organisations: OrganisationsService::new(db.clone()),
            patients: PatientsService::new(db.clone()),
            doctors: DoctorsService::new(db.clone()),
            appointments: AppointmentsService::new(db.clone(), settings.clone()),
            visits: VisitsService::new(db.clone()),
            prescriptions: PrescriptionsService::new(db.clone()),
            diagnostics: DiagnosticsService::new(db.clone()),
            dashboard: DashboardService::new(db.clone(), billing.clone()),
            billing,
            settings,
            notifications: NotificationsService::new(db),
        }
    }
}

/// The acting organisation, or [`DomainError::Forbidden`] when the context
/// is unrestricted.
///
/// Row-creating operations call this first; a new row needs exactly one
/// owner. Reads and id-targeted writes take whatever the context allows, so
/// operator tooling can look across organisations.
pub(crate) fn require_org(ctx: &TenantContext) -> Result<i64, DomainError> {
    ctx.org_id()
        .map(praxis_tenancy::OrgId::get)
        .ok_or(DomainError::Forbidden(
            "this operation requires an organisation context",
        ))
}
