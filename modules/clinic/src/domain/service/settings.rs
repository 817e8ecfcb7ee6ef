//! Per-practice settings with server-side defaults.

use chrono::Utc;
use praxis_db::TenantDb;
use praxis_tenancy::TenantContext;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Set};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::domain::error::DomainError;
use crate::domain::model::OrgSettings;
use crate::domain::service::require_org;
use crate::infra::storage::entities::org_settings;

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_APPOINTMENT_MINUTES: i32 = 30;

const MIN_APPOINTMENT_MINUTES: i32 = 5;
const MAX_APPOINTMENT_MINUTES: i32 = 240;

/// Fields to change; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettings {
    pub clinic_name: Option<String>,
    /// ISO 4217 code, stored uppercase.
    pub currency: Option<String>,
    /// IANA timezone name.
    pub timezone: Option<String>,
    pub default_appointment_minutes: Option<i32>,
}

#[derive(Clone)]
pub struct SettingsService {
    db: TenantDb,
}

impl SettingsService {
    #[must_use]
    pub fn new(db: TenantDb) -> Self {
        Self { db }
    }

    /// The organisation's settings, falling back to the defaults when the
    /// organisation has never written any. The fallback is signalled by
    /// `updated_at` being `None`.
    #[instrument(skip(self, ctx))]
    pub async fn get(&self, ctx: &TenantContext) -> Result<OrgSettings, DomainError> {
        debug!("fetching settings");

        let org_id = require_org(ctx)?;
        let row = self
            .db
            .find::<org_settings::Entity>(ctx)
            .one(self.db.conn())
            .await?;

        Ok(row.map_or_else(
            || OrgSettings {
                org_id,
                clinic_name: None,
                currency: DEFAULT_CURRENCY.to_owned(),
                timezone: DEFAULT_TIMEZONE.to_owned(),
                default_appointment_minutes: DEFAULT_APPOINTMENT_MINUTES,
                updated_at: None,
            },
            OrgSettings::from,
        ))
    }

    /// Apply a settings patch, creating the row on first write.
    #[instrument(skip(self, ctx, input))]
    pub async fn update(
        &self,
        ctx: &TenantContext,
        input: UpdateSettings,
    ) -> Result<OrgSettings, DomainError> {
        info!("updating settings");

        let org_id = require_org(ctx)?;
        let current = self.get(ctx).await?;

        let clinic_name = match input.clinic_name {
            Some(name) => {
                if name.trim().is_empty() {
                    return Err(DomainError::validation("clinic_name", "must not be empty"));
                }
                Some(name)
            }
            None => current.clinic_name,
        };
        let currency = match input.currency {
            Some(code) => validate_currency(&code)?,
            None => current.currency,
        };
        let timezone = match input.timezone {
            Some(tz) => {
                if tz.trim().is_empty() {
                    return Err(DomainError::validation("timezone", "must not be empty"));
                }
                tz
            }
            None => current.timezone,
        };
        let minutes = match input.default_appointment_minutes {
            Some(m) => {
                if !(MIN_APPOINTMENT_MINUTES..=MAX_APPOINTMENT_MINUTES).contains(&m) {
                    return Err(DomainError::validation(
                        "default_appointment_minutes",
                        format!(
                            "must be between {MIN_APPOINTMENT_MINUTES} and {MAX_APPOINTMENT_MINUTES}"
                        ),
                    ));
                }
                m
            }
            None => current.default_appointment_minutes,
        };

        let now = Utc::now();
        if current.updated_at.is_none() {
            self.db
                .insert::<org_settings::Entity>(
                    ctx,
                    org_settings::ActiveModel {
                        org_id: Set(org_id),
                        clinic_name: Set(clinic_name),
                        currency: Set(currency),
                        timezone: Set(timezone),
                        default_appointment_minutes: Set(minutes),
                        updated_at: Set(now),
                        ..Default::default()
                    },
                )
                .await?;
        } else {
            self.db
                .update_many::<org_settings::Entity>(ctx)
                .filter(org_settings::Column::OrgId.eq(org_id))
                .col_expr(org_settings::Column::ClinicName, Expr::value(clinic_name))
                .col_expr(org_settings::Column::Currency, Expr::value(currency))
                .col_expr(org_settings::Column::Timezone, Expr::value(timezone))
                .col_expr(
                    org_settings::Column::DefaultAppointmentMinutes,
                    Expr::value(minutes),
                )
                .col_expr(org_settings::Column::UpdatedAt, Expr::value(now))
                .exec(self.db.conn())
                .await?;
        }

        self.get(ctx).await
    }
}

fn validate_currency(code: &str) -> Result<String, DomainError> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(DomainError::validation(
            "currency",
            format!("{code:?} is not a three-letter currency code"),
        ));
    }
    Ok(code.to_ascii_uppercase())
}
