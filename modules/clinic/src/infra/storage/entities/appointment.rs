use praxis_db::scoped::OrgScopedEntity;
use praxis_tenancy::OrgId;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub org_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub scheduled_start: DateTimeUtc,
    pub scheduled_end: DateTimeUtc,
    pub reason: Option<String>,
    /// See `domain::model::AppointmentStatus` for the accepted values.
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl OrgScopedEntity for Entity {
    fn org_col() -> Option<Self::Column> {
        Some(Column::OrgId)
    }

    fn org_of(model: &Self::Model) -> Option<OrgId> {
        OrgId::new(model.org_id)
    }
}
