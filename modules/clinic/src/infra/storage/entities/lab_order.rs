use praxis_db::scoped::OrgScopedEntity;
use praxis_tenancy::OrgId;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "lab_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub org_id: i64,
    pub patient_id: i64,
    /// Doctor who placed the order.
    pub ordered_by: i64,
    pub test_name: String,
    pub status: String,
    pub ordered_at: DateTimeUtc,
    pub completed_at: Option<DateTimeUtc>,
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
