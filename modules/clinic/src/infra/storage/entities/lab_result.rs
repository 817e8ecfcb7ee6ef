use praxis_db::scoped::OrgScopedEntity;
use praxis_tenancy::OrgId;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "lab_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub org_id: i64,
    pub order_id: i64,
    /// Copied from the order so patient history reads need no join.
    pub patient_id: i64,
    /// Panel the measurement belongs to, e.g. "haematology".
    pub category: String,
    pub name: String,
    pub value: String,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub flagged: bool,
    pub recorded_at: DateTimeUtc,
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
