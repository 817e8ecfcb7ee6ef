use praxis_db::scoped::OrgScopedEntity;
use praxis_tenancy::OrgId;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub org_id: i64,
    pub patient_id: i64,
    pub visit_id: Option<i64>,
    pub total: Decimal,
    pub status: String,
    pub issued_on: Date,
    pub created_at: DateTimeUtc,
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
