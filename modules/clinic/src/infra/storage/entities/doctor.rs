use praxis_db::scoped::OrgScopedEntity;
use praxis_tenancy::OrgId;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "doctors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub org_id: i64,
    pub given_name: String,
    pub family_name: String,
    pub specialty: String,
    pub consultation_fee: Decimal,
    pub active: bool,
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
