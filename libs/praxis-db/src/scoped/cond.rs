//! Narrowing predicate construction.

use praxis_tenancy::TenantContext;
use sea_orm::sea_query::Condition;
use sea_orm::ColumnTrait;

use crate::scoped::entity::OrgScopedEntity;

/// Builds the organisation predicate for `E` under `ctx`.
///
/// Returns `None` when the statement should run as written: either the
/// entity is global or the context carries no organisation. Otherwise the
/// result is a single equality on the entity's organisation column. Callers
/// AND-merge it into the statement, so filters already present stay in
/// effect.
pub fn org_condition<E>(ctx: &TenantContext) -> Option<Condition>
where
    E: OrgScopedEntity,
{
    let org = ctx.org_id()?;
    let col = E::org_col()?;
    Some(Condition::all().add(col.eq(org.get())))
}
