//! Entity-side declaration of organisation ownership.

use praxis_tenancy::OrgId;
use sea_orm::EntityTrait;

/// Declares whether an entity's table is owned by an organisation.
///
/// Implemented manually next to each entity definition, which keeps the set
/// of scoped tables a reviewable list in source rather than a runtime
/// registry. A statement against an entity without this impl cannot pass
/// through the scoped layer at all; it will not compile.
///
/// # Example
/// ```rust,ignore
/// impl OrgScopedEntity for Entity {
///     fn org_col() -> Option<Self::Column> {
///         Some(Column::OrgId)
///     }
///
///     fn org_of(model: &Self::Model) -> Option<OrgId> {
///         OrgId::new(model.org_id)
///     }
/// }
/// ```
pub trait OrgScopedEntity: EntityTrait {
    /// Column holding the owning organisation id, `None` for global tables.
    fn org_col() -> Option<Self::Column>;

    /// Owning organisation of a fetched row.
    ///
    /// `None` for global tables, and for rows whose stored id is outside the
    /// valid range; the read path treats the latter as corrupt rather than
    /// matching it against any context.
    fn org_of(model: &Self::Model) -> Option<OrgId>;
}
