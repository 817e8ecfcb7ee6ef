//! Request-scoped tenancy context.

use serde::{Deserialize, Serialize};

use crate::org::{OrgId, UserId};

/// How broadly a request may touch organisation-owned data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrgScope {
    /// Every organisation-owned row the request reads or writes is pinned to
    /// this organisation.
    Organisation(OrgId),
    /// No narrowing is applied. Reserved for provisioning, migrations and
    /// operator tooling; request handlers never build this variant.
    Unrestricted,
}

impl OrgScope {
    /// The organisation this scope pins rows to, if any.
    #[must_use]
    pub fn org_id(self) -> Option<OrgId> {
        match self {
            Self::Organisation(org) => Some(org),
            Self::Unrestricted => None,
        }
    }
}

/// `TenantContext` carries the tenancy decision for one request or job.
///
/// It is constructed once at the edge, after the session has been resolved,
/// and passed down by reference. Storage never consults ambient state; a
/// missing context cannot compile, and an [`OrgScope::Unrestricted`] one is
/// visible at the call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    scope: OrgScope,
    user: Option<UserId>,
}

impl TenantContext {
    /// Context for a request acting inside a single organisation.
    #[must_use]
    pub fn organisation(org: OrgId) -> Self {
        Self {
            scope: OrgScope::Organisation(org),
            user: None,
        }
    }

    /// Same as [`TenantContext::organisation`] but remembers which account is
    /// acting, for audit fields and per-user data such as notifications.
    #[must_use]
    pub fn organisation_for_user(org: OrgId, user: UserId) -> Self {
        Self {
            scope: OrgScope::Organisation(org),
            user: Some(user),
        }
    }

    /// Context with no organisation narrowing.
    ///
    /// Callers opt into this explicitly; it never falls out of a failed
    /// session lookup.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self {
            scope: OrgScope::Unrestricted,
            user: None,
        }
    }

    #[must_use]
    pub fn scope(&self) -> OrgScope {
        self.scope
    }

    /// The organisation this context is pinned to, `None` when unrestricted.
    #[must_use]
    pub fn org_id(&self) -> Option<OrgId> {
        self.scope.org_id()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user
    }

    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        matches!(self.scope, OrgScope::Unrestricted)
    }
}
