//! Identifier newtypes for organisations and user accounts.
//!
//! Both wrap the storage layer's signed 64-bit keys but only admit positive
//! values, so a constructed id is always one that the database could have
//! issued.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a raw id is zero or negative.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("id must be a positive integer, got {0}")]
pub struct InvalidId(pub i64);

/// Primary key of an organisation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct OrgId(i64);

impl OrgId {
    /// Returns `None` unless `raw >= 1`.
    #[must_use]
    pub fn new(raw: i64) -> Option<Self> {
        (raw >= 1).then_some(Self(raw))
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for OrgId {
    type Error = InvalidId;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(InvalidId(raw))
    }
}

impl From<OrgId> for i64 {
    fn from(id: OrgId) -> Self {
        id.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Primary key of a user account.
///
/// Accounts are global; membership rows tie them to organisations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct UserId(i64);

impl UserId {
    /// Returns `None` unless `raw >= 1`.
    #[must_use]
    pub fn new(raw: i64) -> Option<Self> {
        (raw >= 1).then_some(Self(raw))
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for UserId {
    type Error = InvalidId;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(InvalidId(raw))
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn org_id_rejects_non_positive() {
        assert!(OrgId::new(0).is_none());
        assert!(OrgId::new(-7).is_none());
        assert_eq!(OrgId::new(1).unwrap().get(), 1);
    }

    #[test]
    fn try_from_reports_offending_value() {
        let err = OrgId::try_from(-3).unwrap_err();
        assert_eq!(err, InvalidId(-3));
        assert_eq!(err.to_string(), "id must be a positive integer, got -3");
    }

    #[test]
    fn ids_serialize_as_plain_integers() {
        let org = OrgId::new(42).unwrap();
        assert_eq!(serde_json::to_string(&org).unwrap(), "42");
        let back: OrgId = serde_json::from_str("42").unwrap();
        assert_eq!(back, org);
    }

    #[test]
    fn deserialization_rejects_non_positive() {
        assert!(serde_json::from_str::<OrgId>("0").is_err());
        assert!(serde_json::from_str::<UserId>("-1").is_err());
    }

    #[test]
    fn user_id_round_trips() {
        let user = UserId::try_from(9).unwrap();
        assert_eq!(user.to_string(), "9");
        assert_eq!(UserId::new(9), Some(user));
    }
}
