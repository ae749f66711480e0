use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission token.
///
/// Tokens are opaque strings (e.g. "read:cte") compared by exact membership;
/// they are never pattern-matched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Permission::from_static(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Permission::new(value)
    }
}

// Tokens referenced by the standard role policies.

pub const READ_CTE: Permission = Permission::from_static("read:cte");
pub const READ_DOCUMENT: Permission = Permission::from_static("read:document");
pub const WRITE_DOCUMENT: Permission = Permission::from_static("write:document");
pub const READ_CONTAINER: Permission = Permission::from_static("read:container");
pub const READ_SHIPMENT: Permission = Permission::from_static("read:shipment");
pub const WRITE_TRACKING: Permission = Permission::from_static("write:tracking");
pub const READ_FINANCIAL: Permission = Permission::from_static("read:financial");
pub const WRITE_FINANCIAL: Permission = Permission::from_static("write:financial");
pub const READ_INVOICE: Permission = Permission::from_static("read:invoice");
pub const WRITE_INVOICE: Permission = Permission::from_static("write:invoice");
