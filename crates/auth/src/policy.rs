//! Per-role policy: which handler a role routes to and what it may request.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Handler a role is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerName {
    AdminAgent,
    LogisticsAgent,
    FinanceAgent,
}

impl HandlerName {
    pub const ALL: [HandlerName; 3] = [
        HandlerName::AdminAgent,
        HandlerName::LogisticsAgent,
        HandlerName::FinanceAgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerName::AdminAgent => "admin_agent",
            HandlerName::LogisticsAgent => "logistics_agent",
            HandlerName::FinanceAgent => "finance_agent",
        }
    }
}

impl core::fmt::Display for HandlerName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permissions a role may request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedPermissions {
    /// Every token is allowed (administrative role).
    All,
    /// Only the listed tokens are allowed.
    Only(Cow<'static, [Permission]>),
}

impl AllowedPermissions {
    pub fn only(tokens: &'static [Permission]) -> Self {
        Self::Only(Cow::Borrowed(tokens))
    }

    pub fn from_tokens<I, P>(tokens: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        Self::Only(Cow::Owned(tokens.into_iter().map(Into::into).collect()))
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Exact membership test; `All` permits everything.
    pub fn permits(&self, permission: &Permission) -> bool {
        match self {
            Self::All => true,
            Self::Only(tokens) => tokens.iter().any(|t| t == permission),
        }
    }

    /// Explicitly listed tokens (empty for `All`).
    pub fn tokens(&self) -> &[Permission] {
        match self {
            Self::All => &[],
            Self::Only(tokens) => tokens,
        }
    }
}

/// Routing and permission policy of one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    pub handler: HandlerName,
    pub allowed: AllowedPermissions,
    pub description: Cow<'static, str>,
}

impl RolePolicy {
    pub fn new(
        handler: HandlerName,
        allowed: AllowedPermissions,
        description: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            handler,
            allowed,
            description: description.into(),
        }
    }
}
