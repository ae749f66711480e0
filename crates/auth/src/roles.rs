use core::str::FromStr;

use serde::{Deserialize, Serialize};

use gatekeeper_core::ValidationError;

use crate::permissions::{
    READ_CONTAINER, READ_CTE, READ_DOCUMENT, READ_FINANCIAL, READ_INVOICE, READ_SHIPMENT,
    WRITE_DOCUMENT, WRITE_FINANCIAL, WRITE_INVOICE, WRITE_TRACKING,
};
use crate::policy::{AllowedPermissions, HandlerName, RolePolicy};
use crate::Permission;

static LOGISTICS_PERMISSIONS: [Permission; 5] = [
    READ_CTE,
    WRITE_DOCUMENT,
    READ_CONTAINER,
    WRITE_TRACKING,
    READ_SHIPMENT,
];

static FINANCE_PERMISSIONS: [Permission; 6] = [
    READ_FINANCIAL,
    WRITE_FINANCIAL,
    READ_INVOICE,
    WRITE_INVOICE,
    READ_CTE,
    READ_DOCUMENT,
];

static OPERATOR_PERMISSIONS: [Permission; 4] =
    [READ_CTE, READ_CONTAINER, READ_SHIPMENT, WRITE_TRACKING];

/// Caller role.
///
/// The set is closed: anything else is rejected during payload validation and
/// never reaches authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Logistics,
    Finance,
    Operator,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 4] = [Role::Admin, Role::Logistics, Role::Finance, Role::Operator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Logistics => "logistics",
            Role::Finance => "finance",
            Role::Operator => "operator",
        }
    }

    /// Position of this role in [`Role::ALL`].
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Built-in policy for this role.
    pub fn standard_policy(self) -> RolePolicy {
        match self {
            Role::Admin => RolePolicy::new(
                HandlerName::AdminAgent,
                AllowedPermissions::All,
                "Administrator with every permission",
            ),
            Role::Logistics => RolePolicy::new(
                HandlerName::LogisticsAgent,
                AllowedPermissions::only(&LOGISTICS_PERMISSIONS),
                "Logistics staff managing documents, containers and shipment tracking",
            ),
            Role::Finance => RolePolicy::new(
                HandlerName::FinanceAgent,
                AllowedPermissions::only(&FINANCE_PERMISSIONS),
                "Finance staff with access to financial records and invoices",
            ),
            Role::Operator => RolePolicy::new(
                HandlerName::LogisticsAgent,
                AllowedPermissions::only(&OPERATOR_PERMISSIONS),
                "Terminal operator with read access and tracking updates",
            ),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ValidationError::unknown_role(s))
    }
}
