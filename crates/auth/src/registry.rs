//! Role-permission registry.
//!
//! Built once at startup and shared read-only (typically behind an `Arc`).
//! Storage is a fixed array indexed by [`Role`], so every role has exactly one
//! policy and lookups cannot miss.

use serde::Serialize;

use crate::{Role, RolePolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRegistry {
    policies: [RolePolicy; Role::ALL.len()],
}

impl RoleRegistry {
    /// Registry with the built-in policy of every role.
    pub fn standard() -> Self {
        Self::from_fn(Role::standard_policy)
    }

    /// Build a registry by asking `policy_for` for each role once.
    pub fn from_fn<F>(policy_for: F) -> Self
    where
        F: FnMut(Role) -> RolePolicy,
    {
        Self {
            policies: Role::ALL.map(policy_for),
        }
    }

    pub fn policy(&self, role: Role) -> &RolePolicy {
        &self.policies[role.index()]
    }

    /// Read-only projection of every role, in declaration order.
    pub fn definitions(&self) -> Vec<RoleDefinition> {
        Role::ALL
            .into_iter()
            .map(|role| RoleDefinition::new(role, self.policy(role)))
            .collect()
    }

    /// Projection of a single role by its wire name.
    pub fn definition(&self, name: &str) -> Option<RoleDefinition> {
        let role = name.parse::<Role>().ok()?;
        Some(RoleDefinition::new(role, self.policy(role)))
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Role definition (for listing/display).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDefinition {
    pub name: String,
    pub handler: String,
    pub permissions: Vec<String>,
    pub all_permissions: bool,
    pub description: String,
}

impl RoleDefinition {
    fn new(role: Role, policy: &RolePolicy) -> Self {
        let mut permissions: Vec<String> = policy
            .allowed
            .tokens()
            .iter()
            .map(|p| p.as_str().to_string())
            .collect();
        permissions.sort();

        Self {
            name: role.as_str().to_string(),
            handler: policy.handler.as_str().to_string(),
            permissions,
            all_permissions: policy.allowed.is_all(),
            description: policy.description.to_string(),
        }
    }
}
