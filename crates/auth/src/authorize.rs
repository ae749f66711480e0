use thiserror::Error;

use crate::{AuthPayload, HandlerName, Permission, Role, RoleRegistry};

/// Outcome of a successful authorization: where the request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authorization {
    pub role: Role,
    pub handler: HandlerName,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// Requested permissions exceed the role's policy.
    ///
    /// `denied` is for server-side logs; the message never lists tokens.
    #[error("permissions not compatible with role")]
    Forbidden { role: Role, denied: Vec<Permission> },
}

/// Authorize a validated payload against the registry.
///
/// - No IO
/// - No panics
/// - Strict subset test: every requested token must be allowed by the role
///   (empty requests always pass)
pub fn authorize(registry: &RoleRegistry, payload: &AuthPayload) -> Result<Authorization, AuthzError> {
    let policy = registry.policy(payload.role);

    if !policy.allowed.is_all() {
        let denied: Vec<Permission> = payload
            .permissions
            .iter()
            .filter(|p| !policy.allowed.permits(p))
            .cloned()
            .collect();

        if !denied.is_empty() {
            return Err(AuthzError::Forbidden {
                role: payload.role,
                denied,
            });
        }
    }

    Ok(Authorization {
        role: payload.role,
        handler: policy.handler,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use gatekeeper_core::UserId;
    use proptest::prelude::*;

    use super::*;
    use crate::{AllowedPermissions, RolePolicy};

    const LOGISTICS_ALLOWED: [&str; 5] = [
        "read:cte",
        "write:document",
        "read:container",
        "write:tracking",
        "read:shipment",
    ];

    fn payload(role: Role, permissions: &[&str]) -> AuthPayload {
        AuthPayload::new(UserId::parse("user_1").unwrap(), role, Utc::now())
            .with_permissions(permissions.iter().map(|p| Permission::new(p.to_string())))
    }

    #[test]
    fn admin_routes_to_admin_agent() {
        let registry = RoleRegistry::standard();
        let authz = authorize(&registry, &payload(Role::Admin, &["read:all", "write:all"])).unwrap();
        assert_eq!(authz.handler, HandlerName::AdminAgent);
        assert_eq!(authz.role, Role::Admin);
    }

    #[test]
    fn operator_cannot_request_financial_permissions() {
        let registry = RoleRegistry::standard();
        let err = authorize(&registry, &payload(Role::Operator, &["read:financial"])).unwrap_err();

        assert_eq!(err.to_string(), "permissions not compatible with role");
        let AuthzError::Forbidden { role, denied } = err;
        assert_eq!(role, Role::Operator);
        assert_eq!(denied, vec![Permission::new("read:financial")]);
    }

    #[test]
    fn denied_lists_only_offending_tokens() {
        let registry = RoleRegistry::standard();
        let err = authorize(
            &registry,
            &payload(Role::Finance, &["read:invoice", "write:tracking", "read:cte", "delete:all"]),
        )
        .unwrap_err();

        let AuthzError::Forbidden { denied, .. } = err;
        let denied: Vec<&str> = denied.iter().map(|p| p.as_str()).collect();
        assert_eq!(denied, vec!["delete:all", "write:tracking"]);
    }

    #[test]
    fn operator_and_logistics_share_a_handler() {
        let registry = RoleRegistry::standard();
        for _ in 0..3 {
            let operator = authorize(&registry, &payload(Role::Operator, &[])).unwrap();
            let logistics = authorize(&registry, &payload(Role::Logistics, &[])).unwrap();
            assert_eq!(operator.handler, HandlerName::LogisticsAgent);
            assert_eq!(operator.handler, logistics.handler);
        }
    }

    #[test]
    fn injected_registry_is_respected() {
        let registry = RoleRegistry::from_fn(|role| match role {
            Role::Admin => RolePolicy::new(
                HandlerName::AdminAgent,
                AllowedPermissions::from_tokens(["read:all"]),
                "read-only admin",
            ),
            other => other.standard_policy(),
        });

        assert!(authorize(&registry, &payload(Role::Admin, &["read:all"])).is_ok());
        assert!(authorize(&registry, &payload(Role::Admin, &["write:all"])).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: admin accepts any token set.
        #[test]
        fn admin_accepts_any_permissions(
            tokens in prop::collection::vec("[a-z]{1,8}:[a-z*]{1,8}", 1..12)
        ) {
            let registry = RoleRegistry::standard();
            let refs: Vec<&str> = tokens.iter().map(String::as_str).collect();
            prop_assert!(authorize(&registry, &payload(Role::Admin, &refs)).is_ok());
        }

        /// Property: an empty request is authorized for every role.
        #[test]
        fn empty_permissions_always_pass(idx in 0usize..Role::ALL.len()) {
            let registry = RoleRegistry::standard();
            prop_assert!(authorize(&registry, &payload(Role::ALL[idx], &[])).is_ok());
        }

        /// Property: logistics accepts exactly subsets of its allowed set.
        #[test]
        fn logistics_enforces_subset(
            picks in prop::collection::vec(0usize..LOGISTICS_ALLOWED.len(), 0..6),
            foreign in prop::option::of("[a-z]{1,8}:[a-z]{1,8}"),
        ) {
            let registry = RoleRegistry::standard();
            let mut tokens: Vec<&str> = picks.iter().map(|i| LOGISTICS_ALLOWED[*i]).collect();

            match &foreign {
                Some(extra) if !LOGISTICS_ALLOWED.contains(&extra.as_str()) => {
                    tokens.push(extra.as_str());
                    let result = authorize(&registry, &payload(Role::Logistics, &tokens));
                    let is_forbidden = matches!(result, Err(AuthzError::Forbidden { .. }));
                    prop_assert!(is_forbidden);
                }
                _ => {
                    let result = authorize(&registry, &payload(Role::Logistics, &tokens));
                    prop_assert_eq!(result.map(|a| a.handler), Ok(HandlerName::LogisticsAgent));
                }
            }
        }
    }
}
