//! `gatekeeper-auth` — role policies, payload validation and the
//! authorization gate.
//!
//! This crate is intentionally decoupled from HTTP and from the handlers that
//! requests are eventually routed to.

pub mod authorize;
pub mod payload;
pub mod permissions;
pub mod policy;
pub mod registry;
pub mod roles;

pub use authorize::{authorize, Authorization, AuthzError};
pub use payload::{validate_payload, AuthPayload};
pub use permissions::Permission;
pub use policy::{AllowedPermissions, HandlerName, RolePolicy};
pub use registry::{RoleDefinition, RoleRegistry};
pub use roles::Role;
