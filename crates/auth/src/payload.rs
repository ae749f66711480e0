//! Authenticated-callback payload and its validator.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use gatekeeper_core::{SessionId, UserId, ValidationError, ValidationResult};

use crate::{Permission, Role};

/// A validated callback payload.
///
/// Only [`validate_payload`] (or the constructors below) produce one, so the
/// role is always a known variant and the user id is never blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthPayload {
    pub user_id: UserId,
    pub role: Role,
    pub permissions: BTreeSet<Permission>,
    pub session_id: Option<SessionId>,
    pub timestamp: DateTime<Utc>,
}

impl AuthPayload {
    pub fn new(user_id: UserId, role: Role, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id,
            role,
            permissions: BTreeSet::new(),
            session_id: None,
            timestamp,
        }
    }

    pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

/// Validate a raw callback body.
///
/// Fields are checked in order (`user_id`, `role`, `permissions`,
/// `session_id`, `timestamp`) and the first failure is returned. A missing
/// timestamp is replaced by `now`; unknown fields are ignored.
pub fn validate_payload(raw: &JsonValue, now: DateTime<Utc>) -> ValidationResult<AuthPayload> {
    let obj = raw
        .as_object()
        .ok_or_else(|| ValidationError::malformed("expected a JSON object"))?;

    let user_id = match present(obj, "user_id") {
        Some(JsonValue::String(s)) => UserId::parse(s)?,
        _ => return Err(ValidationError::MissingUserId),
    };

    let role = match present(obj, "role") {
        Some(JsonValue::String(s)) => s.parse::<Role>()?,
        Some(other) => return Err(ValidationError::unknown_role(other.to_string())),
        None => return Err(ValidationError::unknown_role("")),
    };

    let permissions = match present(obj, "permissions") {
        None => BTreeSet::new(),
        Some(JsonValue::Array(items)) => items
            .iter()
            .map(|item| match item {
                JsonValue::String(s) => Ok(Permission::new(s.clone())),
                _ => Err(ValidationError::InvalidPermissions),
            })
            .collect::<ValidationResult<BTreeSet<_>>>()?,
        Some(_) => return Err(ValidationError::InvalidPermissions),
    };

    let session_id = match present(obj, "session_id") {
        None => None,
        Some(JsonValue::String(s)) => Some(SessionId::new(s.clone())),
        Some(_) => return Err(ValidationError::InvalidSessionId),
    };

    let timestamp = match present(obj, "timestamp") {
        None => now,
        Some(JsonValue::String(s)) => parse_timestamp(s)?,
        Some(other) => return Err(ValidationError::InvalidTimestamp(other.to_string())),
    };

    Ok(AuthPayload {
        user_id,
        role,
        permissions,
        session_id,
        timestamp,
    })
}

/// Field lookup treating explicit `null` as absent.
fn present<'a>(obj: &'a Map<String, JsonValue>, key: &str) -> Option<&'a JsonValue> {
    obj.get(key).filter(|v| !v.is_null())
}

/// RFC 3339 first, then a naive ISO-8601 date-time taken as UTC.
fn parse_timestamp(raw: &str) -> ValidationResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| ValidationError::InvalidTimestamp(raw.to_string()))
}
