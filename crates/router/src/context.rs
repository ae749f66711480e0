use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use gatekeeper_auth::AuthPayload;

/// Per-request value handed to a role handler.
///
/// Built from a validated payload, moved into the handler call and echoed in
/// the response. Never shared between requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchContext {
    pub user_id: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub session_id: Option<String>,
    /// RFC 3339 (ISO-8601) instant of the callback.
    pub timestamp: String,
    /// Synthetic description of the triggering event.
    pub request: JsonValue,
}

impl DispatchContext {
    pub fn from_payload(payload: &AuthPayload) -> Self {
        Self {
            user_id: payload.user_id.to_string(),
            role: payload.role.as_str().to_string(),
            permissions: payload
                .permissions
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
            session_id: payload.session_id.as_ref().map(|s| s.to_string()),
            timestamp: payload.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            request: json!({
                "type": "auth_callback",
                "message": format!(
                    "user {} authenticated with role {}",
                    payload.user_id, payload.role
                ),
            }),
        }
    }
}
