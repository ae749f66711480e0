//! Outward-facing response envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use gatekeeper_auth::{AuthPayload, AuthzError};
use gatekeeper_core::ValidationError;

use crate::DispatchResult;

pub const FORBIDDEN_MESSAGE: &str = "permissions not compatible with role";
pub const DISPATCH_FAILED_MESSAGE: &str = "request could not be processed by handler";
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
    Forbidden,
}

/// How much handler failure detail goes into the response body.
///
/// The detail is always logged; `Redacted` keeps it out of the body.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Disclosure {
    #[default]
    Redacted,
    Verbose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatekeeperResponse {
    pub status: ResponseStatus,
    pub handler_name: Option<String>,
    pub message: String,
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub data: Option<JsonValue>,
}

impl GatekeeperResponse {
    /// Wrap a dispatch result (success or failure) for the caller.
    pub fn from_dispatch(
        result: DispatchResult,
        payload: &AuthPayload,
        disclosure: Disclosure,
        now: DateTime<Utc>,
    ) -> Self {
        let user_id = Some(payload.user_id.to_string());

        match result.outcome {
            Ok(output) => Self {
                status: ResponseStatus::Success,
                handler_name: Some(result.handler.as_str().to_string()),
                message: format!("user routed to {}", result.handler),
                user_id,
                timestamp: now,
                data: Some(json!({
                    "result": output,
                    "context": result.context,
                })),
            },
            Err(err) => {
                let mut data = json!({
                    "error_kind": err.kind(),
                    "context": result.context,
                });
                if disclosure == Disclosure::Verbose {
                    data["error"] = JsonValue::String(err.to_string());
                }

                Self {
                    status: ResponseStatus::Error,
                    handler_name: None,
                    message: DISPATCH_FAILED_MESSAGE.to_string(),
                    user_id,
                    timestamp: now,
                    data: Some(data),
                }
            }
        }
    }

    /// Payload rejected before authorization.
    pub fn validation(err: &ValidationError, user_id: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            status: ResponseStatus::Error,
            handler_name: None,
            message: format!("invalid request: {err}"),
            user_id,
            timestamp: now,
            data: Some(json!({ "field": err.field() })),
        }
    }

    /// Permissions rejected by the authorization gate.
    pub fn forbidden(err: &AuthzError, payload: &AuthPayload, now: DateTime<Utc>) -> Self {
        let AuthzError::Forbidden { role, .. } = err;

        Self {
            status: ResponseStatus::Forbidden,
            handler_name: None,
            message: FORBIDDEN_MESSAGE.to_string(),
            user_id: Some(payload.user_id.to_string()),
            timestamp: now,
            data: Some(json!({ "role": role })),
        }
    }

    /// Unexpected failure outside the pipeline stages.
    pub fn internal(now: DateTime<Utc>) -> Self {
        Self {
            status: ResponseStatus::Error,
            handler_name: None,
            message: INTERNAL_ERROR_MESSAGE.to_string(),
            user_id: None,
            timestamp: now,
            data: None,
        }
    }
}
