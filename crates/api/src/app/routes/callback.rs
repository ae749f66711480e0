use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::Value as JsonValue;

use gatekeeper_core::ValidationError;
use gatekeeper_router::{Gatekeeper, GatekeeperResponse};

use crate::app::errors;

/// POST /auth/callback - Route an authenticated-user callback to its role handler
pub async fn auth_callback(
    Extension(gatekeeper): Extension<Gatekeeper>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Response {
    let raw = match body {
        Ok(Json(raw)) => raw,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "unreadable callback body");
            let err = ValidationError::malformed(rejection.body_text());
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(GatekeeperResponse::validation(&err, None, Utc::now())),
            )
                .into_response();
        }
    };

    // The pipeline runs on its own task so an unexpected fault stays confined
    // to this request.
    let routed = tokio::spawn(async move { gatekeeper.route(&raw).await }).await;

    match routed {
        Ok(routed) => (errors::status_for(routed.state), Json(routed.response)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "routing task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(GatekeeperResponse::internal(Utc::now())),
            )
                .into_response()
        }
    }
}
