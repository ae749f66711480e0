//! Read-only projection of the role registry.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use gatekeeper_router::Gatekeeper;

use crate::app::errors;

/// GET /roles - List all roles with their handler and permissions
pub async fn list_roles(Extension(gatekeeper): Extension<Gatekeeper>) -> axum::response::Response {
    let roles = gatekeeper.registry().definitions();
    (StatusCode::OK, Json(serde_json::json!({ "roles": roles }))).into_response()
}

/// GET /roles/:name - Get a single role
pub async fn get_role(
    Extension(gatekeeper): Extension<Gatekeeper>,
    Path(name): Path<String>,
) -> axum::response::Response {
    match gatekeeper.registry().definition(&name) {
        Some(role) => (StatusCode::OK, Json(serde_json::json!({ "role": role }))).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "role not found"),
    }
}
