use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use gatekeeper_router::{Failure, Rejection, RequestState};

/// HTTP status for the terminal state of a routed request.
pub fn status_for(state: RequestState) -> StatusCode {
    match state {
        RequestState::Responded => StatusCode::OK,
        RequestState::Rejected(Rejection::Validation) => StatusCode::UNPROCESSABLE_ENTITY,
        RequestState::Rejected(Rejection::Authorization) => StatusCode::FORBIDDEN,
        RequestState::Failed(Failure::Dispatch) => StatusCode::INTERNAL_SERVER_ERROR,
        // Non-terminal states never leave the pipeline.
        RequestState::Received
        | RequestState::Validated
        | RequestState::Authorized
        | RequestState::Dispatched => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
