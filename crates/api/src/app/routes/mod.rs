use axum::{
    routing::{get, post},
    Router,
};

pub mod callback;
pub mod roles;
pub mod system;

/// Router for the gatekeeper endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/auth/callback", post(callback::auth_callback))
        .route("/roles", get(roles::list_roles))
        .route("/roles/:name", get(roles::get_role))
}
