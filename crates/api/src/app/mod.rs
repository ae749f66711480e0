//! HTTP API application wiring (Axum router + gatekeeper wiring).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `errors.rs`: consistent error responses and status mapping

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use gatekeeper_auth::RoleRegistry;
use gatekeeper_router::{Dispatcher, Gatekeeper, HandlerSet};

use crate::config::Settings;

pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Every role handler is the canned acknowledging implementation; embedders
/// with real handlers use [`build_router`].
pub fn build_app(settings: &Settings) -> Router {
    build_router(gatekeeper(settings, HandlerSet::acknowledging()))
}

/// Assemble the routing core from settings and a set of handlers.
pub fn gatekeeper(settings: &Settings, handlers: HandlerSet) -> Gatekeeper {
    let registry = Arc::new(RoleRegistry::standard());
    let dispatcher = Dispatcher::new(handlers).with_timeout(settings.handler_timeout);

    Gatekeeper::new(registry, dispatcher).with_disclosure(settings.disclosure())
}

/// Router around an already-built gatekeeper.
pub fn build_router(gatekeeper: Gatekeeper) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(gatekeeper)))
}
