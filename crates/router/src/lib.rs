//! `gatekeeper-router` — dispatch of authorized callbacks to role handlers.
//!
//! The request pipeline lives here: validate → authorize → dispatch →
//! assemble. It has no HTTP knowledge; transports map [`RequestState`] to
//! their own status codes.

pub mod context;
pub mod dispatcher;
pub mod handler;
pub mod pipeline;
pub mod response;

pub use context::DispatchContext;
pub use dispatcher::{DispatchError, DispatchErrorKind, DispatchResult, Dispatcher};
pub use handler::{AcknowledgeHandler, HandlerSet, RoleHandler};
pub use pipeline::{Clock, Failure, Gatekeeper, Rejection, RequestState, Routed};
pub use response::{Disclosure, GatekeeperResponse, ResponseStatus};
